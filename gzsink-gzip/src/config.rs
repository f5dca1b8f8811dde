//! Session configuration.

use gzsink_core::error::{GzSinkError, Result};
use gzsink_core::traits::CompressionLevel;
use gzsink_deflate::BackendConfig;

/// Default output buffer capacity (1 MiB).
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024 * 1024;

/// Default low-water mark: the buffer is flushed once free space drops to
/// this many bytes or fewer.
pub const DEFAULT_LOW_WATER_MARK: usize = 51_200;

/// Settings for one gzip write session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GzipSinkConfig {
    /// Compression level (0-9).
    pub level: CompressionLevel,
    /// Output buffer capacity in bytes.
    pub buffer_capacity: usize,
    /// Free-space threshold that triggers a flush.
    pub low_water_mark: usize,
    /// Backend settings, used only if this session initializes the backend.
    pub backend: BackendConfig,
}

impl Default for GzipSinkConfig {
    fn default() -> Self {
        Self {
            level: CompressionLevel::DEFAULT,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            low_water_mark: DEFAULT_LOW_WATER_MARK,
            backend: BackendConfig::default(),
        }
    }
}

impl GzipSinkConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the compression level.
    pub fn level(mut self, level: impl Into<CompressionLevel>) -> Self {
        self.level = level.into();
        self
    }

    /// Set the output buffer capacity.
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Set the low-water mark.
    pub fn low_water_mark(mut self, low_water: usize) -> Self {
        self.low_water_mark = low_water;
        self
    }

    /// Set the backend worker thread count.
    pub fn threads(mut self, threads: usize) -> Self {
        self.backend = self.backend.threads(threads);
        self
    }

    /// Set the backend compressor name.
    pub fn compressor(mut self, name: impl Into<String>) -> Self {
        self.backend = self.backend.compressor(name);
        self
    }

    /// Replace the backend settings.
    pub fn backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }

    /// Check the configuration.
    ///
    /// The low-water mark must leave room for the codec after every flush,
    /// so it has to be strictly below the capacity.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_capacity == 0 {
            return Err(GzSinkError::invalid_config("buffer capacity must be non-zero"));
        }
        if self.low_water_mark >= self.buffer_capacity {
            return Err(GzSinkError::invalid_config(format!(
                "low-water mark {} must be below buffer capacity {}",
                self.low_water_mark, self.buffer_capacity
            )));
        }
        self.backend.validate()?;
        Ok(())
    }
}

//! Process-wide compression backend.
//!
//! Every open session holds a [`BackendGuard`]. The first guard builds the
//! worker pool and fixes the compressor selection; later guards share that
//! backend whatever configuration they ask for; dropping the last guard tears
//! the pool down. The reference count lives behind a mutex, so sessions may
//! be opened and closed from any thread.

use crate::codec::DeflateCodec;
use crate::parallel::ParallelDeflateCodec;
use gzsink_core::error::{GzSinkError, Result};
use gzsink_core::traits::{CompressionLevel, Compressor};
use rayon::ThreadPool;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Default number of worker threads.
pub const DEFAULT_THREADS: usize = 4;

/// Default compressor name.
pub const DEFAULT_COMPRESSOR: &str = "zlib";

/// Default uncompressed block size for parallel compression (128 KiB).
pub const DEFAULT_BLOCK_SIZE: usize = 128 * 1024;

/// Smallest accepted parallel block size.
pub const MIN_BLOCK_SIZE: usize = 4 * 1024;

/// Compressor the backend drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompressorKind {
    /// DEFLATE through flate2 (accepted names: `zlib`, `deflate`, `gzip`).
    Deflate,
}

impl CompressorKind {
    /// Resolve a compressor by name (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "zlib" | "deflate" | "gzip" => Ok(Self::Deflate),
            _ => Err(GzSinkError::unsupported_method(name)),
        }
    }

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Deflate => "zlib",
        }
    }
}

/// Backend configuration, applied by whichever session initializes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Worker threads used by the parallel codec. One selects the
    /// single-stream codec.
    pub threads: usize,
    /// Compressor name.
    pub compressor: String,
    /// Uncompressed bytes per parallel block.
    pub block_size: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            compressor: DEFAULT_COMPRESSOR.to_string(),
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl BackendConfig {
    /// Set the worker thread count.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the compressor name.
    pub fn compressor(mut self, name: impl Into<String>) -> Self {
        self.compressor = name.into();
        self
    }

    /// Set the parallel block size.
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Check the configuration without touching global state.
    pub fn validate(&self) -> Result<CompressorKind> {
        if self.threads == 0 {
            return Err(GzSinkError::invalid_config("thread count must be at least 1"));
        }
        if self.block_size < MIN_BLOCK_SIZE {
            return Err(GzSinkError::invalid_config(format!(
                "block size {} is below the minimum of {}",
                self.block_size, MIN_BLOCK_SIZE
            )));
        }
        CompressorKind::from_name(&self.compressor)
    }
}

/// Initialized backend state shared by all sessions.
pub struct Backend {
    pool: ThreadPool,
    kind: CompressorKind,
    threads: usize,
    block_size: usize,
}

impl Backend {
    fn build(config: &BackendConfig) -> Result<Self> {
        let kind = config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("gzsink-worker-{}", i))
            .build()
            .map_err(|e| GzSinkError::backend(format!("worker pool: {}", e)))?;

        Ok(Self {
            pool,
            kind,
            threads: config.threads,
            block_size: config.block_size,
        })
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Selected compressor.
    pub fn kind(&self) -> CompressorKind {
        self.kind
    }

    /// Uncompressed bytes per parallel block.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Run `op` inside the worker pool.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    /// Create a session codec for `level`.
    pub fn create_codec(self: &Arc<Self>, level: CompressionLevel) -> Box<dyn Compressor + Send> {
        match self.kind {
            CompressorKind::Deflate if self.threads > 1 => {
                Box::new(ParallelDeflateCodec::new(Arc::clone(self), level))
            }
            CompressorKind::Deflate => Box::new(DeflateCodec::new(level)),
        }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("kind", &self.kind)
            .field("threads", &self.threads)
            .field("block_size", &self.block_size)
            .finish()
    }
}

struct Registry {
    refs: usize,
    backend: Option<Arc<Backend>>,
}

static REGISTRY: Mutex<Registry> = Mutex::new(Registry {
    refs: 0,
    backend: None,
});

fn registry() -> MutexGuard<'static, Registry> {
    // The registry is a counter plus an Arc; a panic elsewhere cannot leave
    // it half-updated.
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A counted reference to the process-wide backend.
#[derive(Debug)]
pub struct BackendGuard {
    backend: Arc<Backend>,
}

impl BackendGuard {
    /// Shared handle to the backend (for codecs that outlive a borrow).
    pub fn shared(&self) -> Arc<Backend> {
        Arc::clone(&self.backend)
    }
}

impl Deref for BackendGuard {
    type Target = Backend;

    fn deref(&self) -> &Backend {
        &self.backend
    }
}

impl Drop for BackendGuard {
    fn drop(&mut self) {
        let released = {
            let mut reg = registry();
            reg.refs = reg.refs.saturating_sub(1);
            if reg.refs == 0 { reg.backend.take() } else { None }
        };

        if released.is_some() {
            debug!("compression backend torn down");
        }
    }
}

/// Take a reference to the backend, initializing it on first use.
pub fn acquire(config: &BackendConfig) -> Result<BackendGuard> {
    config.validate()?;

    let mut reg = registry();
    let backend = match reg.backend.clone() {
        Some(existing) => {
            if existing.threads != config.threads || existing.block_size != config.block_size {
                warn!(
                    active_threads = existing.threads,
                    requested_threads = config.threads,
                    "backend already initialized; ignoring requested configuration"
                );
            }
            existing
        }
        None => {
            let backend = Arc::new(Backend::build(config)?);
            debug!(
                threads = backend.threads,
                compressor = backend.kind.name(),
                "compression backend initialized"
            );
            reg.backend = Some(Arc::clone(&backend));
            backend
        }
    };
    reg.refs += 1;

    Ok(BackendGuard { backend })
}

/// Number of live backend references.
pub fn active_references() -> usize {
    registry().refs
}

/// Whether the backend is currently initialized.
pub fn is_initialized() -> bool {
    registry().backend.is_some()
}

// The registry is global; tests that touch it run one at a time.
#[cfg(test)]
static SERIAL: Mutex<()> = Mutex::new(());

#[cfg(test)]
pub(crate) fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compressor_names() {
        assert_eq!(CompressorKind::from_name("zlib").unwrap(), CompressorKind::Deflate);
        assert_eq!(CompressorKind::from_name("DEFLATE").unwrap(), CompressorKind::Deflate);
        assert!(matches!(
            CompressorKind::from_name("blosclz"),
            Err(GzSinkError::UnsupportedMethod { .. })
        ));
    }

    #[test]
    fn test_config_validation() {
        assert!(BackendConfig::default().validate().is_ok());
        assert!(BackendConfig::default().threads(0).validate().is_err());
        assert!(BackendConfig::default().block_size(16).validate().is_err());
        assert!(BackendConfig::default().compressor("lzma").validate().is_err());
    }

    #[test]
    fn test_first_acquire_initializes_last_release_tears_down() {
        let _serial = serial();
        let base = active_references();

        let first = acquire(&BackendConfig::default().threads(2)).unwrap();
        assert!(is_initialized());
        assert_eq!(active_references(), base + 1);

        let second = acquire(&BackendConfig::default().threads(3)).unwrap();
        assert_eq!(active_references(), base + 2);
        // Later acquirers share the first configuration
        assert!(Arc::ptr_eq(&first.shared(), &second.shared()));

        drop(first);
        assert_eq!(active_references(), base + 1);
        assert!(is_initialized());

        drop(second);
        assert_eq!(active_references(), base);
        if base == 0 {
            assert!(!is_initialized());
        }
    }

    #[test]
    fn test_invalid_config_takes_no_reference() {
        let _serial = serial();
        let base = active_references();
        assert!(acquire(&BackendConfig::default().compressor("brotli")).is_err());
        assert_eq!(active_references(), base);
    }

    #[test]
    fn test_install_runs_on_pool() {
        let _serial = serial();
        let guard = acquire(&BackendConfig::default().threads(2)).unwrap();
        let name = guard.install(|| std::thread::current().name().map(str::to_string));
        assert!(name.is_some_and(|n| n.starts_with("gzsink-worker-")));
    }

    #[test]
    fn test_codec_selection_follows_thread_count() {
        let _serial = serial();
        let guard = acquire(&BackendConfig::default()).unwrap();
        let codec = guard.shared().create_codec(CompressionLevel::DEFAULT);
        assert!(!codec.is_finished());
    }
}

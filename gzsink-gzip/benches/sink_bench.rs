//! Session throughput across write sizes and thread counts.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use gzsink_gzip::{GzipSink, GzipSinkConfig, IoChild};
use std::hint::black_box;

fn log_like(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut i = 0u64;
    while data.len() < size {
        data.extend_from_slice(
            format!("2026-01-01T00:00:{:02}Z INFO request id={} status=200\n", i % 60, i).as_bytes(),
        );
        i += 1;
    }
    data.truncate(size);
    data
}

fn bench_write_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("gzip_sink_writes");
    let input = log_like(4 * 1024 * 1024);
    group.throughput(Throughput::Bytes(input.len() as u64));

    for chunk in [512usize, 16 * 1024, 1024 * 1024] {
        group.bench_with_input(BenchmarkId::new("chunk", chunk), &chunk, |b, &chunk| {
            b.iter(|| {
                let config = GzipSinkConfig::default().threads(1);
                let mut sink = GzipSink::open(IoChild::new(std::io::sink()), config).unwrap();
                for piece in input.chunks(chunk) {
                    black_box(sink.write(piece));
                }
                black_box(sink.finish().unwrap())
            });
        });
    }

    group.finish();
}

fn bench_threads(c: &mut Criterion) {
    let mut group = c.benchmark_group("gzip_sink_threads");
    let input = log_like(16 * 1024 * 1024);
    group.throughput(Throughput::Bytes(input.len() as u64));

    for threads in [1usize, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::new("threads", threads), &threads, |b, &threads| {
            b.iter(|| {
                // Each iteration opens and closes the only session, so the
                // backend is rebuilt with this thread count.
                let config = GzipSinkConfig::default().threads(threads);
                let mut sink = GzipSink::open(IoChild::new(std::io::sink()), config).unwrap();
                black_box(sink.write(&input));
                black_box(sink.finish().unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_write_sizes, bench_threads);
criterion_main!(benches);

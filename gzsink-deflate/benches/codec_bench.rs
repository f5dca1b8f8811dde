//! Single-stream vs parallel block deflate throughput.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use gzsink_core::{CompressStatus, CompressionLevel, Compressor, FlushMode};
use gzsink_deflate::backend::{self, BackendConfig};
use gzsink_deflate::DeflateCodec;
use std::hint::black_box;

fn text_like(size: usize) -> Vec<u8> {
    let text = b"The quick brown fox jumps over the lazy dog. 0123456789\n";
    text.iter().copied().cycle().take(size).collect()
}

fn drive(codec: &mut dyn Compressor, input: &[u8], out: &mut [u8]) -> usize {
    let mut total = 0;
    let mut pos = 0;
    while pos < input.len() {
        let (consumed, produced, _) = codec
            .compress(&input[pos..], out, FlushMode::None)
            .expect("compress");
        pos += consumed;
        total += produced;
    }
    loop {
        let (_, produced, status) = codec.compress(&[], out, FlushMode::Finish).expect("finish");
        total += produced;
        if status == CompressStatus::Done {
            return total;
        }
    }
}

fn bench_codecs(c: &mut Criterion) {
    let mut group = c.benchmark_group("deflate_codecs");
    let input = text_like(8 * 1024 * 1024);
    let mut out = vec![0u8; 1024 * 1024];
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("single_stream", |b| {
        b.iter(|| {
            let mut codec = DeflateCodec::new(CompressionLevel::DEFAULT);
            black_box(drive(&mut codec, black_box(&input), &mut out))
        });
    });

    for threads in [2usize, 4, 8] {
        let guard = backend::acquire(&BackendConfig::default().threads(threads)).expect("backend");
        group.bench_with_input(BenchmarkId::new("parallel", threads), &threads, |b, _| {
            b.iter(|| {
                let mut codec = guard.shared().create_codec(CompressionLevel::DEFAULT);
                black_box(drive(codec.as_mut(), black_box(&input), &mut out))
            });
        });
        // Release before the next size so the pool is rebuilt.
        drop(guard);
    }

    group.finish();
}

criterion_group!(benches, bench_codecs);
criterion_main!(benches);

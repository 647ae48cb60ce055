//! Benchmarks for constrained SWF encoding.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use alphaswf::Charset;

/// A compressible payload mixing short repeated runs with separators.
fn synthetic_payload(len: usize) -> Vec<u8> {
    let mut payload = Vec::with_capacity(len);
    while payload.len() < len {
        payload.extend_from_slice(&[3, 4, 5, 3, 4, 5, 40, 77]);
        payload.push((payload.len() % 97) as u8);
    }
    payload.truncate(len);
    payload
}

fn swf_input(payload: &[u8]) -> Vec<u8> {
    let mut input = b"FWS".to_vec();
    input.push(6);
    input.extend_from_slice(&((payload.len() + 8) as u32).to_le_bytes());
    input.extend_from_slice(payload);
    input
}

fn encode_benchmark(c: &mut Criterion) {
    let charset = Charset::alphanumeric();
    let mut group = c.benchmark_group("SWF Encoding");

    for size in [256usize, 1024, 4096].iter() {
        let input = swf_input(&synthetic_payload(*size));
        group.throughput(Throughput::Bytes(*size as u64));

        group.bench_with_input(BenchmarkId::new("alphaswf", size), &input, |b, input| {
            b.iter(|| alphaswf::encode(black_box(input), &charset).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, encode_benchmark);
criterion_main!(benches);

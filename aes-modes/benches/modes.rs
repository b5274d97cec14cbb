use aes_modes::{Engine, Mode};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const SIZES: [usize; 3] = [64, 4 * 1024, 64 * 1024];

fn bench_encrypt(c: &mut Criterion) {
    let engine = Engine::new();
    let mut group = c.benchmark_group("encrypt");

    for size in SIZES {
        let plaintext = vec![0x5Au8; size];
        group.throughput(Throughput::Bytes(size as u64));
        for mode in Mode::ALL {
            group.bench_with_input(BenchmarkId::new(mode.as_str(), size), &plaintext, |b, data| {
                b.iter(|| engine.encrypt(black_box(data), "bench", mode))
            });
        }
    }

    group.finish();
}

fn bench_decrypt(c: &mut Criterion) {
    let engine = Engine::new();
    let mut group = c.benchmark_group("decrypt");

    for size in SIZES {
        let plaintext = vec![0x5Au8; size];
        group.throughput(Throughput::Bytes(size as u64));
        for mode in Mode::ALL {
            let Ok(envelope) = engine.encrypt(&plaintext, "bench", mode) else {
                continue;
            };
            group.bench_with_input(BenchmarkId::new(mode.as_str(), size), &envelope, |b, wire| {
                b.iter(|| engine.decrypt(black_box(wire), "bench", mode))
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_encrypt, bench_decrypt);
criterion_main!(benches);

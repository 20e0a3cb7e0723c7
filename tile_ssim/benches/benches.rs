use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tile_ssim::{compute_ssim_with_config, Image8, SsimConfig, SsimReference};

fn noise_pair(width: usize, height: usize) -> (Image8, Image8) {
    let mut rng = StdRng::seed_from_u64(0);
    let source: Vec<u8> = (0..width * height * 3).map(|_| rng.gen()).collect();
    let distorted = source
        .iter()
        .map(|&v| v.saturating_add(rng.gen_range(0..8)))
        .collect();
    (
        Image8::new(source, width, height, 3).unwrap(),
        Image8::new(distorted, width, height, 3).unwrap(),
    )
}

fn bench_tile_ssim(c: &mut Criterion) {
    let mut group = c.benchmark_group("tile_ssim");
    for size in [256usize, 1024] {
        let (source, distorted) = noise_pair(size, size);

        group.bench_with_input(BenchmarkId::new("sequential", size), &size, |b, _| {
            b.iter(|| {
                compute_ssim_with_config(
                    black_box(&source),
                    black_box(&distorted),
                    SsimConfig::sequential(),
                )
                .unwrap()
            })
        });

        group.bench_with_input(BenchmarkId::new("parallel", size), &size, |b, _| {
            b.iter(|| {
                compute_ssim_with_config(
                    black_box(&source),
                    black_box(&distorted),
                    SsimConfig::parallel(),
                )
                .unwrap()
            })
        });

        let reference = SsimReference::new(&source, SsimConfig::default()).unwrap();
        group.bench_with_input(BenchmarkId::new("precomputed", size), &size, |b, _| {
            b.iter(|| reference.compare(black_box(&distorted)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_tile_ssim);
criterion_main!(benches);

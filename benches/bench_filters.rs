use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tabletop_core::PointCloud;
use tabletop_filters::{crop_box, radius_outlier_removal, voxel_downsample};

/// Points scattered over a 2 m cube, roughly the extent of a tabletop scan.
fn random_cloud(n: usize, seed: u64) -> PointCloud {
    let mut rng = StdRng::seed_from_u64(seed);
    let x: Vec<f32> = (0..n).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
    let y: Vec<f32> = (0..n).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
    let z: Vec<f32> = (0..n).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
    PointCloud::from_xyz(x, y, z)
}

fn bench_voxel_downsample(c: &mut Criterion) {
    let mut group = c.benchmark_group("voxel_downsample_9mm");
    for size in [100_000, 1_000_000] {
        let cloud = random_cloud(size, 42);
        group.bench_with_input(BenchmarkId::new("tabletop", size), &cloud, |b, cloud| {
            b.iter(|| voxel_downsample(cloud, 0.009))
        });
    }
    group.finish();
}

fn bench_crop_box(c: &mut Criterion) {
    let mut group = c.benchmark_group("crop_box");
    for size in [100_000, 1_000_000] {
        let cloud = random_cloud(size, 42);
        group.bench_with_input(BenchmarkId::new("tabletop", size), &cloud, |b, cloud| {
            b.iter(|| crop_box(cloud, [-0.6, -0.5, -0.025], [0.6, 0.5, 0.5]))
        });
    }
    group.finish();
}

fn bench_radius_outlier(c: &mut Criterion) {
    let mut group = c.benchmark_group("radius_outlier_removal");
    for size in [10_000, 100_000] {
        let cloud = random_cloud(size, 42);
        group.bench_with_input(BenchmarkId::new("tabletop", size), &cloud, |b, cloud| {
            b.iter(|| radius_outlier_removal(cloud, 0.05, 5))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_voxel_downsample,
    bench_crop_box,
    bench_radius_outlier
);
criterion_main!(benches);

//! Finalization Benchmarks
//!
//! Measures the scan + normalize + emit pass over staged timesteps.
//!
//! Run: cargo bench --bench finalize

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tempfile::TempDir;
use vdf::{write_final, Dimensions, FileLayout, GlobalRange, GridConfig, GridType, StagingArea};

/// Deterministic pseudo-random timestep
fn gen_timestep(voxels: usize, seed: u64) -> Vec<f32> {
    let mut state = seed
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    (0..voxels)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let bits = ((state >> 33) ^ state) as u32;
            (bits as f32 / u32::MAX as f32) * 200.0 - 100.0
        })
        .collect()
}

fn bench_write_final(c: &mut Criterion) {
    let mut group = c.benchmark_group("finalize/write_final");
    group.sample_size(10);

    for &side in &[16u32, 32, 64] {
        let timesteps = 4;
        let config =
            GridConfig::new(GridType::Cartesian, Dimensions::new(side, side, side).unwrap()).unwrap();
        let voxels = config.voxels_per_timestep();

        let dir = TempDir::new().unwrap();
        let mut staging = StagingArea::create(dir.path(), FileLayout::default(), config).unwrap();
        for t in 0..timesteps {
            staging.write_timestep(&gen_timestep(voxels, t)).unwrap();
        }
        staging.write_header().unwrap();

        group.throughput(Throughput::Bytes((voxels * 4) as u64 * timesteps));
        group.bench_with_input(BenchmarkId::from_parameter(side), &staging, |b, staging| {
            b.iter(|| write_final(staging).unwrap());
        });
    }

    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("finalize/normalize");
    let block = gen_timestep(64 * 64 * 64, 7);
    let mut range = GlobalRange::empty();
    range.observe(&block);

    group.throughput(Throughput::Elements(block.len() as u64));
    group.bench_function("64^3", |b| {
        b.iter(|| {
            let mut samples = block.clone();
            range.normalize_in_place(&mut samples);
            samples
        })
    });
    group.finish();
}

criterion_group!(benches, bench_write_final, bench_normalize);
criterion_main!(benches);

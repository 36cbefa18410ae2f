use criterion::{black_box, criterion_group, criterion_main, Criterion};
use terrain_synth::config::Params;
use terrain_synth::erosion::hydraulic::HydraulicErosion;
use terrain_synth::erosion::thermal::ThermalErosion;
use terrain_synth::noise::NoiseGenerator;

fn bench_hydraulic(c: &mut Criterion) {
    let mut group = c.benchmark_group("Hydraulic Erosion");
    let base = NoiseGenerator::new(12345).generate_heightmap(257, 257, 120.0, 4, 0.5, 2.0);

    for &droplets in &[1000u32, 4000] {
        group.bench_function(format!("droplets_{}", droplets), |b| {
            b.iter(|| {
                let mut map = base.clone();
                let stats = HydraulicErosion::new(7).apply(&mut map, droplets, 0.4);
                black_box((map, stats));
            });
        });
    }

    group.finish();
}

fn bench_thermal(c: &mut Criterion) {
    let mut group = c.benchmark_group("Thermal Erosion");

    for &size in &[257usize, 513] {
        let base = NoiseGenerator::new(12345).generate_heightmap(size, size, 120.0, 4, 0.5, 2.0);
        group.bench_function(format!("size_{}_x5", size), |b| {
            b.iter(|| black_box(ThermalErosion::default().apply(&base, 5)));
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("Pipeline");
    group.sample_size(10);

    let params = Params::default();
    group.bench_function("default_257", |b| {
        b.iter(|| black_box(terrain_synth::generate(&params)));
    });

    group.finish();
}

criterion_group!(benches, bench_hydraulic, bench_thermal, bench_pipeline);
criterion_main!(benches);

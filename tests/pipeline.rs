use terrain_synth::config::{Algorithm, Params};
use terrain_synth::displacement::DiamondSquare;
use terrain_synth::erosion::hydraulic::HydraulicErosion;
use terrain_synth::erosion::thermal::ThermalErosion;
use terrain_synth::noise::NoiseGenerator;
use terrain_synth::smooth::{finalize, normalize, FLAT_FILL};
use terrain_synth::{generate, generate_with_timings, Grid, ParamError};

fn small(algorithm: Algorithm) -> Params {
    Params {
        size: 65,
        algorithm,
        erosion_iterations: 400,
        ..Params::default()
    }
}

fn assert_contract(map: &Grid<f32>, size: usize) {
    assert_eq!(map.size(), size);
    assert_eq!(map.data.len(), size * size);
    assert!(map.data.iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v)));
    let (lo, hi) = map.min_max().unwrap();
    if lo == hi {
        assert_eq!(lo, FLAT_FILL);
    } else {
        assert_eq!(lo, 0.0);
        assert_eq!(hi, 1.0);
    }
}

#[test]
fn every_algorithm_meets_output_contract() {
    for algorithm in [Algorithm::Noise, Algorithm::Displacement, Algorithm::Hybrid] {
        let map = generate(&small(algorithm)).unwrap();
        assert_contract(&map, 65);
    }
}

#[test]
fn generation_is_deterministic() {
    for algorithm in [Algorithm::Noise, Algorithm::Displacement, Algorithm::Hybrid] {
        let p = small(algorithm);
        assert_eq!(generate(&p).unwrap(), generate(&p).unwrap());
    }
}

#[test]
fn seed_changes_output() {
    let a = generate(&small(Algorithm::Hybrid)).unwrap();
    let b = generate(&Params { seed: 54321, ..small(Algorithm::Hybrid) }).unwrap();
    assert_ne!(a, b);
}

#[test]
fn reported_size_matches_buffer_for_odd_sizes() {
    for size in [1u32, 2, 3, 10, 33, 100] {
        let p = Params {
            size,
            erosion_iterations: 50,
            ..Params::default()
        };
        let map = generate(&p).unwrap();
        assert_contract(&map, size as usize);
    }
}

#[test]
fn single_cell_grid_is_flat_fill() {
    for algorithm in [Algorithm::Noise, Algorithm::Displacement, Algorithm::Hybrid] {
        let p = Params { size: 1, ..small(algorithm) };
        let map = generate(&p).unwrap();
        assert_eq!(map.data, vec![FLAT_FILL]);
    }
}

#[test]
fn ridged_and_unsmoothed_variants_are_valid() {
    let p = Params {
        ridged: true,
        smoothing_strength: 0.0,
        thermal_iterations: 0,
        ..small(Algorithm::Noise)
    };
    assert_contract(&generate(&p).unwrap(), 65);
    let p = Params { ridged: true, ..small(Algorithm::Hybrid) };
    assert_contract(&generate(&p).unwrap(), 65);
}

#[test]
fn default_parameters_at_reference_size() {
    let p = Params { size: 129, ..Params::default() };
    let (map, timings) = generate_with_timings(&p).unwrap();
    assert_contract(&map, 129);
    assert_eq!(timings.last().map(|t| t.name), Some("TOTAL"));
    assert!(timings.iter().any(|t| t.name == "hydraulic"));
}

#[test]
fn invalid_parameters_are_rejected_up_front() {
    let p = Params { scale: 0.0, ..Params::default() };
    assert_eq!(generate(&p), Err(ParamError::NonPositiveScale(0.0)));
    let p = Params { size: 0, ..Params::default() };
    assert_eq!(generate(&p), Err(ParamError::ZeroSize));
    let p = Params { octaves: 0, ..Params::default() };
    assert_eq!(generate(&p), Err(ParamError::ZeroOctaves));
}

#[test]
fn displacement_corners_reproduce_with_fresh_generator() {
    let n = 257;
    let corners = |m: &Grid<f32>| [m.get(0, 0), m.get(n - 1, 0), m.get(0, n - 1), m.get(n - 1, n - 1)];
    let a = DiamondSquare::new(12345).generate(n, 0.5, 0.3);
    let mut ds = DiamondSquare::new(999);
    ds.set_seed(12345);
    let b = ds.generate(n, 0.5, 0.3);
    assert_eq!(corners(&a), corners(&b));
}

#[test]
fn zero_erosion_leaves_grid_untouched() {
    let noise = NoiseGenerator::new(3).generate_heightmap(64, 64, 80.0, 4, 0.5, 2.0);
    let mut eroded = noise.clone();
    let stats = HydraulicErosion::new(3).apply(&mut eroded, 0, 0.4);
    assert_eq!(eroded, noise);
    assert_eq!(stats.steps, 0);
}

#[test]
fn erosion_step_bound_on_real_terrain() {
    let mut map = NoiseGenerator::new(8).generate_heightmap(96, 96, 90.0, 5, 0.5, 2.0);
    let mut sim = HydraulicErosion::new(8);
    let intensity = 0.4;
    let stats = sim.apply(&mut map, 2000, intensity);
    assert!(stats.max_step_erosion <= sim.params.max_erosion_per_step * intensity);
}

#[test]
fn thermal_on_flat_grid_is_exact() {
    let flat = Grid::filled(40, 0.5f32);
    let thermal = ThermalErosion::default();
    assert_eq!(thermal.apply(&flat, 0), flat);
    assert_eq!(thermal.apply(&flat, 25), flat);
}

#[test]
fn thermal_conserves_mass_on_noise() {
    let map = DiamondSquare::new(21).generate(65, 0.7, 0.9);
    let out = ThermalErosion::default().apply(&map, 8);
    assert!((out.total() - map.total()).abs() < 1e-3);
}

#[test]
fn normalize_handles_nan_and_is_idempotent() {
    let mut map = NoiseGenerator::new(1).generate_heightmap(32, 32, 50.0, 3, 0.5, 2.0);
    map.data[100] = f32::NAN;
    finalize(&mut map);
    assert!(map.data.iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v)));

    let once = map.clone();
    normalize(&mut map);
    assert_eq!(map, once);
}

pub mod composite;
pub mod config;
pub mod displacement;
pub mod erosion;
pub mod error;
pub mod grid;
pub mod noise;
pub mod render;
pub mod rng;
pub mod smooth;

use std::time::Instant;

use tracing::{debug, info, warn};

use composite::{final_wave_correction, hybrid_blend, ridged, shape_mountains};
use config::{Algorithm, Params};
use displacement::DiamondSquare;
use erosion::hydraulic::HydraulicErosion;
use erosion::thermal::ThermalErosion;
pub use error::{ParamError, Result};
pub use grid::{Grid, Heightmap};
use noise::NoiseGenerator;
use rng::seed_u32;

const SALT_DROPLETS: u32 = 0xD40F_1E75;

/// Corner height scale passed to diamond-square.
const DISPLACEMENT_INITIAL_HEIGHT: f32 = 0.3;
/// Strength of the 8-neighbour wave correction after thermal erosion.
const WAVE_CORRECTION_STRENGTH: f32 = 0.12;
/// Kernel blend used by the final smoothing pass.
const LIGHT_SMOOTHING: f32 = 0.06;

pub struct Timing {
    pub name: &'static str,
    pub ms: f64,
}

/// Run the whole pipeline. Output is `size * size` samples, all in [0, 1].
pub fn generate(params: &Params) -> Result<Heightmap> {
    generate_with_timings(params).map(|(map, _)| map)
}

/// Same as [`generate`], also returning wall-clock time per stage.
pub fn generate_with_timings(params: &Params) -> Result<(Heightmap, Vec<Timing>)> {
    params.validate()?;
    for advisory in params.advisories() {
        warn!("{advisory}");
    }

    let mut timings = Vec::new();
    let total_start = Instant::now();
    let mut lap = |name: &'static str, t: Instant| {
        let ms = t.elapsed().as_secs_f64() * 1000.0;
        debug!(stage = name, ms, "stage done");
        timings.push(Timing { name, ms });
    };

    let n = params.size as usize;
    let ridge_power = params.ridged.then_some(1.0 + params.roughness);

    // 1. Base terrain
    let t = Instant::now();
    let map = match params.algorithm {
        Algorithm::Noise => {
            let mut map = noise_map(params, n);
            if let Some(power) = ridge_power {
                map.data.iter_mut().for_each(|v| *v = ridged(*v, power));
            }
            map
        }
        Algorithm::Displacement => displacement_map(params, n),
        Algorithm::Hybrid => {
            let noise = noise_map(params, n);
            let disp = displacement_map(params, n);
            hybrid_blend(&noise, &disp, params.hybrid_weight, ridge_power)
        }
    };
    lap("base", t);

    // 2. Mountain massifs
    let t = Instant::now();
    let map = shape_mountains(&map, params.mountain_threshold, params.mountain_merge);
    lap("shape", t);

    // 3. Thermal creep
    let t = Instant::now();
    let map = ThermalErosion::default().apply(&map, params.thermal_iterations);
    lap("thermal", t);

    // 4. Wave correction
    let t = Instant::now();
    let (map, fixes) = final_wave_correction(&map, WAVE_CORRECTION_STRENGTH);
    debug!(cells = fixes, "wave correction");
    lap("wave_correction", t);

    // 5. Smoothing
    let s = params.smoothing_strength;
    let t = Instant::now();
    let mut map = if s > 0.0 {
        let map = smooth::blend_smooth(&map, s);
        let iterations = ((s * 3.0).round() as u32).max(1);
        smooth::laplacian_smooth(&map, iterations, 0.35 + s * 0.25)
    } else {
        map
    };
    lap("smooth", t);

    // 6. Hydraulic erosion
    let t = Instant::now();
    let stats = HydraulicErosion::new(seed_u32(params.seed, SALT_DROPLETS)).apply(
        &mut map,
        params.erosion_iterations,
        params.erosion_intensity,
    );
    debug!(
        droplets = stats.droplets,
        steps = stats.steps,
        eroded = stats.total_eroded,
        deposited = stats.total_deposited,
        "hydraulic erosion"
    );
    lap("hydraulic", t);

    // 7. Final smoothing
    let t = Instant::now();
    let mut map = if s > 0.0 {
        let map = smooth::blend_smooth(&map, LIGHT_SMOOTHING);
        smooth::laplacian_smooth(&map, 1, 0.25 + s * 0.25)
    } else {
        map
    };
    lap("final_smooth", t);

    // 8. Normalize
    let t = Instant::now();
    smooth::finalize(&mut map);
    lap("normalize", t);

    let total_ms = total_start.elapsed().as_secs_f64() * 1000.0;
    timings.push(Timing { name: "TOTAL", ms: total_ms });
    info!(size = n, seed = params.seed, ms = total_ms, "heightmap generated");

    Ok((map, timings))
}

fn noise_map(params: &Params, n: usize) -> Heightmap {
    NoiseGenerator::new(params.seed).generate_heightmap(
        n,
        n,
        params.scale,
        params.octaves,
        params.persistence,
        params.lacunarity,
    )
}

fn displacement_map(params: &Params, n: usize) -> Heightmap {
    DiamondSquare::new(params.seed).generate_sized(
        n,
        params.displacement_roughness,
        DISPLACEMENT_INITIAL_HEIGHT,
    )
}

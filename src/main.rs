use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use terrain_synth::config::{Algorithm, Params};
use terrain_synth::render;

/// Droplet count above which interactive runs get too slow.
const MAX_EROSION_ITERATIONS: u32 = 4000;
/// Largest grid side offered; anything bigger exhausts memory in diamond-square.
const MAX_SIZE: u32 = 1025;

#[derive(Parser, Debug)]
#[command(name = "terrain-synth", about = "Generate a normalized heightmap")]
struct Args {
    #[arg(long, default_value_t = 12345)]
    seed: u32,
    #[arg(long, default_value_t = 257, value_parser = clap::value_parser!(u32).range(1..=MAX_SIZE as i64))]
    size: u32,
    #[arg(long, value_enum, default_value_t = AlgorithmArg::Hybrid)]
    algorithm: AlgorithmArg,
    #[arg(long, default_value_t = 120.0)]
    scale: f32,
    #[arg(long, default_value_t = 4)]
    octaves: u32,
    #[arg(long, default_value_t = 0.5)]
    persistence: f32,
    #[arg(long, default_value_t = 2.0)]
    lacunarity: f32,
    #[arg(long, default_value_t = 0.35)]
    roughness: f32,
    #[arg(long)]
    ridged: bool,
    #[arg(long, default_value_t = 0.5)]
    displacement_roughness: f32,
    #[arg(long, default_value_t = 0.4)]
    hybrid_weight: f32,
    #[arg(long, default_value_t = 0.6)]
    mountain_threshold: f32,
    #[arg(long, default_value_t = 0.35)]
    mountain_merge: f32,
    #[arg(long, default_value_t = 3)]
    thermal_iterations: u32,
    #[arg(long, default_value_t = 3000)]
    erosion_iterations: u32,
    #[arg(long, default_value_t = 0.4)]
    erosion_intensity: f32,
    #[arg(long, default_value_t = 0.3)]
    smoothing_strength: f32,
    /// Directory for heightmap.png.
    #[arg(long, default_value = "artifacts")]
    out: PathBuf,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum AlgorithmArg {
    Noise,
    Displacement,
    Hybrid,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(a: AlgorithmArg) -> Self {
        match a {
            AlgorithmArg::Noise => Algorithm::Noise,
            AlgorithmArg::Displacement => Algorithm::Displacement,
            AlgorithmArg::Hybrid => Algorithm::Hybrid,
        }
    }
}

impl From<Args> for Params {
    fn from(a: Args) -> Self {
        Params {
            seed: a.seed,
            size: a.size,
            algorithm: a.algorithm.into(),
            scale: a.scale,
            octaves: a.octaves,
            persistence: a.persistence,
            lacunarity: a.lacunarity,
            roughness: a.roughness,
            ridged: a.ridged,
            displacement_roughness: a.displacement_roughness,
            hybrid_weight: a.hybrid_weight,
            mountain_threshold: a.mountain_threshold,
            mountain_merge: a.mountain_merge,
            thermal_iterations: a.thermal_iterations,
            erosion_iterations: a.erosion_iterations.min(MAX_EROSION_ITERATIONS),
            erosion_intensity: a.erosion_intensity,
            smoothing_strength: a.smoothing_strength,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let out_dir = args.out.clone();
    let params = Params::from(args);

    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    info!(
        "Generating {}x{} {:?} heightmap with seed={}",
        params.size, params.size, params.algorithm, params.seed
    );

    let (map, timings) = terrain_synth::generate_with_timings(&params)?;

    for t in &timings {
        info!("  {:20} {:8.1} ms", t.name, t.ms);
    }
    if let Some((lo, hi)) = map.min_max() {
        info!("range [{lo:.3}, {hi:.3}], mean {:.3}", map.mean());
    }

    let path = out_dir.join("heightmap.png");
    let size = map.size() as u32;
    image::save_buffer(&path, &render::render_heightmap(&map), size, size, image::ColorType::L8)
        .with_context(|| format!("failed to save {}", path.display()))?;
    info!("Saved {}", path.display());

    Ok(())
}

use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use base64::Engine;
use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use terrain_synth::config::Params;
use terrain_synth::render;

/// Droplet count above which interactive runs get too slow.
const MAX_EROSION_ITERATIONS: u32 = 4000;
/// Largest grid side served; anything bigger exhausts memory in diamond-square.
const MAX_SIZE: u32 = 1025;

#[derive(Serialize)]
struct GenerateResponse {
    size: usize,
    min: f32,
    max: f32,
    heightmap: String,
    timings: Vec<TimingEntry>,
}

#[derive(Serialize)]
struct TimingEntry {
    name: String,
    ms: f64,
}

fn encode_png(gray: &[u8], size: usize) -> anyhow::Result<String> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(gray, size as u32, size as u32, image::ExtendedColorType::L8)?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(&buf);
    Ok(format!("data:image/png;base64,{}", b64))
}

fn run(mut params: Params) -> Result<GenerateResponse, (StatusCode, String)> {
    if params.size > MAX_SIZE {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("size {} exceeds the maximum of {MAX_SIZE}", params.size),
        ));
    }
    params.erosion_iterations = params.erosion_iterations.min(MAX_EROSION_ITERATIONS);
    let (map, timings) = terrain_synth::generate_with_timings(&params)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let size = map.size();
    let (min, max) = map.min_max().unwrap_or((0.0, 0.0));
    let heightmap = encode_png(&render::render_heightmap(&map), size)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let timings = timings
        .iter()
        .map(|t| TimingEntry {
            name: t.name.to_string(),
            ms: t.ms,
        })
        .collect();

    Ok(GenerateResponse {
        size,
        min,
        max,
        heightmap,
        timings,
    })
}

async fn generate_handler(
    Json(params): Json<Params>,
) -> Result<Json<GenerateResponse>, (StatusCode, String)> {
    info!(seed = params.seed, size = params.size, "generate request");
    match tokio::task::spawn_blocking(move || run(params)).await {
        Ok(result) => result.map(Json),
        Err(e) => {
            error!("generation task failed: {e}");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "generation task failed".into()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let app = Router::new()
        .route("/api/generate", post(generate_handler))
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("terrain-synth server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

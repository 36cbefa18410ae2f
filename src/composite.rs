use rayon::prelude::*;

use crate::grid::{window_mean, Grid};

/// Noise contribution is scaled down before blending so the displacement
/// layer keeps the tallest peaks.
pub const NOISE_GAIN: f32 = 0.85;
/// Pull applied to an isolated spike surrounded by much lower terrain.
const LONE_PEAK_PULL: f32 = 0.5;
const LONE_PEAK_AVG_RATIO: f32 = 0.65;
const LONE_PEAK_HEIGHT_RATIO: f32 = 0.85;
/// Window radius for the mountain-mass average (5x5).
const MASSIF_RADIUS: usize = 2;

/// Ridge reshaping: values near 0.5 become crests, extremes become valleys.
#[inline]
pub fn ridged(p: f32, power: f32) -> f32 {
    (1.0 - (2.0 * p - 1.0).abs()).max(0.0).powf(power)
}

/// Per-cell linear blend of a noise map and a displacement map, clamped to [0, 1].
/// `ridge_power = Some(p)` reshapes the noise sample with [`ridged`] first.
pub fn hybrid_blend(
    noise: &Grid<f32>,
    displacement: &Grid<f32>,
    weight: f32,
    ridge_power: Option<f32>,
) -> Grid<f32> {
    debug_assert_eq!(noise.data.len(), displacement.data.len());
    let mut out = Grid::new(noise.w, noise.h);
    out.data
        .par_iter_mut()
        .zip(noise.data.par_iter().zip(displacement.data.par_iter()))
        .for_each(|(o, (&p, &d))| {
            let p = match ridge_power {
                Some(power) => ridged(p, power),
                None => p,
            } * NOISE_GAIN;
            *o = (p * (1.0 - weight) + d * weight).clamp(0.0, 1.0);
        });
    out
}

/// Merge isolated spikes into massifs.
///
/// Cells above `threshold` are pulled toward their 5x5 average in proportion
/// to how far above the threshold they sit. A lone peak (cell above
/// `0.85*threshold` with a neighbourhood below `0.65*threshold`) is pulled
/// toward the average regardless.
pub fn shape_mountains(map: &Grid<f32>, threshold: f32, merge: f32) -> Grid<f32> {
    let n = map.w;
    let src = &map.data;
    let span = (1.0 - threshold).max(1e-6);
    let mut out = map.clone();

    out.data.par_chunks_mut(n).enumerate().for_each(|(y, row)| {
        for (x, cell) in row.iter_mut().enumerate() {
            let h = src[y * n + x];
            let avg = window_mean(src, n, x, y, MASSIF_RADIUS, true);
            let mut v = h;
            if h > threshold {
                let t = ((h - threshold) / span).clamp(0.0, 1.0);
                v += (avg - v) * merge * t;
            }
            if avg < LONE_PEAK_AVG_RATIO * threshold && h > LONE_PEAK_HEIGHT_RATIO * threshold {
                v += (avg - v) * LONE_PEAK_PULL;
            }
            *cell = v;
        }
    });
    out
}

/// Nudge every cell toward its 8-neighbour average by `strength`.
/// Returns the corrected grid and the number of cells that moved by more than 1e-4.
pub fn final_wave_correction(map: &Grid<f32>, strength: f32) -> (Grid<f32>, usize) {
    let n = map.w;
    let src = &map.data;
    let mut out = Grid::new(map.w, map.h);

    let fixes: usize = out
        .data
        .par_chunks_mut(n)
        .enumerate()
        .map(|(y, row)| {
            let mut fixes = 0usize;
            for (x, cell) in row.iter_mut().enumerate() {
                let center = src[y * n + x];
                let avg = window_mean(src, n, x, y, 1, false);
                let v = center + (avg - center) * strength;
                if (v - center).abs() > 1e-4 {
                    fixes += 1;
                }
                *cell = v;
            }
            fixes
        })
        .sum();

    (out, fixes)
}

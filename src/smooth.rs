//! Smoothing kernels and the final [0, 1] output contract.

use rayon::prelude::*;

use crate::grid::{min_max_strided, window_mean, Grid};

/// Fill value for grids with no usable range.
pub const FLAT_FILL: f32 = 0.5;
/// Exponent that pushes mid-tones down after rescaling.
pub const TONE_GAMMA: f32 = 1.25;
/// Start of the compressed peak band.
pub const PEAK_KNEE: f32 = 0.9;
/// Softness of the peak band: `t' = 1 - (1-t)^PEAK_EXPONENT`.
pub const PEAK_EXPONENT: f32 = 1.5;

/// 3x3 mean blended in by `intensity`: `new = old*(1-k) + avg*k`.
pub fn blend_smooth(map: &Grid<f32>, intensity: f32) -> Grid<f32> {
    let k = intensity.clamp(0.0, 1.0);
    let n = map.w;
    let src = &map.data;
    let mut out = Grid::new(map.w, map.h);
    out.data.par_chunks_mut(n).enumerate().for_each(|(y, row)| {
        for (x, cell) in row.iter_mut().enumerate() {
            let old = src[y * n + x];
            let avg = window_mean(src, n, x, y, 1, true);
            *cell = old * (1.0 - k) + avg * k;
        }
    });
    out
}

/// Discrete Laplacian relaxation toward the 8-neighbour mean.
pub fn laplacian_smooth(map: &Grid<f32>, iterations: u32, alpha: f32) -> Grid<f32> {
    let n = map.w;
    let mut cur = map.clone();
    let mut next = Grid::new(map.w, map.h);
    for _ in 0..iterations {
        let src = &cur.data;
        next.data.par_chunks_mut(n).enumerate().for_each(|(y, row)| {
            for (x, cell) in row.iter_mut().enumerate() {
                let old = src[y * n + x];
                let avg = window_mean(src, n, x, y, 1, false);
                *cell = old + alpha * (avg - old);
            }
        });
        std::mem::swap(&mut cur, &mut next);
    }
    cur
}

/// Rescale to [0, 1] using the full finite range, then sanitize.
/// A grid with no finite values or zero range becomes [`FLAT_FILL`] and
/// `false` is returned.
pub fn normalize(map: &mut Grid<f32>) -> bool {
    normalize_with_stride(map, 1)
}

/// Like [`normalize`] but scans at most about `max_samples` cells for the range.
/// Unsampled outliers end up clamped by the sanitize step.
pub fn normalize_sampled(map: &mut Grid<f32>, max_samples: usize) -> bool {
    let stride = (map.data.len() / max_samples.max(1)).max(1);
    normalize_with_stride(map, stride)
}

fn normalize_with_stride(map: &mut Grid<f32>, stride: usize) -> bool {
    let range = match min_max_strided(&map.data, stride) {
        Some((lo, hi)) if lo < hi => (lo, hi),
        _ => {
            map.data.fill(FLAT_FILL);
            return false;
        }
    };
    let (lo, hi) = range;
    let span = hi - lo;
    map.data.par_iter_mut().for_each(|v| *v = (*v - lo) / span);
    sanitize(map);
    true
}

/// Gamma plus soft compression of the top band. Fixes 0 and 1.
#[inline]
pub fn tone(h: f32) -> f32 {
    let g = h.max(0.0).powf(TONE_GAMMA);
    if g <= PEAK_KNEE {
        return g;
    }
    let band = 1.0 - PEAK_KNEE;
    let t = ((g - PEAK_KNEE) / band).min(1.0);
    PEAK_KNEE + (1.0 - (1.0 - t).powf(PEAK_EXPONENT)) * band
}

pub fn apply_tone_curve(map: &mut Grid<f32>) {
    map.data.par_iter_mut().for_each(|v| *v = tone(*v));
}

/// Replace non-finite samples with 0 and clamp into [0, 1].
pub fn sanitize(map: &mut Grid<f32>) {
    map.data.par_iter_mut().for_each(|v| {
        *v = if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
    });
}

/// Output contract: normalize, tone, sanitize.
/// A flat fill skips the tone curve so it stays exactly [`FLAT_FILL`].
pub fn finalize(map: &mut Grid<f32>) {
    if normalize(map) {
        apply_tone_curve(map);
    }
    sanitize(map);
}

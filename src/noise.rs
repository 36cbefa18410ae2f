use rayon::prelude::*;

use crate::grid::Grid;
use crate::rng::Rng;

/// Scale above which two fixed-frequency detail passes are layered on.
const DETAIL_SCALE_THRESHOLD: f32 = 40.0;
/// Scale at which the full height range is reached.
const FULL_AMPLITUDE_SCALE: f32 = 60.0;
/// Frequency multiplier of the independent layer in the multi-frequency variant.
const MULTI_FREQ_DETAIL_SCALE: f32 = 2.8;

#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(t: f32, a: f32, b: f32) -> f32 {
    a + t * (b - a)
}

/// Improved-Perlin gradient selection: 12 cube-edge directions padded to 16.
#[inline]
fn grad(hash: u8, x: f32, y: f32, z: f32) -> f32 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}

/// Seeded gradient noise over a shuffled 256-entry permutation table.
#[derive(Clone)]
pub struct NoiseGenerator {
    /// Duplicated to 512 entries so `perm[i + 1]` never needs wrapping.
    perm: [u8; 512],
}

impl NoiseGenerator {
    pub fn new(seed: u32) -> Self {
        let mut p = [0u8; 256];
        for (i, v) in p.iter_mut().enumerate() {
            *v = i as u8;
        }
        let mut rng = Rng::new(seed);
        for i in (1..256).rev() {
            let j = rng.index(i);
            p.swap(i, j);
        }
        let mut perm = [0u8; 512];
        for (i, v) in perm.iter_mut().enumerate() {
            *v = p[i & 255];
        }
        Self { perm }
    }

    /// Gradient noise in roughly [-1, 1].
    pub fn noise3(&self, x: f32, y: f32, z: f32) -> f32 {
        let fx = x.floor();
        let fy = y.floor();
        let fz = z.floor();
        let xi = (fx as i32 & 255) as usize;
        let yi = (fy as i32 & 255) as usize;
        let zi = (fz as i32 & 255) as usize;
        let x = x - fx;
        let y = y - fy;
        let z = z - fz;

        let u = fade(x);
        let v = fade(y);
        let w = fade(z);

        let p = &self.perm;
        let a = p[xi] as usize + yi;
        let aa = p[a] as usize + zi;
        let ab = p[a + 1] as usize + zi;
        let b = p[xi + 1] as usize + yi;
        let ba = p[b] as usize + zi;
        let bb = p[b + 1] as usize + zi;

        lerp(
            w,
            lerp(
                v,
                lerp(u, grad(p[aa], x, y, z), grad(p[ba], x - 1.0, y, z)),
                lerp(u, grad(p[ab], x, y - 1.0, z), grad(p[bb], x - 1.0, y - 1.0, z)),
            ),
            lerp(
                v,
                lerp(u, grad(p[aa + 1], x, y, z - 1.0), grad(p[ba + 1], x - 1.0, y, z - 1.0)),
                lerp(
                    u,
                    grad(p[ab + 1], x, y - 1.0, z - 1.0),
                    grad(p[bb + 1], x - 1.0, y - 1.0, z - 1.0),
                ),
            ),
        )
    }

    #[inline]
    pub fn noise(&self, x: f32, y: f32) -> f32 {
        self.noise3(x, y, 0.0)
    }

    /// Octave sum normalised by total amplitude. Each octave is shifted by a
    /// small seeded offset so octave lattices never line up.
    pub fn fractal_noise(
        &self,
        x: f32,
        y: f32,
        octaves: u32,
        persistence: f32,
        lacunarity: f32,
        jitter: f32,
    ) -> f32 {
        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut norm = 0.0;
        for i in 0..octaves {
            let fi = i as f32;
            let jx = self.noise(fi * 17.13, fi * 29.77) * jitter / frequency;
            let jy = self.noise(fi * 43.91, fi * 11.58) * jitter / frequency;
            value += self.noise(x * frequency + jx, y * frequency + jy) * amplitude;
            norm += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }
        if norm != 0.0 { value / norm } else { 0.0 }
    }

    /// Fractal noise sampled over the grid and remapped from [-1, 1] to [0, 1].
    /// The extra detail passes can overshoot that range slightly; later stages
    /// work in an unbounded range and normalization restores it.
    pub fn generate_heightmap(
        &self,
        width: usize,
        height: usize,
        scale: f32,
        octaves: u32,
        persistence: f32,
        lacunarity: f32,
    ) -> Grid<f32> {
        let mut out = Grid::new(width, height);
        let jitter = (0.8 / octaves.max(1) as f32).clamp(0.1, 0.5);
        let layered = octaves > 1 && scale > DETAIL_SCALE_THRESHOLD;
        // Small scales never reach the full height range.
        let taper = (scale / FULL_AMPLITUDE_SCALE).min(1.0);

        out.data.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
            let ny = (y as f32 / height as f32 - 0.5) * scale;
            for (x, cell) in row.iter_mut().enumerate() {
                let nx = (x as f32 / width as f32 - 0.5) * scale;
                let mut e = self.fractal_noise(nx, ny, octaves, persistence, lacunarity, jitter);
                if layered {
                    e += self.noise(nx * 4.2, ny * 4.2) * 0.08 + self.noise(nx * 1.7, ny * 1.7) * 0.12;
                }
                *cell = (e + 1.0) * 0.5 * taper;
            }
        });
        out
    }

    /// Base heightmap plus one independent high-frequency layer.
    pub fn generate_multi_frequency(
        &self,
        width: usize,
        height: usize,
        scale: f32,
        octaves: u32,
        persistence: f32,
        lacunarity: f32,
    ) -> Grid<f32> {
        let mut out = self.generate_heightmap(width, height, scale, octaves, persistence, lacunarity);
        add_detail_layer(self, &mut out, scale * MULTI_FREQ_DETAIL_SCALE);
        out
    }
}

/// Add a single-octave detail layer to any base heightmap.
pub fn add_detail_layer(generator: &NoiseGenerator, map: &mut Grid<f32>, detail_scale: f32) {
    let w = map.w;
    let h = map.h;
    map.data.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        let ny = (y as f32 / h as f32 - 0.5) * detail_scale;
        for (x, cell) in row.iter_mut().enumerate() {
            let nx = (x as f32 / w as f32 - 0.5) * detail_scale;
            let detail = generator.noise(nx, ny) * 0.15;
            *cell += detail * 0.15;
        }
    });
}

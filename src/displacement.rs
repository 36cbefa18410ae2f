//! Diamond-square midpoint displacement on `2^k+1` grids.
//!
//! The RNG is re-seeded at the start of every `generate` call, so output
//! depends only on the seed and arguments, never on earlier draws.

use crate::grid::Grid;
use crate::rng::Rng;

/// Tunables for the displacement pass and its two clean-up passes.
#[derive(Clone, Debug)]
pub struct DisplacementParams {
    /// Perturbation range of the first pass; shrinks by `2^(-roughness*decay)` per level.
    pub initial_range: f32,
    pub range_decay: f32,
    /// Neighbours closer than this count toward a repeated pattern.
    pub pattern_tolerance: f32,
    pub pattern_min_matches: u32,
    pub pattern_boost: f32,
    pub post_smoothing: f32,
    pub wave_intensity: f32,
    /// Laplacian magnitude that marks a cell as part of a wave artefact.
    pub wave_threshold: f32,
}

impl Default for DisplacementParams {
    fn default() -> Self {
        Self {
            initial_range: 0.7,
            range_decay: 1.3,
            pattern_tolerance: 0.05,
            pattern_min_matches: 3,
            pattern_boost: 1.5,
            post_smoothing: 0.3,
            wave_intensity: 0.2,
            wave_threshold: 0.08,
        }
    }
}

const SMOOTH_KERNEL: [f32; 9] = [0.03, 0.07, 0.03, 0.07, 0.6, 0.07, 0.03, 0.07, 0.03];

/// Smallest `2^k + 1 >= size`, with `k >= 1`.
pub fn rounded_size(size: usize) -> usize {
    if size <= 3 {
        return 3;
    }
    (size - 1).next_power_of_two() + 1
}

pub struct DiamondSquare {
    seed: u32,
    rng: Rng,
    pub params: DisplacementParams,
}

impl DiamondSquare {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            rng: Rng::new(seed),
            params: DisplacementParams::default(),
        }
    }

    pub fn set_seed(&mut self, seed: u32) {
        self.seed = seed;
        self.rng.reseed(seed);
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Full `2^k+1` grid. Every written value lies in [0, 1].
    pub fn generate(&mut self, size: usize, roughness: f32, initial_height: f32) -> Grid<f32> {
        self.rng.reseed(self.seed);

        let n = rounded_size(size);
        let mut map = Grid::square(n);

        self.init_corners(&mut map, initial_height);
        self.displace(&mut map, roughness);
        self.post_smooth(&mut map);
        self.wave_correction(&mut map);
        map
    }

    /// `generate` cropped back to exactly `size x size`.
    pub fn generate_sized(&mut self, size: usize, roughness: f32, initial_height: f32) -> Grid<f32> {
        let full = self.generate(size, roughness, initial_height);
        if full.size() == size { full } else { full.crop(size) }
    }

    /// Blend with an external noise map. Detail influence peaks at mid-elevation
    /// and fades toward the extremes.
    pub fn generate_hybrid(&mut self, noise: &Grid<f32>, weight: f32, roughness: f32) -> Grid<f32> {
        let size = noise.size();
        let mut base = self.generate_sized(size, roughness * 0.6, 0.2);
        for (b, &detail) in base.data.iter_mut().zip(&noise.data) {
            let influence = weight * (1.0 - (*b - 0.5).abs() * 1.5);
            *b = (*b + (detail - 0.5) * influence).clamp(0.0, 1.0);
        }
        base
    }

    fn init_corners(&mut self, map: &mut Grid<f32>, initial_height: f32) {
        let n = map.size();
        for (x, y) in [(0, 0), (n - 1, 0), (0, n - 1), (n - 1, n - 1)] {
            let v = (self.rng.next_f32() * 0.6 + 0.2) * initial_height;
            map.set(x, y, v);
        }
    }

    fn displace(&mut self, map: &mut Grid<f32>, roughness: f32) {
        let n = map.size();
        let mut step = n - 1;
        let mut range = self.params.initial_range;
        while step > 1 {
            let half = step / 2;
            self.diamond_step(map, step, half, range);
            self.square_step(map, step, half, range);
            range *= 2f32.powf(-roughness * self.params.range_decay);
            step = half;
        }
    }

    fn diamond_step(&mut self, map: &mut Grid<f32>, step: usize, half: usize, range: f32) {
        let n = map.size();
        for y in (half..n).step_by(step) {
            for x in (half..n).step_by(step) {
                let avg = (map.get(x - half, y - half)
                    + map.get(x + half, y - half)
                    + map.get(x - half, y + half)
                    + map.get(x + half, y + half))
                    / 4.0;
                let irregularity = 0.6 + self.rng.next_f32() * 0.8;
                let boost = if self.detect_pattern(map, x, y, half) {
                    self.params.pattern_boost
                } else {
                    1.0
                };
                let offset = (self.rng.next_f32() - 0.5) * range * edge_factor(x, y, n) * irregularity * boost;
                map.set(x, y, (avg + offset).clamp(0.0, 1.0));
            }
        }
    }

    fn square_step(&mut self, map: &mut Grid<f32>, step: usize, half: usize, range: f32) {
        let n = map.size();
        for y in (0..n).step_by(half) {
            // Rows through diamond centres start at x = 0, edge rows at x = half.
            let start = if (y + half) % step == 0 { 0 } else { half };
            for x in (start..n).step_by(step) {
                let mut sum = 0.0;
                let mut count = 0u32;
                if y >= half {
                    sum += map.get(x, y - half);
                    count += 1;
                }
                if x + half < n {
                    sum += map.get(x + half, y);
                    count += 1;
                }
                if y + half < n {
                    sum += map.get(x, y + half);
                    count += 1;
                }
                if x >= half {
                    sum += map.get(x - half, y);
                    count += 1;
                }
                let avg = if count > 0 { sum / count as f32 } else { 0.0 };
                let irregularity = 0.7 + self.rng.next_f32() * 0.6;
                let offset = (self.rng.next_f32() - 0.5) * range * edge_factor(x, y, n) * irregularity;
                map.set(x, y, (avg + offset).clamp(0.0, 1.0));
            }
        }
    }

    /// True when enough of the 8 samples at `radius` nearly equal the centre.
    fn detect_pattern(&self, map: &Grid<f32>, x: usize, y: usize, radius: usize) -> bool {
        let n = map.size();
        if x < radius || x + radius >= n || y < radius || y + radius >= n {
            return false;
        }
        let center = map.get(x, y);
        let mut matches = 0;
        for ny in [y - radius, y, y + radius] {
            for nx in [x - radius, x, x + radius] {
                if nx == x && ny == y {
                    continue;
                }
                if (center - map.get(nx, ny)).abs() < self.params.pattern_tolerance {
                    matches += 1;
                }
            }
        }
        matches >= self.params.pattern_min_matches
    }

    fn post_smooth(&self, map: &mut Grid<f32>) {
        let k = self.params.post_smoothing;
        if k <= 0.0 {
            return;
        }
        let n = map.size();
        let src = map.data.clone();
        for y in 1..n.saturating_sub(1) {
            for x in 1..n - 1 {
                let mut sum = 0.0;
                for (ki, (dx, dy)) in KERNEL_OFFSETS.iter().enumerate() {
                    let nx = (x as i32 + dx) as usize;
                    let ny = (y as i32 + dy) as usize;
                    sum += src[ny * n + nx] * SMOOTH_KERNEL[ki];
                }
                let i = y * n + x;
                map.data[i] = map.data[i] * (1.0 - k) + sum * k;
            }
        }
    }

    /// Break up ripples: cells with a large 4-neighbour Laplacian get a random nudge.
    fn wave_correction(&mut self, map: &mut Grid<f32>) {
        let intensity = self.params.wave_intensity;
        if intensity <= 0.0 {
            return;
        }
        let n = map.size();
        let src = map.data.clone();
        for y in 2..n.saturating_sub(2) {
            for x in 2..n - 2 {
                let i = y * n + x;
                let lap = src[i - n] + src[i + n] + src[i - 1] + src[i + 1] - 4.0 * src[i];
                if lap.abs() > self.params.wave_threshold {
                    let nudge = (self.rng.next_f32() - 0.5) * intensity * lap.abs();
                    map.data[i] = (map.data[i] + nudge).clamp(0.0, 1.0);
                }
            }
        }
    }
}

const KERNEL_OFFSETS: [(i32, i32); 9] = [
    (-1, -1), (0, -1), (1, -1),
    (-1, 0),  (0, 0),  (1, 0),
    (-1, 1),  (0, 1),  (1, 1),
];

/// Dampens perturbation near the border.
#[inline]
fn edge_factor(x: usize, y: usize, n: usize) -> f32 {
    let nf = n as f32;
    let edge = (x as f32 / nf)
        .min(y as f32 / nf)
        .min((n - 1 - x) as f32 / nf)
        .min((n - 1 - y) as f32 / nf);
    (edge.powf(0.7) * 1.5 + 0.2).min(1.0)
}

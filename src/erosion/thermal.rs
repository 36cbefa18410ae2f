//! Talus-driven material creep between 4-neighbours.
//!
//! Each iteration reads one snapshot and writes a fresh buffer. A cell's new
//! height is its snapshot height minus its own outflow plus the shares its
//! neighbours send toward it, so rows can be assembled in parallel and no
//! write is ever observed within the same pass.

use rayon::prelude::*;

use crate::grid::Grid;

/// W, E, N, S. Index `k ^ 1` is the opposite direction.
const DIRS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

#[derive(Clone, Debug)]
pub struct ThermalParams {
    /// Base talus threshold; shrinks by up to half on high ground.
    pub talus: f32,
    /// Fraction of the largest excess moved per pass.
    pub strength: f32,
    /// Below this height nothing erodes.
    pub min_height: f32,
    /// At and above this height erosion runs at full rate.
    pub max_height: f32,
}

impl Default for ThermalParams {
    fn default() -> Self {
        Self {
            talus: 0.005,
            strength: 0.25,
            min_height: 0.35,
            max_height: 0.85,
        }
    }
}

/// Material leaving one cell: total amount and per-direction shares.
#[derive(Clone, Copy, Default)]
struct Outflow {
    amount: f32,
    share: [f32; 4],
}

#[derive(Clone, Debug, Default)]
pub struct ThermalErosion {
    pub params: ThermalParams,
}

impl ThermalErosion {
    pub fn new(params: ThermalParams) -> Self {
        Self { params }
    }

    /// Run `iterations` passes. Zero iterations returns an identical copy.
    pub fn apply(&self, map: &Grid<f32>, iterations: u32) -> Grid<f32> {
        let mut current = map.clone();
        if iterations == 0 || map.w < 3 || map.h < 3 {
            return current;
        }
        let mut next = map.clone();
        let mut flows = vec![Outflow::default(); map.data.len()];
        for _ in 0..iterations {
            self.pass(&current, &mut next, &mut flows);
            std::mem::swap(&mut current, &mut next);
        }
        current
    }

    fn pass(&self, src: &Grid<f32>, dst: &mut Grid<f32>, flows: &mut [Outflow]) {
        let w = src.w;
        let h = src.h;

        flows.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
            for (x, f) in row.iter_mut().enumerate() {
                *f = if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
                    Outflow::default()
                } else {
                    self.outflow(src, x, y)
                };
            }
        });

        let flows = &*flows;
        dst.data.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
            for (x, cell) in row.iter_mut().enumerate() {
                let i = y * w + x;
                let mut v = src.data[i] - flows[i].amount;
                for (k, (dx, dy)) in DIRS.iter().enumerate() {
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    if nx < 0 || ny < 0 || nx as usize >= w || ny as usize >= h {
                        continue;
                    }
                    v += flows[ny as usize * w + nx as usize].share[k ^ 1];
                }
                *cell = v;
            }
        });
    }

    fn outflow(&self, src: &Grid<f32>, x: usize, y: usize) -> Outflow {
        let p = &self.params;
        let hgt = src.get(x, y);
        let factor = ((hgt - p.min_height) / (p.max_height - p.min_height)).clamp(0.0, 1.0);
        if factor <= 0.0 {
            return Outflow::default();
        }
        let talus = p.talus * (1.0 - 0.5 * factor);

        let mut excess = [0.0f32; 4];
        let mut total = 0.0;
        let mut largest = 0.0f32;
        for (k, (dx, dy)) in DIRS.iter().enumerate() {
            let nx = (x as i32 + dx) as usize;
            let ny = (y as i32 + dy) as usize;
            let diff = hgt - src.get(nx, ny);
            if diff > talus {
                excess[k] = diff - talus;
                total += excess[k];
                largest = largest.max(excess[k]);
            }
        }
        if total <= 0.0 {
            return Outflow::default();
        }

        let amount = p.strength * factor * largest;
        let mut out = Outflow { amount, share: [0.0; 4] };
        for k in 0..4 {
            out.share[k] = amount * excess[k] / total;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cone(n: usize) -> Grid<f32> {
        let mut g = Grid::square(n);
        let c = (n / 2) as f32;
        for y in 0..n {
            for x in 0..n {
                let d = ((x as f32 - c).powi(2) + (y as f32 - c).powi(2)).sqrt();
                g.set(x, y, (1.0 - d / c).max(0.0));
            }
        }
        g
    }

    #[test]
    fn zero_iterations_is_noop() {
        let map = cone(17);
        assert_eq!(ThermalErosion::default().apply(&map, 0), map);
    }

    #[test]
    fn flat_grid_stays_flat() {
        let map = Grid::filled(16, 0.5f32);
        for iters in [1, 5, 20] {
            assert_eq!(ThermalErosion::default().apply(&map, iters), map);
        }
    }

    #[test]
    fn mass_is_conserved() {
        let map = cone(33);
        let out = ThermalErosion::default().apply(&map, 10);
        assert_ne!(out, map);
        let drift = (out.total() - map.total()).abs();
        assert!(drift < 1e-3, "drift {drift}");
    }

    #[test]
    fn peak_is_lowered() {
        let map = cone(33);
        let out = ThermalErosion::default().apply(&map, 10);
        assert!(out.get(16, 16) < map.get(16, 16));
    }

    #[test]
    fn low_terrain_does_not_erode() {
        let mut map = Grid::filled(9, 0.1f32);
        map.set(4, 4, 0.3);
        assert_eq!(ThermalErosion::default().apply(&map, 5), map);
    }

    #[test]
    fn lowered_min_height_erodes_low_terrain() {
        let mut map = Grid::filled(9, 0.1f32);
        map.set(4, 4, 0.3);
        let thermal = ThermalErosion::new(ThermalParams {
            min_height: 0.0,
            ..ThermalParams::default()
        });
        let out = thermal.apply(&map, 5);
        assert!(out.get(4, 4) < 0.3);
        assert!((out.total() - map.total()).abs() < 1e-4);
    }

    #[test]
    fn single_step_splits_by_excess() {
        let mut map = Grid::filled(5, 0.4f32);
        map.set(2, 2, 0.9);
        map.set(1, 2, 0.45);
        let out = ThermalErosion::default().apply(&map, 1);
        let gain_w = out.get(1, 2) - map.get(1, 2);
        let gain_e = out.get(3, 2) - map.get(3, 2);
        assert!(gain_e > gain_w && gain_w > 0.0);
    }
}

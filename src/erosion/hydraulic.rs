//! Particle-based hydraulic erosion.
//!
//! Droplets run one after another against a single shared grid, so later
//! droplets see earlier droplets' changes. The order is fixed by the seeded
//! RNG, which makes the result reproducible. Each droplet picks up sediment
//! going downhill and drops it going uphill or when over capacity.

use crate::erosion::ErosionStats;
use crate::grid::Grid;
use crate::rng::Rng;

/// Droplet physics tunables.
#[derive(Clone, Debug)]
pub struct HydraulicParams {
    pub sediment_capacity_factor: f32,
    /// Capacity floor so slow droplets on gentle slopes still carry something.
    pub min_sediment_capacity: f32,
    pub evaporate_speed: f32,
    pub gravity: f32,
    pub max_droplet_lifetime: u32,
    pub erosion_speed: f32,
    pub deposition_speed: f32,
    /// Hard ceiling on material removed by one step, before `intensity` scaling.
    pub max_erosion_per_step: f32,
    /// Share of the previous direction kept on each step.
    pub inertia: f32,
    pub min_speed: f32,
    pub min_step: f32,
    pub max_step: f32,
    /// Offset used for the central-difference gradient.
    pub gradient_epsilon: f32,
    pub min_water: f32,
    /// Every write is clamped into this range.
    pub height_floor: f32,
    pub height_ceiling: f32,
}

impl Default for HydraulicParams {
    fn default() -> Self {
        Self {
            sediment_capacity_factor: 4.0,
            min_sediment_capacity: 0.01,
            evaporate_speed: 0.02,
            gravity: 4.0,
            max_droplet_lifetime: 30,
            erosion_speed: 0.3,
            deposition_speed: 0.3,
            max_erosion_per_step: 0.05,
            inertia: 0.3,
            min_speed: 0.01,
            min_step: 0.25,
            max_step: 1.5,
            gradient_epsilon: 0.5,
            min_water: 1e-4,
            height_floor: -1.0,
            height_ceiling: 2.0,
        }
    }
}

/// Why a droplet stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    OutOfBounds,
    LifetimeExceeded,
    WaterDepleted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropletState {
    Alive,
    Terminated(Termination),
}

/// One water particle. Lives for a single descent.
#[derive(Clone, Debug)]
struct Droplet {
    x: f32,
    y: f32,
    dir_x: f32,
    dir_y: f32,
    speed: f32,
    water: f32,
    sediment: f32,
    age: u32,
}

impl Droplet {
    fn spawn(rng: &mut Rng, w: usize, h: usize) -> Self {
        Self {
            x: rng.next_f32() * (w - 2) as f32 + 1.0,
            y: rng.next_f32() * (h - 2) as f32 + 1.0,
            dir_x: 0.0,
            dir_y: 0.0,
            speed: 1.0,
            water: 1.0,
            sediment: 0.0,
            age: 0,
        }
    }

    /// Advance one step. Reads and writes `map` directly; allocation-free.
    fn step(
        &mut self,
        map: &mut Grid<f32>,
        p: &HydraulicParams,
        intensity: f32,
        rng: &mut Rng,
        stats: &mut ErosionStats,
    ) -> DropletState {
        let w = map.w as f32;
        let h = map.h as f32;
        if self.x < 1.0 || self.x >= w - 1.0 || self.y < 1.0 || self.y >= h - 1.0 {
            return DropletState::Terminated(Termination::OutOfBounds);
        }

        let cur_height = map.sample_bilinear(self.x, self.y);
        let (gx, gy) = gradient(map, self.x, self.y, p.gradient_epsilon);
        let slope = (gx * gx + gy * gy).sqrt();

        self.dir_x = self.dir_x * p.inertia - gx * (1.0 - p.inertia);
        self.dir_y = self.dir_y * p.inertia - gy * (1.0 - p.inertia);
        let len = (self.dir_x * self.dir_x + self.dir_y * self.dir_y).sqrt();
        if len > 1e-6 {
            self.dir_x /= len;
            self.dir_y /= len;
        } else {
            // Flat spot: drift a tiny random amount.
            let angle = rng.next_f32() * std::f32::consts::TAU;
            self.dir_x = angle.cos() * 1e-3;
            self.dir_y = angle.sin() * 1e-3;
        }

        let stride = self.speed.clamp(p.min_step, p.max_step);
        let new_x = self.x + self.dir_x * stride;
        let new_y = self.y + self.dir_y * stride;
        if new_x < 0.0 || new_x >= w || new_y < 0.0 || new_y >= h {
            return DropletState::Terminated(Termination::OutOfBounds);
        }

        let new_height = map.sample_bilinear(new_x, new_y);
        let diff = new_height - cur_height;
        let capacity = (p.sediment_capacity_factor * self.speed * slope).max(p.min_sediment_capacity);

        if diff < 0.0 {
            let amount = ((capacity - self.sediment) * p.erosion_speed)
                .min(-diff * p.erosion_speed * 2.0)
                .max(0.0)
                .min(p.max_erosion_per_step * intensity);
            if amount > 1e-8 {
                scatter(map, self.x, self.y, -amount, p);
                self.sediment += amount;
                stats.total_eroded += amount as f64;
                stats.max_step_erosion = stats.max_step_erosion.max(amount);
            }
        } else {
            let amount = self.sediment.min(diff * p.deposition_speed);
            if amount > 1e-8 {
                scatter(map, self.x, self.y, amount, p);
                self.sediment -= amount;
                stats.total_deposited += amount as f64;
            }
        }

        self.speed = (self.speed + diff * p.gravity).max(p.min_speed);
        self.water *= 1.0 - p.evaporate_speed * intensity;

        if self.sediment > capacity {
            let excess = (self.sediment - capacity) * p.deposition_speed;
            scatter(map, self.x, self.y, excess, p);
            self.sediment -= excess;
            stats.total_deposited += excess as f64;
        }

        self.x = new_x;
        self.y = new_y;
        self.age += 1;
        stats.steps += 1;

        if self.water < p.min_water {
            DropletState::Terminated(Termination::WaterDepleted)
        } else if self.age >= p.max_droplet_lifetime {
            DropletState::Terminated(Termination::LifetimeExceeded)
        } else {
            DropletState::Alive
        }
    }
}

/// Central-difference gradient over bilinear samples.
#[inline]
fn gradient(map: &Grid<f32>, x: f32, y: f32, eps: f32) -> (f32, f32) {
    let hl = map.sample_bilinear(x - eps, y);
    let hr = map.sample_bilinear(x + eps, y);
    let hd = map.sample_bilinear(x, y - eps);
    let hu = map.sample_bilinear(x, y + eps);
    ((hr - hl) / (2.0 * eps), (hu - hd) / (2.0 * eps))
}

/// Spread `delta` over the four cells around `(x, y)` with bilinear weights.
#[inline]
fn scatter(map: &mut Grid<f32>, x: f32, y: f32, delta: f32, p: &HydraulicParams) {
    let x0 = x.floor();
    let y0 = y.floor();
    let sx = x - x0;
    let sy = y - y0;
    let x0 = x0 as usize;
    let y0 = y0 as usize;
    let weights = [
        (0, 0, (1.0 - sx) * (1.0 - sy)),
        (1, 0, sx * (1.0 - sy)),
        (0, 1, (1.0 - sx) * sy),
        (1, 1, sx * sy),
    ];
    for (dx, dy, wgt) in weights {
        let cx = x0 + dx;
        let cy = y0 + dy;
        if cx >= map.w || cy >= map.h {
            continue;
        }
        let i = cy * map.w + cx;
        map.data[i] = (map.data[i] + delta * wgt).clamp(p.height_floor, p.height_ceiling);
    }
}

/// Serial droplet simulator. One RNG stream drives spawn points and flat-spot jitter.
pub struct HydraulicErosion {
    pub params: HydraulicParams,
    rng: Rng,
}

impl HydraulicErosion {
    pub fn new(seed: u32) -> Self {
        Self {
            params: HydraulicParams::default(),
            rng: Rng::new(seed),
        }
    }

    pub fn with_params(seed: u32, params: HydraulicParams) -> Self {
        Self {
            params,
            rng: Rng::new(seed),
        }
    }

    /// Run `iterations` droplets in order against `map`.
    pub fn apply(&mut self, map: &mut Grid<f32>, iterations: u32, intensity: f32) -> ErosionStats {
        let mut stats = ErosionStats::default();
        // Spawning needs an interior.
        if iterations == 0 || map.w < 3 || map.h < 3 {
            return stats;
        }

        for _ in 0..iterations {
            let mut droplet = Droplet::spawn(&mut self.rng, map.w, map.h);
            stats.droplets += 1;
            loop {
                match droplet.step(map, &self.params, intensity, &mut self.rng, &mut stats) {
                    DropletState::Alive => continue,
                    DropletState::Terminated(reason) => {
                        stats.record(reason);
                        break;
                    }
                }
            }
        }
        stats
    }
}

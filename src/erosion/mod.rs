pub mod hydraulic;
pub mod thermal;

use hydraulic::Termination;

/// Counters from one hydraulic erosion run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ErosionStats {
    pub droplets: u64,
    pub steps: u64,
    pub total_eroded: f64,
    pub total_deposited: f64,
    /// Largest amount removed by any single step.
    pub max_step_erosion: f32,
    pub out_of_bounds: u64,
    pub lifetime_exceeded: u64,
    pub water_depleted: u64,
}

impl ErosionStats {
    pub(crate) fn record(&mut self, reason: Termination) {
        match reason {
            Termination::OutOfBounds => self.out_of_bounds += 1,
            Termination::LifetimeExceeded => self.lifetime_exceeded += 1,
            Termination::WaterDepleted => self.water_depleted += 1,
        }
    }
}

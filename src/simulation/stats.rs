//! Running statistics and the event feed handed to outside observers

use super::types::CarId;

/// Notifications emitted during the update pass, in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    CarArrived(CarId),
    CarBraked(CarId),
}

/// Counters kept across the whole run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CityStats {
    pub ticks: u64,
    pub total_cars_spawned: u32,
    pub total_cars_arrived: u32,
    pub total_brakes: u32,
    /// Spawn passes that wanted cars but found no free entry point
    pub spawn_deferrals: u32,
    /// Spawn attempts dropped because the destination was unreachable
    pub route_failures: u32,
    pub elapsed_time: f32,
}

impl CityStats {
    /// Share of spawned cars that reached their destination, in percent
    pub fn arrival_rate(&self) -> f32 {
        if self.total_cars_spawned > 0 {
            (self.total_cars_arrived as f32 / self.total_cars_spawned as f32) * 100.0
        } else {
            0.0
        }
    }
}

//! Construction parameters for a city

use anyhow::Result;

use super::error::SimError;

/// Parameters a [`SimCity`](super::SimCity) is built from
#[derive(Debug, Clone, PartialEq)]
pub struct CityConfig {
    /// Target car population kept on the roads
    pub cars_total: usize,
    /// Number of roads to generate, alternating rows and columns
    pub roads_total: usize,
    /// Lanes per direction on every road
    pub road_lanes: usize,
    /// Tiles per side of the square grid
    pub grid_size: usize,
    /// Edge length of a tile in world units
    pub tile_size: f32,
    /// Seed for spawn and destination choices; `None` draws from the thread RNG
    pub seed: Option<u64>,
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            cars_total: 20,
            roads_total: 6,
            road_lanes: 2,
            grid_size: 40,
            tile_size: 10.0,
            seed: None,
        }
    }
}

impl CityConfig {
    pub fn new(cars_total: usize, roads_total: usize, road_lanes: usize) -> Self {
        Self {
            cars_total,
            roads_total,
            road_lanes,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of subdivisions along the axis with the most roads
    pub fn roads_per_axis(&self) -> usize {
        self.roads_total.div_ceil(2)
    }

    /// Reject parameters that would produce an empty or degenerate network
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| -> Result<()> { Err(SimError::InvalidConfig(reason).into()) };

        if self.roads_total == 0 {
            return invalid("at least one road is required".to_string());
        }
        if self.road_lanes == 0 {
            return invalid("roads need at least one lane per direction".to_string());
        }
        if self.grid_size < 2 {
            return invalid(format!("grid size {} is below 2 tiles", self.grid_size));
        }
        if self.tile_size.is_nan() || self.tile_size <= 0.0 {
            return invalid(format!("tile size {} must be positive", self.tile_size));
        }
        // Every road needs its own tile line, with a free line on both borders
        if self.roads_per_axis() + 1 >= self.grid_size {
            return invalid(format!(
                "{} roads do not fit on a {}x{} grid",
                self.roads_total, self.grid_size, self.grid_size
            ));
        }

        Ok(())
    }
}

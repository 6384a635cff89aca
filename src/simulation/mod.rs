//! Standalone city traffic simulation
//!
//! Builds a grid of multi-lane roads, links them at junctions, and drives
//! sensor-equipped cars along shortest routes while a signal controller
//! cycles conflict-free green phases. Nothing here depends on a renderer;
//! a front end reads [`CitySnapshot`] and [`SimEvent`] values.

mod car;
mod car_manager;
mod config;
mod error;
mod grid;
mod junction;
mod navigator;
mod obstacle;
mod road;
mod road_network;
mod sensor;
mod signal;
mod stats;
mod types;
mod world;

// Re-export public types for external use
// These may not be used within this crate but are part of the public API
#[allow(unused_imports)]
pub use car::{CarState, CarUpdateResult, Perception, SimCar};
#[allow(unused_imports)]
pub use car_manager::{
    collidable_list, free_entry_points, recovery_blocked, spawn_car, SPAWN_CLEARANCE,
};
pub use config::CityConfig;
pub use error::SimError;
#[allow(unused_imports)]
pub use grid::{Grid, Tile};
#[allow(unused_imports)]
pub use junction::SimJunction;
#[allow(unused_imports)]
pub use navigator::{Navigator, RoutePoint};
#[allow(unused_imports)]
pub use obstacle::{Hitbox, Obstacle, ObstacleKind};
#[allow(unused_imports)]
pub use road::{lane_offset, LanePoint, NextNode, RoadNode, SimLane, SimRoad, SimWay, Waypoint};
#[allow(unused_imports)]
pub use road_network::SimRoadNetwork;
#[allow(unused_imports)]
pub use sensor::{CarSensor, SensorHit};
#[allow(unused_imports)]
pub use signal::{
    PhaseCycle, PhaseStage, SignalController, SignalState, TrafficSignal, ALL_RED_SECS,
    GREEN_SECS, YELLOW_SECS,
};
pub use stats::{CityStats, SimEvent};
#[allow(unused_imports)]
pub use types::{
    segment_intersection, CarId, JunctionId, LaneId, Position, RoadId, SignalId, WayDirection,
    BRAKE_RECOVERY_SECS, CAR_HITBOX_RADIUS, CAR_LENGTH, CRUISE_SPEED, DANGER_ZONE_RADIUS,
    HARD_STOP_DISTANCE, JUNCTION_CLEARANCE, LANE_WIDTH, POSITION_EPSILON, RECOVERY_CLEARANCE,
    SIGNAL_COMMIT_DISTANCE, STOP_GAP, STOP_LINE_MARGIN, TRANSFER_PENALTY,
};
#[allow(unused_imports)]
pub use world::{CarPose, CitySnapshot, LaneView, SignalView, SimCity};

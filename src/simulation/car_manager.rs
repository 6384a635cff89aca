//! Car spawning and obstacle bookkeeping for the traffic simulation
//!
//! Free functions over the city's collections, kept apart from the tick
//! loop in the world module.

use std::collections::BTreeMap;

use anyhow::{Context, Result};

use super::car::SimCar;
use super::navigator::Navigator;
use super::obstacle::Obstacle;
use super::road::LanePoint;
use super::road_network::SimRoadNetwork;
use super::signal::{SignalController, SignalState};
use super::types::{CarId, CAR_LENGTH, DANGER_ZONE_RADIUS};

/// Minimum distance between a lane's entry point and the nearest car on
/// that lane before another car may spawn there
pub const SPAWN_CLEARANCE: f32 = CAR_LENGTH * 2.0;

/// Route from `start` to `end` and build a car for it
pub fn spawn_car(
    car_id: CarId,
    start: LanePoint,
    end: LanePoint,
    navigator: &mut Navigator,
) -> Result<SimCar> {
    let route = navigator.find_best_route(start, end)?;
    SimCar::new(car_id, route)
}

/// Lane entry points with no car of the same lane closer than
/// [`SPAWN_CLEARANCE`]
pub fn free_entry_points(
    network: &SimRoadNetwork,
    cars: &BTreeMap<CarId, SimCar>,
) -> Result<Vec<LanePoint>> {
    let mut free = Vec::new();

    for point in network.init_points() {
        let position = network
            .point_position(point)
            .context("Entry point without a position")?;

        let occupied = cars.values().any(|car| {
            car.current_lane() == point.lane && car.position.distance(&position) <= SPAWN_CLEARANCE
        });
        if !occupied {
            free.push(point);
        }
    }

    Ok(free)
}

/// Obstacles `car` has to consider this tick: other cars that are not
/// broken and active signals inside the danger zone. Green signals of
/// other lanes and signals of the lane being transferred into are left
/// out so they never make the car yield.
pub fn collidable_list(
    car: &SimCar,
    cars: &BTreeMap<CarId, SimCar>,
    signals: &SignalController,
) -> Vec<Obstacle> {
    let mut obstacles: Vec<Obstacle> = cars
        .values()
        .filter(|other| other.id != car.id && !other.broken)
        .filter(|other| car.position.distance(&other.position) < DANGER_ZONE_RADIUS)
        .map(SimCar::as_obstacle)
        .collect();

    let lane = car.current_lane();
    let transferring_to = car.transferring_to();
    obstacles.extend(
        signals
            .signals()
            .iter()
            .filter(|signal| signal.is_active())
            .filter(|signal| !(signal.state() == SignalState::Green && !signal.governs(lane)))
            .filter(|signal| transferring_to.map_or(true, |to| !signal.governs(to)))
            .filter(|signal| car.position.distance(&signal.position()) < DANGER_ZONE_RADIUS)
            .map(|signal| Obstacle::signal(signal.id, signal.stop_line)),
    );

    obstacles
}

/// Whether broken `car` has to keep standing once its brake timer runs
/// out: some other car, broken or not, is still in front of it. Two broken
/// cars in front of each other go by id, lower first.
pub fn recovery_blocked(car: &SimCar, cars: &BTreeMap<CarId, SimCar>) -> bool {
    cars.values()
        .filter(|other| other.id != car.id && car.has_in_front(other))
        .any(|other| !(other.broken && other.has_in_front(car) && car.id < other.id))
}

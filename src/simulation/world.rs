//! Main simulation world that ties everything together
//!
//! [`SimCity`] owns the road network, the navigator, the signal controller
//! and every car. One [`SimCity::tick`] runs, in this order: the signal
//! timer, a collision pass over all cars, an update pass over all cars,
//! removal of arrived cars, and spawn replenishment. Cars are visited in
//! insertion order in both passes, and no car moves until every car has
//! sensed, so all cars see the same pre-tick positions.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use super::car::{CarState, CarUpdateResult, SimCar};
use super::car_manager::{collidable_list, free_entry_points, recovery_blocked, spawn_car};
use super::config::CityConfig;
use super::error::SimError;
use super::navigator::{Navigator, RoutePoint};
use super::road::{LanePoint, SimLane};
use super::road_network::SimRoadNetwork;
use super::signal::{SignalController, SignalState};
use super::stats::{CityStats, SimEvent};
use super::types::{CarId, LaneId, Position, RoadId, SignalId, WayDirection};

/// Pose of a car for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarPose {
    pub id: CarId,
    pub position: Position,
    pub angle: f32,
    pub state: CarState,
}

/// Signal display data for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalView {
    pub id: SignalId,
    pub position: Position,
    pub state: SignalState,
    pub active: bool,
}

/// Centerline of one lane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneView {
    pub id: LaneId,
    pub start: Position,
    pub end: Position,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct CitySnapshot {
    pub time: f32,
    pub cars: Vec<CarPose>,
    pub signals: Vec<SignalView>,
    pub lanes: Vec<LaneView>,
}

/// The main simulation world
pub struct SimCity {
    pub config: CityConfig,

    network: SimRoadNetwork,

    navigator: Navigator,

    signals: SignalController,

    /// All cars, keyed by insertion order
    cars: BTreeMap<CarId, SimCar>,

    /// Next car ID to assign
    next_car_id: usize,

    /// Optional seeded RNG for reproducible simulations
    rng: Option<StdRng>,

    /// Events waiting to be drained by an observer
    events: Vec<SimEvent>,

    pub stats: CityStats,

    /// Simulation time
    pub time: f32,
}

impl SimCity {
    /// Build the network described by `config`, install the signal
    /// controller and spawn the first cars
    pub fn new(config: CityConfig) -> Result<Self> {
        let network = SimRoadNetwork::generate(&config)?;
        Ok(Self::with_network(config, network))
    }

    /// Run a city on an already built network. Signals still held by the
    /// network are handed to the controller, which starts installed.
    pub fn with_network(config: CityConfig, mut network: SimRoadNetwork) -> Self {
        let navigator = Navigator::new(&network);
        let mut signals = SignalController::new(network.take_signals());
        signals.install();
        let rng = config.seed.map(StdRng::seed_from_u64);

        let mut city = Self {
            config,
            network,
            navigator,
            signals,
            cars: BTreeMap::new(),
            next_car_id: 0,
            rng,
            events: Vec::new(),
            stats: CityStats::default(),
            time: 0.0,
        };
        city.populate_cars();
        city
    }

    /// Get a random index below `len`, using seeded RNG if available
    fn random_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(match &mut self.rng {
            Some(rng) => rng.random_range(0..len),
            None => rand::rng().random_range(0..len),
        })
    }

    pub fn network(&self) -> &SimRoadNetwork {
        &self.network
    }

    pub fn signals(&self) -> &SignalController {
        &self.signals
    }

    pub fn cars(&self) -> &BTreeMap<CarId, SimCar> {
        &self.cars
    }

    pub fn car(&self, id: CarId) -> Option<&SimCar> {
        self.cars.get(&id)
    }

    pub fn car_count(&self) -> usize {
        self.cars.len()
    }

    /// Route between two lane points on this city's network
    pub fn find_best_route(&mut self, start: LanePoint, end: LanePoint) -> Result<Vec<RoutePoint>> {
        self.navigator.find_best_route(start, end)
    }

    /// Spawn a car routed from `start` to `end`
    pub fn spawn_car(&mut self, start: LanePoint, end: LanePoint) -> Result<CarId> {
        let id = CarId(self.next_car_id);
        let car = spawn_car(id, start, end, &mut self.navigator)?;
        Ok(self.insert(car))
    }

    /// Put a car on a route that was computed elsewhere
    pub fn insert_car(&mut self, route: Vec<RoutePoint>) -> Result<CarId> {
        let car = SimCar::new(CarId(self.next_car_id), route)?;
        Ok(self.insert(car))
    }

    fn insert(&mut self, car: SimCar) -> CarId {
        let id = car.id;
        self.next_car_id += 1;
        self.cars.insert(id, car);
        self.stats.total_cars_spawned += 1;
        debug!("Spawned car {:?} ({} cars active)", id, self.cars.len());
        id
    }

    /// Install the signal controller if it is torn down, tear it down otherwise
    pub fn toggle_traffic_signals(&mut self) {
        self.signals.toggle();
        info!(
            "Traffic signals {}",
            if self.signals.is_installed() {
                "installed"
            } else {
                "torn down"
            }
        );
    }

    /// Take every event emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Main simulation tick
    pub fn tick(&mut self, delta_secs: f32) {
        self.time += delta_secs;
        self.stats.ticks += 1;
        self.stats.elapsed_time = self.time;

        self.signals.tick(delta_secs);

        self.check_collisions();

        let results = self.update_cars(delta_secs);
        for (car_id, result) in results {
            match result {
                CarUpdateResult::Arrived => {
                    // Deferred until the pass is over so the map is never
                    // mutated while it is walked
                    self.cars.remove(&car_id);
                    self.stats.total_cars_arrived += 1;
                    self.events.push(SimEvent::CarArrived(car_id));
                    debug!("Car {:?} arrived", car_id);
                }
                CarUpdateResult::Braked => {
                    self.stats.total_brakes += 1;
                    self.events.push(SimEvent::CarBraked(car_id));
                    if let Some(car) = self.cars.get(&car_id) {
                        warn!(
                            "Car {:?} braked hard at ({:.1}, {:.1})",
                            car_id, car.position.x, car.position.y
                        );
                    }
                }
                CarUpdateResult::Transferred { from, to } => {
                    if from != to {
                        debug!("Car {:?} transferred from {:?} to {:?}", car_id, from, to);
                    }
                }
                CarUpdateResult::Continue => {}
            }
        }

        self.populate_cars();
    }

    /// Let every car sense its obstacles before any car moves. Broken cars
    /// also learn whether they are clear to resume.
    fn check_collisions(&mut self) {
        let car_ids: Vec<CarId> = self.cars.keys().copied().collect();

        for car_id in car_ids {
            let (obstacles, blocked) = match self.cars.get(&car_id) {
                Some(car) => (
                    collidable_list(car, &self.cars, &self.signals),
                    car.broken && recovery_blocked(car, &self.cars),
                ),
                None => continue,
            };
            if let Some(car) = self.cars.get_mut(&car_id) {
                car.check_collision(&obstacles, &self.signals);
                car.block_recovery(blocked);
            }
        }
    }

    /// Update all cars in the simulation
    ///
    /// Returns a list of (car_id, result) tuples for cars that need special handling
    fn update_cars(&mut self, delta_secs: f32) -> Vec<(CarId, CarUpdateResult)> {
        self.cars
            .values_mut()
            .filter_map(|car| match car.update(delta_secs) {
                CarUpdateResult::Continue => None,
                result => Some((car.id, result)),
            })
            .collect()
    }

    /// Top the population back up to `cars_total`, one car per free entry
    /// point. Without free entry points spawning waits for a later tick.
    pub fn populate_cars(&mut self) {
        let wanted = self.config.cars_total.saturating_sub(self.cars.len());
        if wanted == 0 {
            return;
        }

        let mut free = match free_entry_points(&self.network, &self.cars) {
            Ok(points) => points,
            Err(err) => {
                warn!("Could not compute free entry points: {err:#}");
                return;
            }
        };
        if free.is_empty() {
            self.stats.spawn_deferrals += 1;
            return;
        }

        for _ in 0..wanted.min(free.len()) {
            let Some(index) = self.random_index(free.len()) else {
                break;
            };
            let start = free.remove(index);
            let Some(end) = self.random_destination(start) else {
                continue;
            };

            if let Err(err) = self.spawn_car(start, end) {
                match err.downcast_ref::<SimError>() {
                    Some(SimError::NoRoute { .. }) => {
                        self.stats.route_failures += 1;
                        debug!("Skipping spawn: {err}");
                    }
                    _ => warn!("Failed to spawn car: {err:#}"),
                }
            }
        }
    }

    /// Deepest point of a random lane. A destination on the start's own
    /// road stays on the start's way.
    fn random_destination(&mut self, start: LanePoint) -> Option<LanePoint> {
        let (start_road, start_direction) = {
            let lane = self.network.lane(start.lane)?;
            (lane.road, lane.direction)
        };

        let road = RoadId(self.random_index(self.network.road_count())?);
        let mut direction = WayDirection::ALL[self.random_index(WayDirection::ALL.len())?];
        if road == start_road {
            direction = start_direction;
        }

        let lanes = self.network.road(road)?.way(direction).lanes.clone();
        let lane = lanes[self.random_index(lanes.len())?];
        self.network.lane(lane).map(SimLane::deepest_point)
    }

    /// Positions and states for a renderer
    pub fn snapshot(&self) -> CitySnapshot {
        CitySnapshot {
            time: self.time,
            cars: self
                .cars
                .values()
                .map(|car| CarPose {
                    id: car.id,
                    position: car.position,
                    angle: car.angle,
                    state: car.state,
                })
                .collect(),
            signals: self
                .signals
                .signals()
                .iter()
                .map(|signal| SignalView {
                    id: signal.id,
                    position: signal.position(),
                    state: signal.state(),
                    active: signal.is_active(),
                })
                .collect(),
            lanes: self
                .network
                .lanes()
                .iter()
                .map(|lane| LaneView {
                    id: lane.id,
                    start: lane.start(),
                    end: lane.end(),
                })
                .collect(),
        }
    }

    /// Remaining route of a car, for drawing its trace
    pub fn route_trace(&self, id: CarId) -> Result<Vec<Position>> {
        self.cars
            .get(&id)
            .map(SimCar::route_polyline)
            .context("Car not found")
    }

    /// Log a summary of the world state
    pub fn log_summary(&self) {
        info!("=== Traffic Simulation Summary ===");
        info!("Time: {:.2}s", self.time);
        info!(
            "Roads: {}, Junctions: {}, Signals: {} ({})",
            self.network.road_count(),
            self.network.junction_count(),
            self.signals.signals().len(),
            if self.signals.is_installed() {
                "installed"
            } else {
                "off"
            }
        );

        let yielding = self
            .cars
            .values()
            .filter(|car| car.state == CarState::Yielding)
            .count();
        let braked = self.cars.values().filter(|car| car.broken).count();
        info!(
            "Cars: {} ({} yielding, {} braked)",
            self.cars.len(),
            yielding,
            braked
        );
    }
}

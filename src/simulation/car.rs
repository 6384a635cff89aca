//! Car movement logic for the traffic simulation
//!
//! A car follows its route point by point. Each tick runs in two steps,
//! called from separate passes over all cars: [`SimCar::check_collision`]
//! probes the obstacle list with the car's sensors, then
//! [`SimCar::update`] turns what was sensed into a state and moves the car.

use anyhow::{bail, Result};

use super::navigator::RoutePoint;
use super::obstacle::{Obstacle, ObstacleKind};
use super::sensor::{CarSensor, SensorHit};
use super::signal::SignalController;
use super::types::{
    CarId, LaneId, Position, BRAKE_RECOVERY_SECS, CAR_HITBOX_RADIUS, CAR_LENGTH, CRUISE_SPEED,
    HARD_STOP_DISTANCE, JUNCTION_CLEARANCE, RECOVERY_CLEARANCE, SIGNAL_COMMIT_DISTANCE, STOP_GAP,
};

/// Behavioural state of a car
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CarState {
    Cruising,
    /// Slowing for an obstacle inside a sensor's range
    Yielding,
    /// Hard stop after an obstacle came too close
    Braked,
    /// Crossing a junction into the next lane, until `JUNCTION_CLEARANCE`
    /// past the transfer point
    Transferring,
    /// Reached the end of the route
    Arrived,
}

/// Result of a car update indicating what action should be taken
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CarUpdateResult {
    Continue,
    /// Crossed a route point into the next segment
    Transferred { from: LaneId, to: LaneId },
    /// Hard stop; the car stays on the road
    Braked,
    /// Reached the final route point and should be removed
    Arrived,
}

/// The obstacle that decided this tick's behaviour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perception {
    pub hit: SensorHit,
    /// Range of the sensor that saw it
    pub range: f32,
}

/// A car in the traffic simulation
#[derive(Debug, Clone)]
pub struct SimCar {
    pub id: CarId,
    pub position: Position,
    /// Heading in radians
    pub angle: f32,
    pub speed: f32,
    pub cruise_speed: f32,
    pub state: CarState,
    /// Set while a hard stop is being sat out
    pub broken: bool,
    route: Vec<RoutePoint>,
    /// Index of the route point being driven toward
    target: usize,
    sensors: Vec<CarSensor>,
    perception: Option<Perception>,
    brake_timer: f32,
    /// Set by the collision pass while another car still stands in front
    recovery_blocked: bool,
    /// Lane being entered and the point where the transfer happened
    transfer: Option<(LaneId, Position)>,
}

impl SimCar {
    pub fn new(id: CarId, route: Vec<RoutePoint>) -> Result<Self> {
        let Some(first) = route.first().copied() else {
            bail!("Car {:?} needs a route with at least one point", id);
        };
        let angle = route
            .get(1)
            .map(|next| first.position.angle_to(&next.position))
            .unwrap_or_default();

        Ok(Self {
            id,
            position: first.position,
            angle,
            speed: CRUISE_SPEED,
            cruise_speed: CRUISE_SPEED,
            state: CarState::Cruising,
            broken: false,
            route,
            target: 0,
            sensors: CarSensor::default_set(),
            perception: None,
            brake_timer: 0.0,
            recovery_blocked: false,
            transfer: None,
        })
    }

    pub fn route(&self) -> &[RoutePoint] {
        &self.route
    }

    /// Current position followed by the route points still ahead
    pub fn route_polyline(&self) -> Vec<Position> {
        std::iter::once(self.position)
            .chain(self.route[self.target..].iter().map(|point| point.position))
            .collect()
    }

    /// Lane of the segment being driven
    pub fn current_lane(&self) -> LaneId {
        self.route[self.target.saturating_sub(1)].lane
    }

    /// Lane being entered across a junction, until the car is
    /// `JUNCTION_CLEARANCE` past the transfer point
    pub fn transferring_to(&self) -> Option<LaneId> {
        self.transfer.map(|(lane, _)| lane)
    }

    pub fn sensors(&self) -> &[CarSensor] {
        &self.sensors
    }

    pub fn perception(&self) -> Option<Perception> {
        self.perception
    }

    /// Obstacle other cars' sensors see for this car
    pub fn as_obstacle(&self) -> Obstacle {
        Obstacle::car(self.id, self.position, CAR_HITBOX_RADIUS)
    }

    /// Whether `other` stands in this car's lane corridor less than
    /// `RECOVERY_CLEARANCE` ahead. An overlapping car counts from any side.
    pub fn has_in_front(&self, other: &SimCar) -> bool {
        let offset = other.position - self.position;
        let heading = Position::from_angle(self.angle);
        let distance = offset.length();

        let ahead = offset.dot(&heading) >= 0.0 || distance < CAR_HITBOX_RADIUS;
        ahead && offset.cross(&heading).abs() < CAR_LENGTH && distance < RECOVERY_CLEARANCE
    }

    /// Keep a broken car standing past its brake timer
    pub fn block_recovery(&mut self, blocked: bool) {
        self.recovery_blocked = blocked;
    }

    /// Probe `obstacles` with every sensor and keep the nearest obstacle
    /// worth reacting to. Stop lines the controller lets this car's lane
    /// through, and those the car is already committed to, are not.
    pub fn check_collision(&mut self, obstacles: &[Obstacle], signals: &SignalController) {
        for sensor in &mut self.sensors {
            sensor.update(self.position, self.angle, obstacles);
        }

        let lane = self.current_lane();
        let mut nearest: Option<Perception> = None;
        for sensor in &self.sensors {
            for hit in sensor.collisions() {
                if !is_relevant(hit, lane, signals) {
                    continue;
                }
                if nearest.map_or(true, |n| hit.distance < n.hit.distance) {
                    nearest = Some(Perception {
                        hit: *hit,
                        range: sensor.far,
                    });
                }
            }
        }
        self.perception = nearest;
    }

    /// Apply this tick's perception and move along the route
    pub fn update(&mut self, delta_secs: f32) -> CarUpdateResult {
        if self.state == CarState::Arrived {
            return CarUpdateResult::Arrived;
        }

        if self.broken {
            self.brake_timer -= delta_secs;
            if self.brake_timer > 0.0 || self.recovery_blocked {
                return CarUpdateResult::Continue;
            }
            self.broken = false;
            self.recovery_blocked = false;
            self.state = CarState::Cruising;
        }

        match self.perception {
            Some(perception) if perception.hit.distance < HARD_STOP_DISTANCE => {
                self.state = CarState::Braked;
                self.broken = true;
                self.brake_timer = BRAKE_RECOVERY_SECS;
                self.speed = 0.0;
                return CarUpdateResult::Braked;
            }
            Some(perception) => {
                self.state = CarState::Yielding;
                self.speed = self.yield_speed(perception);
            }
            None => {
                self.state = if self.transfer.is_some() {
                    CarState::Transferring
                } else {
                    CarState::Cruising
                };
                self.speed = self.cruise_speed;
            }
        }

        self.advance(delta_secs)
    }

    /// Slows linearly from cruise speed at the sensor's edge to a standstill
    /// `STOP_GAP` away from the obstacle
    fn yield_speed(&self, perception: Perception) -> f32 {
        let band = (perception.range - STOP_GAP).max(f32::EPSILON);
        let factor = ((perception.hit.distance - STOP_GAP) / band).clamp(0.0, 1.0);
        self.cruise_speed * factor
    }

    fn advance(&mut self, delta_secs: f32) -> CarUpdateResult {
        let target = self.route[self.target].position;
        let step = self.speed * delta_secs;
        let remaining = self.position.distance(&target);

        if remaining <= step {
            self.position = target;
            return self.reach_route_point();
        }

        if step > 0.0 {
            self.angle = self.position.angle_to(&target);
            self.position = self.position.lerp(&target, step / remaining);
        }
        if let Some((_, at)) = self.transfer {
            if self.position.distance(&at) > JUNCTION_CLEARANCE {
                self.transfer = None;
            }
        }
        CarUpdateResult::Continue
    }

    fn reach_route_point(&mut self) -> CarUpdateResult {
        let reached = self.target;
        if reached + 1 >= self.route.len() {
            self.state = CarState::Arrived;
            self.speed = 0.0;
            return CarUpdateResult::Arrived;
        }

        let from = self.current_lane();
        let to = self.route[reached].lane;
        self.target += 1;
        self.transfer = (from != to).then_some((to, self.position));
        self.angle = self.position.angle_to(&self.route[self.target].position);
        // A yielding car keeps yielding through the route point
        if self.state == CarState::Cruising {
            self.state = CarState::Transferring;
        }

        CarUpdateResult::Transferred { from, to }
    }
}

/// Cars always matter. A stop line matters when the car is not yet
/// committed to it and the controller does not permit `lane` into the
/// line's junction.
fn is_relevant(hit: &SensorHit, lane: LaneId, signals: &SignalController) -> bool {
    match hit.kind {
        ObstacleKind::Car(_) => true,
        ObstacleKind::Signal(id) => {
            hit.distance >= SIGNAL_COMMIT_DISTANCE
                && signals
                    .signal(id)
                    .is_some_and(|signal| !signals.is_permitted(lane, signal.junction))
        }
    }
}

//! Directional obstacle probes attached to a car

use super::obstacle::{Obstacle, ObstacleKind};
use super::types::Position;

/// One obstacle met by a sensor probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorHit {
    pub kind: ObstacleKind,
    pub distance: f32,
}

/// A ray cast from the car along a fixed angle from its heading,
/// detecting obstacles between `near` and `far`
#[derive(Debug, Clone)]
pub struct CarSensor {
    pub name: &'static str,
    /// Offset from the car heading, radians
    pub angle: f32,
    pub near: f32,
    pub far: f32,
    collisions: Vec<SensorHit>,
    closest: Option<SensorHit>,
}

impl CarSensor {
    pub fn new(name: &'static str, angle: f32, near: f32, far: f32) -> Self {
        Self {
            name,
            angle,
            near,
            far,
            collisions: Vec::new(),
            closest: None,
        }
    }

    /// Forward probe plus two shorter probes angled slightly to each side
    pub fn default_set() -> Vec<CarSensor> {
        let side = 12f32.to_radians();
        vec![
            CarSensor::new("center", 0.0, 0.0, 12.0),
            CarSensor::new("left", side, 0.0, 8.0),
            CarSensor::new("right", -side, 0.0, 8.0),
        ]
    }

    /// Probe `obstacles` from `origin` with the car facing `heading`.
    /// Clears the previous tick's results first.
    pub fn update(&mut self, origin: Position, heading: f32, obstacles: &[Obstacle]) {
        self.reset();

        let direction = Position::from_angle(heading + self.angle);
        for obstacle in obstacles {
            let Some(distance) = obstacle.hitbox.ray_distance(origin, direction) else {
                continue;
            };
            if distance < self.near || distance > self.far {
                continue;
            }

            let hit = SensorHit {
                kind: obstacle.kind,
                distance,
            };
            // Ties keep the first obstacle in list order
            if self.closest.map_or(true, |closest| distance < closest.distance) {
                self.closest = Some(hit);
            }
            self.collisions.push(hit);
        }
    }

    /// Back to the neutral, non-colliding state
    pub fn reset(&mut self) {
        self.collisions.clear();
        self.closest = None;
    }

    pub fn is_colliding(&self) -> bool {
        self.closest.is_some()
    }

    pub fn is_colliding_signal(&self) -> bool {
        self.collisions
            .iter()
            .any(|hit| matches!(hit.kind, ObstacleKind::Signal(_)))
    }

    /// Every obstacle met this tick, in obstacle-list order
    pub fn collisions(&self) -> &[SensorHit] {
        &self.collisions
    }

    pub fn closest(&self) -> Option<SensorHit> {
        self.closest
    }

    pub fn distance(&self) -> Option<f32> {
        self.closest.map(|hit| hit.distance)
    }
}

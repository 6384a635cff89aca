//! Obstacles a car's sensors test against

use super::types::{CarId, Position, SignalId};

/// What an obstacle is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObstacleKind {
    Car(CarId),
    Signal(SignalId),
}

/// Testable bounding shape of an obstacle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hitbox {
    Circle { center: Position, radius: f32 },
    /// A stop line
    Segment { start: Position, end: Position },
}

impl Hitbox {
    /// Distance along the ray `origin + t * direction` (unit `direction`,
    /// `t >= 0`) to the first point of this shape, if the ray meets it.
    /// A ray starting inside a circle hits it at distance zero.
    pub fn ray_distance(&self, origin: Position, direction: Position) -> Option<f32> {
        match *self {
            Hitbox::Circle { center, radius } => {
                let to_origin = origin - center;
                let b = to_origin.dot(&direction);
                let c = to_origin.dot(&to_origin) - radius * radius;
                let discriminant = b * b - c;
                if discriminant < 0.0 {
                    return None;
                }

                let root = discriminant.sqrt();
                let far = -b + root;
                if far < 0.0 {
                    return None;
                }
                Some((-b - root).max(0.0))
            }
            Hitbox::Segment { start, end } => {
                let edge = end - start;
                let denom = direction.cross(&edge);
                if denom.abs() < f32::EPSILON {
                    return None;
                }

                let w = start - origin;
                let t = w.cross(&edge) / denom;
                let u = w.cross(&direction) / denom;
                (t >= 0.0 && (0.0..=1.0).contains(&u)).then_some(t)
            }
        }
    }

    /// Reference point used for danger-zone distance checks
    pub fn center(&self) -> Position {
        match *self {
            Hitbox::Circle { center, .. } => center,
            Hitbox::Segment { start, end } => start.lerp(&end, 0.5),
        }
    }
}

/// An entry of a car's obstacle list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub kind: ObstacleKind,
    pub hitbox: Hitbox,
}

impl Obstacle {
    pub fn car(id: CarId, position: Position, radius: f32) -> Self {
        Self {
            kind: ObstacleKind::Car(id),
            hitbox: Hitbox::Circle {
                center: position,
                radius,
            },
        }
    }

    pub fn signal(id: SignalId, stop_line: (Position, Position)) -> Self {
        Self {
            kind: ObstacleKind::Signal(id),
            hitbox: Hitbox::Segment {
                start: stop_line.0,
                end: stop_line.1,
            },
        }
    }
}

//! Core types for the traffic simulation
//!
//! Identifiers, planar geometry and the tuning constants shared by the
//! road network, the vehicles and the signal controller.

use std::ops::{Add, Mul, Sub};

/// A wrapper type for road IDs (index into the network's road list)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoadId(pub usize);

/// A wrapper type for lane IDs (index into the network's lane arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LaneId(pub usize);

/// A wrapper type for junction IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JunctionId(pub usize);

/// A wrapper type for traffic signal IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalId(pub usize);

/// A wrapper type for car IDs
///
/// Car IDs are handed out in increasing order, so ordering by ID is
/// insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CarId(pub usize);

/// Direction of travel of a way relative to its road's nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WayDirection {
    /// From the road's first node to its second
    Forward,
    /// From the road's second node to its first
    Backward,
}

impl WayDirection {
    pub const ALL: [WayDirection; 2] = [WayDirection::Forward, WayDirection::Backward];

    pub fn index(self) -> usize {
        match self {
            WayDirection::Forward => 0,
            WayDirection::Backward => 1,
        }
    }
}

/// A 2D position in the simulation plane
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle` (radians)
    pub fn from_angle(angle: f32) -> Self {
        Self {
            x: angle.cos(),
            y: angle.sin(),
        }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        (*other - *self).length()
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn dot(&self, other: &Position) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product
    pub fn cross(&self, other: &Position) -> f32 {
        self.x * other.y - self.y * other.x
    }

    pub fn normalized(&self) -> Position {
        let len = self.length();
        if len > 0.0 {
            Position::new(self.x / len, self.y / len)
        } else {
            Position::default()
        }
    }

    pub fn lerp(&self, other: &Position, t: f32) -> Position {
        Position {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// Calculate the heading from this position to another
    pub fn angle_to(&self, other: &Position) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        if dx == 0.0 && dy == 0.0 {
            0.0
        } else {
            dy.atan2(dx)
        }
    }

    /// Calculate perpendicular offset (right side of direction)
    pub fn perpendicular_offset(&self, other: &Position, offset: f32) -> Position {
        let dir = (*other - *self).normalized();
        Position {
            x: dir.y * offset,
            y: -dir.x * offset,
        }
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Position {
    type Output = Position;

    fn mul(self, rhs: f32) -> Position {
        Position::new(self.x * rhs, self.y * rhs)
    }
}

/// Intersection point of segments `a0-a1` and `b0-b1`, endpoints included.
/// Parallel (and collinear) segments never intersect.
pub fn segment_intersection(
    a0: Position,
    a1: Position,
    b0: Position,
    b1: Position,
) -> Option<Position> {
    let r = a1 - a0;
    let s = b1 - b0;
    let denom = r.cross(&s);
    if denom.abs() < f32::EPSILON {
        return None;
    }

    let w = b0 - a0;
    let t = w.cross(&s) / denom;
    let u = w.cross(&r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(a0 + r * t)
    } else {
        None
    }
}

/// Width of a single lane in world units
pub const LANE_WIDTH: f32 = 3.0;

/// Length of a car in world units
pub const CAR_LENGTH: f32 = 2.0;

/// Radius of the circular hitbox other cars' sensors test against
pub const CAR_HITBOX_RADIUS: f32 = CAR_LENGTH / 2.0;

/// Free-flow speed in world units per second
pub const CRUISE_SPEED: f32 = 8.0;

/// Only obstacles closer than this are handed to a car's sensors
pub const DANGER_ZONE_RADIUS: f32 = 30.0;

/// A relevant obstacle closer than this is a collision anomaly
pub const HARD_STOP_DISTANCE: f32 = 1.5;

/// Yielding cars come to rest this far from the obstacle
pub const STOP_GAP: f32 = 3.0;

/// A stop line closer than this is already committed to and ignored
pub const SIGNAL_COMMIT_DISTANCE: f32 = 2.5;

/// How long a braked car stands still before resuming its route
pub const BRAKE_RECOVERY_SECS: f32 = 3.0;

/// A braked car stays put while another car's center is closer than this
/// ahead of it in its own lane corridor
pub const RECOVERY_CLEARANCE: f32 = CAR_LENGTH + HARD_STOP_DISTANCE;

/// Gap between a junction's conflict zone and its stop lines
pub const STOP_LINE_MARGIN: f32 = 1.0;

/// A car counts as transferring until it is this far past the transfer point
pub const JUNCTION_CLEARANCE: f32 = CAR_LENGTH * 4.0;

/// Routing cost of switching lanes at a junction, in world units
pub const TRANSFER_PENALTY: f32 = 5.0;

/// Positions closer than this are treated as the same point
pub const POSITION_EPSILON: f32 = 1e-3;

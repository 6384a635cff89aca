//! Error conditions callers are expected to tell apart
//!
//! Everything else travels as a plain `anyhow::Error` with context. These
//! variants are wrapped in `anyhow::Error` too and recovered with
//! `downcast_ref::<SimError>()`.

use std::fmt;

use super::road::LanePoint;
use super::types::LaneId;

#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// The construction parameters cannot produce a usable network
    InvalidConfig(String),
    /// No chain of lanes and junction transfers connects the two points
    NoRoute { from: LanePoint, to: LanePoint },
    /// A lane point refers to a lane or waypoint that does not exist
    UnknownLane(LaneId),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidConfig(reason) => write!(f, "invalid city configuration: {reason}"),
            SimError::NoRoute { from, to } => write!(
                f,
                "no route from lane {:?} point {} to lane {:?} point {}",
                from.lane, from.index, to.lane, to.index
            ),
            SimError::UnknownLane(lane) => write!(f, "unknown lane {lane:?}"),
        }
    }
}

impl std::error::Error for SimError {}

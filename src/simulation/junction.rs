//! Junctions where two roads cross
//!
//! A junction exists for every pair of roads whose centerlines intersect.
//! It owns the way-transfer table (which lane may feed which lane of the
//! other road) and the signals guarding entry into its conflict zone.

use std::collections::BTreeMap;

use anyhow::{Context, Result};

use super::road::{lane_offset, SimLane, SimRoad};
use super::signal::TrafficSignal;
use super::types::{
    segment_intersection, JunctionId, LaneId, Position, RoadId, SignalId, WayDirection,
    STOP_LINE_MARGIN,
};

/// How far a stop line reaches past the outer lane centers
const STOP_LINE_OVERHANG: f32 = 1.0;

/// A crossing of two roads
#[derive(Debug, Clone)]
pub struct SimJunction {
    pub id: JunctionId,
    pub roads: [RoadId; 2],
    /// Where the two centerlines cross
    pub center: Position,
    /// Incoming lane -> lanes of the other road it can transfer into
    transfers: BTreeMap<LaneId, Vec<LaneId>>,
    pub signals: Vec<SignalId>,
}

impl SimJunction {
    /// Create the junction of two roads if their centerlines intersect.
    /// Parallel or disjoint roads have no junction.
    pub fn between(id: JunctionId, a: &SimRoad, b: &SimRoad) -> Option<Self> {
        if a.id == b.id {
            return None;
        }

        let center = segment_intersection(a.start(), a.end(), b.start(), b.end())?;

        Some(Self {
            id,
            roads: [a.id, b.id],
            center,
            transfers: BTreeMap::new(),
            signals: Vec::new(),
        })
    }

    /// Compute the way-transfer table, record crossing waypoints on every
    /// lane involved and create one signal per incoming way.
    /// Running it again adds nothing.
    pub fn connect_way_transfers(
        &mut self,
        roads: &[SimRoad],
        lanes: &mut [SimLane],
        signals: &mut Vec<TrafficSignal>,
    ) -> Result<()> {
        let road_a = roads
            .get(self.roads[0].0)
            .context("Junction road not found")?;
        let road_b = roads
            .get(self.roads[1].0)
            .context("Junction road not found")?;

        for lane_a in road_a.lane_ids() {
            for lane_b in road_b.lane_ids() {
                let (a0, a1) = lane_extent(lanes, lane_a)?;
                let (b0, b1) = lane_extent(lanes, lane_b)?;

                let Some(point) = segment_intersection(a0, a1, b0, b1) else {
                    continue;
                };

                lanes[lane_a.0].insert_crossing(point, self.id, lane_b);
                lanes[lane_b.0].insert_crossing(point, self.id, lane_a);
                self.add_transfer(lane_a, lane_b);
                self.add_transfer(lane_b, lane_a);
            }
        }

        if self.signals.is_empty() {
            for (road, other) in [(road_a, road_b), (road_b, road_a)] {
                for direction in WayDirection::ALL {
                    if let Some(signal) = self.create_signal(road, other, direction, signals.len()) {
                        self.signals.push(signal.id);
                        signals.push(signal);
                    }
                }
            }
        }

        Ok(())
    }

    fn add_transfer(&mut self, from: LaneId, to: LaneId) {
        let targets = self.transfers.entry(from).or_default();
        if !targets.contains(&to) {
            targets.push(to);
        }
    }

    /// Stop-line signal for the way of `road` heading in `direction`.
    /// Ways that start inside the conflict zone get none.
    fn create_signal(
        &self,
        road: &SimRoad,
        other: &SimRoad,
        direction: WayDirection,
        next_id: usize,
    ) -> Option<TrafficSignal> {
        let (from, to) = match direction {
            WayDirection::Forward => (road.start(), road.end()),
            WayDirection::Backward => (road.end(), road.start()),
        };

        let stop_distance = other.half_width() + STOP_LINE_MARGIN;
        if from.distance(&self.center) <= stop_distance {
            return None;
        }

        let heading = (to - from).normalized();
        let stop_center = self.center - heading * stop_distance;
        let inner = from.perpendicular_offset(&to, lane_offset(0) - STOP_LINE_OVERHANG);
        let outer = from.perpendicular_offset(
            &to,
            lane_offset(road.lane_count.saturating_sub(1)) + STOP_LINE_OVERHANG,
        );

        Some(TrafficSignal::new(
            SignalId(next_id),
            self.id,
            road.id,
            road.way(direction).lanes.clone(),
            (stop_center + inner, stop_center + outer),
        ))
    }

    /// Lanes of the other road reachable from `lane` at this junction
    pub fn transfers_from(&self, lane: LaneId) -> &[LaneId] {
        self.transfers
            .get(&lane)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn transfer_table(&self) -> &BTreeMap<LaneId, Vec<LaneId>> {
        &self.transfers
    }
}

fn lane_extent(lanes: &[SimLane], lane: LaneId) -> Result<(Position, Position)> {
    let lane = lanes.get(lane.0).context("Junction lane not found")?;
    Ok((lane.start(), lane.end()))
}

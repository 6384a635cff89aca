//! Roads, ways and lanes
//!
//! A road owns two ways, one per direction of travel. Each way owns an
//! ordered set of parallel lanes. Lanes live in the network's lane arena
//! and are referenced by [`LaneId`]; a lane knows the road and way it
//! belongs to and nothing else shares it.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;

use super::types::{
    JunctionId, LaneId, Position, RoadId, WayDirection, LANE_WIDTH, POSITION_EPSILON,
};

/// A world-space point anchoring one end of a road
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadNode {
    pub position: Position,
}

impl RoadNode {
    pub fn new(position: Position) -> Self {
        Self { position }
    }
}

/// A waypoint along a lane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub position: Position,
    /// Junction this waypoint sits in, if it is a crossing point
    pub junction: Option<JunctionId>,
    /// The other road's lane crossing this one here
    pub crossing: Option<LaneId>,
}

impl Waypoint {
    fn endpoint(position: Position) -> Self {
        Self {
            position,
            junction: None,
            crossing: None,
        }
    }
}

/// A waypoint addressed by lane and index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanePoint {
    pub lane: LaneId,
    pub index: usize,
}

impl LanePoint {
    pub fn new(lane: LaneId, index: usize) -> Self {
        Self { lane, index }
    }
}

/// One directed line of travel (a road path)
#[derive(Debug, Clone)]
pub struct SimLane {
    pub id: LaneId,
    pub road: RoadId,
    pub direction: WayDirection,
    /// Position within the way, 0 being closest to the road centerline
    pub index: usize,
    waypoints: Vec<Waypoint>,
}

impl SimLane {
    pub fn new(
        id: LaneId,
        road: RoadId,
        direction: WayDirection,
        index: usize,
        start: Position,
        end: Position,
    ) -> Self {
        Self {
            id,
            road,
            direction,
            index,
            waypoints: vec![Waypoint::endpoint(start), Waypoint::endpoint(end)],
        }
    }

    /// Lateral offset from the road centerline, to the right of travel
    pub fn offset(&self) -> f32 {
        lane_offset(self.index)
    }

    pub fn start(&self) -> Position {
        self.waypoints[0].position
    }

    pub fn end(&self) -> Position {
        self.waypoints[self.waypoints.len() - 1].position
    }

    pub fn length(&self) -> f32 {
        self.start().distance(&self.end())
    }

    /// Heading of the lane in radians
    pub fn angle(&self) -> f32 {
        self.start().angle_to(&self.end())
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn waypoint(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    /// Entry point where cars are spawned
    pub fn init_point(&self) -> LanePoint {
        LanePoint::new(self.id, 0)
    }

    /// Farthest reachable waypoint, used as a destination
    pub fn deepest_point(&self) -> LanePoint {
        LanePoint::new(self.id, self.waypoints.len() - 1)
    }

    /// Record the point where `crossing` cuts this lane inside `junction`.
    /// Waypoints stay ordered by distance from the lane start; recording the
    /// same crossing twice is a no-op.
    pub fn insert_crossing(&mut self, position: Position, junction: JunctionId, crossing: LaneId) {
        if self.waypoints.iter().any(|w| w.crossing == Some(crossing)) {
            return;
        }

        let start = self.start();
        let waypoint = Waypoint {
            position,
            junction: Some(junction),
            crossing: Some(crossing),
        };

        // A crossing on an endpoint takes over that endpoint
        if let Some(existing) = self
            .waypoints
            .iter_mut()
            .find(|w| w.crossing.is_none() && w.position.distance(&position) < POSITION_EPSILON)
        {
            *existing = waypoint;
            return;
        }

        self.waypoints.push(waypoint);
        self.waypoints
            .sort_by_key(|w| OrderedFloat(start.distance(&w.position)));
    }

    /// Index of the waypoint where `crossing` cuts this lane
    pub fn crossing_index(&self, crossing: LaneId) -> Option<usize> {
        self.waypoints
            .iter()
            .position(|w| w.crossing == Some(crossing))
    }
}

/// Lateral offset of lane `index` from its road's centerline
pub fn lane_offset(index: usize) -> f32 {
    (index as f32 + 0.5) * LANE_WIDTH
}

/// Where a lane can continue after a junction crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextNode {
    /// Waypoint on the incoming lane where the transfer happens
    pub at: usize,
    pub junction: JunctionId,
    /// Waypoint on the outgoing lane the transfer lands on
    pub to: LanePoint,
}

/// One direction of travel on a road
#[derive(Debug, Clone)]
pub struct SimWay {
    pub road: RoadId,
    pub direction: WayDirection,
    pub lanes: Vec<LaneId>,
    /// Per lane, the transfers available at each junction crossing
    next_nodes: BTreeMap<LaneId, Vec<NextNode>>,
}

impl SimWay {
    pub fn new(road: RoadId, direction: WayDirection, lanes: Vec<LaneId>) -> Self {
        Self {
            road,
            direction,
            lanes,
            next_nodes: BTreeMap::new(),
        }
    }

    pub fn all_next_nodes(&self) -> &BTreeMap<LaneId, Vec<NextNode>> {
        &self.next_nodes
    }

    /// Rebuild the transfer continuations of every lane from scratch.
    /// `lanes` is the network's lane arena and `transfers` resolves the
    /// outgoing lanes a junction allows from an incoming lane.
    pub fn update_next_nodes<F>(&mut self, lanes: &[SimLane], transfers: F)
    where
        F: Fn(JunctionId, LaneId) -> Vec<LaneId>,
    {
        self.next_nodes.clear();

        for lane_id in &self.lanes {
            let Some(lane) = lanes.get(lane_id.0) else {
                continue;
            };

            let mut nodes = Vec::new();
            for (at, waypoint) in lane.waypoints().iter().enumerate() {
                let (Some(junction), Some(crossing)) = (waypoint.junction, waypoint.crossing)
                else {
                    continue;
                };

                // The lane crossing here is the only one reachable at this point
                if !transfers(junction, lane.id).contains(&crossing) {
                    continue;
                }
                let Some(target) = lanes.get(crossing.0) else {
                    continue;
                };
                if let Some(index) = target.crossing_index(lane.id) {
                    nodes.push(NextNode {
                        at,
                        junction,
                        to: LanePoint::new(crossing, index),
                    });
                }
            }

            self.next_nodes.insert(*lane_id, nodes);
        }
    }
}

/// A named, undirected road between two nodes
#[derive(Debug, Clone)]
pub struct SimRoad {
    pub id: RoadId,
    pub name: String,
    pub nodes: [RoadNode; 2],
    pub ways: [SimWay; 2],
    pub lane_count: usize,
}

impl SimRoad {
    /// Create a road and its lanes. Lanes are appended to `lanes` with IDs
    /// matching their arena index.
    pub fn new(
        id: RoadId,
        name: String,
        nodes: [RoadNode; 2],
        lane_count: usize,
        lanes: &mut Vec<SimLane>,
    ) -> Self {
        let ways = WayDirection::ALL.map(|direction| {
            let (from, to) = match direction {
                WayDirection::Forward => (nodes[0].position, nodes[1].position),
                WayDirection::Backward => (nodes[1].position, nodes[0].position),
            };

            let lane_ids = (0..lane_count)
                .map(|index| {
                    let offset = from.perpendicular_offset(&to, lane_offset(index));
                    let lane_id = LaneId(lanes.len());
                    lanes.push(SimLane::new(
                        lane_id,
                        id,
                        direction,
                        index,
                        from + offset,
                        to + offset,
                    ));
                    lane_id
                })
                .collect();

            SimWay::new(id, direction, lane_ids)
        });

        Self {
            id,
            name,
            nodes,
            ways,
            lane_count,
        }
    }

    pub fn way(&self, direction: WayDirection) -> &SimWay {
        &self.ways[direction.index()]
    }

    pub fn start(&self) -> Position {
        self.nodes[0].position
    }

    pub fn end(&self) -> Position {
        self.nodes[1].position
    }

    pub fn length(&self) -> f32 {
        self.start().distance(&self.end())
    }

    /// Distance from the centerline to the outer edge of the outermost lane
    pub fn half_width(&self) -> f32 {
        self.lane_count as f32 * LANE_WIDTH
    }

    /// All lanes of both ways
    pub fn lane_ids(&self) -> impl Iterator<Item = LaneId> + '_ {
        self.ways.iter().flat_map(|way| way.lanes.iter().copied())
    }

    /// Entry points of every lane, in way then lane order
    pub fn init_points(&self, lanes: &[SimLane]) -> Vec<LanePoint> {
        self.lane_ids()
            .filter_map(|id| lanes.get(id.0))
            .map(SimLane::init_point)
            .collect()
    }
}

//! Route computation over the road network
//!
//! Graph nodes are lane waypoints. Consecutive waypoints of a lane are
//! joined by an edge weighted with their distance; junction transfers join
//! two lanes at their shared crossing point and cost a fixed penalty.

use std::collections::HashMap;

use anyhow::Result;
use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};

use super::error::SimError;
use super::road::LanePoint;
use super::road_network::SimRoadNetwork;
use super::types::{LaneId, Position, TRANSFER_PENALTY};

/// A point of a car's route, tagged with the lane travelled from it onward
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutePoint {
    pub position: Position,
    pub lane: LaneId,
}

/// Node data for the navigation graph
#[derive(Debug, Clone, Copy)]
struct NavNode {
    point: LanePoint,
    position: Position,
}

/// Scale distances for integer weights, preserving two decimals
fn weight_for(distance: f32) -> u32 {
    ((distance * 100.0) as u32).max(1)
}

/// Shortest-route finder over lanes and junction transfers
#[derive(Debug, Default)]
pub struct Navigator {
    graph: DiGraph<NavNode, u32>,
    point_to_node: HashMap<LanePoint, NodeIndex>,
    route_cache: HashMap<(LanePoint, LanePoint), Vec<RoutePoint>>,
}

impl Navigator {
    pub fn new(network: &SimRoadNetwork) -> Self {
        let mut navigator = Self::default();
        navigator.rebuild(network);
        navigator
    }

    /// Rebuild the graph from the network; clears cached routes
    pub fn rebuild(&mut self, network: &SimRoadNetwork) {
        self.graph.clear();
        self.point_to_node.clear();
        self.route_cache.clear();

        for lane in network.lanes() {
            let mut previous: Option<(NodeIndex, Position)> = None;
            for (index, waypoint) in lane.waypoints().iter().enumerate() {
                let point = LanePoint::new(lane.id, index);
                let node = self.graph.add_node(NavNode {
                    point,
                    position: waypoint.position,
                });
                self.point_to_node.insert(point, node);

                if let Some((prev_node, prev_position)) = previous {
                    let weight = weight_for(prev_position.distance(&waypoint.position));
                    self.graph.add_edge(prev_node, node, weight);
                }
                previous = Some((node, waypoint.position));
            }
        }

        for road in network.roads() {
            for way in &road.ways {
                for (lane, next_nodes) in way.all_next_nodes() {
                    for next in next_nodes {
                        let from = self.point_to_node.get(&LanePoint::new(*lane, next.at));
                        let to = self.point_to_node.get(&next.to);
                        if let (Some(from), Some(to)) = (from, to) {
                            self.graph
                                .add_edge(*from, *to, weight_for(TRANSFER_PENALTY));
                        }
                    }
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Lowest-cost route from `start` to `end`.
    ///
    /// The route keeps its first point, its last point and every point where
    /// the lane changes. Identical network state always yields the same
    /// route. Fails with [`SimError::NoRoute`] when the points are not
    /// connected, never with an empty route.
    pub fn find_best_route(&mut self, start: LanePoint, end: LanePoint) -> Result<Vec<RoutePoint>> {
        let start_node = *self
            .point_to_node
            .get(&start)
            .ok_or(SimError::UnknownLane(start.lane))?;
        let end_node = *self
            .point_to_node
            .get(&end)
            .ok_or(SimError::UnknownLane(end.lane))?;

        if let Some(route) = self.route_cache.get(&(start, end)) {
            return Ok(route.clone());
        }

        let nodes = if start == end {
            vec![start_node]
        } else if start.lane == end.lane && start.index <= end.index {
            // Same lane, ahead of the start: the lane's own waypoints
            vec![start_node, end_node]
        } else {
            let (_, path) = astar(
                &self.graph,
                start_node,
                |node| node == end_node,
                |edge| *edge.weight(),
                |_| 0, // Null heuristic = Dijkstra
            )
            .ok_or(SimError::NoRoute {
                from: start,
                to: end,
            })?;
            path
        };

        let route = self.compress(&nodes);
        self.route_cache.insert((start, end), route.clone());
        Ok(route)
    }

    fn compress(&self, nodes: &[NodeIndex]) -> Vec<RoutePoint> {
        let mut route: Vec<RoutePoint> = Vec::with_capacity(nodes.len());

        for node in nodes {
            let nav = self.graph[*node];
            let point = RoutePoint {
                position: nav.position,
                lane: nav.point.lane,
            };

            match route.last_mut() {
                // A transfer lands on the same spot: keep one point, on the new lane
                Some(last) if last.position.distance(&point.position) < f32::EPSILON => {
                    last.lane = point.lane;
                }
                _ => route.push(point),
            }
        }

        // Lanes are straight, so interior points that keep the lane are redundant
        let last_index = route.len().saturating_sub(1);
        let mut compressed = Vec::with_capacity(route.len());
        for (i, point) in route.iter().enumerate() {
            if i == 0 || i == last_index || route[i - 1].lane != point.lane {
                compressed.push(*point);
            }
        }
        compressed
    }
}

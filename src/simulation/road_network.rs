//! Road network topology
//!
//! Builds the drivable graph once at start-up: roads laid across the grid,
//! junctions wherever two roads cross, then the per-lane transfer
//! continuations. Routing over the result lives in the navigator.

use anyhow::{bail, Context, Result};
use log::{debug, info};

use super::config::CityConfig;
use super::error::SimError;
use super::grid::Grid;
use super::junction::SimJunction;
use super::road::{LanePoint, RoadNode, SimLane, SimRoad, SimWay};
use super::signal::TrafficSignal;
use super::types::{JunctionId, LaneId, Position, RoadId};

/// Roads, lanes and junctions of a city
#[derive(Debug, Clone)]
pub struct SimRoadNetwork {
    grid: Grid,
    roads: Vec<SimRoad>,
    /// Lane arena; a lane's ID is its index
    lanes: Vec<SimLane>,
    junctions: Vec<SimJunction>,
    /// Signals created with the junctions, until the controller takes them
    signals: Vec<TrafficSignal>,
}

impl SimRoadNetwork {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            roads: Vec::new(),
            lanes: Vec::new(),
            junctions: Vec::new(),
            signals: Vec::new(),
        }
    }

    /// Validate `config` and run the full construction sequence
    pub fn generate(config: &CityConfig) -> Result<Self> {
        config.validate()?;

        let mut network = Self::new(Grid::new(config.grid_size, config.tile_size));
        network.build_roads(config.roads_total, config.road_lanes)?;
        network.build_junctions()?;
        network.finalize_transfers();

        info!(
            "Road network: {} roads, {} lanes, {} junctions, {} signals",
            network.road_count(),
            network.lanes.len(),
            network.junction_count(),
            network.signals.len()
        );

        Ok(network)
    }

    /// Lay `count` roads across the grid, alternating rows and columns and
    /// spacing each axis evenly. With an odd count the column axis gets one
    /// subdivision fewer.
    pub fn build_roads(&mut self, count: usize, lane_count: usize) -> Result<&[SimRoad]> {
        if count == 0 {
            return Err(SimError::InvalidConfig("at least one road is required".into()).into());
        }
        if lane_count == 0 {
            return Err(
                SimError::InvalidConfig("roads need at least one lane per direction".into()).into(),
            );
        }
        if !self.roads.is_empty() {
            bail!("Roads already built");
        }

        let size = self.grid.size();
        let per_axis = count.div_ceil(2);

        for i in 0..count {
            let is_row = i % 2 == 0;
            let counter = i / 2;
            let tile_mod = if is_row { 0 } else { count % 2 };
            let tile_part = size / (per_axis + 1 - tile_mod);
            if tile_part == 0 {
                return Err(SimError::InvalidConfig(format!(
                    "{count} roads do not fit on a {size}x{size} grid"
                ))
                .into());
            }
            let tile_index = tile_part * (counter + 1);

            let (first, last) = if is_row {
                (self.grid.tile(0, tile_index), self.grid.tile(size - 1, tile_index))
            } else {
                (self.grid.tile(tile_index, 0), self.grid.tile(tile_index, size - 1))
            };
            let first = first.context("Road start tile outside the grid")?.center;
            let last = last.context("Road end tile outside the grid")?.center;

            let axis = if is_row { "Row" } else { "Col" };
            self.add_road(format!("{axis}-{counter}"), first, last, lane_count);
        }

        Ok(&self.roads)
    }

    /// Add a single straight road between two points
    pub fn add_road(
        &mut self,
        name: String,
        start: Position,
        end: Position,
        lane_count: usize,
    ) -> RoadId {
        let id = RoadId(self.roads.len());
        let road = SimRoad::new(
            id,
            name,
            [RoadNode::new(start), RoadNode::new(end)],
            lane_count,
            &mut self.lanes,
        );
        debug!("Road {} ({:?}) with {} lanes per way", road.name, id, lane_count);
        self.roads.push(road);
        id
    }

    /// Create a junction for every pair of crossing roads and fill in their
    /// transfer tables and signals
    pub fn build_junctions(&mut self) -> Result<&[SimJunction]> {
        if !self.junctions.is_empty() {
            bail!("Junctions already built");
        }

        for i in 0..self.roads.len() {
            for j in (i + 1)..self.roads.len() {
                let id = JunctionId(self.junctions.len());
                if let Some(junction) = SimJunction::between(id, &self.roads[i], &self.roads[j]) {
                    self.junctions.push(junction);
                }
            }
        }

        for junction in &mut self.junctions {
            junction.connect_way_transfers(&self.roads, &mut self.lanes, &mut self.signals)?;
        }

        Ok(&self.junctions)
    }

    /// Recompute, for every lane of every way, where it can continue after
    /// each junction crossing. Must run after all junctions exist.
    pub fn finalize_transfers(&mut self) {
        let junctions = &self.junctions;
        let lanes = &self.lanes;

        for road in &mut self.roads {
            for way in &mut road.ways {
                way.update_next_nodes(lanes, |junction, lane| {
                    junctions
                        .get(junction.0)
                        .map(|j| j.transfers_from(lane).to_vec())
                        .unwrap_or_default()
                });
            }
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn roads(&self) -> &[SimRoad] {
        &self.roads
    }

    pub fn road(&self, id: RoadId) -> Option<&SimRoad> {
        self.roads.get(id.0)
    }

    pub fn lanes(&self) -> &[SimLane] {
        &self.lanes
    }

    pub fn lane(&self, id: LaneId) -> Option<&SimLane> {
        self.lanes.get(id.0)
    }

    pub fn junctions(&self) -> &[SimJunction] {
        &self.junctions
    }

    pub fn junction(&self, id: JunctionId) -> Option<&SimJunction> {
        self.junctions.get(id.0)
    }

    /// Signals not yet handed to a controller
    pub fn signals(&self) -> &[TrafficSignal] {
        &self.signals
    }

    /// Hand the signals over to their controller
    pub fn take_signals(&mut self) -> Vec<TrafficSignal> {
        std::mem::take(&mut self.signals)
    }

    /// The way a lane belongs to
    pub fn way_of(&self, lane: LaneId) -> Option<&SimWay> {
        let lane = self.lane(lane)?;
        self.road(lane.road).map(|road| road.way(lane.direction))
    }

    /// World position of a lane point
    pub fn point_position(&self, point: LanePoint) -> Result<Position> {
        self.lane(point.lane)
            .and_then(|lane| lane.waypoint(point.index))
            .map(|waypoint| waypoint.position)
            .ok_or_else(|| SimError::UnknownLane(point.lane).into())
    }

    /// Entry points of every lane of every road
    pub fn init_points(&self) -> Vec<LanePoint> {
        self.roads
            .iter()
            .flat_map(|road| road.init_points(&self.lanes))
            .collect()
    }

    pub fn road_count(&self) -> usize {
        self.roads.len()
    }

    pub fn junction_count(&self) -> usize {
        self.junctions.len()
    }
}

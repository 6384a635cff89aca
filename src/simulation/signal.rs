//! Traffic signals and their phase controller
//!
//! Signals are created during junction construction. The controller
//! partitions them into phase groups of mutually non-conflicting signals
//! and cycles the groups round-robin: green, yellow, an all-red clearance,
//! then the next group. The controller can be torn down and reinstalled at
//! any tick boundary; while torn down every signal is inactive and every
//! lane is permitted.

use std::collections::HashMap;

use log::{debug, info};
use petgraph::graph::{NodeIndex, UnGraph};

use super::types::{JunctionId, LaneId, Position, RoadId, SignalId};

/// Time a phase group holds green
pub const GREEN_SECS: f32 = 8.0;
/// Time a phase group holds yellow before turning red
pub const YELLOW_SECS: f32 = 2.0;
/// Time every group holds red before the next group turns green
pub const ALL_RED_SECS: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalState {
    Green,
    Yellow,
    Red,
}

/// A stop-line signal guarding one way's entry into a junction
#[derive(Debug, Clone)]
pub struct TrafficSignal {
    pub id: SignalId,
    pub junction: JunctionId,
    pub road: RoadId,
    /// Lanes that must stop at this signal's line
    pub lanes: Vec<LaneId>,
    /// Stop line across the governed lanes
    pub stop_line: (Position, Position),
    pub phase_group: usize,
    state: SignalState,
    active: bool,
}

impl TrafficSignal {
    pub fn new(
        id: SignalId,
        junction: JunctionId,
        road: RoadId,
        lanes: Vec<LaneId>,
        stop_line: (Position, Position),
    ) -> Self {
        Self {
            id,
            junction,
            road,
            lanes,
            stop_line,
            phase_group: 0,
            state: SignalState::Red,
            active: false,
        }
    }

    pub fn state(&self) -> SignalState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn governs(&self, lane: LaneId) -> bool {
        self.lanes.contains(&lane)
    }

    /// Midpoint of the stop line
    pub fn position(&self) -> Position {
        self.stop_line.0.lerp(&self.stop_line.1, 0.5)
    }

    /// Two signals conflict when they let crossing roads into the same
    /// junction. A car turns at the crossing waypoint of its two lanes, so
    /// opposite approaches of one road never conflict and share a phase.
    pub fn conflicts_with(&self, other: &TrafficSignal) -> bool {
        self.id != other.id && self.junction == other.junction && self.road != other.road
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStage {
    Green,
    Yellow,
    AllRed,
}

impl PhaseStage {
    fn duration(self) -> f32 {
        match self {
            PhaseStage::Green => GREEN_SECS,
            PhaseStage::Yellow => YELLOW_SECS,
            PhaseStage::AllRed => ALL_RED_SECS,
        }
    }
}

/// Position of the running cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseCycle {
    pub group: usize,
    pub stage: PhaseStage,
    pub elapsed: f32,
}

/// Owns every signal and drives the phase cycle
#[derive(Debug, Clone, Default)]
pub struct SignalController {
    signals: Vec<TrafficSignal>,
    group_count: usize,
    /// (lane, junction) -> signal governing that approach
    approaches: HashMap<(LaneId, JunctionId), SignalId>,
    cycle: Option<PhaseCycle>,
}

impl SignalController {
    /// Take ownership of `signals` and assign phase groups. The controller
    /// starts torn down; call [`install`](Self::install) to run it.
    pub fn new(mut signals: Vec<TrafficSignal>) -> Self {
        let group_count = assign_phase_groups(&mut signals);

        let mut approaches = HashMap::new();
        for signal in &signals {
            for lane in &signal.lanes {
                approaches.insert((*lane, signal.junction), signal.id);
            }
        }

        info!(
            "Signal controller: {} signals in {} phase groups",
            signals.len(),
            group_count
        );

        Self {
            signals,
            group_count,
            approaches,
            cycle: None,
        }
    }

    pub fn is_installed(&self) -> bool {
        self.cycle.is_some()
    }

    /// Activate every signal and start the cycle at the first group's green
    pub fn install(&mut self) {
        if self.is_installed() {
            return;
        }

        self.cycle = Some(PhaseCycle {
            group: 0,
            stage: PhaseStage::Green,
            elapsed: 0.0,
        });
        for signal in &mut self.signals {
            signal.active = true;
        }
        self.apply_phase();
        debug!("Traffic signals installed");
    }

    /// Stop the cycle and leave every signal inactive and red
    pub fn teardown(&mut self) {
        self.cycle = None;
        for signal in &mut self.signals {
            signal.active = false;
            signal.state = SignalState::Red;
        }
        debug!("Traffic signals torn down");
    }

    /// Install when torn down, tear down when installed
    pub fn toggle(&mut self) {
        if self.is_installed() {
            self.teardown();
        } else {
            self.install();
        }
    }

    /// Advance the cycle timer
    pub fn tick(&mut self, delta_secs: f32) {
        let Some(cycle) = self.cycle.as_mut() else {
            return;
        };
        if self.group_count == 0 {
            return;
        }

        cycle.elapsed += delta_secs;
        let mut changed = false;
        while cycle.elapsed >= cycle.stage.duration() {
            cycle.elapsed -= cycle.stage.duration();
            cycle.stage = match cycle.stage {
                PhaseStage::Green => PhaseStage::Yellow,
                PhaseStage::Yellow => PhaseStage::AllRed,
                PhaseStage::AllRed => {
                    cycle.group = (cycle.group + 1) % self.group_count;
                    PhaseStage::Green
                }
            };
            changed = true;
        }

        if changed {
            self.apply_phase();
        }
    }

    /// Recompute every signal's state from the cycle in one pass
    fn apply_phase(&mut self) {
        let Some(cycle) = self.cycle else {
            return;
        };

        for signal in &mut self.signals {
            signal.state = if signal.phase_group != cycle.group {
                SignalState::Red
            } else {
                match cycle.stage {
                    PhaseStage::Green => SignalState::Green,
                    PhaseStage::Yellow => SignalState::Yellow,
                    PhaseStage::AllRed => SignalState::Red,
                }
            };
        }
    }

    /// Whether a car on `lane` may enter `junction` right now.
    /// Approaches without a signal, and all approaches while the controller
    /// is torn down, are unregulated.
    pub fn is_permitted(&self, lane: LaneId, junction: JunctionId) -> bool {
        match self.approaches.get(&(lane, junction)) {
            Some(id) => self
                .signal(*id)
                .map_or(true, |signal| !signal.active || signal.state == SignalState::Green),
            None => true,
        }
    }

    pub fn state_of(&self, id: SignalId) -> Option<SignalState> {
        self.signal(id).map(TrafficSignal::state)
    }

    pub fn signal(&self, id: SignalId) -> Option<&TrafficSignal> {
        self.signals.get(id.0)
    }

    pub fn signals(&self) -> &[TrafficSignal] {
        &self.signals
    }

    pub fn group_count(&self) -> usize {
        self.group_count
    }

    pub fn cycle(&self) -> Option<PhaseCycle> {
        self.cycle
    }

    /// Signals currently showing green
    pub fn green_signals(&self) -> impl Iterator<Item = &TrafficSignal> {
        self.signals
            .iter()
            .filter(|signal| signal.active && signal.state == SignalState::Green)
    }
}

/// Greedy coloring of the conflict graph. Signals are visited in ID order
/// and take the lowest group none of their conflicting neighbours hold.
/// Returns the number of groups.
fn assign_phase_groups(signals: &mut [TrafficSignal]) -> usize {
    let mut graph: UnGraph<SignalId, ()> = UnGraph::new_undirected();
    let nodes: Vec<NodeIndex> = signals.iter().map(|s| graph.add_node(s.id)).collect();

    for i in 0..signals.len() {
        for j in (i + 1)..signals.len() {
            if signals[i].conflicts_with(&signals[j]) {
                graph.add_edge(nodes[i], nodes[j], ());
            }
        }
    }

    let mut groups: Vec<Option<usize>> = vec![None; signals.len()];
    for (i, node) in nodes.iter().enumerate() {
        let taken: Vec<usize> = graph
            .neighbors(*node)
            .filter_map(|neighbour| groups[neighbour.index()])
            .collect();
        let group = (0..).find(|g| !taken.contains(g)).unwrap_or_default();
        groups[i] = Some(group);
        signals[i].phase_group = group;
    }

    groups.into_iter().flatten().max().map_or(0, |max| max + 1)
}

//! Traffic signal controller tests

use city_traffic::simulation::{
    CityConfig, JunctionId, LaneId, PhaseStage, SignalController, SignalState, SimRoadNetwork,
    ALL_RED_SECS, GREEN_SECS, YELLOW_SECS,
};

fn controller_for(config: &CityConfig) -> (SimRoadNetwork, SignalController) {
    let mut network = SimRoadNetwork::generate(config).expect("network should build");
    let controller = SignalController::new(network.take_signals());
    (network, controller)
}

fn assert_no_conflicting_greens(controller: &SignalController) {
    let greens: Vec<_> = controller.green_signals().collect();
    for a in &greens {
        for b in &greens {
            assert!(
                !a.conflicts_with(b),
                "signals {:?} and {:?} are green together",
                a.id,
                b.id
            );
        }
    }
}

#[test]
fn test_crossing_roads_get_two_phase_groups() {
    let (_, controller) = controller_for(&CityConfig::new(0, 2, 2));

    assert_eq!(controller.signals().len(), 4);
    assert_eq!(controller.group_count(), 2);

    let signals = controller.signals();
    for a in signals {
        for b in signals {
            if a.conflicts_with(b) {
                assert_ne!(a.phase_group, b.phase_group);
            }
        }
    }
}

#[test]
fn test_opposite_approaches_share_a_phase() {
    let (_, mut controller) = controller_for(&CityConfig::new(0, 2, 2));
    controller.install();

    let signals = controller.signals();
    for a in signals {
        for b in signals {
            let same_road = a.junction == b.junction && a.road == b.road;
            assert_eq!(a.conflicts_with(b), a.id != b.id && !same_road);
            if same_road {
                assert_eq!(a.phase_group, b.phase_group);
            }
        }
    }

    // Both directions of the first group's road go together
    let greens: Vec<_> = controller.green_signals().collect();
    assert_eq!(greens.len(), 2);
    assert_eq!(greens[0].road, greens[1].road);
}

#[test]
fn test_controller_starts_torn_down() {
    let (_, controller) = controller_for(&CityConfig::new(0, 2, 2));

    assert!(!controller.is_installed());
    assert!(controller.signals().iter().all(|s| !s.is_active()));
    assert_eq!(controller.green_signals().count(), 0);
}

#[test]
fn test_install_turns_first_group_green() {
    let (_, mut controller) = controller_for(&CityConfig::new(0, 2, 2));
    controller.install();

    assert!(controller.is_installed());
    for signal in controller.signals() {
        assert!(signal.is_active());
        let expected = if signal.phase_group == 0 {
            SignalState::Green
        } else {
            SignalState::Red
        };
        assert_eq!(signal.state(), expected);
        for lane in &signal.lanes {
            assert_eq!(
                controller.is_permitted(*lane, signal.junction),
                expected == SignalState::Green
            );
        }
    }
}

#[test]
fn test_never_conflicting_greens() {
    let (_, mut controller) = controller_for(&CityConfig::default());
    controller.install();

    for _ in 0..2000 {
        controller.tick(0.1);
        assert_no_conflicting_greens(&controller);
    }
}

#[test]
fn test_all_red_before_next_group() {
    let (_, mut controller) = controller_for(&CityConfig::new(0, 2, 2));
    controller.install();

    let mut previous = controller.cycle().expect("installed");
    let mut switches = 0;
    for _ in 0..1000 {
        controller.tick(0.1);
        let cycle = controller.cycle().expect("installed");

        if cycle.stage == PhaseStage::AllRed {
            assert_eq!(controller.green_signals().count(), 0);
            assert!(controller
                .signals()
                .iter()
                .all(|s| s.state() == SignalState::Red));
        }
        if cycle.group != previous.group {
            assert_eq!(previous.stage, PhaseStage::AllRed);
            assert_eq!(cycle.stage, PhaseStage::Green);
            switches += 1;
        }
        previous = cycle;
    }

    // 100 seconds over an 11 second cycle
    let period = GREEN_SECS + YELLOW_SECS + ALL_RED_SECS;
    assert!(switches >= (100.0 / period) as usize - 1);
}

#[test]
fn test_yellow_is_not_permitted() {
    let (_, mut controller) = controller_for(&CityConfig::new(0, 2, 2));
    controller.install();

    // Just past the end of green
    let mut elapsed = 0.0;
    while elapsed < GREEN_SECS + 0.05 {
        controller.tick(0.1);
        elapsed += 0.1;
    }

    let cycle = controller.cycle().expect("installed");
    assert_eq!(cycle.stage, PhaseStage::Yellow);
    for signal in controller.signals() {
        if signal.phase_group == cycle.group {
            assert_eq!(signal.state(), SignalState::Yellow);
            assert!(!controller.is_permitted(signal.lanes[0], signal.junction));
        }
    }
}

#[test]
fn test_teardown_permits_every_lane() {
    let (network, mut controller) = controller_for(&CityConfig::default());
    controller.install();
    for _ in 0..37 {
        controller.tick(0.1);
    }

    controller.teardown();
    assert!(!controller.is_installed());

    for signal in controller.signals() {
        assert!(!signal.is_active());
        for lane in &signal.lanes {
            assert!(controller.is_permitted(*lane, signal.junction));
        }
    }
    for junction in network.junctions() {
        for lane in network.lanes() {
            assert!(controller.is_permitted(lane.id, junction.id));
        }
    }

    // A torn down controller does not advance
    controller.tick(30.0);
    assert!(controller.cycle().is_none());
    assert_eq!(controller.green_signals().count(), 0);
}

#[test]
fn test_toggle_reinstalls_at_first_group() {
    let (_, mut controller) = controller_for(&CityConfig::new(0, 2, 2));
    controller.install();
    controller.tick(GREEN_SECS + YELLOW_SECS + ALL_RED_SECS + 1.0);
    assert_eq!(controller.cycle().map(|c| c.group), Some(1));

    controller.toggle();
    assert!(!controller.is_installed());
    controller.toggle();

    let cycle = controller.cycle().expect("installed again");
    assert_eq!(cycle.group, 0);
    assert_eq!(cycle.stage, PhaseStage::Green);
}

#[test]
fn test_unregulated_approach_is_permitted() {
    let (_, mut controller) = controller_for(&CityConfig::new(0, 2, 2));
    controller.install();

    assert!(controller.is_permitted(LaneId(999), JunctionId(0)));
    assert!(controller.is_permitted(LaneId(0), JunctionId(999)));
}

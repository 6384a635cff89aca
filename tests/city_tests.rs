//! City orchestration tests

use city_traffic::simulation::{
    CarId, CarState, CityConfig, LaneId, ObstacleKind, Position, RoutePoint, SimCity, SimError,
    SimEvent, CAR_HITBOX_RADIUS, SPAWN_CLEARANCE,
};

const DELTA: f32 = 0.1;

fn seeded(cars: usize, roads: usize, lanes: usize, seed: u64) -> SimCity {
    SimCity::new(CityConfig::new(cars, roads, lanes).with_seed(seed)).expect("city should build")
}

#[test]
fn test_city_builds_and_spawns() {
    let city = seeded(10, 4, 1, 42);

    assert_eq!(city.network().road_count(), 4);
    assert_eq!(city.network().junction_count(), 4);
    assert!(city.signals().is_installed());
    assert!(city.car_count() > 0);
    assert!(city.car_count() <= 10);
    assert_eq!(city.stats.total_cars_spawned as usize, city.car_count());
}

#[test]
fn test_invalid_config_is_rejected() {
    let err = SimCity::new(CityConfig::new(10, 0, 2)).err().expect("no roads");
    assert!(matches!(
        err.downcast_ref::<SimError>(),
        Some(SimError::InvalidConfig(_))
    ));
}

#[test]
fn test_population_never_exceeds_target() {
    let mut city = seeded(12, 6, 2, 7);

    for _ in 0..600 {
        city.tick(DELTA);
        assert!(city.car_count() <= 12);
    }
    assert_eq!(city.stats.ticks, 600);
    assert!((city.time - 60.0).abs() < 0.1);
}

#[test]
fn test_spawns_wait_for_free_entry_points() {
    // 2 roads x 2 ways x 1 lane = 4 entry points
    let mut city = seeded(50, 2, 1, 3);
    assert!(city.car_count() <= 4);

    // Fresh cars are still sitting on their entry points
    city.tick(DELTA);
    assert!(city.stats.spawn_deferrals >= 1);
    assert!(city.car_count() <= 4);
}

#[test]
fn test_fresh_spawns_keep_clearance() {
    let city = seeded(30, 6, 2, 11);

    let cars: Vec<_> = city.cars().values().collect();
    for (i, a) in cars.iter().enumerate() {
        for b in &cars[i + 1..] {
            if a.current_lane() == b.current_lane() {
                assert!(a.position.distance(&b.position) > SPAWN_CLEARANCE);
            }
        }
    }
}

#[test]
fn test_arrivals_are_reported_and_removed() {
    let mut city = seeded(8, 2, 2, 5);

    let mut arrived = Vec::new();
    let mut braked = 0;
    for _ in 0..1500 {
        city.tick(DELTA);
        for event in city.drain_events() {
            match event {
                SimEvent::CarArrived(id) => arrived.push(id),
                SimEvent::CarBraked(_) => braked += 1,
            }
        }
    }

    assert_eq!(arrived.len(), city.stats.total_cars_arrived as usize);
    assert_eq!(braked, city.stats.total_brakes as usize);
    for id in &arrived {
        assert!(city.car(*id).is_none());
    }
    assert!(city.drain_events().is_empty());
}

#[test]
fn test_lone_car_reaches_destination() {
    let mut city = seeded(0, 2, 2, 1);
    assert_eq!(city.car_count(), 0);

    let id = city.insert_car(north_route(-50.0)).expect("route is not empty");

    let mut events = Vec::new();
    for _ in 0..100 {
        city.tick(DELTA);
        events.extend(city.drain_events());
    }

    assert_eq!(events, vec![SimEvent::CarArrived(id)]);
    assert!(city.car(id).is_none());
    assert_eq!(city.stats.arrival_rate(), 100.0);
}

/// Two-point route up the empty stretch south of the junction
fn north_route(from_y: f32) -> Vec<RoutePoint> {
    vec![
        RoutePoint {
            position: Position::new(0.0, from_y),
            lane: LaneId(0),
        },
        RoutePoint {
            position: Position::new(0.0, -20.0),
            lane: LaneId(0),
        },
    ]
}

#[test]
fn test_cars_sense_pre_tick_positions() {
    let mut city = seeded(0, 2, 2, 1);
    let ahead = city.insert_car(north_route(-40.0)).expect("route");
    let behind = city.insert_car(north_route(-50.0)).expect("route");

    // The first tick only commits both cars to their first segment
    city.tick(DELTA);

    let ahead_before = city.car(ahead).expect("car").position;
    let behind_before = city.car(behind).expect("car").position;
    city.tick(DELTA);

    let ahead_after = city.car(ahead).expect("car").position;
    assert!(ahead_after.distance(&ahead_before) > 0.5);

    let car = city.car(behind).expect("car");
    assert_eq!(car.state, CarState::Yielding);
    let perception = car.perception().expect("car ahead is seen");
    assert_eq!(perception.hit.kind, ObstacleKind::Car(ahead));

    let expected = behind_before.distance(&ahead_before) - CAR_HITBOX_RADIUS;
    assert!((perception.hit.distance - expected).abs() < 1e-3);
}

#[test]
fn test_overlapping_broken_cars_recover_one_at_a_time() {
    let mut city = seeded(0, 2, 2, 1);
    let rear = city.insert_car(north_route(-50.0)).expect("route");
    let front = city.insert_car(north_route(-49.8)).expect("route");

    let mut brakes: Vec<CarId> = Vec::new();
    let mut arrived: Vec<CarId> = Vec::new();
    for _ in 0..600 {
        city.tick(DELTA);
        for event in city.drain_events() {
            match event {
                SimEvent::CarBraked(id) => brakes.push(id),
                SimEvent::CarArrived(id) => arrived.push(id),
            }
        }
    }

    // One hard stop each when they first overlap, never again after
    assert_eq!(brakes.len(), 2);
    assert!(brakes.contains(&rear));
    assert!(brakes.contains(&front));
    assert_eq!(city.stats.total_brakes, 2);

    arrived.sort();
    assert_eq!(arrived, vec![rear, front]);
}

#[test]
fn test_spawn_car_follows_route() {
    let mut city = seeded(0, 2, 2, 1);

    let network = city.network();
    let start = network.init_points()[0];
    let end = network
        .lane(start.lane)
        .map(|lane| lane.deepest_point())
        .expect("lane");

    let id = city.spawn_car(start, end).expect("reachable");
    let car = city.car(id).expect("spawned");
    assert_eq!(car.route().len(), 2);
    assert_eq!(car.state, CarState::Cruising);

    let trace = city.route_trace(id).expect("trace");
    assert_eq!(trace.first(), Some(&car.position));
}

#[test]
fn test_toggle_signals_mid_run() {
    let mut city = seeded(10, 4, 2, 9);

    for _ in 0..50 {
        city.tick(DELTA);
    }
    city.toggle_traffic_signals();
    assert!(!city.signals().is_installed());

    for _ in 0..50 {
        city.tick(DELTA);
        let snapshot = city.snapshot();
        assert!(snapshot.signals.iter().all(|s| !s.active));
    }

    city.toggle_traffic_signals();
    assert!(city.signals().is_installed());
    let cycle = city.signals().cycle().expect("installed");
    assert_eq!(cycle.group, 0);
}

#[test]
fn test_snapshot_reflects_state() {
    let mut city = seeded(6, 2, 2, 4);
    city.tick(DELTA);

    let snapshot = city.snapshot();
    assert_eq!(snapshot.time, city.time);
    assert_eq!(snapshot.cars.len(), city.car_count());
    assert_eq!(snapshot.signals.len(), city.signals().signals().len());
    assert_eq!(snapshot.lanes.len(), city.network().lanes().len());

    for pose in &snapshot.cars {
        let car = city.car(pose.id).expect("snapshot car exists");
        assert_eq!(pose.position, car.position);
        assert_eq!(pose.state, car.state);
    }
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let mut a = seeded(15, 6, 2, 1234);
    let mut b = seeded(15, 6, 2, 1234);

    for _ in 0..400 {
        a.tick(DELTA);
        b.tick(DELTA);
        assert_eq!(a.drain_events(), b.drain_events());
    }

    assert_eq!(a.snapshot(), b.snapshot());
    assert_eq!(a.stats, b.stats);
}

//! Route finding tests

use city_traffic::simulation::{
    CityConfig, Grid, LaneId, LanePoint, Navigator, Position, SimError, SimRoadNetwork,
    WayDirection,
};

fn two_road_network() -> SimRoadNetwork {
    SimRoadNetwork::generate(&CityConfig::new(0, 2, 2)).expect("two roads should build")
}

/// Inner forward lane of the given road
fn forward_lane(network: &SimRoadNetwork, road: usize) -> LaneId {
    network.roads()[road].way(WayDirection::Forward).lanes[0]
}

#[test]
fn test_route_to_same_point_is_single_point() {
    let network = two_road_network();
    let mut navigator = Navigator::new(&network);

    let lane = forward_lane(&network, 0);
    let point = LanePoint::new(lane, 0);
    let route = navigator.find_best_route(point, point).expect("trivial route");

    assert_eq!(route.len(), 1);
    assert_eq!(route[0].lane, lane);
    assert_eq!(
        route[0].position,
        network.point_position(point).expect("position")
    );
}

#[test]
fn test_route_along_one_lane() {
    let network = two_road_network();
    let mut navigator = Navigator::new(&network);

    let lane = network.lane(forward_lane(&network, 0)).expect("lane");
    let route = navigator
        .find_best_route(lane.init_point(), lane.deepest_point())
        .expect("straight route");

    assert_eq!(route.len(), 2);
    assert_eq!(route[0].position, lane.start());
    assert_eq!(route[1].position, lane.end());
    assert!(route.iter().all(|point| point.lane == lane.id));
}

#[test]
fn test_route_across_junction() {
    let network = two_road_network();
    let mut navigator = Navigator::new(&network);

    let row_lane = network.lane(forward_lane(&network, 0)).expect("row lane");
    let col_lane = network.lane(forward_lane(&network, 1)).expect("column lane");

    let route = navigator
        .find_best_route(row_lane.init_point(), col_lane.deepest_point())
        .expect("one transfer apart");

    // Start, the transfer point and the destination
    assert_eq!(route.len(), 3);
    assert_eq!(route[0].lane, row_lane.id);
    assert_eq!(route[0].position, row_lane.start());
    assert_eq!(route[1].lane, col_lane.id);
    assert_eq!(route[2].position, col_lane.end());

    let crossing = col_lane
        .crossing_index(row_lane.id)
        .and_then(|index| col_lane.waypoint(index))
        .expect("lanes cross");
    assert!(route[1].position.distance(&crossing.position) < 1e-3);
}

#[test]
fn test_disconnected_lanes_have_no_route() {
    let mut network = SimRoadNetwork::new(Grid::new(20, 10.0));
    network.add_road(
        "North".to_string(),
        Position::new(-90.0, 30.0),
        Position::new(90.0, 30.0),
        1,
    );
    network.add_road(
        "South".to_string(),
        Position::new(-90.0, -30.0),
        Position::new(90.0, -30.0),
        1,
    );
    network.build_junctions().expect("junction pass");
    network.finalize_transfers();

    let mut navigator = Navigator::new(&network);
    let from = network.lane(forward_lane(&network, 0)).expect("lane");
    let to = network.lane(forward_lane(&network, 1)).expect("lane");

    let result = navigator.find_best_route(from.init_point(), to.deepest_point());
    let err = result.expect_err("parallel roads are not connected");
    assert!(matches!(
        err.downcast_ref::<SimError>(),
        Some(SimError::NoRoute { .. })
    ));
}

#[test]
fn test_unknown_lane_is_rejected() {
    let network = two_road_network();
    let mut navigator = Navigator::new(&network);

    let valid = LanePoint::new(forward_lane(&network, 0), 0);
    let bogus = LanePoint::new(LaneId(1000), 0);

    let err = navigator.find_best_route(valid, bogus).unwrap_err();
    assert_eq!(
        err.downcast_ref::<SimError>(),
        Some(&SimError::UnknownLane(LaneId(1000)))
    );
}

#[test]
fn test_routes_are_deterministic() {
    let network = SimRoadNetwork::generate(&CityConfig::default()).expect("default city");
    let mut first = Navigator::new(&network);
    let mut second = Navigator::new(&network);

    let starts = network.init_points();
    let ends: Vec<LanePoint> = network.lanes().iter().map(|l| l.deepest_point()).collect();

    for (start, end) in starts.iter().zip(ends.iter().rev()) {
        let a = first.find_best_route(*start, *end);
        let b = second.find_best_route(*start, *end);
        match (a, b) {
            (Ok(a), Ok(b)) => {
                assert_eq!(a, b);
                // Cached answer matches the computed one
                assert_eq!(first.find_best_route(*start, *end).expect("cached"), a);
            }
            (Err(_), Err(_)) => {}
            _ => panic!("routing disagreed between identical navigators"),
        }
    }
}

#[test]
fn test_routes_only_change_lane_at_crossings() {
    let network = SimRoadNetwork::generate(&CityConfig::default()).expect("default city");
    let mut navigator = Navigator::new(&network);

    let start = network.init_points()[0];
    for lane in network.lanes() {
        let Ok(route) = navigator.find_best_route(start, lane.deepest_point()) else {
            continue;
        };
        assert!(!route.is_empty());
        assert_eq!(route.last().map(|p| p.lane), Some(lane.id));

        for pair in route.windows(2) {
            if pair[0].lane != pair[1].lane {
                let next = network.lane(pair[1].lane).expect("lane");
                let on_next = next
                    .waypoints()
                    .iter()
                    .any(|w| w.position.distance(&pair[1].position) < 1e-3);
                assert!(on_next, "transfer point must lie on the new lane");
            }
        }
    }
}

#[test]
fn test_navigator_graph_covers_every_waypoint() {
    let network = two_road_network();
    let navigator = Navigator::new(&network);

    let waypoints: usize = network.lanes().iter().map(|l| l.waypoints().len()).sum();
    assert_eq!(navigator.node_count(), waypoints);
}

//! End-to-end navigation on the simulated street grid

use crate::{GRID_NODES, StreetWorld, drifting_robot};
use chakra_io::devices::mock::render;
use chakra_io::{FileFrameSource, FrameSource, TimeoutActuator};
use marga_nav::config::NavigationConfig;
use marga_nav::localization::{BlobDetector, ColorRange, FixSource, PositionEstimator};
use marga_nav::{NavError, PixelPoint};
use std::time::Duration;

fn node(id: u64) -> PixelPoint {
    let (_, x, y) = GRID_NODES
        .iter()
        .copied()
        .find(|(n, _, _)| *n == id)
        .expect("grid node");
    PixelPoint::new(x, y)
}

#[test]
fn test_navigate_across_grid() {
    let world = StreetWorld::new();
    let mut driver = world.driver();
    let navigator = world.navigator(NavigationConfig::default());

    let start = driver.pose().expect("initial fix");
    assert_eq!((start.x, start.y), (100, 100));

    let report = navigator.navigate_to(&mut driver, 510, 290).unwrap();

    // Three streets to cross, every junction on the way reached
    assert_eq!(report.legs.len(), 4);
    assert_eq!(report.legs.first().unwrap().0.node_id, 1);
    assert_eq!(report.legs.last().unwrap().0.node_id, 6);
    assert!(report.all_arrived(), "{:?}", report);

    let truth = world.robot.true_pose();
    let goal = node(6);
    let miss = ((truth.x - goal.x as f32).powi(2) + (truth.y - goal.y as f32).powi(2)).sqrt();
    assert!(miss <= 20.0, "ended {:.1}px from node 6", miss);
    assert_eq!(world.robot.edge_hits(), 0);
}

#[test]
fn test_navigate_through_timeout_wrapper() {
    let world = StreetWorld::new();
    let link = TimeoutActuator::spawn(world.robot.actuator(), Duration::from_secs(5)).unwrap();
    let mut driver = world.driver_with(link);
    let navigator = world.navigator(NavigationConfig::default());

    let report = navigator.navigate_to(&mut driver, 300, 300).unwrap();
    assert!(report.all_arrived(), "{:?}", report);

    let pose = driver.pose().unwrap();
    assert!(PixelPoint::new(pose.x, pose.y).distance_to(node(5)) <= 20.0);
}

#[test]
fn test_robot_hidden_under_roof_uses_prediction() {
    let mut config = drifting_robot();
    // Roof over the street between nodes 1 and 2
    config.render.occluders.push(chakra_io::devices::mock::config::Occluder {
        x: 180,
        y: 60,
        width: 140,
        height: 80,
    });
    let world = StreetWorld::with_config(config);
    let mut driver = world.driver();
    let navigator = world.navigator(NavigationConfig::default());

    let route = navigator.plan_route(node(1), node(2)).unwrap();
    let report = navigator.follow_route(&mut driver, &route).unwrap();

    assert!(report.all_arrived(), "{:?}", report);
    assert_eq!(driver.estimator().last_fix(), FixSource::Predicted);
}

#[test]
fn test_unreachable_destination_surfaces_error() {
    let world = StreetWorld::new();
    let mut graph_nodes = world.graph.nodes().to_vec();
    graph_nodes.push(marga_nav::graph::GraphNode {
        id: 99,
        x: 590,
        y: 390,
    });
    let edges: Vec<marga_nav::graph::GraphEdge> = Vec::new();
    let isolated = marga_nav::StreetGraph::from_parts(graph_nodes, &edges, false).unwrap();
    let navigator = marga_nav::Navigator::new(isolated, NavigationConfig::default());
    let mut driver = world.driver();

    let err = navigator.navigate_to(&mut driver, 590, 390).unwrap_err();
    assert!(matches!(err, NavError::NoPathFound { to: 99, .. }));
    assert!(world.robot.command_history().is_empty());
}

#[test]
fn test_locate_from_snapshot_file() {
    let world = StreetWorld::new();
    world.robot.teleport(300.0, 300.0, 0.0);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("overhead.png");
    world.robot.camera().overhead_frame().unwrap().save(&path).unwrap();

    let mut camera = FileFrameSource::new(&path);
    let frame = camera.overhead_frame().unwrap();
    let detector = BlobDetector::new(ColorRange::for_robot(5).unwrap(), 350.0, 1000.0);
    let estimator = PositionEstimator::initialize(detector, 0.0, &frame, &world.street);

    let pose = estimator.pose().unwrap();
    assert_eq!((pose.x, pose.y), (300, 300));
    assert_eq!(estimator.last_fix(), FixSource::Detected { blobs: 1 });
    assert_eq!(*frame.get_pixel(300, 300), render::marker_color(2).unwrap());
}

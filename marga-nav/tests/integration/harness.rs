//! Street grid world shared by the scenarios

use chakra_io::devices::mock::config::{NoiseConfig, SimulationConfig};
use chakra_io::devices::mock::{SimActuator, SimCamera, SimulatedRobot};
use chakra_io::{Actuator, DrivabilityMask, FrameSource};
use image::{GrayImage, Luma};
use marga_nav::config::{MotionConfig, NavigationConfig};
use marga_nav::localization::{BlobDetector, ColorRange};
use marga_nav::{MotionDriver, Navigator, StreetGraph, StreetMasks};

pub const WIDTH: u32 = 600;
pub const HEIGHT: u32 = 400;

/// Half the street width in pixels
const HALF_STREET: i32 = 20;

/// Junction nodes: two east-west streets crossed by three north-south ones
pub const GRID_NODES: [(u64, i32, i32); 6] = [
    (1, 100, 100),
    (2, 300, 100),
    (3, 500, 100),
    (4, 100, 300),
    (5, 300, 300),
    (6, 500, 300),
];

const GRID_JSON: &str = r#"{
    "nodes": [
        {"id": 1, "x": 100, "y": 100},
        {"id": 2, "x": 300, "y": 100},
        {"id": 3, "x": 500, "y": 100},
        {"id": 4, "x": 100, "y": 300},
        {"id": 5, "x": 300, "y": 300},
        {"id": 6, "x": 500, "y": 300}
    ],
    "edges": [
        {"from": 1, "to": 2}, {"from": 2, "to": 3},
        {"from": 4, "to": 5}, {"from": 5, "to": 6},
        {"from": 1, "to": 4}, {"from": 2, "to": 5}, {"from": 3, "to": 6}
    ]
}"#;

/// Street mask with a band around every grid street
pub fn street_grid() -> DrivabilityMask {
    let rows = [100, 300];
    let cols = [100, 300, 500];
    let img = GrayImage::from_fn(WIDTH, HEIGHT, |x, y| {
        let (x, y) = (x as i32, y as i32);
        let on_row = rows.iter().any(|r| (y - r).abs() <= HALF_STREET);
        let on_col = cols.iter().any(|c| (x - c).abs() <= HALF_STREET);
        if on_row || on_col { Luma([255]) } else { Luma([0]) }
    });
    DrivabilityMask::from_image(img)
}

/// Simulated robot, street mask and graph
pub struct StreetWorld {
    pub robot: SimulatedRobot,
    pub street: DrivabilityMask,
    pub graph: StreetGraph,
}

/// Robot 2 at node 1 facing east, with a steady left drift the pursuit
/// correction compensates
pub fn drifting_robot() -> SimulationConfig {
    SimulationConfig {
        robot_id: 2,
        start_x: 100.0,
        start_y: 100.0,
        start_heading: 0.0,
        noise: NoiseConfig {
            heading_drift_deg: -3.0,
            ..NoiseConfig::none()
        },
        ..Default::default()
    }
}

impl StreetWorld {
    pub fn new() -> Self {
        Self::with_config(drifting_robot())
    }

    pub fn with_config(config: SimulationConfig) -> Self {
        let street = street_grid();
        let robot = SimulatedRobot::new(config, street.clone()).expect("simulated robot");
        let graph = StreetGraph::from_json(GRID_JSON).expect("grid graph");
        Self {
            robot,
            street,
            graph,
        }
    }

    pub fn navigator(&self, config: NavigationConfig) -> Navigator {
        Navigator::new(self.graph.clone(), config)
    }

    /// Driver detecting the marker on the street only
    pub fn driver(&self) -> MotionDriver<SimActuator, SimCamera> {
        self.driver_with(self.robot.actuator())
    }

    /// Driver using a custom actuator in front of the simulation
    pub fn driver_with<A: Actuator>(&self, actuator: A) -> MotionDriver<A, SimCamera> {
        driver(actuator, self.robot.camera(), &self.street)
    }
}

fn driver<A: Actuator, F: FrameSource>(
    actuator: A,
    camera: F,
    street: &DrivabilityMask,
) -> MotionDriver<A, F> {
    let detector = BlobDetector::new(ColorRange::for_robot(2).expect("range"), 350.0, 1000.0);
    MotionDriver::new(
        actuator,
        camera,
        detector,
        0.0,
        StreetMasks {
            detection: street.clone(),
            street: street.clone(),
        },
        MotionConfig::default(),
    )
    .expect("driver")
}

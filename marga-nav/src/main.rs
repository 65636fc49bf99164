//! MargaNav - drive an overhead-tracked robot through the streets
//!
//! ```text
//! marga-nav [--config marga.toml] navigate --x 420 --y 310
//! marga-nav walk --iterations 30 --duration 1.0
//! marga-nav locate
//! ```
//!
//! With `camera.source = "simulation"` (the default) the robot, camera and
//! IR sensors are simulated on top of the street mask. The file source reads
//! overhead snapshots from disk and supports `locate` only, since no robot
//! link is attached to it.

use chakra_io::devices::mock::SimulatedRobot;
use chakra_io::{Actuator, DrivabilityMask, FileFrameSource, FrameSource, TimeoutActuator};
use clap::{Parser, Subcommand};
use marga_nav::config::CameraSource;
use marga_nav::localization::{BlobDetector, ColorRange, PositionEstimator};
use marga_nav::navigation::random_walk;
use marga_nav::{MotionDriver, NavConfig, NavError, Navigator, Result, StreetGraph, StreetMasks};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (default: marga.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drive to the street node nearest a pixel position
    Navigate {
        #[arg(long)]
        x: i32,
        #[arg(long)]
        y: i32,
    },
    /// Wander along the streets
    Walk {
        #[arg(long, default_value = "30")]
        iterations: u32,
        /// Seconds per forward step
        #[arg(long, default_value = "1.0")]
        duration: f32,
        /// Random seed (default: from entropy)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the current position fix
    Locate,
}

type Driver = MotionDriver<Box<dyn Actuator>, Box<dyn FrameSource>>;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("marga_nav=info,chakra_io=info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    info!("MargaNav v{}", env!("CARGO_PKG_VERSION"));

    let street = load_mask(&config.streets.street_mask)?;
    let detection = match &config.vision.detection_mask {
        Some(path) => load_mask(path)?,
        None => street.clone(),
    };
    let range = ColorRange::for_robot(config.robot.id).ok_or_else(|| {
        NavError::Config(format!("No marker color range for robot {}", config.robot.id))
    })?;
    let detector = BlobDetector::new(range, config.vision.min_blob_area, config.vision.max_blob_area);
    let masks = StreetMasks { detection, street };

    match config.camera.source {
        CameraSource::File => run_file_source(&config, args.command, detector, &masks),
        CameraSource::Simulation => {
            let mut driver = simulated_driver(&config, detector, masks)?;
            run(&config, args.command, &mut driver)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<NavConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            NavConfig::load(path)
        }
        None if Path::new("marga.toml").exists() => {
            info!("Loading configuration from marga.toml");
            NavConfig::load(Path::new("marga.toml"))
        }
        None => {
            info!("Using default configuration");
            Ok(NavConfig::default())
        }
    }
}

fn load_mask(path: &Path) -> Result<DrivabilityMask> {
    DrivabilityMask::load(path).map_err(|e| NavError::Config(e.to_string()))
}

fn simulated_driver(config: &NavConfig, detector: BlobDetector, masks: StreetMasks) -> Result<Driver> {
    let mut sim_config = config.simulation.clone();
    if sim_config.robot_id != config.robot.id {
        warn!(
            "simulation.robot_id {} overridden by robot.id {}",
            sim_config.robot_id, config.robot.id
        );
        sim_config.robot_id = config.robot.id;
    }
    let robot = SimulatedRobot::new(sim_config, masks.street.clone())?;

    let actuator: Box<dyn Actuator> = match config.motion.command_timeout_ms {
        0 => Box::new(robot.actuator()),
        ms => Box::new(TimeoutActuator::spawn(
            robot.actuator(),
            Duration::from_millis(ms),
        )?),
    };
    let camera: Box<dyn FrameSource> = Box::new(robot.camera());

    let driver = MotionDriver::new(
        actuator,
        camera,
        detector,
        config.robot.initial_heading,
        masks,
        config.motion.clone(),
    )?
    .with_proximity(Box::new(robot.proximity_sensor()))
    .with_battery(Box::new(robot.battery()));
    Ok(driver)
}

fn run_file_source(
    config: &NavConfig,
    command: Command,
    detector: BlobDetector,
    masks: &StreetMasks,
) -> Result<()> {
    let Command::Locate = command else {
        return Err(NavError::Config(
            "camera.source = \"file\" supports only `locate`".to_string(),
        ));
    };

    let overhead = config
        .camera
        .overhead_path
        .as_ref()
        .ok_or_else(|| NavError::Config("camera.overhead_path not set".to_string()))?;
    let mut camera = FileFrameSource::new(overhead);
    if let Some(front) = &config.camera.front_path {
        camera = camera.with_front(front);
    }

    let frame = camera.overhead_frame()?;
    let estimator = PositionEstimator::initialize(
        detector,
        config.robot.initial_heading,
        &frame,
        &masks.detection,
    );
    report_fix(estimator.pose(), estimator.last_fix());
    Ok(())
}

fn run(config: &NavConfig, command: Command, driver: &mut Driver) -> Result<()> {
    match command {
        Command::Navigate { x, y } => {
            let graph = StreetGraph::load(&config.streets.graph)?;
            let navigator = Navigator::new(graph, config.navigation.clone());
            let report = navigator.navigate_to(driver, x, y)?;

            for (waypoint, outcome) in &report.legs {
                info!("  node {:>6}: {:?}", waypoint.node_id, outcome);
            }
            if report.all_arrived() {
                info!("Destination reached");
            } else {
                warn!(
                    "Route finished with {} missed waypoints",
                    report.exhausted().count()
                );
            }
        }
        Command::Walk {
            iterations,
            duration,
            seed,
        } => {
            let mut rng = match seed {
                Some(seed) => SmallRng::seed_from_u64(seed),
                None => SmallRng::from_entropy(),
            };
            random_walk(
                driver,
                iterations,
                duration,
                config.navigation.max_heading_samples,
                &mut rng,
            )?;
        }
        Command::Locate => {}
    }

    report_fix(driver.pose(), driver.estimator().last_fix());
    driver.battery()?;
    driver.stop()?;
    Ok(())
}

fn report_fix(pose: Option<marga_nav::Pose>, source: marga_nav::localization::FixSource) {
    match pose {
        Some(pose) => info!("Position {} ({:?})", pose, source),
        None => warn!("Position unresolved"),
    }
}

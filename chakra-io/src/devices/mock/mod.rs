//! Simulated robot for hardware-free navigation runs
//!
//! Replaces the remote robot link, the overhead camera and the IR sensors
//! with one shared simulated world:
//!
//! | Component | Simulation Method |
//! |-----------|-------------------|
//! | Forward / reverse | Calibrated duration→pixels model, drift + jitter |
//! | Turns, maneuvers | Heading update with angle noise |
//! | Overhead camera | Street layout + square color marker + roofs |
//! | Front camera | Flat placeholder frame |
//! | IR sensors | Ray-casting against the street mask |
//! | Battery | Linear drain with commanded motion time |
//!
//! # Configuration
//!
//! ```toml
//! [simulation]
//! robot_id = 2
//! start_x = 120.0
//! start_y = 80.0
//! start_heading = 0.0
//! random_seed = 42      # 0 = random each run
//! collision_mode = "stop"
//!
//! [simulation.noise]
//! heading_drift_deg = -3.5
//!
//! [[simulation.render.occluders]]
//! x = 300
//! y = 40
//! width = 60
//! height = 60
//! ```
//!
//! # Thread Model
//!
//! All handles share one `parking_lot::Mutex`-guarded world. Commands are
//! applied atomically; with a non-zero `realtime_factor` the actuator then
//! sleeps for the scaled command duration outside the lock, so camera reads
//! from another thread observe the post-command state.
//!
//! # Module Structure
//!
//! - [`config`]: Simulation parameters
//! - [`physics`]: Pixel-space kinematics and street-edge handling
//! - [`render`]: Overhead frame synthesis
//! - [`noise`]: Seeded motion errors

pub mod config;
mod noise;
pub mod physics;
pub mod render;

use config::SimulationConfig;
use noise::MotionNoise;
use physics::{CollisionMode, PhysicsState};

use crate::actuator::{Actuator, ActuatorCommand, DriveCommand, Maneuver, TurnCommand};
use crate::camera::FrameSource;
use crate::error::{Error, Result};
use crate::mask::DrivabilityMask;
use crate::sensors::{BatteryMonitor, BatteryStatus, ProximityReading, ProximitySensor};
use image::{Rgb, RgbImage};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Ground-truth pose of the simulated robot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TruePose {
    pub x: f32,
    pub y: f32,
    pub heading: f32,
}

struct SimState {
    config: SimulationConfig,
    street: DrivabilityMask,
    marker: Rgb<u8>,
    physics: PhysicsState,
    noise: MotionNoise,
    history: Vec<ActuatorCommand>,
    edge_hits: usize,
    busy_seconds: f32,
}

impl SimState {
    /// Apply a command and return how long it would take on the real robot
    fn apply(&mut self, command: ActuatorCommand) -> f32 {
        self.history.push(command);

        match command {
            ActuatorCommand::Forward(cmd) => {
                self.drive(cmd, 1.0);
                cmd.duration
            }
            ActuatorCommand::Reverse(cmd) => {
                self.drive(cmd, -1.0);
                cmd.duration
            }
            ActuatorCommand::TurnLeft(cmd) => {
                let error = self.noise.turn_error();
                self.physics.rotate(-cmd.angle + error);
                cmd.duration
            }
            ActuatorCommand::TurnRight(cmd) => {
                let error = self.noise.turn_error();
                self.physics.rotate(cmd.angle + error);
                cmd.duration
            }
            ActuatorCommand::Maneuver(maneuver) => {
                let error = self.noise.turn_error();
                self.physics.rotate(maneuver.heading_change() + error);
                match maneuver {
                    Maneuver::LeftCircle { step, .. } | Maneuver::RightCircle { step, .. } => {
                        step as f32
                    }
                    Maneuver::LeftUTurn { step, delay, .. }
                    | Maneuver::RightUTurn { step, delay, .. } => step as f32 * (1.0 + delay),
                }
            }
            ActuatorCommand::Stop => 0.0,
        }
    }

    fn drive(&mut self, cmd: DriveCommand, direction: f32) {
        let nominal = self.config.motion.travel(cmd.speed, cmd.duration);
        let distance = self.noise.travel(nominal);

        // Half the drift before moving, half after, approximating a gentle arc
        let drift = self.noise.drive_drift();
        self.physics.rotate(drift / 2.0);
        let blocked = self.physics.translate(direction * distance, &self.street);
        self.physics.rotate(drift / 2.0);

        if blocked {
            self.edge_hits += 1;
            log::warn!(
                "Simulated robot stopped at street edge ({:.1}, {:.1})",
                self.physics.x(),
                self.physics.y()
            );
        }
        log::debug!(
            "Simulated drive {:.1}px -> ({:.1}, {:.1}) heading {:.1}",
            direction * distance,
            self.physics.x(),
            self.physics.y(),
            self.physics.heading()
        );
    }
}

/// Shared simulated world
#[derive(Clone)]
pub struct SimulatedRobot {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedRobot {
    /// Create a simulated robot driving on `street`
    pub fn new(config: SimulationConfig, street: DrivabilityMask) -> Result<Self> {
        let marker = render::marker_color(config.robot_id).ok_or_else(|| {
            Error::InvalidParameter(format!("No marker color for robot {}", config.robot_id))
        })?;

        let physics = PhysicsState::new(
            config.start_x,
            config.start_y,
            config.start_heading,
            CollisionMode::from_config(&config.collision_mode),
        );
        let noise = MotionNoise::new(config.random_seed, config.noise.clone());

        log::info!(
            "Simulated robot {} at ({:.0}, {:.0}) heading {:.0}°, street {}x{}",
            config.robot_id,
            config.start_x,
            config.start_y,
            config.start_heading,
            street.width(),
            street.height()
        );

        Ok(Self {
            state: Arc::new(Mutex::new(SimState {
                config,
                street,
                marker,
                physics,
                noise,
                history: Vec::new(),
                edge_hits: 0,
                busy_seconds: 0.0,
            })),
        })
    }

    /// Actuator handle
    pub fn actuator(&self) -> SimActuator {
        SimActuator {
            state: Arc::clone(&self.state),
        }
    }

    /// Overhead and front camera handle
    pub fn camera(&self) -> SimCamera {
        SimCamera {
            state: Arc::clone(&self.state),
        }
    }

    /// IR sensor handle
    pub fn proximity_sensor(&self) -> SimProximity {
        SimProximity {
            state: Arc::clone(&self.state),
        }
    }

    /// Battery gauge handle
    pub fn battery(&self) -> SimBattery {
        SimBattery {
            state: Arc::clone(&self.state),
        }
    }

    /// Ground-truth pose
    pub fn true_pose(&self) -> TruePose {
        let state = self.state.lock();
        TruePose {
            x: state.physics.x(),
            y: state.physics.y(),
            heading: state.physics.heading(),
        }
    }

    /// Every command the actuator has received, in order
    pub fn command_history(&self) -> Vec<ActuatorCommand> {
        self.state.lock().history.clone()
    }

    /// How many drives were cut short by the street edge
    pub fn edge_hits(&self) -> usize {
        self.state.lock().edge_hits
    }

    /// Place the robot somewhere else without issuing a command
    pub fn teleport(&self, x: f32, y: f32, heading: f32) {
        let mut state = self.state.lock();
        let mode = CollisionMode::from_config(&state.config.collision_mode);
        state.physics = PhysicsState::new(x, y, heading, mode);
    }
}

/// Actuator backed by the simulated world
pub struct SimActuator {
    state: Arc<Mutex<SimState>>,
}

impl SimActuator {
    fn run(&mut self, command: ActuatorCommand) -> Result<()> {
        let (duration, factor) = {
            let mut state = self.state.lock();
            let duration = state.apply(command);
            state.busy_seconds += duration;
            (duration, state.config.realtime_factor)
        };

        if factor > 0.0 && duration > 0.0 {
            thread::sleep(Duration::from_secs_f32(duration * factor));
        }
        Ok(())
    }
}

impl Actuator for SimActuator {
    fn forward(&mut self, cmd: DriveCommand) -> Result<()> {
        self.run(ActuatorCommand::Forward(cmd))
    }

    fn reverse(&mut self, cmd: DriveCommand) -> Result<()> {
        self.run(ActuatorCommand::Reverse(cmd))
    }

    fn turn_left(&mut self, cmd: TurnCommand) -> Result<()> {
        self.run(ActuatorCommand::TurnLeft(cmd))
    }

    fn turn_right(&mut self, cmd: TurnCommand) -> Result<()> {
        self.run(ActuatorCommand::TurnRight(cmd))
    }

    fn maneuver(&mut self, maneuver: Maneuver) -> Result<()> {
        self.run(ActuatorCommand::Maneuver(maneuver))
    }

    fn stop(&mut self) -> Result<()> {
        self.run(ActuatorCommand::Stop)
    }
}

/// Camera backed by the simulated world
pub struct SimCamera {
    state: Arc<Mutex<SimState>>,
}

impl FrameSource for SimCamera {
    fn overhead_frame(&mut self) -> Result<RgbImage> {
        let state = self.state.lock();
        Ok(render::render_overhead(
            &state.street,
            &state.config.render,
            state.marker,
            state.physics.x(),
            state.physics.y(),
        ))
    }

    fn front_frame(&mut self) -> Result<RgbImage> {
        let state = self.state.lock();
        let (w, h) = state.config.render.front_size;
        Ok(RgbImage::from_pixel(w, h, Rgb(state.config.render.street_color)))
    }
}

/// IR sensors backed by the simulated world
pub struct SimProximity {
    state: Arc<Mutex<SimState>>,
}

impl ProximitySensor for SimProximity {
    fn read_proximity(&mut self) -> Result<ProximityReading> {
        let state = self.state.lock();
        let (x, y, heading) = (state.physics.x(), state.physics.y(), state.physics.heading());
        let range = state.config.proximity_range;

        // Closer edge = stronger reflection
        let beam = |offset: f32| -> u8 {
            let d = state.street.ray_cast(x, y, heading + offset, range);
            (255.0 * (1.0 - d / range)).clamp(0.0, 255.0) as u8
        };
        let ground = if state.street.is_drivable(x.round() as i32, y.round() as i32) {
            200
        } else {
            20
        };

        Ok(ProximityReading {
            front_right: beam(30.0),
            bottom_right: ground,
            back_right: beam(150.0),
            bottom_left: ground,
            back_left: beam(-150.0),
            front_left: beam(-30.0),
        })
    }
}

/// Battery gauge backed by the simulated world
pub struct SimBattery {
    state: Arc<Mutex<SimState>>,
}

impl BatteryMonitor for SimBattery {
    fn read_battery(&mut self) -> Result<BatteryStatus> {
        let state = self.state.lock();
        let battery = &state.config.battery;
        let charge = battery.charge(state.busy_seconds);
        Ok(BatteryStatus {
            percentage: (charge * 100.0).round() as u8,
            voltage: battery.voltage(charge),
        })
    }
}

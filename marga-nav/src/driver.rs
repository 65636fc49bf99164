//! Movement-issuing layer
//!
//! Wraps the actuator, the overhead camera and the pose estimator so every
//! movement follows the same sequence: store the dead-reckoning prediction,
//! optionally check clearance, command the robot, then update the pose
//! belief. A command that fails leaves the pose untouched.

use crate::clearance;
use crate::config::MotionConfig;
use crate::error::{NavError, Result};
use crate::geometry::{PixelPoint, normalize_angle, project_point};
use crate::localization::{BlobDetector, Pose, PositionEstimator};
use chakra_io::{
    Actuator, BatteryMonitor, BatteryStatus, DriveCommand, DrivabilityMask, FrameSource,
    Maneuver, ProximityReading, ProximitySensor, TurnCommand,
};

/// Speed the duration/distance calibration was measured at
pub const CALIBRATED_SPEED: f32 = 40.0;

/// Shortest forward command
const MIN_DRIVE_SECONDS: f32 = 0.1;

/// Linear duration ↔ pixel mapping for forward moves
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Calibration {
    /// Pixels per second
    pub slope: f32,
    /// Constant pixels per command
    pub offset: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            slope: 130.0,
            offset: 20.0,
        }
    }
}

impl Calibration {
    /// Whole pixels travelled in `duration` seconds
    pub fn distance_for_duration(&self, duration: f32, speed: f32) -> i32 {
        warn_uncalibrated(speed);
        (self.slope * duration + self.offset) as i32
    }

    /// Seconds needed for `distance` pixels, rounded to 0.1 s
    ///
    /// Never below the shortest commandable drive of 0.1 s.
    pub fn duration_for_distance(&self, distance: f32, speed: f32) -> f32 {
        warn_uncalibrated(speed);
        let seconds = ((distance - self.offset) / self.slope * 10.0).round() / 10.0;
        seconds.max(MIN_DRIVE_SECONDS)
    }
}

fn warn_uncalibrated(speed: f32) {
    if speed != CALIBRATED_SPEED {
        tracing::warn!(
            "No calibration for speed {}, using the one for {}",
            speed,
            CALIBRATED_SPEED
        );
    }
}

/// Parameters of one forward move
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForwardMove {
    pub speed: f32,
    /// Seconds per repetition
    pub duration: f32,
    /// Right turn issued before each repetition, not recorded in the heading
    pub correction: f32,
    pub repeat: u32,
    /// Refuse to move if the strip ahead leaves the street
    pub check_clearance: bool,
}

impl ForwardMove {
    pub fn new(speed: f32, duration: f32) -> Self {
        Self {
            speed,
            duration,
            correction: 4.0,
            repeat: 1,
            check_clearance: false,
        }
    }

    pub fn correction(mut self, degrees: f32) -> Self {
        self.correction = degrees;
        self
    }

    pub fn repeat(mut self, times: u32) -> Self {
        self.repeat = times;
        self
    }

    pub fn checked(mut self) -> Self {
        self.check_clearance = true;
        self
    }
}

/// Detection and street masks in overhead pixel coordinates
#[derive(Clone, Debug)]
pub struct StreetMasks {
    /// Where the robot's marker may be detected
    pub detection: DrivabilityMask,
    /// Where the robot may drive
    pub street: DrivabilityMask,
}

/// Robot handle used by the navigator
pub struct MotionDriver<A, F> {
    actuator: A,
    camera: F,
    estimator: PositionEstimator,
    masks: StreetMasks,
    motion: MotionConfig,
    calibration: Calibration,
    proximity: Option<Box<dyn ProximitySensor>>,
    last_proximity: Option<ProximityReading>,
    battery: Option<Box<dyn BatteryMonitor>>,
}

impl<A: Actuator, F: FrameSource> MotionDriver<A, F> {
    /// Create a driver and take the first position fix
    ///
    /// The robot may not be visible yet; the position then stays unresolved
    /// until a later fix.
    pub fn new(
        actuator: A,
        mut camera: F,
        detector: BlobDetector,
        initial_heading: f32,
        masks: StreetMasks,
        motion: MotionConfig,
    ) -> Result<Self> {
        let frame = camera.overhead_frame()?;
        let estimator =
            PositionEstimator::initialize(detector, initial_heading, &frame, &masks.detection);
        let calibration = Calibration {
            slope: motion.calibration_slope,
            offset: motion.calibration_offset,
        };

        Ok(Self {
            actuator,
            camera,
            estimator,
            masks,
            motion,
            calibration,
            proximity: None,
            last_proximity: None,
            battery: None,
        })
    }

    /// Read the proximity sensor after every movement
    pub fn with_proximity(mut self, sensor: Box<dyn ProximitySensor>) -> Self {
        self.proximity = Some(sensor);
        self
    }

    pub fn with_battery(mut self, gauge: Box<dyn BatteryMonitor>) -> Self {
        self.battery = Some(gauge);
        self
    }

    pub fn estimator(&self) -> &PositionEstimator {
        &self.estimator
    }

    pub fn pose(&self) -> Option<Pose> {
        self.estimator.pose()
    }

    pub fn street_mask(&self) -> &DrivabilityMask {
        &self.masks.street
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    pub fn motion(&self) -> &MotionConfig {
        &self.motion
    }

    pub fn last_proximity(&self) -> Option<ProximityReading> {
        self.last_proximity
    }

    /// Front camera frame
    pub fn front_frame(&mut self) -> Result<image::RgbImage> {
        Ok(self.camera.front_frame()?)
    }

    /// Forward move with the configured speed and drift correction
    pub fn forward_move(&self, duration: f32) -> ForwardMove {
        ForwardMove::new(self.motion.speed, duration).correction(self.motion.forward_correction)
    }

    /// Take a fresh position fix
    pub fn localize(&mut self) -> Result<Option<Pose>> {
        let frame = self.camera.overhead_frame()?;
        Ok(self.estimator.estimate(&frame, &self.masks.detection))
    }

    fn current_pose(&self) -> Result<Pose> {
        self.estimator.pose().ok_or(NavError::PositionUnresolved)
    }

    /// Drive forward and re-localize
    ///
    /// Fails with `ObstacleAhead` before any command is issued if clearance
    /// checking is requested and the strip ahead leaves the street.
    pub fn forward(&mut self, mv: ForwardMove) -> Result<Option<Pose>> {
        let pose = self.current_pose()?;
        let travel = self
            .calibration
            .distance_for_duration(mv.duration * mv.repeat as f32, mv.speed);

        if mv.check_clearance
            && !clearance::is_clear(pose.position(), pose.heading, travel as f32, &self.masks.street)
        {
            tracing::warn!("Obstacle in path at heading {:.0}°", pose.heading);
            return Err(NavError::ObstacleAhead {
                heading: pose.heading,
                distance: travel as f32,
            });
        }

        // Only a move that actually goes ahead may leave a prediction behind
        let expected = project_point(pose.position(), pose.heading, travel as f32);
        self.estimator.set_prediction(expected);

        for _ in 0..mv.repeat {
            if mv.correction != 0.0 {
                self.command_turn(mv.correction, 1.0)?;
            }
            self.actuator
                .forward(DriveCommand::new(mv.speed, mv.duration))?;
        }
        tracing::info!("Forward {}px towards {}", travel, expected);

        let pose = self.localize()?;
        self.read_proximity();
        Ok(pose)
    }

    /// Drive backwards and re-localize
    pub fn reverse(&mut self, duration: f32) -> Result<Option<Pose>> {
        let speed = self.motion.reverse_speed;
        if let Some(pose) = self.estimator.pose() {
            let travel = self.calibration.distance_for_duration(duration, speed);
            let behind = normalize_angle(pose.heading + 180.0);
            self.estimator
                .set_prediction(project_point(pose.position(), behind, travel as f32));
        }

        self.actuator.reverse(DriveCommand::new(speed, duration))?;
        tracing::info!("Reverse for {:.1}s", duration);

        let frame = self.camera.overhead_frame()?;
        let pose = self
            .estimator
            .estimate_reversing(&frame, &self.masks.detection);
        self.read_proximity();
        Ok(pose)
    }

    /// Turn in place; negative = left, positive = right
    ///
    /// The heading belief is updated by the commanded angle once the robot
    /// acknowledges.
    pub fn turn(&mut self, angle: f32) -> Result<()> {
        if angle == 0.0 {
            tracing::debug!("Zero turn skipped");
            return Ok(());
        }
        let duration = if angle.abs() > 90.0 {
            angle.abs() / 90.0
        } else {
            1.0
        };

        self.command_turn(angle, duration)?;
        self.estimator.record_turn(angle);
        tracing::info!(
            "Turn {} {:.0}°, heading now {:.0}°",
            if angle < 0.0 { "left" } else { "right" },
            angle.abs(),
            self.estimator.heading()
        );

        self.read_proximity();
        Ok(())
    }

    fn command_turn(&mut self, angle: f32, duration: f32) -> Result<()> {
        if angle < 0.0 {
            self.actuator.turn_left(TurnCommand::new(-angle, duration))?;
        } else {
            self.actuator.turn_right(TurnCommand::new(angle, duration))?;
        }
        Ok(())
    }

    /// Turn to face `(x, y)`
    pub fn turn_towards(&mut self, x: i32, y: i32) -> Result<()> {
        let angle = self
            .estimator
            .turn_angle_towards(x, y)
            .ok_or(NavError::PositionUnresolved)?;
        tracing::debug!("Turn angle towards ({}, {}) is {:.0}°", x, y, angle);
        self.turn(angle)
    }

    /// Face `(x, y)`, drive the calibrated distance towards it and report
    /// the remaining distance
    pub fn drive_towards(&mut self, x: i32, y: i32) -> Result<f32> {
        self.turn_towards(x, y)?;

        let distance = self.distance_to(x, y)?;
        let duration = self
            .calibration
            .duration_for_distance(distance, self.motion.speed);
        tracing::debug!(
            "Distance towards ({}, {}) is {:.1}, driving {:.1}s",
            x,
            y,
            distance,
            duration
        );

        self.forward(
            ForwardMove::new(self.motion.speed, duration).correction(self.motion.pursuit_correction),
        )?;

        let remaining = self.distance_to(x, y)?;
        tracing::info!("After drive, distance to ({}, {}) is {:.1}", x, y, remaining);
        Ok(remaining)
    }

    /// Distance from the believed position to `(x, y)`
    pub fn distance_to(&self, x: i32, y: i32) -> Result<f32> {
        self.estimator
            .distance_to(x, y)
            .ok_or(NavError::PositionUnresolved)
    }

    /// Run a firmware maneuver and apply its nominal heading change
    pub fn maneuver(&mut self, maneuver: Maneuver) -> Result<()> {
        self.actuator.maneuver(maneuver)?;
        self.estimator.record_turn(maneuver.heading_change());
        tracing::info!("Maneuver {:?} done", maneuver);
        self.read_proximity();
        Ok(())
    }

    /// Hard brake
    pub fn stop(&mut self) -> Result<()> {
        self.actuator.stop()?;
        tracing::info!("Hard brake");
        Ok(())
    }

    /// Whether the strip along `heading` stays on the street for `distance`
    pub fn path_clear(&self, heading: f32, distance: f32) -> Result<bool> {
        let position: PixelPoint = self.current_pose()?.position();
        Ok(clearance::is_clear(position, heading, distance, &self.masks.street))
    }

    /// Current battery charge, `None` without an attached gauge
    pub fn battery(&mut self) -> Result<Option<BatteryStatus>> {
        let Some(gauge) = self.battery.as_mut() else {
            return Ok(None);
        };
        let status = gauge.read_battery()?;
        if status.is_low() {
            tracing::warn!("Battery low: {}% ({:.2} V)", status.percentage, status.voltage);
        } else {
            tracing::info!("Battery {}% ({:.2} V)", status.percentage, status.voltage);
        }
        Ok(Some(status))
    }

    fn read_proximity(&mut self) {
        let Some(sensor) = self.proximity.as_mut() else {
            return;
        };
        match sensor.read_proximity() {
            Ok(reading) => {
                tracing::debug!("IR {:?}", reading.channels());
                self.last_proximity = Some(reading);
            }
            Err(e) => tracing::warn!("Proximity read failed: {}", e),
        }
    }
}

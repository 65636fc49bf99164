//! Configuration loading for MargaNav

use crate::error::{NavError, Result};
use crate::navigation::ExhaustedPolicy;
use chakra_io::devices::mock::config::SimulationConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NavConfig {
    #[serde(default)]
    pub robot: RobotConfig,
    #[serde(default)]
    pub vision: VisionConfig,
    #[serde(default)]
    pub streets: StreetsConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Robot identity and starting belief
#[derive(Clone, Debug, Deserialize)]
pub struct RobotConfig {
    /// Robot identity, selects the marker color range (default: 2)
    #[serde(default = "default_robot_id")]
    pub id: u8,

    /// Heading assumed before the first movement (degrees, default: 0)
    #[serde(default)]
    pub initial_heading: f32,
}

/// Marker detection settings
#[derive(Clone, Debug, Deserialize)]
pub struct VisionConfig {
    /// Region where the robot may be detected (default: street mask)
    #[serde(default)]
    pub detection_mask: Option<PathBuf>,

    /// Smallest accepted blob contour area in pixels (default: 350)
    #[serde(default = "default_min_blob_area")]
    pub min_blob_area: f32,

    /// Largest accepted blob contour area in pixels (default: 1000)
    #[serde(default = "default_max_blob_area")]
    pub max_blob_area: f32,
}

/// Street map inputs
#[derive(Clone, Debug, Deserialize)]
pub struct StreetsConfig {
    /// Drivability bitmap used for clearance checks
    #[serde(default = "default_street_mask")]
    pub street_mask: PathBuf,

    /// Street graph JSON
    #[serde(default = "default_graph")]
    pub graph: PathBuf,
}

/// Motion calibration
#[derive(Clone, Debug, Deserialize)]
pub struct MotionConfig {
    /// Forward speed (robot units, default: 40)
    #[serde(default = "default_speed")]
    pub speed: f32,

    /// Pixels per second of forward travel at 40 (default: 130)
    #[serde(default = "default_calibration_slope")]
    pub calibration_slope: f32,

    /// Constant pixel offset per forward command (default: 20)
    #[serde(default = "default_calibration_offset")]
    pub calibration_offset: f32,

    /// Right turn issued before each plain forward move (degrees, default: 4)
    #[serde(default = "default_forward_correction")]
    pub forward_correction: f32,

    /// Right turn issued before each waypoint pursuit move (degrees, default: 3)
    #[serde(default = "default_pursuit_correction")]
    pub pursuit_correction: f32,

    /// Reverse speed (robot units, default: 20)
    #[serde(default = "default_reverse_speed")]
    pub reverse_speed: f32,

    /// Actuator acknowledgement timeout in milliseconds (default: 15000, 0 = wait forever)
    #[serde(default = "default_command_timeout")]
    pub command_timeout_ms: u64,
}

/// Route following settings
#[derive(Clone, Debug, Deserialize)]
pub struct NavigationConfig {
    /// Distance at which a waypoint counts as reached (pixels, default: 20)
    #[serde(default = "default_waypoint_tolerance")]
    pub waypoint_tolerance: f32,

    /// Pursuit attempts per waypoint (default: 2)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// What to do when a waypoint is not reached (default: skip)
    #[serde(default)]
    pub exhausted_policy: ExhaustedPolicy,

    /// Random headings tried per obstruction during a random walk (default: 360)
    #[serde(default = "default_max_heading_samples")]
    pub max_heading_samples: u32,
}

/// Where frames come from
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CameraSource {
    /// Rendered by the simulated robot
    #[default]
    Simulation,
    /// Snapshots written to disk by an external grabber
    File,
}

/// Camera settings
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CameraConfig {
    #[serde(default)]
    pub source: CameraSource,

    /// Overhead snapshot path (file source only)
    #[serde(default)]
    pub overhead_path: Option<PathBuf>,

    /// Front camera snapshot path (file source only)
    #[serde(default)]
    pub front_path: Option<PathBuf>,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            id: default_robot_id(),
            initial_heading: 0.0,
        }
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            detection_mask: None,
            min_blob_area: default_min_blob_area(),
            max_blob_area: default_max_blob_area(),
        }
    }
}

impl Default for StreetsConfig {
    fn default() -> Self {
        Self {
            street_mask: default_street_mask(),
            graph: default_graph(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            calibration_slope: default_calibration_slope(),
            calibration_offset: default_calibration_offset(),
            forward_correction: default_forward_correction(),
            pursuit_correction: default_pursuit_correction(),
            reverse_speed: default_reverse_speed(),
            command_timeout_ms: default_command_timeout(),
        }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            waypoint_tolerance: default_waypoint_tolerance(),
            max_attempts: default_max_attempts(),
            exhausted_policy: ExhaustedPolicy::default(),
            max_heading_samples: default_max_heading_samples(),
        }
    }
}

// Default value functions
fn default_robot_id() -> u8 {
    2
}
fn default_min_blob_area() -> f32 {
    350.0
}
fn default_max_blob_area() -> f32 {
    1000.0
}
fn default_street_mask() -> PathBuf {
    PathBuf::from("data/street_mask.png")
}
fn default_graph() -> PathBuf {
    PathBuf::from("data/streets.json")
}

// Motion defaults
fn default_speed() -> f32 {
    40.0
}
fn default_calibration_slope() -> f32 {
    130.0
}
fn default_calibration_offset() -> f32 {
    20.0
}
fn default_forward_correction() -> f32 {
    4.0
}
fn default_pursuit_correction() -> f32 {
    3.0
}
fn default_reverse_speed() -> f32 {
    20.0
}
fn default_command_timeout() -> u64 {
    15_000
}

// Navigation defaults
fn default_waypoint_tolerance() -> f32 {
    20.0
}
fn default_max_attempts() -> u32 {
    2
}
fn default_max_heading_samples() -> u32 {
    360
}

impl NavConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NavError::Config(format!("Failed to read config file: {}", e)))?;
        let config: NavConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no run could succeed with
    pub fn validate(&self) -> Result<()> {
        if !self.robot.initial_heading.is_finite() {
            return Err(NavError::Config(format!(
                "initial_heading must be finite, got {}",
                self.robot.initial_heading
            )));
        }
        if self.vision.min_blob_area > self.vision.max_blob_area {
            return Err(NavError::Config(format!(
                "min_blob_area {} exceeds max_blob_area {}",
                self.vision.min_blob_area, self.vision.max_blob_area
            )));
        }
        if self.motion.calibration_slope <= 0.0 {
            return Err(NavError::Config(
                "calibration_slope must be positive".to_string(),
            ));
        }
        if self.navigation.max_attempts == 0 {
            return Err(NavError::Config("max_attempts must be at least 1".to_string()));
        }
        if self.camera.source == CameraSource::File && self.camera.overhead_path.is_none() {
            return Err(NavError::Config(
                "camera.source = \"file\" requires camera.overhead_path".to_string(),
            ));
        }
        Ok(())
    }
}

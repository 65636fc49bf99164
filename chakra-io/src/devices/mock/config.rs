//! Mock robot simulation configuration
//!
//! Every parameter has a default matching the classroom robots and the
//! overhead camera they are tracked with, so a bare `[simulation]` table is
//! enough for basic runs.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! SimulationConfig
//! ├── robot_id, start_x/y/heading    # Which robot, where it starts
//! ├── random_seed, realtime_factor   # Simulation control
//! ├── collision_mode                 # What happens at the street edge
//! ├── MotionModelConfig              # Speed/duration calibration
//! ├── NoiseConfig                    # Drift and jitter
//! ├── BatteryConfig                  # Drain with commanded motion time
//! └── RenderConfig                   # Overhead frame synthesis
//!     └── occluders                  # Areas hiding the robot from the camera
//! ```

use serde::Deserialize;

/// Rectangle in overhead pixel coordinates
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct Occluder {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Occluder {
    /// Check whether a pixel position lies under this occluder
    pub fn covers(&self, x: f32, y: f32) -> bool {
        x >= self.x as f32
            && y >= self.y as f32
            && x < (self.x + self.width) as f32
            && y < (self.y + self.height) as f32
    }
}

/// Calibrated relation between commanded duration and travelled pixels
#[derive(Debug, Clone, Deserialize)]
pub struct MotionModelConfig {
    /// Pixels per second at the reference speed
    #[serde(default = "default_pixels_per_second")]
    pub pixels_per_second: f32,

    /// Constant pixels added per forward command (acceleration overshoot)
    #[serde(default = "default_offset_pixels")]
    pub offset_pixels: f32,

    /// Speed at which the calibration was measured
    #[serde(default = "default_reference_speed")]
    pub reference_speed: f32,
}

fn default_pixels_per_second() -> f32 {
    130.0
}
fn default_offset_pixels() -> f32 {
    20.0
}
fn default_reference_speed() -> f32 {
    40.0
}

impl Default for MotionModelConfig {
    fn default() -> Self {
        Self {
            pixels_per_second: default_pixels_per_second(),
            offset_pixels: default_offset_pixels(),
            reference_speed: default_reference_speed(),
        }
    }
}

impl MotionModelConfig {
    /// Pixels travelled by one forward command
    pub fn travel(&self, speed: f32, duration: f32) -> f32 {
        if duration <= 0.0 || speed <= 0.0 {
            return 0.0;
        }
        (self.pixels_per_second * duration + self.offset_pixels) * (speed / self.reference_speed)
    }
}

/// Drift and jitter applied to simulated motion
#[derive(Debug, Clone, Deserialize)]
pub struct NoiseConfig {
    /// Systematic heading change per forward command (degrees, negative = left)
    #[serde(default = "default_heading_drift")]
    pub heading_drift_deg: f32,

    /// Heading jitter per forward command (degrees, stddev)
    #[serde(default = "default_heading_stddev")]
    pub heading_stddev_deg: f32,

    /// Relative travel distance error (stddev, fraction of distance)
    #[serde(default = "default_distance_stddev")]
    pub distance_stddev: f32,

    /// Turn angle error (degrees, stddev)
    #[serde(default = "default_turn_stddev")]
    pub turn_stddev_deg: f32,
}

fn default_heading_drift() -> f32 {
    -3.5
}
fn default_heading_stddev() -> f32 {
    1.0
}
fn default_distance_stddev() -> f32 {
    0.05
}
fn default_turn_stddev() -> f32 {
    2.0
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            heading_drift_deg: default_heading_drift(),
            heading_stddev_deg: default_heading_stddev(),
            distance_stddev: default_distance_stddev(),
            turn_stddev_deg: default_turn_stddev(),
        }
    }
}

impl NoiseConfig {
    /// Noise-free motion
    pub fn none() -> Self {
        Self {
            heading_drift_deg: 0.0,
            heading_stddev_deg: 0.0,
            distance_stddev: 0.0,
            turn_stddev_deg: 0.0,
        }
    }
}

/// Single-cell battery drained by commanded motion time
#[derive(Debug, Clone, Deserialize)]
pub struct BatteryConfig {
    /// Voltage at full charge
    #[serde(default = "default_full_voltage")]
    pub full_voltage: f32,

    /// Voltage at which the robot reports 0%
    #[serde(default = "default_empty_voltage")]
    pub empty_voltage: f32,

    /// Seconds of commanded motion from full to empty
    #[serde(default = "default_runtime_seconds")]
    pub runtime_seconds: f32,
}

fn default_full_voltage() -> f32 {
    4.2
}
fn default_empty_voltage() -> f32 {
    3.3
}
fn default_runtime_seconds() -> f32 {
    3600.0
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            full_voltage: default_full_voltage(),
            empty_voltage: default_empty_voltage(),
            runtime_seconds: default_runtime_seconds(),
        }
    }
}

impl BatteryConfig {
    /// Remaining charge fraction after `busy_seconds` of motion
    pub fn charge(&self, busy_seconds: f32) -> f32 {
        if self.runtime_seconds <= 0.0 {
            return 0.0;
        }
        (1.0 - busy_seconds / self.runtime_seconds).clamp(0.0, 1.0)
    }

    /// Cell voltage at a charge fraction (linear discharge curve)
    pub fn voltage(&self, charge: f32) -> f32 {
        self.empty_voltage + (self.full_voltage - self.empty_voltage) * charge
    }
}

/// Overhead frame synthesis
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Edge length of the square color marker on the robot (pixels)
    #[serde(default = "default_blob_size")]
    pub blob_size: u32,

    /// Street surface color
    #[serde(default = "default_street_color")]
    pub street_color: [u8; 3],

    /// Color of everything off-street
    #[serde(default = "default_ground_color")]
    pub ground_color: [u8; 3],

    /// Roofs and other areas that hide the robot from the camera
    #[serde(default)]
    pub occluders: Vec<Occluder>,

    /// Front camera frame size (width, height)
    #[serde(default = "default_front_size")]
    pub front_size: (u32, u32),
}

fn default_blob_size() -> u32 {
    24
}
fn default_street_color() -> [u8; 3] {
    [110, 110, 110]
}
fn default_ground_color() -> [u8; 3] {
    [70, 80, 70]
}
fn default_front_size() -> (u32, u32) {
    (160, 120)
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            blob_size: default_blob_size(),
            street_color: default_street_color(),
            ground_color: default_ground_color(),
            occluders: Vec::new(),
            front_size: default_front_size(),
        }
    }
}

/// Top-level simulation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Robot identity (selects the marker color)
    #[serde(default = "default_robot_id")]
    pub robot_id: u8,

    /// Start column (pixels)
    #[serde(default = "default_start_x")]
    pub start_x: f32,

    /// Start row (pixels)
    #[serde(default = "default_start_y")]
    pub start_y: f32,

    /// Start heading (degrees, clockwise from +x in image coordinates)
    #[serde(default)]
    pub start_heading: f32,

    /// Random seed (0 = random each run)
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,

    /// Sleep commanded durations scaled by this factor (0 = instantaneous)
    #[serde(default)]
    pub realtime_factor: f32,

    /// "stop" halts at the street edge, "passthrough" ignores it
    #[serde(default = "default_collision_mode")]
    pub collision_mode: String,

    /// Range of the simulated IR sensors (pixels)
    #[serde(default = "default_proximity_range")]
    pub proximity_range: f32,

    #[serde(default)]
    pub motion: MotionModelConfig,

    #[serde(default)]
    pub noise: NoiseConfig,

    #[serde(default)]
    pub battery: BatteryConfig,

    #[serde(default)]
    pub render: RenderConfig,
}

fn default_robot_id() -> u8 {
    2
}
fn default_start_x() -> f32 {
    100.0
}
fn default_start_y() -> f32 {
    100.0
}
fn default_random_seed() -> u64 {
    42
}
fn default_collision_mode() -> String {
    "stop".to_string()
}
fn default_proximity_range() -> f32 {
    60.0
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            robot_id: default_robot_id(),
            start_x: default_start_x(),
            start_y: default_start_y(),
            start_heading: 0.0,
            random_seed: default_random_seed(),
            realtime_factor: 0.0,
            collision_mode: default_collision_mode(),
            proximity_range: default_proximity_range(),
            motion: MotionModelConfig::default(),
            noise: NoiseConfig::default(),
            battery: BatteryConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_travel_calibration() {
        let motion = MotionModelConfig::default();
        assert_eq!(motion.travel(40.0, 1.0), 150.0);
        assert_eq!(motion.travel(20.0, 1.0), 75.0);
        assert_eq!(motion.travel(40.0, 0.0), 0.0);
    }

    #[test]
    fn test_battery_drain() {
        let battery = BatteryConfig::default();
        assert_eq!(battery.charge(0.0), 1.0);
        assert_eq!(battery.charge(1800.0), 0.5);
        assert_eq!(battery.charge(10_000.0), 0.0);
        assert_eq!(battery.voltage(1.0), 4.2);
        assert_eq!(battery.voltage(0.0), 3.3);
    }

    #[test]
    fn test_occluder_covers() {
        let roof = Occluder {
            x: 10,
            y: 10,
            width: 20,
            height: 5,
        };
        assert!(roof.covers(10.0, 10.0));
        assert!(roof.covers(29.9, 14.9));
        assert!(!roof.covers(30.0, 12.0));
        assert!(!roof.covers(15.0, 9.0));
    }
}

//! ChakraIO - Robot-side collaborators for overhead-tracked navigation
//!
//! This library provides the interfaces the navigation core talks through,
//! plus a simulated robot for hardware-free runs.
//!
//! - [`actuator`]: blocking actuator link and command value objects
//! - [`timeout`]: per-command acknowledgement timeout around any actuator
//! - [`camera`]: overhead / front frame sources
//! - [`sensors`]: IR proximity and battery readings
//! - [`mask`]: drivability bitmaps
//!
//! ## Features
//!
//! - `mock`: simulated robot (enabled by default)

pub mod actuator;
pub mod camera;
pub mod devices;
pub mod error;
pub mod mask;
pub mod sensors;
pub mod timeout;

// Re-export commonly used types
pub use actuator::{Actuator, ActuatorCommand, DriveCommand, Maneuver, TurnCommand};
pub use camera::{FileFrameSource, FrameSource};
pub use error::{Error, Result};
pub use mask::DrivabilityMask;
pub use sensors::{BatteryMonitor, BatteryStatus, ProximityReading, ProximitySensor};
pub use timeout::TimeoutActuator;

//! Proximity (IR) and battery sensor interfaces

use crate::error::Result;

/// Number of IR channels on the robot
pub const PROXIMITY_CHANNELS: usize = 6;

/// One reading of all IR channels
///
/// Channel order is fixed by the firmware and independent of position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProximityReading {
    pub front_right: u8,
    pub bottom_right: u8,
    pub back_right: u8,
    pub bottom_left: u8,
    pub back_left: u8,
    pub front_left: u8,
}

impl ProximityReading {
    /// Build from the firmware's ordered channel vector
    pub fn from_channels(values: [u8; PROXIMITY_CHANNELS]) -> Self {
        Self {
            front_right: values[0],
            bottom_right: values[1],
            back_right: values[2],
            bottom_left: values[3],
            back_left: values[4],
            front_left: values[5],
        }
    }

    /// Channels in firmware order
    pub fn channels(&self) -> [u8; PROXIMITY_CHANNELS] {
        [
            self.front_right,
            self.bottom_right,
            self.back_right,
            self.bottom_left,
            self.back_left,
            self.front_left,
        ]
    }
}

/// IR proximity sensor access
pub trait ProximitySensor {
    fn read_proximity(&mut self) -> Result<ProximityReading>;
}

impl<S: ProximitySensor + ?Sized> ProximitySensor for Box<S> {
    fn read_proximity(&mut self) -> Result<ProximityReading> {
        (**self).read_proximity()
    }
}

/// Battery charge as reported by the robot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BatteryStatus {
    /// Charge level (0-100%)
    pub percentage: u8,
    /// Cell voltage in volts
    pub voltage: f32,
}

impl BatteryStatus {
    /// Check if battery is low (< 20%)
    pub fn is_low(&self) -> bool {
        self.percentage < 20
    }
}

/// Battery gauge access
pub trait BatteryMonitor {
    fn read_battery(&mut self) -> Result<BatteryStatus>;
}

impl<B: BatteryMonitor + ?Sized> BatteryMonitor for Box<B> {
    fn read_battery(&mut self) -> Result<BatteryStatus> {
        (**self).read_battery()
    }
}

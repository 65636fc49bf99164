//! Actuator interface and motion command definitions
//!
//! Every call blocks until the remote unit reports completion. Actuators
//! return no position feedback; localization is the caller's concern.

use crate::error::Result;

/// Straight-line drive intent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveCommand {
    /// Motor speed in robot units (0-100)
    pub speed: f32,
    /// Duration in seconds
    pub duration: f32,
}

impl DriveCommand {
    pub fn new(speed: f32, duration: f32) -> Self {
        Self { speed, duration }
    }
}

/// In-place turn intent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnCommand {
    /// Unsigned turn angle in degrees
    pub angle: f32,
    /// Duration in seconds
    pub duration: f32,
}

impl TurnCommand {
    pub fn new(angle: f32, duration: f32) -> Self {
        Self { angle, duration }
    }
}

/// Fixed maneuver primitives provided by the robot firmware
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Maneuver {
    /// Full circle turning left
    LeftCircle { speed: f32, step: u32 },
    /// Full circle turning right
    RightCircle { speed: f32, step: u32 },
    /// U-turn to the left
    LeftUTurn { speed: f32, step: u32, delay: f32 },
    /// U-turn to the right
    RightUTurn { speed: f32, step: u32, delay: f32 },
}

impl Maneuver {
    pub fn left_circle() -> Self {
        Self::LeftCircle { speed: 30.0, step: 2 }
    }

    pub fn right_circle() -> Self {
        Self::RightCircle { speed: 30.0, step: 2 }
    }

    pub fn left_u_turn() -> Self {
        Self::LeftUTurn {
            speed: 30.0,
            step: 4,
            delay: 0.02,
        }
    }

    pub fn right_u_turn() -> Self {
        Self::RightUTurn {
            speed: 30.0,
            step: 4,
            delay: 0.02,
        }
    }

    /// Net heading change in degrees (positive = clockwise)
    pub fn heading_change(&self) -> f32 {
        match self {
            Self::LeftCircle { .. } | Self::RightCircle { .. } => 0.0,
            Self::LeftUTurn { .. } => -180.0,
            Self::RightUTurn { .. } => 180.0,
        }
    }
}

/// A single actuator command, used where commands cross a thread boundary
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorCommand {
    Forward(DriveCommand),
    Reverse(DriveCommand),
    TurnLeft(TurnCommand),
    TurnRight(TurnCommand),
    Maneuver(Maneuver),
    Stop,
}

impl ActuatorCommand {
    /// Get command type as string
    pub fn command_type(&self) -> &'static str {
        match self {
            Self::Forward(_) => "forward",
            Self::Reverse(_) => "reverse",
            Self::TurnLeft(_) => "turn_left",
            Self::TurnRight(_) => "turn_right",
            Self::Maneuver(_) => "maneuver",
            Self::Stop => "stop",
        }
    }
}

/// Remote actuator link
///
/// Implementations block until the remote side acknowledges the command.
pub trait Actuator {
    fn forward(&mut self, cmd: DriveCommand) -> Result<()>;

    fn reverse(&mut self, cmd: DriveCommand) -> Result<()>;

    fn turn_left(&mut self, cmd: TurnCommand) -> Result<()>;

    fn turn_right(&mut self, cmd: TurnCommand) -> Result<()>;

    fn maneuver(&mut self, maneuver: Maneuver) -> Result<()>;

    /// Hard brake
    fn stop(&mut self) -> Result<()>;

    /// Dispatch a command value to the matching method
    fn execute(&mut self, command: ActuatorCommand) -> Result<()> {
        match command {
            ActuatorCommand::Forward(cmd) => self.forward(cmd),
            ActuatorCommand::Reverse(cmd) => self.reverse(cmd),
            ActuatorCommand::TurnLeft(cmd) => self.turn_left(cmd),
            ActuatorCommand::TurnRight(cmd) => self.turn_right(cmd),
            ActuatorCommand::Maneuver(m) => self.maneuver(m),
            ActuatorCommand::Stop => self.stop(),
        }
    }
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn forward(&mut self, cmd: DriveCommand) -> Result<()> {
        (**self).forward(cmd)
    }

    fn reverse(&mut self, cmd: DriveCommand) -> Result<()> {
        (**self).reverse(cmd)
    }

    fn turn_left(&mut self, cmd: TurnCommand) -> Result<()> {
        (**self).turn_left(cmd)
    }

    fn turn_right(&mut self, cmd: TurnCommand) -> Result<()> {
        (**self).turn_right(cmd)
    }

    fn maneuver(&mut self, maneuver: Maneuver) -> Result<()> {
        (**self).maneuver(maneuver)
    }

    fn stop(&mut self) -> Result<()> {
        (**self).stop()
    }
}

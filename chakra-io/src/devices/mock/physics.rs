//! Kinematics for the simulated robot
//!
//! Positions are overhead-camera pixels, headings are degrees measured
//! clockwise from the +x image axis (image rows grow downwards).

use crate::mask::DrivabilityMask;

/// Collision handling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionMode {
    /// Stop at the last drivable pixel
    Stop,
    /// Ignore the street edge (for debugging)
    Passthrough,
}

impl CollisionMode {
    /// Parse collision mode from config string
    pub fn from_config(mode: &str) -> Self {
        match mode {
            "passthrough" => Self::Passthrough,
            _ => Self::Stop,
        }
    }
}

/// Physics state for the simulated robot
#[derive(Debug, Clone)]
pub struct PhysicsState {
    x: f32,
    y: f32,
    heading: f32,
    collision_mode: CollisionMode,
}

impl PhysicsState {
    pub fn new(x: f32, y: f32, heading: f32, collision_mode: CollisionMode) -> Self {
        Self {
            x,
            y,
            heading: wrap_degrees(heading),
            collision_mode,
        }
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn heading(&self) -> f32 {
        self.heading
    }

    /// Rotate in place (positive = clockwise)
    pub fn rotate(&mut self, delta_deg: f32) {
        self.heading = wrap_degrees(self.heading + delta_deg);
    }

    /// Translate along the current heading (negative distance = backwards)
    ///
    /// Returns true if the street edge stopped the motion early.
    pub fn translate(&mut self, distance: f32, street: &DrivabilityMask) -> bool {
        let (sin, cos) = self.heading.to_radians().sin_cos();
        let direction = distance.signum();
        let total = distance.abs();

        // Integrate in one-pixel steps so the edge check cannot be skipped
        let mut travelled = 0.0;
        while travelled < total {
            let step = (total - travelled).min(1.0);
            let nx = self.x + direction * cos * step;
            let ny = self.y + direction * sin * step;

            if self.collision_mode == CollisionMode::Stop
                && !street.is_drivable(nx.round() as i32, ny.round() as i32)
            {
                return true;
            }

            self.x = nx;
            self.y = ny;
            travelled += step;
        }

        false
    }
}

/// Wrap degrees into (-180, 180]
pub(crate) fn wrap_degrees(angle: f32) -> f32 {
    let mut a = angle % 360.0;
    if a > 180.0 {
        a -= 360.0;
    } else if a <= -180.0 {
        a += 360.0;
    }
    a
}

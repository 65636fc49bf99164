//! Route planning and following over the street graph
//!
//! - [`navigator`]: nearest-node snapping, route planning, waypoint pursuit
//! - [`random_walk`]: clearance-guarded wandering

pub mod navigator;
pub mod random_walk;

pub use navigator::Navigator;
pub use random_walk::{WalkReport, random_walk};

use crate::error::Result;
use crate::geometry::PixelPoint;
use crate::graph::Waypoint;
use serde::Deserialize;

/// What to do with a waypoint that could not be reached
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExhaustedPolicy {
    /// Log it and continue with the next waypoint
    #[default]
    Skip,
    /// Stop following the route and report `WaypointRetryExhausted`
    Abort,
}

/// Terminal state of the pursuit of one waypoint
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WaypointOutcome {
    /// Within tolerance after `attempts` drives
    Arrived { attempts: u32, distance: f32 },
    /// Attempt budget spent while still outside tolerance
    RetryExhausted { attempts: u32, distance: f32 },
}

impl WaypointOutcome {
    pub fn is_arrived(&self) -> bool {
        matches!(self, Self::Arrived { .. })
    }

    pub fn distance(&self) -> f32 {
        match self {
            Self::Arrived { distance, .. } | Self::RetryExhausted { distance, .. } => *distance,
        }
    }
}

/// Per-waypoint outcomes of one route, in route order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RouteReport {
    pub legs: Vec<(Waypoint, WaypointOutcome)>,
}

impl RouteReport {
    pub fn all_arrived(&self) -> bool {
        self.legs.iter().all(|(_, o)| o.is_arrived())
    }

    pub fn exhausted(&self) -> impl Iterator<Item = &Waypoint> {
        self.legs
            .iter()
            .filter(|(_, o)| !o.is_arrived())
            .map(|(w, _)| w)
    }

    /// Outcome for the final waypoint
    pub fn last(&self) -> Option<WaypointOutcome> {
        self.legs.last().map(|(_, o)| *o)
    }
}

/// What waypoint pursuit needs from the robot
pub trait WaypointDriver {
    /// Believed position, `None` while unresolved
    fn position(&self) -> Option<PixelPoint>;

    /// One turn-towards plus drive-towards cycle; returns the remaining distance
    fn drive_towards(&mut self, x: i32, y: i32) -> Result<f32>;
}

//! MargaNav - Overhead-camera localization and street navigation
//!
//! Tracks a small wheeled robot through the colored marker on its roof as
//! seen by a fixed overhead camera, and drives it along routes planned on a
//! street graph.
//!
//! ## Module Structure
//!
//! - [`geometry`]: angle normalization, bearings, turn angles, projection
//! - [`localization`]: marker detection and the pose estimator
//! - [`clearance`]: on-street checks against the drivability mask
//! - [`graph`]: street graph, nearest-node lookup, shortest paths
//! - [`driver`]: movement-issuing layer over the actuator and camera
//! - [`navigation`]: route following and random walk
//! - [`config`]: TOML configuration
//!
//! ## Coordinates
//!
//! Positions are overhead-image pixels (column, row). Headings are degrees in
//! (-180, 180], measured clockwise from +x since image rows grow downwards.
//! A positive turn angle is a right turn.

pub mod clearance;
pub mod config;
pub mod driver;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod localization;
pub mod navigation;

pub use config::NavConfig;
pub use driver::{Calibration, ForwardMove, MotionDriver, StreetMasks};
pub use error::{NavError, Result};
pub use geometry::PixelPoint;
pub use graph::{Route, StreetGraph, Waypoint};
pub use localization::{Pose, PositionEstimator};
pub use navigation::{ExhaustedPolicy, Navigator, RouteReport, WaypointOutcome};

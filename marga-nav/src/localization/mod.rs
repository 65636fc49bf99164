//! Overhead-camera localization
//!
//! - [`detection`]: color-blob marker detection
//! - [`estimator`]: pose belief with prediction fallback

pub mod detection;
pub mod estimator;

pub use detection::{Blob, BlobDetector, ColorRange, rgb_to_hsv};
pub use estimator::{FixSource, Pose, PositionEstimator};

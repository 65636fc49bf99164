//! Pose belief fused from marker detections and dead-reckoning predictions
//!
//! The estimator is the only writer of the pose. A cycle either sees the
//! marker, falls back to the prediction stored before the last movement, or
//! ends unresolved. Heading comes from the displacement between consecutive
//! resolved positions, or from commanded turns via [`PositionEstimator::record_turn`].

use super::detection::{BlobDetector, average_center};
use crate::geometry::{PixelPoint, bearing, normalize_angle, turn_angle};
use chakra_io::DrivabilityMask;
use image::RgbImage;
use std::fmt;

/// Position and heading belief
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub x: i32,
    pub y: i32,
    /// Degrees in (-180, 180], clockwise from +x
    pub heading: f32,
}

impl Pose {
    pub fn position(&self) -> PixelPoint {
        PixelPoint::new(self.x, self.y)
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) @ {:.0}°", self.x, self.y, self.heading)
    }
}

/// How the current position was obtained
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FixSource {
    /// Marker seen; number of accepted blobs
    Detected { blobs: usize },
    /// Marker not seen, stored prediction used
    Predicted,
    /// Marker not seen and nothing to fall back on
    Unresolved,
}

impl FixSource {
    fn label(&self) -> &'static str {
        match self {
            Self::Detected { .. } => "detected",
            Self::Predicted => "predicted",
            Self::Unresolved => "unresolved",
        }
    }
}

/// Owner of the robot's pose belief
#[derive(Clone, Debug)]
pub struct PositionEstimator {
    detector: BlobDetector,
    position: Option<PixelPoint>,
    heading: f32,
    prediction: Option<PixelPoint>,
    last_fix: FixSource,
}

impl PositionEstimator {
    /// Estimator with no position yet
    pub fn new(detector: BlobDetector, initial_heading: f32) -> Self {
        Self {
            detector,
            position: None,
            heading: normalize_angle(initial_heading),
            prediction: None,
            last_fix: FixSource::Unresolved,
        }
    }

    /// Create an estimator and run the first detection attempt on `frame`
    ///
    /// The attempt may fail, leaving the position unresolved.
    pub fn initialize(
        detector: BlobDetector,
        initial_heading: f32,
        frame: &RgbImage,
        mask: &DrivabilityMask,
    ) -> Self {
        let mut estimator = Self::new(detector, initial_heading);
        match estimator.estimate(frame, mask) {
            Some(pose) => tracing::info!("Initial pose {}", pose),
            None => tracing::warn!("Robot not visible at startup, position unresolved"),
        }
        estimator
    }

    /// Fuse one overhead frame into the pose belief
    ///
    /// Returns the updated pose, or `None` if the position is unresolved
    /// for this cycle.
    pub fn estimate(&mut self, frame: &RgbImage, mask: &DrivabilityMask) -> Option<Pose> {
        self.fuse(frame, mask, false)
    }

    /// Like [`estimate`](Self::estimate) after a reverse move
    ///
    /// The displacement points opposite to the heading, so the derived
    /// bearing is flipped.
    pub fn estimate_reversing(&mut self, frame: &RgbImage, mask: &DrivabilityMask) -> Option<Pose> {
        self.fuse(frame, mask, true)
    }

    fn fuse(&mut self, frame: &RgbImage, mask: &DrivabilityMask, reversing: bool) -> Option<Pose> {
        let blobs = self.detector.detect(frame, mask);

        let (observed, source) = match average_center(&blobs) {
            Some(center) => {
                // Prediction only bridges the gap until the next real fix
                self.prediction = None;
                (Some(center), FixSource::Detected { blobs: blobs.len() })
            }
            None => match self.prediction {
                Some(predicted) => {
                    tracing::warn!("Robot not detected, using predicted position {}", predicted);
                    (Some(predicted), FixSource::Predicted)
                }
                None => {
                    tracing::warn!("Robot not detected and no prediction available");
                    (None, FixSource::Unresolved)
                }
            },
        };

        if source.label() != self.last_fix.label() {
            tracing::info!("Fix source {} -> {}", self.last_fix.label(), source.label());
        }
        self.last_fix = source;

        if let (Some(new), Some(previous)) = (observed, self.position) {
            // Zero displacement has no bearing
            if new != previous {
                let heading = bearing(new.x as f32, new.y as f32, previous.x as f32, previous.y as f32);
                let flip = if reversing { 180.0 } else { 0.0 };
                self.heading = normalize_angle(heading as f32 + flip);
            }
        }
        self.position = observed;

        if let Some(pose) = self.pose() {
            tracing::debug!("Pose {} ({:?})", pose, source);
        }
        self.pose()
    }

    /// Store the position expected after the next movement
    pub fn set_prediction(&mut self, point: PixelPoint) {
        tracing::debug!("Prediction set to {}", point);
        self.prediction = Some(point);
    }

    /// Signed turn from the current heading towards `(x, y)`
    ///
    /// `None` while the position is unresolved.
    pub fn turn_angle_towards(&self, x: i32, y: i32) -> Option<f32> {
        let current = self.position?;
        let target = bearing(x as f32, y as f32, current.x as f32, current.y as f32);
        Some(turn_angle(self.heading, target as f32))
    }

    /// Apply a commanded heading change
    pub fn record_turn(&mut self, delta: f32) {
        self.heading = normalize_angle(self.heading + delta);
    }

    /// Distance from the current position to `(x, y)`
    pub fn distance_to(&self, x: i32, y: i32) -> Option<f32> {
        self.position
            .map(|p| p.distance_to(PixelPoint::new(x, y)))
    }

    pub fn pose(&self) -> Option<Pose> {
        self.position.map(|p| Pose {
            x: p.x,
            y: p.y,
            heading: self.heading,
        })
    }

    pub fn position(&self) -> Option<PixelPoint> {
        self.position
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }

    pub fn prediction(&self) -> Option<PixelPoint> {
        self.prediction
    }

    pub fn last_fix(&self) -> FixSource {
        self.last_fix
    }
}

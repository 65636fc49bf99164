//! Street clearance probing
//!
//! A path is clear when three parallel probe lines stay on the street: one
//! through the robot's position and one on each side, offset by half the
//! robot's width.

use crate::geometry::{PixelPoint, normalize_angle, project_point};
use chakra_io::DrivabilityMask;

/// Lateral offset of the side probe lines (pixels)
pub const LATERAL_OFFSET: f32 = 10.0;

/// First probed distance along the heading (pixels)
pub const FIRST_PROBE: i32 = 10;

/// Spacing between probes (pixels)
pub const PROBE_STEP: usize = 5;

/// Probe points in checking order: by distance, then left, center, right
///
/// The center line starts at the position itself and probing stops short of
/// `max_distance`.
pub fn probe_points(position: PixelPoint, heading: f32, max_distance: f32) -> Vec<PixelPoint> {
    let left = project_point(position, normalize_angle(heading - 90.0), LATERAL_OFFSET);
    let right = project_point(position, normalize_angle(heading + 90.0), LATERAL_OFFSET);
    let origins = [left, position, right];

    (FIRST_PROBE..)
        .step_by(PROBE_STEP)
        .take_while(|&d| (d as f32) < max_distance)
        .flat_map(|d| origins.map(|o| project_point(o, heading, d as f32)))
        .collect()
}

/// Check whether the strip ahead of `position` stays on the street
///
/// Stops at the first probe that is off the street or outside the mask.
pub fn is_clear(
    position: PixelPoint,
    heading: f32,
    max_distance: f32,
    mask: &DrivabilityMask,
) -> bool {
    for probe in probe_points(position, heading, max_distance) {
        if !mask.is_drivable(probe.x, probe.y) {
            tracing::debug!(
                "Clearance probe {} off street (heading {:.0}°, range {:.0})",
                probe,
                heading,
                max_distance
            );
            return false;
        }
    }
    true
}

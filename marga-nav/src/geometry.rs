//! Planar geometry in overhead-camera pixel space
//!
//! Angles are degrees. Image rows grow downwards, so a positive angle turns
//! clockwise on screen, which is also a right turn for the robot.

use std::fmt;

/// Integer pixel position (column, row)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    #[inline]
    pub fn distance_to(&self, other: PixelPoint) -> f32 {
        distance(self.x as f32, self.y as f32, other.x as f32, other.y as f32)
    }
}

impl fmt::Display for PixelPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Normalize angle to (-180, 180]
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    // rem_euclid may round up to exactly 360
    let a = angle.rem_euclid(360.0);
    if a > 180.0 { a - 360.0 } else { a }
}

/// Euclidean distance between `(ax, ay)` and `(bx, by)`
#[inline]
pub fn distance(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    (bx - ax).hypot(by - ay)
}

/// Direction of travel from the old point to the new one, in whole degrees
///
/// Truncated toward zero, as the heading is only ever derived from pixel
/// displacements.
#[inline]
pub fn bearing(new_x: f32, new_y: f32, old_x: f32, old_y: f32) -> i32 {
    (new_y - old_y).atan2(new_x - old_x).to_degrees() as i32
}

/// Signed minimal rotation from `current` to `target` heading
///
/// Positive = right (clockwise), negative = left. A half-turn tie goes right.
pub fn turn_angle(current: f32, target: f32) -> f32 {
    let (right, left) = if current < target {
        let right = target - current;
        (right, 360.0 - right)
    } else {
        let left = current - target;
        (360.0 - left, left)
    };

    if right <= left { right } else { -left }
}

/// Point `length` pixels from `origin` along `angle_deg`, rounded to pixels
#[inline]
pub fn project_point(origin: PixelPoint, angle_deg: f32, length: f32) -> PixelPoint {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    PixelPoint::new(
        (origin.x as f32 + length * cos).round() as i32,
        (origin.y as f32 + length * sin).round() as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_normalize_angle_examples() {
        assert_eq!(normalize_angle(200.0), -160.0);
        assert_eq!(normalize_angle(-200.0), 160.0);
        assert_eq!(normalize_angle(180.0), 180.0);
        assert_eq!(normalize_angle(-180.0), 180.0);
        assert_eq!(normalize_angle(45.0), 45.0);
    }

    #[test]
    fn test_normalize_angle_range_and_idempotence() {
        let mut a = -1500.0f32;
        while a <= 1500.0 {
            let n = normalize_angle(a);
            assert!(n > -180.0 && n <= 180.0, "{} -> {}", a, n);
            assert_eq!(normalize_angle(n), n);
            a += 7.25;
        }
    }

    #[test]
    fn test_normalize_angle_large_inputs() {
        assert_eq!(normalize_angle(720.0), 0.0);
        assert_eq!(normalize_angle(-720.0), 0.0);
        assert_eq!(normalize_angle(540.0), 180.0);
        for a in [1.0e10f32, -1.0e10, 3.4e38, -3.4e38] {
            let n = normalize_angle(a);
            assert!(n > -180.0 && n <= 180.0, "{} -> {}", a, n);
        }
    }

    #[test]
    fn test_distance() {
        assert_eq!(distance(0.0, 0.0, 3.0, 4.0), 5.0);
        assert_eq!(PixelPoint::new(1, 1).distance_to(PixelPoint::new(4, 5)), 5.0);
    }

    #[test]
    fn test_bearing_truncates_toward_zero() {
        assert_eq!(bearing(10.0, 0.0, 0.0, 0.0), 0);
        assert_eq!(bearing(0.0, 10.0, 0.0, 0.0), 90);
        assert_eq!(bearing(-10.0, 0.0, 0.0, 0.0), 180);
        assert_eq!(bearing(0.0, -10.0, 0.0, 0.0), -90);
        // atan2(1, 2) = 26.57°
        assert_eq!(bearing(2.0, 1.0, 0.0, 0.0), 26);
        assert_eq!(bearing(2.0, -1.0, 0.0, 0.0), -26);
    }

    #[test]
    fn test_turn_angle_picks_shorter_arc() {
        assert_eq!(turn_angle(0.0, 170.0), 170.0);
        assert_eq!(turn_angle(170.0, 0.0), -170.0);
        assert_eq!(turn_angle(170.0, -170.0), 20.0);
        assert_eq!(turn_angle(-170.0, 170.0), -20.0);
        assert_eq!(turn_angle(90.0, 90.0), 0.0);
    }

    #[test]
    fn test_turn_angle_tie_goes_right() {
        assert_eq!(turn_angle(0.0, 180.0), 180.0);
        assert_eq!(turn_angle(90.0, -90.0), 180.0);
    }

    #[test]
    fn test_project_point() {
        let origin = PixelPoint::new(0, 0);
        assert_eq!(project_point(origin, 0.0, 10.0), PixelPoint::new(10, 0));
        assert_eq!(project_point(origin, 90.0, 10.0), PixelPoint::new(0, 10));
        assert_eq!(project_point(origin, 180.0, 10.0), PixelPoint::new(-10, 0));

        let p = project_point(PixelPoint::new(100, 50), 45.0, 20.0);
        assert_eq!(p, PixelPoint::new(114, 64));
        assert_abs_diff_eq!(PixelPoint::new(100, 50).distance_to(p), 19.8, epsilon = 0.1);
    }
}

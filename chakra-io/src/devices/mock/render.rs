//! Overhead camera frame synthesis
//!
//! Draws the street layout, roofs and the robot's colored marker the way the
//! fixed overhead camera would see them.

use super::config::RenderConfig;
use crate::mask::DrivabilityMask;
use image::{Rgb, RgbImage};

/// Marker color carried by each robot identity
///
/// Each color lies inside the HSV window the tracker uses for that identity;
/// identities share colors pairwise.
pub fn marker_color(robot_id: u8) -> Option<Rgb<u8>> {
    match robot_id {
        2 | 5 => Some(Rgb([30, 60, 200])),
        1 | 3 => Some(Rgb([170, 40, 30])),
        4 | 6 => Some(Rgb([190, 170, 40])),
        _ => None,
    }
}

/// Roof color (low saturation, never matches a marker window)
const ROOF_COLOR: Rgb<u8> = Rgb([90, 90, 100]);

/// Render one overhead frame with the marker centred on `(x, y)`
pub fn render_overhead(
    street: &DrivabilityMask,
    config: &RenderConfig,
    marker: Rgb<u8>,
    x: f32,
    y: f32,
) -> RgbImage {
    let street_color = Rgb(config.street_color);
    let ground_color = Rgb(config.ground_color);

    let mut frame = RgbImage::from_fn(street.width(), street.height(), |px, py| {
        if street.is_drivable(px as i32, py as i32) {
            street_color
        } else {
            ground_color
        }
    });

    let hidden = config.occluders.iter().any(|o| o.covers(x, y));
    if !hidden {
        let half = config.blob_size as i32 / 2;
        let cx = x.round() as i32;
        let cy = y.round() as i32;
        for py in (cy - half)..(cy - half + config.blob_size as i32) {
            for px in (cx - half)..(cx - half + config.blob_size as i32) {
                if px >= 0 && py >= 0 && (px as u32) < frame.width() && (py as u32) < frame.height()
                {
                    frame.put_pixel(px as u32, py as u32, marker);
                }
            }
        }
    }

    // Roofs are drawn last so they cover anything beneath
    for occluder in &config.occluders {
        for py in occluder.y..(occluder.y + occluder.height).min(frame.height()) {
            for px in occluder.x..(occluder.x + occluder.width).min(frame.width()) {
                frame.put_pixel(px, py, ROOF_COLOR);
            }
        }
    }

    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::mock::config::Occluder;
    use image::{GrayImage, Luma};

    fn street() -> DrivabilityMask {
        DrivabilityMask::from_image(GrayImage::from_pixel(200, 200, Luma([255])))
    }

    fn marker_pixels(frame: &RgbImage, marker: Rgb<u8>) -> usize {
        frame.pixels().filter(|p| **p == marker).count()
    }

    #[test]
    fn test_marker_drawn_at_position() {
        let config = RenderConfig::default();
        let marker = marker_color(2).unwrap();
        let frame = render_overhead(&street(), &config, marker, 50.0, 60.0);

        assert_eq!(marker_pixels(&frame, marker), 24 * 24);
        assert_eq!(*frame.get_pixel(50, 60), marker);
        assert_eq!(*frame.get_pixel(150, 150), Rgb(config.street_color));
    }

    #[test]
    fn test_marker_hidden_under_roof() {
        let config = RenderConfig {
            occluders: vec![Occluder {
                x: 40,
                y: 40,
                width: 40,
                height: 40,
            }],
            ..Default::default()
        };
        let marker = marker_color(4).unwrap();
        let frame = render_overhead(&street(), &config, marker, 60.0, 60.0);

        assert_eq!(marker_pixels(&frame, marker), 0);
        assert_eq!(*frame.get_pixel(60, 60), ROOF_COLOR);
    }

    #[test]
    fn test_marker_clipped_at_border() {
        let config = RenderConfig::default();
        let marker = marker_color(1).unwrap();
        let frame = render_overhead(&street(), &config, marker, 0.0, 0.0);

        assert_eq!(marker_pixels(&frame, marker), 12 * 12);
    }

    #[test]
    fn test_unknown_identity_has_no_color() {
        assert!(marker_color(0).is_none());
        assert!(marker_color(7).is_none());
        assert_eq!(marker_color(3), marker_color(1));
    }
}

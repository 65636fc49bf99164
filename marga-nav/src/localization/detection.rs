//! Color-blob marker detection in overhead frames
//!
//! Pipeline per frame:
//!
//! 1. Pixels outside the detection mask are dropped
//! 2. RGB is converted to 8-bit HSV (H 0-179, S/V 0-255)
//! 3. The robot's color range is applied (inclusive on both ends)
//! 4. Outer contours of the binary image are extracted
//! 5. Contours whose polygon area is outside the accepted window are ignored
//! 6. Each remaining contour contributes its bounding-box center

use crate::geometry::PixelPoint;
use chakra_io::DrivabilityMask;
use image::{GrayImage, Luma, RgbImage};
use imageproc::contours::{BorderType, find_contours};
use imageproc::point::Point;

/// Inclusive HSV window in 8-bit OpenCV scale
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl ColorRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    /// Marker color range for a robot identity
    ///
    /// Identities share ranges pairwise; unknown identities have none.
    pub fn for_robot(id: u8) -> Option<Self> {
        match id {
            2 | 5 => Some(Self::new([107, 135, 25], [121, 255, 255])),
            1 | 3 => Some(Self::new([0, 88, 70], [7, 229, 179])),
            4 | 6 => Some(Self::new([16, 102, 107], [39, 218, 199])),
            _ => None,
        }
    }

    #[inline]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| hsv[i] >= self.lower[i] && hsv[i] <= self.upper[i])
    }
}

/// Convert one RGB pixel to 8-bit HSV
///
/// Hue is halved to fit a byte, so it spans 0..=179.
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(f32::from);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v > 0.0 { 255.0 * diff / v } else { 0.0 };

    let h = if diff == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / diff
    } else if v == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    // 360° wraps to 0 after halving
    let h = ((h / 2.0).round() as u32 % 180) as u8;
    [h, s.round() as u8, v as u8]
}

/// One accepted marker region
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Blob {
    /// Bounding-box center (column, row)
    pub center: (f32, f32),
    /// Contour polygon area in pixels
    pub area: f32,
}

/// Marker detector bound to one color range and area window
#[derive(Clone, Debug)]
pub struct BlobDetector {
    range: ColorRange,
    min_area: f32,
    max_area: f32,
}

impl BlobDetector {
    pub fn new(range: ColorRange, min_area: f32, max_area: f32) -> Self {
        Self {
            range,
            min_area,
            max_area,
        }
    }

    pub fn range(&self) -> ColorRange {
        self.range
    }

    /// Binary image of pixels inside the mask and the color range
    pub fn threshold(&self, frame: &RgbImage, mask: &DrivabilityMask) -> GrayImage {
        GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
            let visible = mask.is_drivable(x as i32, y as i32);
            if visible && self.range.contains(rgb_to_hsv(frame.get_pixel(x, y).0)) {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    /// All marker regions with an area inside the accepted window
    pub fn detect(&self, frame: &RgbImage, mask: &DrivabilityMask) -> Vec<Blob> {
        let binary = self.threshold(frame, mask);

        find_contours::<i32>(&binary)
            .into_iter()
            .filter(|c| c.parent.is_none() && c.border_type == BorderType::Outer)
            .filter_map(|contour| {
                let area = polygon_area(&contour.points);
                if area < self.min_area || area > self.max_area {
                    tracing::trace!("Ignoring blob with area {:.0}", area);
                    return None;
                }
                let center = bounding_box_center(&contour.points)?;
                Some(Blob { center, area })
            })
            .collect()
    }
}

/// Mean of the blob centers, truncated to whole pixels
pub fn average_center(blobs: &[Blob]) -> Option<PixelPoint> {
    if blobs.is_empty() {
        return None;
    }
    let n = blobs.len() as f32;
    let (sx, sy) = blobs
        .iter()
        .fold((0.0, 0.0), |(sx, sy), b| (sx + b.center.0, sy + b.center.1));
    Some(PixelPoint::new((sx / n) as i32, (sy / n) as i32))
}

/// Shoelace area of a closed pixel contour
fn polygon_area(points: &[Point<i32>]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area: i64 = 0;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    twice_area.abs() as f32 / 2.0
}

/// Center of the inclusive pixel bounding box
fn bounding_box_center(points: &[Point<i32>]) -> Option<(f32, f32)> {
    let min_x = points.iter().map(|p| p.x).min()?;
    let max_x = points.iter().map(|p| p.x).max()?;
    let min_y = points.iter().map(|p| p.y).min()?;
    let max_y = points.iter().map(|p| p.y).max()?;

    let w = (max_x - min_x + 1) as f32;
    let h = (max_y - min_y + 1) as f32;
    Some((min_x as f32 + 0.5 * w, min_y as f32 + 0.5 * h))
}

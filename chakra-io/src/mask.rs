//! Drivability bitmaps
//!
//! A mask is a grayscale image in overhead-camera pixel coordinates.
//! Non-zero pixels are drivable, zero pixels are not. Addressing is
//! `(column, row)`; anything outside the image is treated as not drivable.

use crate::error::{Error, Result};
use image::GrayImage;
use std::path::Path;

/// Grayscale drivability mask
#[derive(Clone, Debug)]
pub struct DrivabilityMask {
    pixels: GrayImage,
}

impl DrivabilityMask {
    /// Wrap an in-memory image
    pub fn from_image(pixels: GrayImage) -> Self {
        Self { pixels }
    }

    /// Load a mask image from disk (any format `image` can decode)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let pixels = image::open(path)
            .map_err(|e| {
                Error::Config(format!("Failed to load mask {}: {}", path.display(), e))
            })?
            .into_luma8();
        log::info!(
            "Loaded mask {}: {}x{} pixels",
            path.display(),
            pixels.width(),
            pixels.height()
        );
        Ok(Self { pixels })
    }

    /// Mask width in pixels
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Mask height in pixels
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Underlying image
    pub fn image(&self) -> &GrayImage {
        &self.pixels
    }

    /// Raw pixel value, `None` outside the image
    #[inline]
    pub fn value(&self, col: i32, row: i32) -> Option<u8> {
        if col < 0 || row < 0 || col as u32 >= self.pixels.width() || row as u32 >= self.pixels.height()
        {
            return None;
        }
        Some(self.pixels.get_pixel(col as u32, row as u32).0[0])
    }

    /// Check if the pixel at `(col, row)` is drivable
    #[inline]
    pub fn is_drivable(&self, col: i32, row: i32) -> bool {
        self.value(col, row).is_some_and(|v| v != 0)
    }

    /// March from `(x, y)` along `angle_deg` and return the distance to the
    /// first non-drivable pixel, or `max_range` if none is hit.
    pub fn ray_cast(&self, x: f32, y: f32, angle_deg: f32, max_range: f32) -> f32 {
        // Step size: half pixel
        let step = 0.5;
        let (sin, cos) = angle_deg.to_radians().sin_cos();

        let mut distance = 0.0;
        while distance < max_range {
            distance += step;
            let px = (x + cos * distance).round() as i32;
            let py = (y + sin * distance).round() as i32;
            if !self.is_drivable(px, py) {
                return distance;
            }
        }

        max_range
    }
}

//! Frame-source interface for the overhead and on-board cameras

use crate::error::Result;
use image::RgbImage;
use std::path::{Path, PathBuf};

/// Synchronous camera access
///
/// Both calls block until the most recent frame is available.
pub trait FrameSource {
    /// Latest frame from the fixed overhead camera
    fn overhead_frame(&mut self) -> Result<RgbImage>;

    /// Latest frame from the robot's front camera
    fn front_frame(&mut self) -> Result<RgbImage>;
}

impl<F: FrameSource + ?Sized> FrameSource for Box<F> {
    fn overhead_frame(&mut self) -> Result<RgbImage> {
        (**self).overhead_frame()
    }

    fn front_frame(&mut self) -> Result<RgbImage> {
        (**self).front_frame()
    }
}

/// Frame source that reads snapshots written to disk by an external grabber
pub struct FileFrameSource {
    overhead_path: PathBuf,
    front_path: Option<PathBuf>,
}

impl FileFrameSource {
    pub fn new<P: AsRef<Path>>(overhead_path: P) -> Self {
        Self {
            overhead_path: overhead_path.as_ref().to_path_buf(),
            front_path: None,
        }
    }

    /// Also serve front-camera frames from `path`
    pub fn with_front<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.front_path = Some(path.as_ref().to_path_buf());
        self
    }

    fn read(path: &Path) -> Result<RgbImage> {
        let frame = image::open(path)?.into_rgb8();
        log::debug!(
            "Read frame {} ({}x{})",
            path.display(),
            frame.width(),
            frame.height()
        );
        Ok(frame)
    }
}

impl FrameSource for FileFrameSource {
    fn overhead_frame(&mut self) -> Result<RgbImage> {
        Self::read(&self.overhead_path)
    }

    fn front_frame(&mut self) -> Result<RgbImage> {
        match &self.front_path {
            Some(path) => Self::read(path),
            None => Err(crate::error::Error::Config(
                "No front camera snapshot path configured".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_reads_overhead_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overhead.png");
        RgbImage::from_pixel(8, 6, image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        let mut source = FileFrameSource::new(&path);
        let frame = source.overhead_frame().unwrap();
        assert_eq!(frame.dimensions(), (8, 6));
        assert_eq!(frame.get_pixel(3, 3).0, [10, 20, 30]);

        assert!(matches!(source.front_frame(), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_snapshot_is_error() {
        let mut source = FileFrameSource::new("/nonexistent/overhead.png");
        assert!(source.overhead_frame().is_err());
    }
}

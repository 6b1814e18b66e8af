//! Video sources. A source is opened once per session and yields frames until it runs
//! dry; dropping it releases whatever it holds (file handles, a camera).

#[cfg(feature = "desktop")]
pub mod camera;
pub mod image_sequence;

use anyhow::Result;
use image::RgbImage;

/// One captured frame: 8-bit RGB, height x width x 3
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub index: u64,
    pub image: RgbImage,
}

impl VideoFrame {
    pub fn new(index: u64, image: RgbImage) -> Self {
        VideoFrame { index, image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

pub trait VideoSource {
    /// Next frame, or `Ok(None)` once the stream is exhausted. May block until a
    /// frame is available.
    fn read(&mut self) -> Result<Option<VideoFrame>>;
}

/// Opens a fresh [`VideoSource`] on every Start
pub trait SourceOpener {
    fn open(&mut self) -> Result<Box<dyn VideoSource>>;

    /// Human-readable name for logs
    fn describe(&self) -> String;
}

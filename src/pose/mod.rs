//! Pose detectors: one RGB frame in, zero or one set of body landmarks out.

#[cfg(feature = "desktop")]
pub mod movenet;
pub mod recorded;

use anyhow::Result;

use crate::{capture::VideoFrame, tracking::Pose};

pub trait PoseDetector {
    /// `Ok(None)` means nobody was found in this frame
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<Pose>>;

    fn name(&self) -> &str;
}

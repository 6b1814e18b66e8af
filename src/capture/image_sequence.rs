use std::{
    collections::VecDeque,
    fs,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

use anyhow::{bail, Context, Result};
use log::{debug, info};

use super::{SourceOpener, VideoFrame, VideoSource};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Replays a directory of still images, in file name order, as a video stream
pub struct ImageSequenceOpener {
    dir: PathBuf,
    frame_interval: Option<Duration>,
}

impl ImageSequenceOpener {
    pub fn new<P: AsRef<Path>>(dir: P, frame_interval: Option<Duration>) -> Self {
        ImageSequenceOpener {
            dir: dir.as_ref().to_path_buf(),
            frame_interval,
        }
    }
}

impl SourceOpener for ImageSequenceOpener {
    fn open(&mut self) -> Result<Box<dyn VideoSource>> {
        let sequence = ImageSequence::open(&self.dir, self.frame_interval)?;
        Ok(Box::new(sequence))
    }

    fn describe(&self) -> String {
        format!("image sequence {}", self.dir.display())
    }
}

pub struct ImageSequence {
    files: VecDeque<PathBuf>,
    next_index: u64,
    frame_interval: Option<Duration>,
    last_read: Option<Instant>,
}

impl ImageSequence {
    pub fn open(dir: &Path, frame_interval: Option<Duration>) -> Result<Self> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read image directory {}", dir.display()))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if is_image_file(&path) {
                files.push(path);
            }
        }

        if files.is_empty() {
            bail!("No PNG or JPEG images found in {}", dir.display());
        }
        files.sort();

        info!("Opened {} images from {}", files.len(), dir.display());

        Ok(ImageSequence {
            files: files.into(),
            next_index: 0,
            frame_interval,
            last_read: None,
        })
    }

    fn wait_for_next_frame(&self) {
        if let (Some(interval), Some(last_read)) = (self.frame_interval, self.last_read) {
            let elapsed = last_read.elapsed();
            if elapsed < interval {
                thread::sleep(interval - elapsed);
            }
        }
    }
}

impl VideoSource for ImageSequence {
    fn read(&mut self) -> Result<Option<VideoFrame>> {
        let Some(path) = self.files.pop_front() else {
            return Ok(None);
        };

        self.wait_for_next_frame();

        let image = image::open(&path)
            .with_context(|| format!("Failed to decode {}", path.display()))?
            .to_rgb8();
        self.last_read = Some(Instant::now());

        let frame = VideoFrame::new(self.next_index, image);
        self.next_index += 1;
        Ok(Some(frame))
    }
}

impl Drop for ImageSequence {
    fn drop(&mut self) {
        debug!(
            "Released image sequence after {} frames ({} unread)",
            self.next_index,
            self.files.len()
        );
    }
}

fn is_image_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
}

use anyhow::{bail, Context, Result};
use image::RgbImage;
use log::{debug, info, warn};
use opencv::{
    core::{AlgorithmHint, Mat},
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureAPIs},
};

use super::{SourceOpener, VideoFrame, VideoSource};

pub struct CameraOpener {
    index: i32,
    width: Option<u32>,
    height: Option<u32>,
}

impl CameraOpener {
    pub fn new(index: i32, width: Option<u32>, height: Option<u32>) -> Self {
        CameraOpener {
            index,
            width,
            height,
        }
    }
}

impl SourceOpener for CameraOpener {
    fn open(&mut self) -> Result<Box<dyn VideoSource>> {
        let camera = OpenCvCamera::open(self.index, self.width, self.height)?;
        Ok(Box::new(camera))
    }

    fn describe(&self) -> String {
        format!("camera {}", self.index)
    }
}

/// Live camera capture through OpenCV. The device is released when this is dropped.
pub struct OpenCvCamera {
    capture: VideoCapture,
    index: i32,
    next_index: u64,
}

impl OpenCvCamera {
    pub fn open(index: i32, width: Option<u32>, height: Option<u32>) -> Result<Self> {
        let mut capture = VideoCapture::new(index, VideoCaptureAPIs::CAP_ANY as i32)
            .context("Failed to open camera")?;

        if !capture.is_opened()? {
            bail!("Camera {} is not available", index);
        }

        if let Some(w) = width {
            capture.set(videoio::CAP_PROP_FRAME_WIDTH, w as f64)?;
        }
        if let Some(h) = height {
            capture.set(videoio::CAP_PROP_FRAME_HEIGHT, h as f64)?;
        }
        capture.set(videoio::CAP_PROP_BUFFERSIZE, 1.0)?;

        let actual_width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)?;
        let actual_height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)?;
        info!(
            "Camera {} opened at {}x{}",
            index, actual_width, actual_height
        );

        Ok(OpenCvCamera {
            capture,
            index,
            next_index: 0,
        })
    }
}

impl VideoSource for OpenCvCamera {
    fn read(&mut self) -> Result<Option<VideoFrame>> {
        let mut bgr = Mat::default();
        match self.capture.read(&mut bgr) {
            Ok(true) if !bgr.empty() => {}
            Ok(_) => {
                info!("Camera {} returned no frame; treating as end of stream", self.index);
                return Ok(None);
            }
            Err(e) => {
                warn!("Camera {} read failed ({}); treating as end of stream", self.index, e);
                return Ok(None);
            }
        }

        let mut rgb = Mat::default();
        imgproc::cvt_color(
            &bgr,
            &mut rgb,
            imgproc::COLOR_BGR2RGB,
            0,
            AlgorithmHint::ALGO_HINT_DEFAULT,
        )?;

        let width = rgb.cols() as u32;
        let height = rgb.rows() as u32;
        let bytes = rgb.data_bytes()?.to_vec();
        let image = RgbImage::from_raw(width, height, bytes)
            .context("Camera frame buffer does not match its dimensions")?;

        let frame = VideoFrame::new(self.next_index, image);
        self.next_index += 1;
        Ok(Some(frame))
    }
}

impl Drop for OpenCvCamera {
    fn drop(&mut self) {
        match self.capture.release() {
            Ok(()) => debug!("Released camera {}", self.index),
            Err(e) => warn!("Failed to release camera {}: {}", self.index, e),
        }
    }
}

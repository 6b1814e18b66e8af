use std::path::Path;

use anyhow::{bail, Context, Result};
use image::{imageops, imageops::FilterType, RgbImage};
use log::{debug, info};
use ndarray::{Array4, ArrayViewD};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};

use super::PoseDetector;
use crate::{
    capture::VideoFrame,
    tracking::{Keypoint, KeypointIndex, Pose},
};

/// MoveNet single-pose input resolution (square)
pub const MOVENET_INPUT_SIZE: u32 = 192;

const OUTPUT_NAME: &str = "StatefulPartitionedCall_0";

/// MoveNet single-pose inference on ONNX Runtime
pub struct MoveNetDetector {
    session: Session,
}

impl MoveNetDetector {
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path.as_ref())
            .with_context(|| {
                format!("Failed to load ONNX model {}", model_path.as_ref().display())
            })?;
        info!("Loaded MoveNet model from {}", model_path.as_ref().display());

        Ok(MoveNetDetector { session })
    }
}

/// Resize to the model input and lay out as a [1, 192, 192, 3] tensor of 0-255 floats
pub fn preprocess(image: &RgbImage) -> Array4<f32> {
    let resized = imageops::resize(
        image,
        MOVENET_INPUT_SIZE,
        MOVENET_INPUT_SIZE,
        FilterType::Triangle,
    );

    let size = MOVENET_INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, size, size, 3));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, y as usize, x as usize, c]] = pixel[c] as f32;
        }
    }
    tensor
}

/// Read keypoints from a [1, 1, 17, 3] (y, x, confidence) output tensor
pub fn pose_from_output(output: &ArrayViewD<f32>) -> Result<Pose> {
    let expected = [1, 1, KeypointIndex::COUNT, 3];
    if output.shape() != expected {
        bail!(
            "Unexpected model output shape {:?}, expected {:?}",
            output.shape(),
            expected
        );
    }

    let mut keypoints = [Keypoint::default(); KeypointIndex::COUNT];
    for (i, keypoint) in keypoints.iter_mut().enumerate() {
        let y = output[[0, 0, i, 0]];
        let x = output[[0, 0, i, 1]];
        let confidence = output[[0, 0, i, 2]];
        *keypoint = Keypoint::new(x, y, confidence);
    }
    Ok(Pose::new(keypoints))
}

impl PoseDetector for MoveNetDetector {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<Pose>> {
        let input_tensor = Tensor::from_array(preprocess(&frame.image))?;
        let outputs = self
            .session
            .run(ort::inputs!["serving_default_input_0" => input_tensor])
            .context("Inference failed")?;

        let output: ArrayViewD<f32> = outputs
            .get(OUTPUT_NAME)
            .with_context(|| format!("Model has no output named {}", OUTPUT_NAME))?
            .try_extract_array()
            .context("Failed to extract output tensor")?;

        let pose = pose_from_output(&output)?;
        debug!("Frame {}: pose score {:.2}", frame.index, pose.score());

        // Single-pose MoveNet always answers; the detection gate decides whether
        // anyone is really there
        Ok(Some(pose))
    }

    fn name(&self) -> &str {
        "movenet"
    }
}

impl Drop for MoveNetDetector {
    fn drop(&mut self) {
        debug!("Releasing MoveNet session");
    }
}

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::geometry_utils::to_pixels;

/// The 17 body landmarks reported by single-pose detectors, in COCO order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum KeypointIndex {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl KeypointIndex {
    pub const COUNT: usize = 17;
}

/// How far beyond [0;1] a coordinate may fall and still be taken seriously
/// (limbs partly out of shot)
pub const COORDINATE_MARGIN: f32 = 0.5;

/// A single landmark in normalised image coordinates (origin top-left, y pointing down)
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Visibility / confidence score in the range [0;1]
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Keypoint { x, y, confidence }
    }

    pub fn is_valid(&self, threshold: f32) -> bool {
        self.confidence >= threshold
    }

    /// Finite, and on the frame give or take [`COORDINATE_MARGIN`]
    pub fn is_in_range(&self) -> bool {
        let range = -COORDINATE_MARGIN..=1. + COORDINATE_MARGIN;
        range.contains(&self.x) && range.contains(&self.y) && self.confidence.is_finite()
    }

    pub fn to_pixel(&self, width: u32, height: u32) -> (i32, i32) {
        (
            to_pixels(self.x, width) as i32,
            to_pixels(self.y, height) as i32,
        )
    }
}

/// One person's landmarks for a single frame
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    pub keypoints: [Keypoint; KeypointIndex::COUNT],
}

impl Pose {
    pub fn new(keypoints: [Keypoint; KeypointIndex::COUNT]) -> Self {
        Pose { keypoints }
    }

    pub fn from_slice(keypoints: &[Keypoint]) -> Result<Self> {
        let keypoints: [Keypoint; KeypointIndex::COUNT] = keypoints.try_into().map_err(|_| {
            anyhow!(
                "expected {} keypoints per pose, got {}",
                KeypointIndex::COUNT,
                keypoints.len()
            )
        })?;
        Ok(Pose { keypoints })
    }

    pub fn get(&self, index: KeypointIndex) -> &Keypoint {
        &self.keypoints[index as usize]
    }

    /// Overall pose score: the mean of all keypoint confidences
    pub fn score(&self) -> f32 {
        let sum: f32 = self.keypoints.iter().map(|k| k.confidence).sum();
        sum / KeypointIndex::COUNT as f32
    }
}

impl Default for Pose {
    fn default() -> Self {
        Pose {
            keypoints: [Keypoint::default(); KeypointIndex::COUNT],
        }
    }
}

/// Normalised vertical ankle positions for one frame, plus the frame height
/// needed to bring them into pixel units. Produced fresh every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnkleObservation {
    pub left_y: f32,
    pub right_y: f32,
    pub frame_height: u32,
}

impl AnkleObservation {
    pub fn from_pose(pose: &Pose, frame_height: u32) -> Self {
        AnkleObservation {
            left_y: pose.get(KeypointIndex::LeftAnkle).y,
            right_y: pose.get(KeypointIndex::RightAnkle).y,
            frame_height,
        }
    }

    /// (left, right) ankle y in pixels
    pub fn to_pixels(&self) -> (f32, f32) {
        (
            to_pixels(self.left_y, self.frame_height),
            to_pixels(self.right_y, self.frame_height),
        )
    }
}

use std::{fs, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use indexmap::IndexMap;
use log::{info, trace};
use serde::{Deserialize, Serialize};

use super::PoseDetector;
use crate::{
    capture::VideoFrame,
    tracking::{Keypoint, Pose},
};

#[derive(Serialize, Deserialize, Debug)]
pub struct RecordedFrame {
    pub frame: u64,
    pub keypoints: Vec<Keypoint>,
}

/// On-disk format: `{"frames": [{"frame": 0, "keypoints": [...17 keypoints]}]}`
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct PoseRecording {
    pub frames: Vec<RecordedFrame>,
}

/// Replays detections captured earlier, keyed by frame index. Frames that are not in
/// the recording count as "no detection".
#[derive(Debug)]
pub struct RecordedPoses {
    poses: IndexMap<u64, Pose>,
}

impl RecordedPoses {
    pub fn from_recording(recording: PoseRecording) -> Result<Self> {
        let mut poses = IndexMap::new();
        for recorded in recording.frames {
            let pose = Pose::from_slice(&recorded.keypoints)
                .map_err(|e| anyhow!("Recorded frame {}: {}", recorded.frame, e))?;
            if let Some((i, k)) = pose
                .keypoints
                .iter()
                .enumerate()
                .find(|(_, k)| !k.is_in_range())
            {
                bail!(
                    "Recorded frame {}: keypoint {} out of range ({}, {}, confidence {})",
                    recorded.frame,
                    i,
                    k.x,
                    k.y,
                    k.confidence
                );
            }
            poses.insert(recorded.frame, pose);
        }
        Ok(RecordedPoses { poses })
    }

    pub fn parse(text: &str) -> Result<Self> {
        let recording: PoseRecording =
            serde_json::from_str(text).map_err(|e| anyhow!("Failed to parse pose recording: {}", e))?;
        Self::from_recording(recording)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read pose recording {}", path.display()))?;
        let recorded = Self::parse(&text)?;
        info!(
            "Loaded {} recorded poses from {}",
            recorded.len(),
            path.display()
        );
        Ok(recorded)
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }
}

impl PoseDetector for RecordedPoses {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<Pose>> {
        let pose = self.poses.get(&frame.index).cloned();
        if pose.is_none() {
            trace!("No recorded pose for frame {}", frame.index);
        }
        Ok(pose)
    }

    fn name(&self) -> &str {
        "recorded"
    }
}

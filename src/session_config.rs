use std::{fs, io::ErrorKind, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    // -------- DETECTOR SETTINGS
    /// Minimum pose score for a fresh detection, in the range [0;1]
    pub min_detection_confidence: f32,

    /// Minimum pose score to keep following a pose detected on the previous frame,
    /// in the range [0;1]
    pub min_tracking_confidence: f32,

    // -------- OVERLAY SETTINGS
    /// Keypoints below this confidence get no bones and a "low confidence" marker
    pub overlay_confidence_threshold: f32,

    // -------- SOURCE SETTINGS
    /// Delay (ms) between frames when replaying an image sequence; 0 plays as fast as possible
    pub frame_interval_ms: u64,

    pub camera_index: i32,
    pub camera_width: u32,
    pub camera_height: u32,

    /// MoveNet single-pose ONNX model, used for live detection
    pub model_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
            overlay_confidence_threshold: 0.3,
            frame_interval_ms: 33,
            camera_index: 0,
            camera_width: 640,
            camera_height: 480,
            model_path: String::from("models/movenet_lightning.onnx"),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("minDetectionConfidence", self.min_detection_confidence),
            ("minTrackingConfidence", self.min_tracking_confidence),
            ("overlayConfidenceThreshold", self.overlay_confidence_threshold),
        ] {
            if !value.is_finite() || !(0. ..=1.).contains(&value) {
                bail!("{} must be in the range [0;1], got {}", name, value);
            }
        }
        Ok(())
    }

    pub fn frame_interval(&self) -> Option<Duration> {
        if self.frame_interval_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.frame_interval_ms))
        }
    }

    pub fn write_config_to_file(&self, config_file_path: &str) -> Result<()> {
        debug!("Current state of config: {:?}", self);
        let text = serde_json::to_string_pretty(self)?;
        fs::write(config_file_path, text)
            .with_context(|| format!("Error writing config to file {}", config_file_path))?;
        info!("Wrote config to file: {:?}", config_file_path);
        Ok(())
    }
}

/// Load the config from disk. A missing file is not an error: defaults are used and
/// written back so there is something to edit next time.
pub fn load_config_from_file(config_file_path: &str) -> Result<SessionConfig> {
    match fs::read_to_string(config_file_path) {
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(
                "Config file not found, will create one with defaults at {}",
                &config_file_path
            );
            let config = SessionConfig::default();
            if let Err(e) = config.write_config_to_file(config_file_path) {
                warn!("Could not save default config: {:#}", e);
            }
            Ok(config)
        }
        Err(e) => Err(anyhow!(
            "Failed to load config from \"{}\": {}",
            config_file_path,
            e
        )),
        Ok(s) => {
            let config = serde_json::from_str::<SessionConfig>(&s)
                .map_err(|e| anyhow!("Failed to parse config data: {}", e))?;
            config.validate()?;
            info!("Loaded config OK from \"{}\"", config_file_path);
            debug!("Config parsed data from file: {:?}", &config);
            Ok(config)
        }
    }
}

use anyhow::{bail, Result};
use clap::Args;
use log::info;

use crate::{
    capture::{image_sequence::ImageSequenceOpener, SourceOpener},
    pose::{recorded::RecordedPoses, PoseDetector},
    session::SessionController,
    session_config::SessionConfig,
    systems::Systems,
};

// Some defaults; some of which can be overriden via CLI args
pub const CONFIG_FILE_PATH: &str = "./jumpConfig.json";

/// Where frames and poses come from. Shared by the backend and frontend.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Directory of PNG/JPEG frames, replayed in file name order
    #[arg(long = "frames")]
    pub frames_dir: Option<String>,

    /// Recorded pose track (JSON) matching the frames
    #[arg(long = "poses")]
    pub poses_path: Option<String>,

    /// Capture from the camera configured in the config file
    #[cfg(feature = "desktop")]
    #[arg(long = "camera")]
    pub use_camera: bool,

    /// MoveNet ONNX model; overrides modelPath from the config file
    #[cfg(feature = "desktop")]
    #[arg(long = "model")]
    pub model_path: Option<String>,
}

fn build_opener(input: &InputArgs, config: &SessionConfig) -> Result<Box<dyn SourceOpener>> {
    #[cfg(feature = "desktop")]
    {
        if input.use_camera {
            if input.frames_dir.is_some() {
                bail!("--camera and --frames are mutually exclusive");
            }
            return Ok(Box::new(crate::capture::camera::CameraOpener::new(
                config.camera_index,
                Some(config.camera_width),
                Some(config.camera_height),
            )));
        }
    }

    match &input.frames_dir {
        Some(dir) => Ok(Box::new(ImageSequenceOpener::new(
            dir,
            config.frame_interval(),
        ))),
        None => bail!("No video source given; use --frames <dir>"),
    }
}

fn build_detector(input: &InputArgs, config: &SessionConfig) -> Result<Box<dyn PoseDetector>> {
    match &input.poses_path {
        Some(path) => Ok(Box::new(RecordedPoses::load(path)?)),
        None => live_detector(input, config),
    }
}

#[cfg(feature = "desktop")]
fn live_detector(input: &InputArgs, config: &SessionConfig) -> Result<Box<dyn PoseDetector>> {
    let model_path = input.model_path.as_deref().unwrap_or(&config.model_path);
    Ok(Box::new(crate::pose::movenet::MoveNetDetector::new(
        model_path,
    )?))
}

#[cfg(not(feature = "desktop"))]
fn live_detector(_input: &InputArgs, _config: &SessionConfig) -> Result<Box<dyn PoseDetector>> {
    bail!("No pose detector given; use --poses <file>")
}

/// Wire up the source, detector and systems described by the command line and config
pub fn build_controller(input: &InputArgs, config: &SessionConfig) -> Result<SessionController> {
    let opener = build_opener(input, config)?;
    let detector = build_detector(input, config)?;
    info!("Using {} with {} poses", opener.describe(), detector.name());

    Ok(SessionController::new(
        opener,
        detector,
        Systems::new(config),
    ))
}

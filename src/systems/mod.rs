pub mod detection_gate;
pub mod displacement;

use detection_gate::DetectionGate;
use displacement::DisplacementTracker;
use log::debug;

use crate::session_config::SessionConfig;

pub struct Systems {
    pub displacement_tracker: DisplacementTracker,
    pub detection_gate: DetectionGate,
    /// Keypoints below this confidence are drawn as "unsure" and their bones are skipped
    pub overlay_confidence_threshold: f32,
}

impl Systems {
    pub fn new(config: &SessionConfig) -> Systems {
        debug!(
            "Detection gate: detect >= {}, track >= {}",
            config.min_detection_confidence, config.min_tracking_confidence
        );

        Systems {
            displacement_tracker: DisplacementTracker::new(),
            detection_gate: DetectionGate::new(
                config.min_detection_confidence,
                config.min_tracking_confidence,
            ),
            overlay_confidence_threshold: config.overlay_confidence_threshold,
        }
    }

    /// Forget everything learned about the current jumper
    pub fn reset(&mut self) {
        self.displacement_tracker.reset();
        self.detection_gate.reset();
    }
}

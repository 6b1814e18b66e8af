use log::debug;

use crate::tracking::Pose;

/// Applies the detector's confidence thresholds to raw pose scores. A fresh detection must
/// clear `min_detection_confidence`; once a pose is being tracked, later frames only need
/// to clear `min_tracking_confidence`.
#[derive(Debug, Clone)]
pub struct DetectionGate {
    min_detection_confidence: f32,
    min_tracking_confidence: f32,
    tracking: bool,
}

impl DetectionGate {
    pub fn new(min_detection_confidence: f32, min_tracking_confidence: f32) -> Self {
        DetectionGate {
            min_detection_confidence,
            min_tracking_confidence,
            tracking: false,
        }
    }

    pub fn admit(&mut self, detection: Option<Pose>) -> Option<Pose> {
        let threshold = if self.tracking {
            self.min_tracking_confidence
        } else {
            self.min_detection_confidence
        };

        match detection {
            Some(pose) if pose.score() >= threshold => {
                if !self.tracking {
                    debug!("Pose acquired (score {:.2})", pose.score());
                }
                self.tracking = true;
                Some(pose)
            }
            Some(pose) => {
                if self.tracking {
                    debug!("Pose lost (score {:.2} < {})", pose.score(), threshold);
                }
                self.tracking = false;
                None
            }
            None => {
                self.tracking = false;
                None
            }
        }
    }

    #[cfg(test)]
    fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn reset(&mut self) {
        self.tracking = false;
    }
}

use log::trace;

use crate::tracking::AnkleObservation;

/// Running "ground level" baseline plus the highest upward displacement seen since the
/// last reset. All values are pixels on the vertical image axis, where y grows downward,
/// so the ground is the *largest* ankle y observed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplacementTracker {
    baseline: Option<f32>,
    peak_displacement: f32,
}

impl DisplacementTracker {
    pub fn new() -> Self {
        DisplacementTracker {
            baseline: None,
            peak_displacement: 0.,
        }
    }

    /// Feed one frame's ankle positions (pixels). Returns the displacement for this frame,
    /// or None if either input is not finite, in which case nothing changes.
    pub fn update(&mut self, left_ankle_y: f32, right_ankle_y: f32) -> Option<f32> {
        if !left_ankle_y.is_finite() || !right_ankle_y.is_finite() {
            trace!(
                "Rejected non-finite ankle input ({}, {})",
                left_ankle_y,
                right_ankle_y
            );
            return None;
        }

        // The lower foot is the one touching the ground
        let ankle_y = left_ankle_y.max(right_ankle_y);

        let baseline = match self.baseline {
            Some(b) if b >= ankle_y => b,
            _ => {
                trace!("Baseline raised to {}", ankle_y);
                self.baseline = Some(ankle_y);
                ankle_y
            }
        };

        let displacement = baseline - ankle_y;
        if displacement > self.peak_displacement {
            self.peak_displacement = displacement;
        }

        Some(displacement)
    }

    /// Scale a normalised observation by its frame height, then [`Self::update`]
    pub fn observe(&mut self, observation: &AnkleObservation) -> Option<f32> {
        let (left, right) = observation.to_pixels();
        self.update(left, right)
    }

    pub fn reset(&mut self) {
        self.baseline = None;
        self.peak_displacement = 0.;
    }

    pub fn baseline(&self) -> Option<f32> {
        self.baseline
    }

    pub fn peak_displacement(&self) -> f32 {
        self.peak_displacement
    }
}

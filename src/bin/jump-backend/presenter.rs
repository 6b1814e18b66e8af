use log::{debug, info, trace};

use jump_height_estimator::{
    annotate::{format_metric, AnnotatedFrame, PEAK_METRIC_LABEL},
    session::{Presenter, SessionStatus},
};

/// Headless presenter: everything goes to the log
#[derive(Default)]
pub struct LogPresenter {
    last_peak: Option<String>,
    frames_shown: u64,
}

impl LogPresenter {
    pub fn frames_shown(&self) -> u64 {
        self.frames_shown
    }
}

impl Presenter for LogPresenter {
    fn show_frame(&mut self, frame: AnnotatedFrame) {
        self.frames_shown += 1;
        match frame.caption() {
            Some(caption) => debug!("Frame {}: {}", frame.index, caption),
            None => trace!("Frame {}: no pose", frame.index),
        }
    }

    fn show_peak(&mut self, peak_displacement: f32) {
        // Only log when the displayed value would change
        let text = format_metric(peak_displacement);
        if self.last_peak.as_ref() != Some(&text) {
            info!("{}: {}", PEAK_METRIC_LABEL, text);
            self.last_peak = Some(text);
        }
    }

    fn show_status(&mut self, status: &SessionStatus) {
        info!("{}", status.status_message());
    }
}

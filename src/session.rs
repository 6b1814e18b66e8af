use std::fmt;

use log::{debug, info, trace, warn};

use crate::{
    annotate::{annotate, AnnotatedFrame},
    capture::{SourceOpener, VideoSource},
    pose::PoseDetector,
    systems::{displacement::DisplacementTracker, Systems},
    tracking::AnkleObservation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Requested,
    EndOfStream,
    OpenFailed(String),
    ReadFailed(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Requested => write!(f, "stopped by user"),
            StopReason::EndOfStream => write!(f, "end of video"),
            StopReason::OpenFailed(e) => write!(f, "could not open video source: {}", e),
            StopReason::ReadFailed(e) => write!(f, "video source failed: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Running,
    Stopped(StopReason),
}

impl SessionStatus {
    /// One-line status for display
    pub fn status_message(&self) -> String {
        match self {
            SessionStatus::Idle => String::from("Click Start to begin."),
            SessionStatus::Running => String::from("Running."),
            SessionStatus::Stopped(StopReason::Requested) => String::from("Stopped."),
            SessionStatus::Stopped(reason) => format!("Stopped: {}.", reason),
        }
    }
}

/// Where frames, the peak metric and status changes end up
pub trait Presenter {
    fn show_frame(&mut self, frame: AnnotatedFrame);
    fn show_peak(&mut self, peak_displacement: f32);
    fn show_status(&mut self, status: &SessionStatus);
}

/// Source of Start/Stop commands, polled once per loop iteration
pub trait ControlSurface {
    fn poll_command(&mut self) -> Option<Command>;
}

/// Drives capture → pose detection → displacement tracking → presentation, one frame at
/// a time. Running exactly when a video source is held.
pub struct SessionController {
    opener: Box<dyn SourceOpener>,
    detector: Box<dyn PoseDetector>,
    systems: Systems,
    source: Option<Box<dyn VideoSource>>,
    frames_processed: u64,
}

impl SessionController {
    pub fn new(
        opener: Box<dyn SourceOpener>,
        detector: Box<dyn PoseDetector>,
        systems: Systems,
    ) -> Self {
        info!(
            "Session controller ready; source: {}, detector: {}",
            opener.describe(),
            detector.name()
        );
        SessionController {
            opener,
            detector,
            systems,
            source: None,
            frames_processed: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.source.is_some() {
            SessionState::Running
        } else {
            SessionState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == SessionState::Running
    }

    pub fn tracker(&self) -> &DisplacementTracker {
        &self.systems.displacement_tracker
    }

    /// Frames pulled from the source during the current (or last) session
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Start while Running and Stop while Idle do nothing
    pub fn handle(&mut self, command: Command, presenter: &mut dyn Presenter) {
        match (command, self.state()) {
            (Command::Start, SessionState::Idle) => self.start(presenter),
            (Command::Stop, SessionState::Running) => self.stop(presenter),
            (command, state) => debug!("Ignoring {:?} while {:?}", command, state),
        }
    }

    pub fn start(&mut self, presenter: &mut dyn Presenter) {
        if self.is_running() {
            debug!("Already running");
            return;
        }

        self.systems.reset();
        self.frames_processed = 0;

        match self.opener.open() {
            Ok(source) => {
                info!("Session started on {}", self.opener.describe());
                self.source = Some(source);
                presenter.show_status(&SessionStatus::Running);
                presenter.show_peak(self.tracker().peak_displacement());
            }
            Err(e) => {
                warn!("Failed to open {}: {:#}", self.opener.describe(), e);
                presenter.show_status(&SessionStatus::Stopped(StopReason::OpenFailed(
                    format!("{:#}", e),
                )));
            }
        }
    }

    pub fn stop(&mut self, presenter: &mut dyn Presenter) {
        self.end_session(StopReason::Requested, presenter);
    }

    /// Process exactly one frame, if Running. Returns the state afterwards.
    pub fn step(&mut self, presenter: &mut dyn Presenter) -> SessionState {
        let Some(source) = self.source.as_mut() else {
            return SessionState::Idle;
        };

        let frame = match source.read() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                self.end_session(StopReason::EndOfStream, presenter);
                return SessionState::Idle;
            }
            Err(e) => {
                self.end_session(StopReason::ReadFailed(format!("{:#}", e)), presenter);
                return SessionState::Idle;
            }
        };
        self.frames_processed += 1;

        let detection = match self.detector.detect(&frame) {
            Ok(detection) => detection,
            Err(e) => {
                warn!("Pose detection failed on frame {}: {:#}", frame.index, e);
                None
            }
        };

        match self.systems.detection_gate.admit(detection) {
            Some(pose) => {
                let observation = AnkleObservation::from_pose(&pose, frame.height());
                match self.systems.displacement_tracker.observe(&observation) {
                    Some(displacement) => {
                        trace!("Frame {}: displacement {:.1}", frame.index, displacement);
                        let annotated = annotate(
                            frame,
                            &pose,
                            displacement,
                            self.systems.overlay_confidence_threshold,
                        );
                        presenter.show_frame(annotated);
                        presenter.show_peak(self.tracker().peak_displacement());
                    }
                    None => presenter.show_frame(AnnotatedFrame::plain(frame)),
                }
            }
            None => presenter.show_frame(AnnotatedFrame::plain(frame)),
        }

        SessionState::Running
    }

    /// Blocking loop: step, then check for a command, until Idle
    pub fn run(&mut self, presenter: &mut dyn Presenter, controls: &mut dyn ControlSurface) {
        while self.step(presenter) == SessionState::Running {
            if let Some(command) = controls.poll_command() {
                self.handle(command, presenter);
            }
        }
        debug!(
            "Session loop ended after {} frames",
            self.frames_processed
        );
    }

    /// Release the source (if any) and then the pose detector for good
    pub fn shutdown(mut self) {
        if let Some(source) = self.source.take() {
            drop(source);
            debug!("Released video source on shutdown");
        }
        info!("Shutting down {} detector", self.detector.name());
        drop(self.detector);
    }

    fn end_session(&mut self, reason: StopReason, presenter: &mut dyn Presenter) {
        match self.source.take() {
            Some(source) => {
                drop(source);
                info!(
                    "Session ended ({}) after {} frames; peak {:.1} px",
                    reason,
                    self.frames_processed,
                    self.tracker().peak_displacement()
                );
                presenter.show_status(&SessionStatus::Stopped(reason));
            }
            None => debug!("Not running; nothing to stop"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        capture::VideoFrame,
        session_config::SessionConfig,
        systems::detection_gate::DetectionGate,
        tracking::{Keypoint, KeypointIndex, Pose},
    };
    use anyhow::{anyhow, Result};
    use image::RgbImage;
    use std::{cell::Cell, collections::VecDeque, rc::Rc};

    const FRAME_HEIGHT: u32 = 100;

    enum Scripted {
        Frame,
        Fail,
    }

    struct ScriptedSource {
        script: VecDeque<Scripted>,
        next_index: u64,
        released: Rc<Cell<bool>>,
    }

    impl VideoSource for ScriptedSource {
        fn read(&mut self) -> Result<Option<VideoFrame>> {
            match self.script.pop_front() {
                Some(Scripted::Frame) => {
                    let frame = VideoFrame::new(self.next_index, RgbImage::new(50, FRAME_HEIGHT));
                    self.next_index += 1;
                    Ok(Some(frame))
                }
                Some(Scripted::Fail) => Err(anyhow!("cable unplugged")),
                None => Ok(None),
            }
        }
    }

    impl Drop for ScriptedSource {
        fn drop(&mut self) {
            self.released.set(true);
        }
    }

    struct ScriptedOpener {
        frames: usize,
        fail_after: Option<usize>,
        refuse: bool,
        opened: Rc<Cell<u32>>,
        released: Rc<Cell<bool>>,
    }

    impl ScriptedOpener {
        fn with_frames(frames: usize) -> Self {
            ScriptedOpener {
                frames,
                fail_after: None,
                refuse: false,
                opened: Rc::new(Cell::new(0)),
                released: Rc::new(Cell::new(false)),
            }
        }
    }

    impl SourceOpener for ScriptedOpener {
        fn open(&mut self) -> Result<Box<dyn VideoSource>> {
            if self.refuse {
                return Err(anyhow!("no such device"));
            }
            self.opened.set(self.opened.get() + 1);
            self.released.set(false);
            let mut script: VecDeque<Scripted> =
                (0..self.frames).map(|_| Scripted::Frame).collect();
            if let Some(n) = self.fail_after {
                script.truncate(n);
                script.push_back(Scripted::Fail);
            }
            Ok(Box::new(ScriptedSource {
                script,
                next_index: 0,
                released: self.released.clone(),
            }))
        }

        fn describe(&self) -> String {
            String::from("scripted")
        }
    }

    /// Per-frame (left, right) ankle y in normalised units; None = no detection,
    /// NaN = garbage output
    struct ScriptedDetector {
        ankles: Vec<Option<(f32, f32)>>,
        error_on: Option<u64>,
        dropped: Rc<Cell<bool>>,
    }

    impl PoseDetector for ScriptedDetector {
        fn detect(&mut self, frame: &VideoFrame) -> Result<Option<Pose>> {
            if self.error_on == Some(frame.index) {
                return Err(anyhow!("inference blew up"));
            }
            Ok(self
                .ankles
                .get(frame.index as usize)
                .copied()
                .flatten()
                .map(|(left, right)| {
                    let mut pose = Pose::new([Keypoint::new(0.5, 0.5, 1.0); KeypointIndex::COUNT]);
                    pose.keypoints[KeypointIndex::LeftAnkle as usize].y = left;
                    pose.keypoints[KeypointIndex::RightAnkle as usize].y = right;
                    pose
                }))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    impl Drop for ScriptedDetector {
        fn drop(&mut self) {
            self.dropped.set(true);
        }
    }

    #[derive(Default)]
    struct RecordingPresenter {
        frames: Vec<AnnotatedFrame>,
        peaks: Vec<f32>,
        statuses: Vec<SessionStatus>,
    }

    impl Presenter for RecordingPresenter {
        fn show_frame(&mut self, frame: AnnotatedFrame) {
            self.frames.push(frame);
        }
        fn show_peak(&mut self, peak_displacement: f32) {
            self.peaks.push(peak_displacement);
        }
        fn show_status(&mut self, status: &SessionStatus) {
            self.statuses.push(status.clone());
        }
    }

    struct ScriptedControls {
        /// Command to issue after the given number of frames
        at_frame: Vec<(usize, Command)>,
        polls: usize,
    }

    impl ControlSurface for ScriptedControls {
        fn poll_command(&mut self) -> Option<Command> {
            self.polls += 1;
            self.at_frame
                .iter()
                .find(|(n, _)| *n == self.polls)
                .map(|(_, c)| *c)
        }
    }

    fn no_controls() -> ScriptedControls {
        ScriptedControls {
            at_frame: Vec::new(),
            polls: 0,
        }
    }

    fn controller(
        opener: ScriptedOpener,
        ankles: Vec<Option<(f32, f32)>>,
    ) -> (SessionController, Rc<Cell<bool>>) {
        let dropped = Rc::new(Cell::new(false));
        let detector = ScriptedDetector {
            ankles,
            error_on: None,
            dropped: dropped.clone(),
        };
        let controller = SessionController::new(
            Box::new(opener),
            Box::new(detector),
            Systems::new(&SessionConfig::default()),
        );
        (controller, dropped)
    }

    #[test]
    fn test_starts_idle() {
        let (controller, _) = controller(ScriptedOpener::with_frames(1), vec![]);
        assert_eq!(controller.state(), SessionState::Idle);
        assert_eq!(controller.tracker().baseline(), None);
    }

    #[test]
    fn test_worked_jump_through_the_loop() {
        let opener = ScriptedOpener::with_frames(4);
        let released = opener.released.clone();
        let (mut controller, _) = controller(
            opener,
            vec![
                Some((3.0, 3.1)),
                Some((2.5, 2.6)),
                None,
                Some((3.2, 3.3)),
            ]
            .into_iter()
            .map(|a| a.map(|(l, r)| (l / 10., r / 10.)))
            .collect(),
        );
        let mut presenter = RecordingPresenter::default();

        controller.start(&mut presenter);
        assert!(controller.is_running());
        assert_eq!(presenter.statuses, vec![SessionStatus::Running]);
        assert_eq!(presenter.peaks, vec![0.0]);

        controller.run(&mut presenter, &mut no_controls());

        assert_eq!(controller.state(), SessionState::Idle);
        assert!(released.get());
        assert_eq!(controller.frames_processed(), 4);
        assert_eq!(
            presenter.statuses.last(),
            Some(&SessionStatus::Stopped(StopReason::EndOfStream))
        );

        let displacements: Vec<Option<f32>> =
            presenter.frames.iter().map(|f| f.displacement).collect();
        assert_eq!(displacements.len(), 4);
        assert_eq!(displacements[0], Some(0.0));
        assert!((displacements[1].unwrap() - 5.0).abs() < 0.001);
        // No detection: shown unannotated, peak untouched
        assert_eq!(displacements[2], None);
        assert_eq!(displacements[3], Some(0.0));

        // Start + one peak per tracked frame
        assert_eq!(presenter.peaks.len(), 4);
        assert!((controller.tracker().peak_displacement() - 5.0).abs() < 0.001);
        assert!((controller.tracker().baseline().unwrap() - 33.0).abs() < 0.001);
    }

    #[test]
    fn test_stop_command_finishes_the_current_frame() {
        let opener = ScriptedOpener::with_frames(10);
        let released = opener.released.clone();
        let (mut controller, _) = controller(opener, vec![Some((0.5, 0.5)); 10]);
        let mut presenter = RecordingPresenter::default();
        let mut controls = ScriptedControls {
            at_frame: vec![(1, Command::Start), (3, Command::Stop)],
            polls: 0,
        };

        controller.start(&mut presenter);
        controller.run(&mut presenter, &mut controls);

        assert_eq!(controller.state(), SessionState::Idle);
        assert!(released.get());
        assert_eq!(presenter.frames.len(), 3);
        assert_eq!(
            presenter.statuses,
            vec![
                SessionStatus::Running,
                SessionStatus::Stopped(StopReason::Requested)
            ]
        );
    }

    #[test]
    fn test_start_resets_tracker_and_reopens_source() {
        let opener = ScriptedOpener::with_frames(2);
        let opened = opener.opened.clone();
        let (mut controller, _) = controller(opener, vec![Some((0.9, 0.9)), Some((0.4, 0.4))]);
        let mut presenter = RecordingPresenter::default();

        controller.start(&mut presenter);
        controller.run(&mut presenter, &mut no_controls());
        assert!(controller.tracker().peak_displacement() > 0.);

        controller.handle(Command::Start, &mut presenter);
        assert_eq!(opened.get(), 2);
        assert_eq!(controller.tracker().baseline(), None);
        assert_eq!(controller.tracker().peak_displacement(), 0.);
        assert_eq!(presenter.peaks.last(), Some(&0.0));
    }

    #[test]
    fn test_redundant_commands_are_ignored() {
        let opener = ScriptedOpener::with_frames(3);
        let opened = opener.opened.clone();
        let (mut controller, _) = controller(opener, vec![]);
        let mut presenter = RecordingPresenter::default();

        controller.handle(Command::Stop, &mut presenter);
        assert!(presenter.statuses.is_empty());

        controller.handle(Command::Start, &mut presenter);
        controller.handle(Command::Start, &mut presenter);
        assert_eq!(opened.get(), 1);
        assert_eq!(presenter.statuses, vec![SessionStatus::Running]);

        controller.handle(Command::Stop, &mut presenter);
        controller.handle(Command::Stop, &mut presenter);
        assert_eq!(presenter.statuses.len(), 2);
        assert_eq!(controller.step(&mut presenter), SessionState::Idle);
    }

    #[test]
    fn test_open_failure_stays_idle() {
        let mut opener = ScriptedOpener::with_frames(3);
        opener.refuse = true;
        let (mut controller, _) = controller(opener, vec![]);
        let mut presenter = RecordingPresenter::default();

        controller.start(&mut presenter);
        assert_eq!(controller.state(), SessionState::Idle);
        match presenter.statuses.as_slice() {
            [SessionStatus::Stopped(StopReason::OpenFailed(msg))] => {
                assert!(msg.contains("no such device"))
            }
            other => panic!("unexpected statuses {:?}", other),
        }
    }

    #[test]
    fn test_read_failure_ends_session_and_releases_source() {
        let mut opener = ScriptedOpener::with_frames(5);
        opener.fail_after = Some(2);
        let released = opener.released.clone();
        let (mut controller, _) = controller(opener, vec![Some((0.5, 0.5)); 5]);
        let mut presenter = RecordingPresenter::default();

        controller.start(&mut presenter);
        controller.run(&mut presenter, &mut no_controls());

        assert!(released.get());
        assert_eq!(presenter.frames.len(), 2);
        assert!(matches!(
            presenter.statuses.last(),
            Some(SessionStatus::Stopped(StopReason::ReadFailed(_)))
        ));
    }

    #[test]
    fn test_detector_error_and_garbage_are_no_detection() {
        let dropped = Rc::new(Cell::new(false));
        let detector = ScriptedDetector {
            ankles: vec![Some((0.8, 0.8)), Some((0.5, 0.5)), Some((f32::NAN, 0.5))],
            error_on: Some(1),
            dropped: dropped.clone(),
        };
        let mut controller = SessionController::new(
            Box::new(ScriptedOpener::with_frames(3)),
            Box::new(detector),
            Systems::new(&SessionConfig::default()),
        );
        let mut presenter = RecordingPresenter::default();

        controller.start(&mut presenter);
        controller.run(&mut presenter, &mut no_controls());

        let displacements: Vec<Option<f32>> =
            presenter.frames.iter().map(|f| f.displacement).collect();
        assert_eq!(displacements, vec![Some(0.0), None, None]);
        assert!((controller.tracker().baseline().unwrap() - 80.0).abs() < 0.001);
        assert_eq!(controller.tracker().peak_displacement(), 0.0);
    }

    #[test]
    fn test_low_score_pose_is_not_tracked() {
        let dropped = Rc::new(Cell::new(false));
        let detector = ScriptedDetector {
            ankles: vec![Some((0.5, 0.5))],
            error_on: None,
            dropped: dropped.clone(),
        };
        let mut systems = Systems::new(&SessionConfig::default());
        // Scripted poses score exactly 1.0
        systems.detection_gate = DetectionGate::new(1.01, 0.5);
        let mut controller = SessionController::new(
            Box::new(ScriptedOpener::with_frames(1)),
            Box::new(detector),
            systems,
        );
        let mut presenter = RecordingPresenter::default();

        controller.start(&mut presenter);
        controller.step(&mut presenter);
        assert_eq!(presenter.frames[0].displacement, None);
        assert_eq!(controller.tracker().baseline(), None);
    }

    #[test]
    fn test_shutdown_releases_source_and_detector() {
        let opener = ScriptedOpener::with_frames(5);
        let released = opener.released.clone();
        let (mut controller, detector_dropped) = controller(opener, vec![]);
        let mut presenter = RecordingPresenter::default();

        controller.start(&mut presenter);
        controller.step(&mut presenter);
        assert!(!released.get());

        controller.shutdown();
        assert!(released.get());
        assert!(detector_dropped.get());
    }

    #[test]
    fn test_status_messages() {
        assert_eq!(SessionStatus::Idle.status_message(), "Click Start to begin.");
        assert_eq!(
            SessionStatus::Stopped(StopReason::Requested).status_message(),
            "Stopped."
        );
        assert_eq!(
            SessionStatus::Stopped(StopReason::EndOfStream).status_message(),
            "Stopped: end of video."
        );
    }
}

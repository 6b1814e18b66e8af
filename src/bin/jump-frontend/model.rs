use std::collections::VecDeque;

use egui::{ColorImage, TextureHandle, TextureOptions};
use log::{error, info};

use jump_height_estimator::{
    annotate::{format_metric, AnnotatedFrame},
    session::{Presenter, SessionController, SessionStatus},
    session_config::load_config_from_file,
    settings::build_controller,
};

use crate::{cli::Cli, ui::render_ui};

/// How many per-frame displacements to keep for the history plot
pub const HISTORY_LENGTH: usize = 300;

/// Everything the window shows; fed by the controller through [`Presenter`]
pub struct FrontendView {
    pending_frame: Option<AnnotatedFrame>,
    pub texture: Option<TextureHandle>,
    pub caption: Option<String>,
    pub peak_text: String,
    pub status: SessionStatus,
    /// (frame index, displacement) for recent tracked frames
    pub history: VecDeque<[f64; 2]>,
}

impl Default for FrontendView {
    fn default() -> Self {
        FrontendView {
            pending_frame: None,
            texture: None,
            caption: None,
            peak_text: format_metric(0.),
            status: SessionStatus::Idle,
            history: VecDeque::with_capacity(HISTORY_LENGTH),
        }
    }
}

impl FrontendView {
    /// Move the latest frame (if any) into GPU texture memory
    pub fn upload_pending(&mut self, ctx: &egui::Context) {
        let Some(frame) = self.pending_frame.take() else {
            return;
        };

        let size = [frame.image.width() as usize, frame.image.height() as usize];
        let image = ColorImage::from_rgb(size, frame.image.as_raw());
        if let Some(texture) = self.texture.as_mut() {
            texture.set(image, TextureOptions::default());
        } else {
            self.texture = Some(ctx.load_texture("video", image, TextureOptions::default()));
        }
    }
}

impl Presenter for FrontendView {
    fn show_frame(&mut self, frame: AnnotatedFrame) {
        self.caption = frame.caption();
        if let Some(displacement) = frame.displacement {
            if self.history.len() == HISTORY_LENGTH {
                self.history.pop_front();
            }
            self.history
                .push_back([frame.index as f64, displacement as f64]);
        }
        self.pending_frame = Some(frame);
    }

    fn show_peak(&mut self, peak_displacement: f32) {
        self.peak_text = format_metric(peak_displacement);
    }

    fn show_status(&mut self, status: &SessionStatus) {
        if *status == SessionStatus::Running {
            self.history.clear();
            self.caption = None;
        }
        self.status = status.clone();
    }
}

pub struct Model {
    pub controller: Option<SessionController>,
    /// Set if the controller could not be built; shown in place of the controls
    pub startup_error: Option<String>,
    pub view: FrontendView,
}

impl Model {
    pub fn new(cli: &Cli) -> Self {
        let built = load_config_from_file(&cli.config_path)
            .and_then(|config| build_controller(&cli.input, &config));

        match built {
            Ok(controller) => {
                info!("Jump Frontend started OK");
                Model {
                    controller: Some(controller),
                    startup_error: None,
                    view: FrontendView::default(),
                }
            }
            Err(e) => {
                error!("Could not set up session: {:#}", e);
                Model {
                    controller: None,
                    startup_error: Some(format!("{:#}", e)),
                    view: FrontendView::default(),
                }
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.controller
            .as_ref()
            .map(|c| c.is_running())
            .unwrap_or(false)
    }

    pub fn frames_processed(&self) -> u64 {
        self.controller
            .as_ref()
            .map(|c| c.frames_processed())
            .unwrap_or(0)
    }
}

impl eframe::App for Model {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(controller) = self.controller.as_mut() {
            if controller.is_running() {
                controller.step(&mut self.view);
                ctx.request_repaint();
            }
        }

        self.view.upload_pending(ctx);

        if let Some(command) = render_ui(ctx, self) {
            if let Some(controller) = self.controller.as_mut() {
                controller.handle(command, &mut self.view);
                ctx.request_repaint();
            }
        }
    }
}

impl Drop for Model {
    fn drop(&mut self) {
        if let Some(controller) = self.controller.take() {
            controller.shutdown();
        }
    }
}

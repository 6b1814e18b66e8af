use egui::{Button, Color32, Grid, RichText, Ui};
use jump_height_estimator::{annotate::PEAK_METRIC_LABEL, session::Command};

use crate::model::Model;

use super::SPACING_AMOUNT;

pub fn render_controls(model: &Model, ui: &mut Ui) -> Option<Command> {
    let mut command = None;

    ui.heading("Session");
    let running = model.is_running();
    let ready = model.controller.is_some();
    ui.horizontal(|ui| {
        if ui
            .add_enabled(ready && !running, Button::new("Start"))
            .clicked()
        {
            command = Some(Command::Start);
        }
        if ui.add_enabled(running, Button::new("Stop")).clicked() {
            command = Some(Command::Stop);
        }
    });
    ui.add_space(SPACING_AMOUNT);

    ui.group(|ui| {
        ui.label(PEAK_METRIC_LABEL);
        ui.label(RichText::new(&model.view.peak_text).size(36.).strong());
    });
    ui.add_space(SPACING_AMOUNT);

    ui.label(model.view.status.status_message());
    if let Some(e) = &model.startup_error {
        ui.colored_label(Color32::RED, e);
    }

    ui.separator();

    Grid::new("session_grid").show(ui, |ui| {
        ui.label("Frames processed: ");
        ui.label(format!("{}", model.frames_processed()));
        ui.end_row();
    });

    command
}

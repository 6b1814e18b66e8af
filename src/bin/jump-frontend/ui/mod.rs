mod controls;
mod history_graph;
mod video;

use controls::render_controls;
use history_graph::render_history_graph;
use jump_height_estimator::session::Command;
use video::render_video;

use crate::model::Model;

pub const SPACING_AMOUNT: f32 = 16.0;

/// Draw the whole window; returns a command if one of the buttons was clicked
pub fn render_ui(ctx: &egui::Context, model: &mut Model) -> Option<Command> {
    let command = egui::SidePanel::left("controls")
        .min_width(200.)
        .show(ctx, |ui| {
            ui.add_space(SPACING_AMOUNT);
            render_controls(model, ui)
        })
        .inner;

    egui::TopBottomPanel::bottom("history")
        .resizable(true)
        .show(ctx, |ui| {
            render_history_graph(model, ui);
        });

    egui::CentralPanel::default().show(ctx, |ui| {
        render_video(model, ui);
    });

    command
}

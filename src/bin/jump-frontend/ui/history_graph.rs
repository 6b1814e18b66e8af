use egui::{
    plot::{Line, Plot, PlotPoints},
    Color32, Ui,
};

use crate::model::Model;

pub fn render_history_graph(model: &Model, ui: &mut Ui) {
    ui.heading("Displacement (px)");

    let plot = Plot::new("displacement_history")
        .height(160.)
        .include_y(0.)
        .auto_bounds_x()
        .auto_bounds_y();

    let points: Vec<[f64; 2]> = model.view.history.iter().copied().collect();
    plot.show(ui, |plot_ui| {
        plot_ui.line(Line::new(PlotPoints::new(points)).color(Color32::YELLOW));
    });
}

//! # Jump Frontend
//!
//! Desktop window around a [`SessionController`](jump_height_estimator::session::SessionController):
//! Start/Stop buttons, the live annotated video, the peak metric and a short history of
//! per-frame displacement. The controller is stepped once per UI update, on the UI thread.
//!
use clap::Parser;

use cli::Cli;
use env_logger::Env;
use log::debug;
use model::Model;

mod cli;
mod model;
mod ui;

fn main() -> Result<(), eframe::Error> {
    let cli = Cli::parse();

    // Initialize the logger from the environment

    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level))
        .filter_module("winit", log::LevelFilter::Warn)
        .filter_module("eframe", log::LevelFilter::Warn)
        .filter_module("egui_glow", log::LevelFilter::Warn)
        .filter_module("ort", log::LevelFilter::Warn)
        .init();

    debug!("Started; args: {:?}", cli);

    let model = Model::new(&cli);

    let options = eframe::NativeOptions {
        initial_window_size: Some(egui::vec2(1280.0, 800.0)),
        ..Default::default()
    };
    eframe::run_native(
        "Jump Height Estimator",
        options,
        Box::new(|_cc| Box::new(model)),
    )
}

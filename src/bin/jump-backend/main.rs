use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::{debug, info};

use cli::Cli;
use console::ConsoleControls;
use jump_height_estimator::{
    annotate::{format_metric, PEAK_METRIC_LABEL},
    session::{Presenter, SessionStatus},
    session_config::load_config_from_file,
    settings::build_controller,
};
use presenter::LogPresenter;

mod cli;
mod console;
mod presenter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger from the environment

    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level))
        .filter_module("ort", log::LevelFilter::Warn)
        .init();

    debug!("Started; args: {:?}", cli);

    let config = load_config_from_file(&cli.config_path)?;
    let mut controller = build_controller(&cli.input, &config)?;

    let mut presenter = LogPresenter::default();
    let mut controls = ConsoleControls::new(cli.interactive)?;

    if cli.interactive {
        presenter.show_status(&SessionStatus::Idle);
        info!("Type start, stop or quit (Ctrl+C stops a running session)");
        while let Some(command) = controls.wait_for_command() {
            controller.handle(command, &mut presenter);
            controller.run(&mut presenter, &mut controls);
            if controls.quit_requested() {
                break;
            }
        }
    } else {
        controller.start(&mut presenter);
        controller.run(&mut presenter, &mut controls);
    }

    info!(
        "{}: {} ({} frames shown)",
        PEAK_METRIC_LABEL,
        format_metric(controller.tracker().peak_displacement()),
        presenter.frames_shown()
    );

    controller.shutdown();
    Ok(())
}

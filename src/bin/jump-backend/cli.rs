use clap::Parser;

use jump_height_estimator::settings::{InputArgs, CONFIG_FILE_PATH};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Where to load the session config (created with defaults if missing)
    #[arg(long="configPath",default_value_t=String::from(CONFIG_FILE_PATH))]
    pub config_path: String,

    #[arg(long = "loglevel",default_value_t=String::from("info"))]
    pub log_level: String,

    #[command(flatten)]
    pub input: InputArgs,

    /// Wait for start / stop / quit on stdin instead of running a single session
    #[arg(long = "interactive")]
    pub interactive: bool,
}

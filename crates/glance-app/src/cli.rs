use std::path::PathBuf;

use clap::Parser;

/// Hotkey-driven screen capture answered by a multimodal model
#[derive(Parser, Debug)]
#[command(name = "glance", version, about)]
pub struct Cli {
    /// Load settings from this env file instead of `.env`
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Run the pipeline once, without hotkeys, and exit
    #[arg(long)]
    pub once: bool,

    /// Validate the configuration, print it and exit
    #[arg(long, conflicts_with = "once")]
    pub check_config: bool,
}

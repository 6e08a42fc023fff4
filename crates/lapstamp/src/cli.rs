use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "lapstamp", about = "Adds timestamps to timelapse videos.")]
pub struct Cli {
    /// Wall clock interval between frames in seconds.
    #[arg(
        short,
        long,
        value_name = "SECONDS",
        required_unless_present = "rebuild_config"
    )]
    pub interval: Option<f64>,

    /// Input file path.
    #[arg(required_unless_present = "rebuild_config")]
    pub input: Option<PathBuf>,

    /// Output file path. Defaults to the input name with a
    /// "-timestamped" suffix, keeping the extension.
    pub output: Option<PathBuf>,

    /// Overwrite the settings file with defaults and exit.
    #[arg(long)]
    pub rebuild_config: bool,

    /// Stop after this many frames.
    #[arg(long, value_name = "N")]
    pub max_frames: Option<u64>,
}

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "seekguard",
    version,
    about = "Play a video in the terminal with seek-rate guarding"
)]
pub struct Cli {
    /// Enable the development debug console (also SEEKGUARD_DEV=1)
    #[arg(long, global = true)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve the input to a playable URL and open the player
    Play {
        /// Stored video path, local file, or absolute http(s) URL
        video: String,

        /// Fallback duration in seconds when the resolver reports none
        #[arg(long, default_value_t = 600.0)]
        duration: f64,
    },
    /// Print the resolved streaming URL without playing
    Resolve {
        /// Stored video path, local file, or absolute http(s) URL
        video: String,
    },
}

//! Command-line argument definitions for the Cavern CLI.

use clap::Parser;

/// Command-line arguments for the Cavern map checker
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input map file
    #[arg(help = "Path to the map file to check")]
    pub input: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Emit diagnostics as JSON instead of rendered reports
    #[arg(long)]
    pub json: bool,

    /// Treat warnings like errors for the exit code
    #[arg(long)]
    pub deny_warnings: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

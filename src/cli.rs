use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Cli {
    /// Directory holding `appsettings.*` files
    #[arg(long, global = true, default_value = "config")]
    pub config_dir: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the recurring jobs until interrupted (default)
    Serve,
    /// List the recurring jobs the application registers
    Jobs {
        /// Print the jobs as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show version information
    Version,
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Rain removal for photos, over HTTP or offline", long_about = None)]
pub struct Cli {
    /// YAML config file
    #[arg(long, global = true, default_value = "config.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the web front-end (default)
    Serve,
    /// Restore a single image without starting the server
    Restore {
        /// image path
        #[arg(long)]
        input: PathBuf,

        /// directory the restored image is written to
        #[arg(long, default_value = "static/results")]
        output: PathBuf,
    },
}

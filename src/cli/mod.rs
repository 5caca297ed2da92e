pub mod augment;
pub mod detect;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// QR Detection Node CLI
#[derive(Parser, Debug)]
#[command(name = "qr-cli")]
#[command(version)]
#[command(about = "Local QR detection and dataset tools", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect and decode QR codes in an image file
    Detect(detect::DetectArgs),

    /// Write augmented copies of a YOLO-format dataset
    Augment(augment::AugmentArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Detect(args) => detect::run_detect(args).await,
        Commands::Augment(args) => augment::run_augment(args).await,
    }
}

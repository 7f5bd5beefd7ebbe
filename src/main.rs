//! GrabX command-line front end
//!
//! Fetches media with yt-dlp (or takes a local file), clips a fragment with
//! stream copy and re-encodes it with ffmpeg. Output files are never left
//! half-written: failures and cancellations restore what was there before.
//!
//! # Usage
//!
//! ```bash
//! grabx grab "https://example.com/watch?v=abc" --start 1:00 --end 1:30
//! grabx grab --file talk.mkv --video-codec h265 --container mp4
//! grabx formats "https://example.com/watch?v=abc"
//! grabx check mov --video prores --audio copy --original-audio aac
//! ```

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

use grabx_cli::app::DefaultAppContainer;
use grabx_cli::cli::{commands, Cli, Commands};
use grabx_cli::config_initialization::initialize_configuration_hierarchy;
use grabx_cli::utils::logging::init_logging;

/// Main entry point for the GrabX CLI application
#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Configuration first, since it decides how logging is set up
    let loaded = initialize_configuration_hierarchy(&cli)?;
    init_logging(&loaded.config.logging)?;
    match &loaded.file {
        Some(path) => info!(path = %path.display(), "Using configuration file"),
        None => debug!("No configuration file found, using defaults"),
    }

    let config = loaded.config;
    match cli.command {
        Commands::Grab(args) => {
            let container = DefaultAppContainer::new(&config);
            let result = commands::grab(&container, &config, args).await?;
            commands::report(&result);
            Ok(if result.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Formats(args) => {
            let container = DefaultAppContainer::new(&config);
            commands::formats(&container, args).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check(args) => Ok(if commands::check(&args) {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(2)
        }),
    }
}

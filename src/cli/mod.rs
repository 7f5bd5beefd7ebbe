//! CLI module for GrabX
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

pub use args::{CheckArgs, FormatsArgs, GrabArgs};

/// GrabX media grabber
///
/// Fetches media from a remote source or takes a local file, optionally clips a
/// fragment losslessly and re-encodes it, leaving the output directory
/// consistent whatever happens.
#[derive(Parser, Debug)]
#[command(name = "grabx")]
#[command(about = "GrabX - fetch, clip and re-encode media safely")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to grabx.toml or the user config directory)
    #[arg(long, global = true, env = "GRABX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (pretty, compact, json)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Existing output files: prompt, overwrite or rename
    #[arg(long, global = true)]
    pub conflict: Option<String>,

    /// Accept format compromises and keep originals without asking
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch or take a local file, clip and re-encode it
    Grab(GrabArgs),
    /// List the formats a source offers
    Formats(FormatsArgs),
    /// Check a container/codec combination without touching any file
    Check(CheckArgs),
}

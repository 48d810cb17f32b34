//! # CLI Argument Definitions
//!
//! This module defines the command-line interface (CLI) structure using the `clap` crate.
//! It specifies the available subcommands, arguments, and flags for the application.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI structure parsing command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "vestibule-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Identity backend gated by a datastore readiness check")]
pub struct Cli {
    /// Path to the configuration file (defaults to `server` in the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The subcommand to execute; defaults to `serve`.
    #[command(subcommand)]
    pub command: Option<AppCommands>,
}

/// Enumeration of available application subcommands.
#[derive(Debug, Default, Subcommand)]
pub enum AppCommands {
    /// Run the HTTP server (waits for the datastore first)
    #[default]
    Serve,
    /// Block until the configured datastore answers, then exit 0
    WaitForDb,
}

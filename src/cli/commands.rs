//! CLI command definitions using clap.
//!
//! Each subcommand plays one host event against the persisted rating state:
//! - launch / foreground: record a use
//! - event: record a significant event
//! - status: show the record and eligibility

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rategate - decide when to ask for an app rating
#[derive(Parser, Debug)]
#[command(name = "rategate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// SQLite database holding the rating state
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Application identifier (overrides config)
    #[arg(long, global = true)]
    pub identifier: Option<String>,

    /// Version of the running app (overrides config)
    #[arg(long, global = true)]
    pub app_version: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Record an app launch
    Launch,

    /// Record a return to the foreground
    Foreground,

    /// Record a significant event
    Event {
        /// Allow this event to trigger the prompt
        #[arg(short, long)]
        prompt: bool,
    },

    /// Show the persisted record and eligibility
    Status {
        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the prompt regardless of eligibility
    Prompt,

    /// Mark the current version as rated and print the review URL
    Rate,

    /// Reset all counters for the running version
    Reset,
}

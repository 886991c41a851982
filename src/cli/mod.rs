//! CLI module for rategate - command-line interface and subcommands.
//!
//! Drives a rating gate against a SQLite store, with the terminal standing
//! in for the host UI.

pub mod commands;
pub mod terminal;

pub use commands::Cli;
pub use terminal::TerminalHost;

//! CLI module for trendwatch - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for running schedulers,
//! validating configuration, and ranking feed files.

pub mod commands;

pub use commands::Cli;

//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: start every configured scheduler against the local feed
//! - check: validate configuration and list schedulers
//! - score: rank a feed file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Trendwatch - periodic trend collection and scoring
#[derive(Parser, Debug)]
#[command(name = "trendwatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write logs to stderr instead of the log file
    #[arg(long, global = true)]
    pub log_stderr: bool,

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
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run all enabled schedulers until Ctrl-C
    Run {
        /// Feed file to read items from (overrides the config)
        #[arg(short, long)]
        feed: Option<PathBuf>,

        /// Execute one cycle per scheduler and exit
        #[arg(long)]
        once: bool,
    },

    /// Validate configuration and list schedulers
    Check,

    /// Rank the items of a feed file
    Score {
        /// JSON feed file
        file: PathBuf,

        /// Rank by surge score instead of composite score
        #[arg(short, long)]
        surge: bool,

        /// Number of items to print
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
}

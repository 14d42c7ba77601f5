//! CLI argument structures
//!
//! This module defines the command-line interface of featurecook: the global
//! flags and one subcommand per job or streaming stage.

use crate::pipeline::InputStream;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Compute time-decayed counter and interaction-history features per entity key
#[derive(Parser)]
#[command(name = "featurecook")]
#[command(about = "featurecook - batch per-key temporal feature aggregation", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Job configuration file (YAML or TOML); built-in presets when absent
    #[arg(short = 'c', long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which job a streaming stage runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum JobKind {
    Counters,
    History,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Enrich a JSON-lines dataset with decayed counters, one pass per key group
    Counters {
        /// Dataset rows to enrich (file or directory, `.gz` allowed)
        #[arg(long, value_name = "PATH")]
        input_dataset: PathBuf,

        /// Signal events feeding the counters
        #[arg(long, value_name = "PATH")]
        input_signals: PathBuf,

        /// Output file; compressed when it ends in `.gz`
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,

        /// Key group to aggregate by, e.g. `hostId,memberId` (repeat to chain passes)
        #[arg(long = "reduce-by", value_name = "DIMS")]
        reduce_by: Vec<String>,

        /// Sequencing gap of one window, e.g. `1h` (repeat for several windows)
        #[arg(long = "window", value_name = "GAP", value_parser = parse_gap)]
        windows: Vec<Duration>,

        /// Insert window labels into output field names
        #[arg(long)]
        label_windows: bool,

        /// Only emit rows at or after this instant (epoch seconds, RFC 3339 or YYYY-MM-DD)
        #[arg(long, value_name = "INSTANT")]
        cutoff: Option<String>,

        /// Maximum number of groups reduced concurrently
        #[arg(long)]
        parallelism: Option<usize>,

        /// Parent directory for intermediate outputs of chained passes
        #[arg(long, value_name = "DIR")]
        tmp_prefix: Option<PathBuf>,

        /// Keep intermediate outputs after a successful run
        #[arg(long)]
        keep_intermediate: bool,

        /// Show a progress bar while reducing
        #[arg(long)]
        progress: bool,
    },

    /// Append positive and negative host histories to interaction CSV rows
    History {
        /// Interaction rows (file or directory, `.gz` allowed)
        #[arg(short, long, value_name = "PATH")]
        input: PathBuf,

        /// Output file; compressed when it ends in `.gz`
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,

        /// Only emit rows at or after this instant
        #[arg(long, value_name = "INSTANT")]
        cutoff: Option<String>,

        /// Maximum number of groups reduced concurrently
        #[arg(long)]
        parallelism: Option<usize>,

        /// Show a progress bar while reducing
        #[arg(long)]
        progress: bool,
    },

    /// Streaming map stage: raw lines on stdin, `key<TAB>value` lines on stdout
    Map {
        #[arg(long, value_enum)]
        job: JobKind,

        /// Stream the stdin records belong to
        #[arg(long, value_enum, default_value = "dataset")]
        stream: InputStream,

        /// Key group for the counters job
        #[arg(long = "reduce-by", value_name = "DIMS")]
        reduce_by: Option<String>,
    },

    /// Streaming reduce stage: key-sorted `key<TAB>value` lines on stdin, records on stdout
    Reduce {
        #[arg(long, value_enum)]
        job: JobKind,

        /// Key group for the counters job
        #[arg(long = "reduce-by", value_name = "DIMS")]
        reduce_by: Option<String>,
    },

    /// Print the effective configuration as YAML
    #[command(name = "show-config")]
    ShowConfig,
}

fn parse_gap(value: &str) -> Result<Duration, String> {
    humantime::parse_duration(value).map_err(|e| format!("invalid gap '{}': {}", value, e))
}

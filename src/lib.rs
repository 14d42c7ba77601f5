//! # featurecook
//!
//! Batch feature engineering over event logs: time-decayed counters and
//! bounded interaction histories, computed per entity key without leaking
//! same-instant evidence into the rows being enriched.
//!
//! ## Usage
//!
//! ```bash
//! featurecook counters --input-dataset rows.jsonl --input-signals events.jsonl -o out.jsonl.gz
//! featurecook history --input interactions.csv -o with_history.csv
//! featurecook map --job counters --stream signals --reduce-by hostId < events.jsonl
//! ```
//!
//! ## Modules
//!
//! - `core` - Pure per-group logic: keys, causal sequencing, accumulators, snapshots
//! - `pipeline` - The counter and history jobs as map/reduce functions
//! - `runner` - In-process executor, sinks, gzip-aware IO and streaming stages
//! - `config` - Job configuration, presets and validation
//! - `error` - Error type with numeric codes
//! - `app` - Logging and fatal error handling
//! - `cli` - Command-line interface
pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod runner;

pub use error::{FeatureError, Result};

//! Command implementation modules
//!
//! Each command loads the job configuration, applies its flag overrides and
//! hands off to the runner or a streaming stage.

pub mod config;
pub mod counters;
pub mod history;
pub mod stream;

pub use config::run_show_config;
pub use counters::{run_counters_command, CountersParams};
pub use history::{run_history_command, HistoryParams};
pub use stream::{run_map_command, run_reduce_command};

use crate::config::{load_job_config, parse_cutoff, ConfigValidator, JobConfig};
use crate::error::{ErrorCode, FeatureError};
use anyhow::{Context, Result};
use std::path::Path;

/// Load the configuration file (or presets) for a command
pub async fn load_config(path: Option<&Path>) -> Result<JobConfig> {
    let config = load_job_config(path)
        .await
        .context("Failed to load job configuration")?;
    Ok(config)
}

/// Re-check a configuration after flag overrides were applied
pub fn revalidate(config: &JobConfig) -> Result<()> {
    ConfigValidator::validate(config).context("Invalid command-line overrides")
}

pub(crate) fn cutoff_flag(value: Option<&str>) -> Result<Option<i64>> {
    value
        .map(|text| {
            parse_cutoff(text).map_err(|message| {
                anyhow::Error::from(FeatureError::config_with_code(
                    ErrorCode::CONFIG_INVALID_VALUE,
                    message,
                ))
            })
        })
        .transpose()
}

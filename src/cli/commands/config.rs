//! `show-config` command

use super::load_config;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Print the effective job configuration, presets included, as YAML
pub async fn run_show_config(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path.as_deref()).await?;
    let yaml = serde_yaml::to_string(&config).context("Failed to render configuration")?;
    print!("{}", yaml);
    Ok(())
}

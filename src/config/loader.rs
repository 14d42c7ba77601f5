use super::{ConfigValidator, JobConfig};
use crate::error::{ErrorCode, FeatureError, Result};
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a file extension; anything but `.toml` is YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }
}

/// Parse and validate configuration text
pub fn parse_job_config(content: &str, format: ConfigFormat) -> Result<JobConfig> {
    let config: JobConfig = if content.trim().is_empty() {
        JobConfig::default()
    } else {
        match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Toml => toml::from_str(content)?,
        }
    };
    ConfigValidator::validate(&config)?;
    Ok(config)
}

/// Load the job configuration, falling back to the built-in defaults
pub async fn load_job_config(path: Option<&Path>) -> Result<JobConfig> {
    let Some(path) = path else {
        debug!("No configuration file given, using built-in defaults");
        return Ok(JobConfig::default());
    };

    let content = fs::read_to_string(path).await.map_err(|e| {
        let code = if e.kind() == std::io::ErrorKind::NotFound {
            ErrorCode::CONFIG_NOT_FOUND
        } else {
            ErrorCode::CONFIG_GENERIC
        };
        FeatureError::config_with_code(code, format!("cannot read {}", path.display()))
            .with_source(e)
    })?;

    let config = parse_job_config(&content, ConfigFormat::from_path(path))
        .map_err(|e| e.with_context(path.display()))?;
    debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

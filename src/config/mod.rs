//! Job configuration
//!
//! A single [`JobConfig`] file (YAML or TOML) describes both jobs and the
//! local runner. Every section has defaults reproducing the built-in feature
//! set, so an empty file is a valid configuration.

pub mod loader;
pub mod presets;
pub mod validator;

pub use loader::{load_job_config, parse_job_config, ConfigFormat};
pub use validator::ConfigValidator;

use crate::core::accumulator::AccumulatorSpec;
use crate::core::snapshot::window_label;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    #[serde(default)]
    pub counters: CounterJobConfig,
    #[serde(default)]
    pub history: HistoryJobConfig,
    #[serde(default)]
    pub runner: RunnerSettings,
}

/// One sequencing pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    #[serde(with = "humantime_serde")]
    pub gap: Duration,
    /// Label used in field names; defaults to the compact gap, e.g. `1h`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl WindowSpec {
    pub fn new(gap: Duration) -> Self {
        Self { gap, label: None }
    }

    pub fn label(&self) -> String {
        self.label.clone().unwrap_or_else(|| window_label(self.gap))
    }
}

/// Decay-counter job over JSON-lines events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterJobConfig {
    /// Key groups run in order, each as `dim1,dim2,...`; the output of one
    /// pass is the dataset of the next
    pub dimension_groups: Vec<String>,
    pub windows: Vec<WindowSpec>,
    /// Insert the window label into field names
    pub label_windows: bool,
    /// Primary rows earlier than this instant are not emitted
    #[serde(deserialize_with = "deserialize_cutoff")]
    pub cutoff: Option<i64>,
    pub accumulators: Vec<AccumulatorSpec>,
}

impl Default for CounterJobConfig {
    fn default() -> Self {
        Self {
            dimension_groups: presets::dimension_groups(),
            windows: vec![WindowSpec::new(presets::DEFAULT_GAP)],
            label_windows: false,
            cutoff: None,
            accumulators: presets::counters(),
        }
    }
}

/// Interaction history job over positional CSV rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryJobConfig {
    pub key_fields: Vec<String>,
    #[serde(with = "humantime_serde")]
    pub gap: Duration,
    #[serde(deserialize_with = "deserialize_cutoff")]
    pub cutoff: Option<i64>,
    pub accumulators: Vec<AccumulatorSpec>,
}

impl Default for HistoryJobConfig {
    fn default() -> Self {
        Self {
            key_fields: vec!["memberId".to_string()],
            gap: presets::DEFAULT_GAP,
            cutoff: Some(presets::HISTORY_CUTOFF),
            accumulators: presets::histories(),
        }
    }
}

/// Local executor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    /// Maximum number of groups reduced concurrently
    pub parallelism: usize,
    /// Parent directory for intermediate outputs of chained passes
    pub tmp_prefix: Option<PathBuf>,
    pub keep_intermediate: bool,
    pub progress: bool,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            parallelism: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            tmp_prefix: None,
            keep_intermediate: false,
            progress: false,
        }
    }
}

/// Parse a cutoff given as epoch seconds, an RFC 3339 instant or a UTC date
pub fn parse_cutoff(text: &str) -> Result<i64, String> {
    let text = text.trim();
    if let Ok(seconds) = text.parse::<i64>() {
        return Ok(seconds);
    }
    if let Ok(instant) = chrono::DateTime::parse_from_rfc3339(text) {
        return Ok(instant.timestamp());
    }
    chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp())
        .ok_or_else(|| {
            format!(
                "invalid cutoff '{}': expected epoch seconds, RFC 3339 or YYYY-MM-DD",
                text
            )
        })
}

fn deserialize_cutoff<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCutoff {
        Epoch(i64),
        Text(String),
    }

    match Option::<RawCutoff>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawCutoff::Epoch(seconds)) => Ok(Some(seconds)),
        Some(RawCutoff::Text(text)) => parse_cutoff(&text).map(Some).map_err(de::Error::custom),
    }
}

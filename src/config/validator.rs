use super::{CounterJobConfig, HistoryJobConfig, JobConfig, RunnerSettings};
use crate::core::accumulator::AccumulatorSpec;
use crate::core::key::KEY_SENTINEL;
use crate::error::{ErrorCode, FeatureError, Result};
use crate::pipeline::history::COLUMNS;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Window labels sit inside a field name, never at its start
static LABEL_FRAGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("label pattern is valid"));

static DIMENSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").expect("dimension pattern is valid")
});

/// Checks a parsed configuration, reporting every problem at once
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &JobConfig) -> Result<()> {
        let mut problems = Vec::new();
        Self::check_counters(&config.counters, &mut problems);
        Self::check_history(&config.history, &mut problems);
        Self::check_runner(&config.runner, &mut problems);

        if problems.is_empty() {
            Ok(())
        } else {
            Err(FeatureError::config_with_code(
                ErrorCode::CONFIG_VALIDATION_FAILED,
                format!(
                    "{} problem(s) found:\n  - {}",
                    problems.len(),
                    problems.join("\n  - ")
                ),
            ))
        }
    }

    fn check_counters(config: &CounterJobConfig, problems: &mut Vec<String>) {
        if config.dimension_groups.is_empty() {
            problems.push("counters.dimension_groups must not be empty".to_string());
        }
        for group in &config.dimension_groups {
            Self::check_dimensions("counters.dimension_groups", group.split(','), problems);
        }

        if config.windows.is_empty() {
            problems.push("counters.windows must contain at least one window".to_string());
        }
        let mut labels = HashSet::new();
        for window in &config.windows {
            let label = window.label();
            if config.label_windows && !LABEL_FRAGMENT.is_match(&label) {
                problems.push(format!(
                    "counters.windows: label '{}' may only contain letters, digits and '_'",
                    label
                ));
            }
            if !labels.insert(label.clone()) {
                problems.push(format!("counters.windows: duplicate window '{}'", label));
            }
        }
        if config.windows.len() > 1 && !config.label_windows {
            problems.push(
                "counters.label_windows must be true when more than one window is configured"
                    .to_string(),
            );
        }

        Self::check_accumulators("counters.accumulators", &config.accumulators, problems);
    }

    fn check_history(config: &HistoryJobConfig, problems: &mut Vec<String>) {
        if config.key_fields.is_empty() {
            problems.push("history.key_fields must not be empty".to_string());
        }
        for field in &config.key_fields {
            if !COLUMNS.contains(&field.trim()) {
                problems.push(format!(
                    "history.key_fields: '{}' is not one of the row columns ({})",
                    field,
                    COLUMNS.join(", ")
                ));
            }
        }
        Self::check_accumulators("history.accumulators", &config.accumulators, problems);
    }

    fn check_runner(config: &RunnerSettings, problems: &mut Vec<String>) {
        if config.parallelism == 0 {
            problems.push("runner.parallelism must be greater than 0".to_string());
        }
    }

    fn check_dimensions<'a>(
        section: &str,
        dimensions: impl Iterator<Item = &'a str>,
        problems: &mut Vec<String>,
    ) {
        for dimension in dimensions {
            let dimension = dimension.trim();
            if dimension.contains(KEY_SENTINEL) || !DIMENSION.is_match(dimension) {
                problems.push(format!("{}: invalid dimension '{}'", section, dimension));
            }
        }
    }

    fn check_accumulators(section: &str, specs: &[AccumulatorSpec], problems: &mut Vec<String>) {
        if specs.is_empty() {
            problems.push(format!("{} must not be empty", section));
        }
        let mut seen = HashSet::new();
        for spec in specs {
            if !IDENTIFIER.is_match(spec.name()) {
                problems.push(format!(
                    "{}: name '{}' is not a valid identifier",
                    section,
                    spec.name()
                ));
            }
            if !seen.insert(spec.name()) {
                problems.push(format!("{}: duplicate name '{}'", section, spec.name()));
            }
            match spec {
                AccumulatorSpec::DecayCounter(counter) => {
                    if counter.decay.is_zero() {
                        problems.push(format!(
                            "{}: '{}' has a zero decay interval",
                            section, counter.name
                        ));
                    }
                    if let Some(expected) = counter.contribution.event_name() {
                        if expected != counter.event_name {
                            problems.push(format!(
                                "{}: '{}' reads a '{}' payload but listens to '{}'",
                                section, counter.name, expected, counter.event_name
                            ));
                        }
                    }
                }
                AccumulatorSpec::History(history) => {
                    if history.max_size == 0 {
                        problems.push(format!(
                            "{}: '{}' must keep at least one item",
                            section, history.name
                        ));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{presets, WindowSpec};
    use std::time::Duration;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ConfigValidator::validate(&JobConfig::default()).is_ok());

        let mut config = JobConfig::default();
        config.counters.windows = presets::multi_windows();
        config.counters.label_windows = true;
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_all_problems_are_reported() {
        let mut config = JobConfig::default();
        config.counters.dimension_groups = vec!["host£Id".to_string()];
        config.counters.windows = vec![
            WindowSpec::new(Duration::from_secs(60)),
            WindowSpec::new(Duration::from_secs(60)),
        ];
        config.runner.parallelism = 0;

        let err = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_VALIDATION_FAILED);
        let message = err.to_string();
        assert!(message.contains("invalid dimension 'host£Id'"));
        assert!(message.contains("duplicate window '1m'"));
        assert!(message.contains("label_windows must be true"));
        assert!(message.contains("parallelism"));
    }

    #[test]
    fn test_window_labels_may_start_with_a_digit() {
        let mut config = JobConfig::default();
        config.counters.windows = vec![
            WindowSpec::new(Duration::from_secs(60)),
            WindowSpec::new(Duration::from_secs(86_400)),
            WindowSpec {
                gap: Duration::from_secs(7_200),
                label: Some("two-hours".to_string()),
            },
        ];
        config.counters.label_windows = true;

        let err = ConfigValidator::validate(&config).unwrap_err();
        let message = err.to_string();
        assert!(!message.contains("'1m'"));
        assert!(!message.contains("'1day'"));
        assert!(message.contains("label 'two-hours' may only contain"));
    }

    #[test]
    fn test_history_keys_must_be_row_columns() {
        let mut config = JobConfig::default();
        config.history.key_fields = vec!["evaluationFlag".to_string()];
        assert!(ConfigValidator::validate(&config).is_ok());

        config.history.key_fields = vec!["viewerId".to_string()];
        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(err
            .to_string()
            .contains("'viewerId' is not one of the row columns"));
    }

    #[test]
    fn test_accumulator_checks_apply_to_both_sections() {
        let mut config = JobConfig::default();
        config.history.accumulators = vec![AccumulatorSpec::DecayCounter(
            crate::core::accumulator::CounterSpec {
                name: "likes".to_string(),
                event_name: "like".to_string(),
                decay: Duration::ZERO,
                contribution: crate::core::accumulator::Contribution::Unit,
            },
        )];
        config.counters.accumulators = vec![AccumulatorSpec::History(
            crate::core::accumulator::HistorySpec {
                name: "hosts".to_string(),
                id_field: "hostId".to_string(),
                label_field: "label".to_string(),
                polarity: crate::core::accumulator::Polarity::Any,
                max_size: 0,
            },
        )];

        let message = ConfigValidator::validate(&config).unwrap_err().to_string();
        assert!(message.contains("history.accumulators: 'likes' has a zero decay interval"));
        assert!(message.contains("counters.accumulators: 'hosts' must keep at least one item"));
    }

    #[test]
    fn test_mismatched_contribution_is_rejected() {
        let mut config = JobConfig::default();
        config.counters.accumulators = vec![AccumulatorSpec::DecayCounter(
            crate::core::accumulator::CounterSpec {
                name: "gifts".to_string(),
                event_name: "like".to_string(),
                decay: Duration::from_secs(60),
                contribution: crate::core::accumulator::Contribution::GiftValue,
            },
        )];
        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("reads a 'gift' payload"));
    }
}

//! Built-in feature set

use super::WindowSpec;
use crate::core::accumulator::{
    AccumulatorSpec, Contribution, CounterSpec, HistorySpec, Polarity,
};
use crate::core::snapshot::window_label;
use std::time::Duration;

pub const DEFAULT_GAP: Duration = Duration::from_secs(3600);

pub const COUNTER_DECAY: Duration = Duration::from_secs(30 * 24 * 3600);

/// Views longer than this count as a watched live
pub const LONG_VIEW_MS: f64 = 90_000.0;

/// 2023-04-05T00:00:00Z
pub const HISTORY_CUTOFF: i64 = 1_680_652_800;

pub const HISTORY_MAX_SIZE: usize = 32;

pub fn dimension_groups() -> Vec<String> {
    ["hostId", "memberId", "livestreamId", "hostId,memberId"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// One-minute, one-hour and one-day passes with labelled field names
pub fn multi_windows() -> Vec<WindowSpec> {
    [60, 3600, 86_400]
        .into_iter()
        .map(|secs| WindowSpec::new(Duration::from_secs(secs)))
        .collect()
}

fn counter(base: &str, event_name: &str, contribution: Contribution) -> AccumulatorSpec {
    AccumulatorSpec::DecayCounter(CounterSpec {
        name: format!("{}_decay_{}", base, window_label(COUNTER_DECAY)),
        event_name: event_name.to_string(),
        decay: COUNTER_DECAY,
        contribution,
    })
}

pub fn counters() -> Vec<AccumulatorSpec> {
    vec![
        counter("timespent", "view_end", Contribution::DurationMs),
        counter(
            "lives_count",
            "view_end",
            Contribution::LongView {
                min_duration_ms: LONG_VIEW_MS,
            },
        ),
        counter("like_count", "like", Contribution::LikeCounter),
        counter("gift_count", "gift", Contribution::GiftQuantity),
        counter("gift_value", "gift", Contribution::GiftValue),
        counter("shares_count", "share", Contribution::Unit),
        counter("comments_count", "comment", Contribution::Unit),
    ]
}

pub fn counter_names() -> Vec<String> {
    counters()
        .iter()
        .map(|spec| spec.name().to_string())
        .collect()
}

pub fn histories() -> Vec<AccumulatorSpec> {
    [
        ("positives_history", Polarity::Positive),
        ("negatives_history", Polarity::Negative),
    ]
    .into_iter()
    .map(|(name, polarity)| {
        AccumulatorSpec::History(HistorySpec {
            name: name.to_string(),
            id_field: "hostId".to_string(),
            label_field: "label".to_string(),
            polarity,
            max_size: HISTORY_MAX_SIZE,
        })
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_names() {
        let names = counter_names();
        assert_eq!(names[0], "timespent_decay_30days");
        assert!(names.contains(&"like_count_decay_30days".to_string()));
        assert_eq!(names.len(), 7);
    }

    #[test]
    fn test_multi_window_labels() {
        let labels: Vec<String> = multi_windows().iter().map(WindowSpec::label).collect();
        assert_eq!(labels, vec!["1m", "1h", "1day"]);
    }
}

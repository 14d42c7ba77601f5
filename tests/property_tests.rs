//! Property tests for the per-group aggregation core
//!
//! Verifies, over generated groups:
//! - No leakage: a row only sees auxiliary evidence strictly before it
//! - Determinism: arrival order never changes the output
//! - Window independence: a window's fields do not depend on other windows
//! - History bounds: reads never exceed the configured size

use featurecook::config::{CounterJobConfig, WindowSpec};
use featurecook::core::{
    AccumulatorSpec, Contribution, CounterSpec, Event, GroupKey, HistoryBuffer, HistorySpec,
    KeyExtractor, Polarity, Role, TaggedEvent,
};
use featurecook::pipeline::CounterPipeline;
use proptest::prelude::*;
use serde_json::json;
use std::time::Duration;

const DECAY_SECS: u64 = 86_400;
const FIELD: &str = "shares";

fn config(windows: Vec<WindowSpec>, label_windows: bool) -> CounterJobConfig {
    CounterJobConfig {
        dimension_groups: vec!["hostId".to_string()],
        windows,
        label_windows,
        cutoff: None,
        accumulators: vec![AccumulatorSpec::DecayCounter(CounterSpec {
            name: FIELD.to_string(),
            event_name: "share".to_string(),
            decay: Duration::from_secs(DECAY_SECS),
            contribution: Contribution::Unit,
        })],
    }
}

fn record(role: Role, time: i64) -> TaggedEvent {
    let name = match role {
        Role::Primary => "row",
        Role::Auxiliary => "share",
    };
    let fields = json!({ "event_name": name, "event_time": time, "hostId": "h" });
    let event = Event::from_fields(fields.as_object().cloned().unwrap()).unwrap();
    TaggedEvent::new(role, event)
}

fn group_strategy() -> impl Strategy<Value = Vec<TaggedEvent>> {
    (
        prop::collection::vec(0i64..20_000, 0..20),
        prop::collection::vec(0i64..20_000, 1..6),
    )
        .prop_map(|(aux, primaries)| {
            aux.into_iter()
                .map(|t| record(Role::Auxiliary, t))
                .chain(primaries.into_iter().map(|t| record(Role::Primary, t)))
                .collect()
        })
}

fn job(windows: Vec<WindowSpec>, label_windows: bool) -> CounterPipeline {
    CounterPipeline::new(
        &config(windows, label_windows),
        KeyExtractor::parse("hostId").unwrap(),
    )
}

proptest! {
    #[test]
    fn prop_rows_only_see_strictly_earlier_evidence(
        aux in prop::collection::vec(0i64..10_000, 0..30),
        primary_time in 0i64..15_000,
        gap in 0u64..4_000,
    ) {
        let job = job(vec![WindowSpec::new(Duration::from_secs(gap))], false);
        let mut records: Vec<TaggedEvent> =
            aux.iter().map(|t| record(Role::Auxiliary, *t)).collect();
        records.push(record(Role::Primary, primary_time));

        let reduced = job
            .reduce_group(&GroupKey::from_raw("h£"), records)
            .unwrap();
        let observed = reduced.rows[0]
            .field(&format!("feature_hostId_{}", FIELD))
            .and_then(|v| v.as_f64())
            .unwrap();

        let gap = gap as i64;
        let expected: f64 = aux
            .iter()
            .map(|t| t + gap)
            .filter(|shifted| *shifted < primary_time)
            .map(|shifted| (-((primary_time - shifted) as f64) / DECAY_SECS as f64).exp())
            .sum();
        prop_assert!((observed - expected).abs() <= 1e-9 * expected.max(1.0));
    }

    #[test]
    fn prop_arrival_order_is_irrelevant(
        (group, shuffled) in group_strategy()
            .prop_flat_map(|group| (Just(group.clone()), Just(group).prop_shuffle()))
    ) {
        let job = job(vec![WindowSpec::new(Duration::from_secs(3600))], false);
        let key = GroupKey::from_raw("h£");
        let a = job.reduce_group(&key, group).unwrap();
        let b = job.reduce_group(&key, shuffled).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_window_fields_do_not_depend_on_other_windows(group in group_strategy()) {
        let hour = WindowSpec::new(Duration::from_secs(3600));
        let minute = WindowSpec::new(Duration::from_secs(60));
        let key = GroupKey::from_raw("h£");
        let alone = job(vec![hour.clone()], true)
            .reduce_group(&key, group.clone())
            .unwrap();
        let together = job(vec![minute, hour], true)
            .reduce_group(&key, group)
            .unwrap();

        let field = format!("feature_hostId_1h_{}", FIELD);
        prop_assert_eq!(alone.rows.len(), together.rows.len());
        for (a, b) in alone.rows.iter().zip(together.rows.iter()) {
            prop_assert_eq!(a.field(&field), b.field(&field));
        }
    }

    #[test]
    fn prop_history_reads_are_bounded(pushes in 0usize..200, max_size in 1usize..40) {
        let mut buffer = HistoryBuffer::new(&HistorySpec {
            name: "hosts".to_string(),
            id_field: "hostId".to_string(),
            label_field: "label".to_string(),
            polarity: Polarity::Any,
            max_size,
        });
        for i in 0..pushes {
            buffer.push(i.to_string());
            prop_assert!(buffer.stored_len() <= 2 * max_size);
        }

        let items = buffer.items();
        prop_assert_eq!(items.len(), pushes.min(max_size));
        let expected: Vec<String> = (pushes.saturating_sub(max_size)..pushes)
            .map(|i| i.to_string())
            .collect();
        prop_assert_eq!(items, expected.as_slice());
    }
}

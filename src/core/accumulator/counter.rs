//! Exponentially time-decayed counters

use crate::core::event::{Event, EventKind};
use crate::error::{ErrorCode, FeatureError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pure increment extracted from a matching event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Contribution {
    /// `duration_ms` of a `view_end`
    DurationMs,
    /// 1.0 when a `view_end` lasted longer than the threshold, else 0.0
    LongView { min_duration_ms: f64 },
    /// `like_counter` of a `like`
    LikeCounter,
    /// `gift_quantity` of a `gift`
    GiftQuantity,
    /// `gift_quantity * gift_cheers_value` of a `gift`
    GiftValue,
    /// 1.0 for any matching event
    Unit,
}

impl Contribution {
    /// Event kind this contribution reads its payload from, if any
    pub fn event_name(&self) -> Option<&'static str> {
        match self {
            Contribution::DurationMs | Contribution::LongView { .. } => Some(EventKind::VIEW_END),
            Contribution::LikeCounter => Some(EventKind::LIKE),
            Contribution::GiftQuantity | Contribution::GiftValue => Some(EventKind::GIFT),
            Contribution::Unit => None,
        }
    }

    pub fn extract(&self, kind: &EventKind) -> Result<f64> {
        match (self, kind) {
            (Contribution::Unit, _) => Ok(1.0),
            (Contribution::DurationMs, EventKind::ViewEnd { duration_ms }) => Ok(*duration_ms),
            (Contribution::LongView { min_duration_ms }, EventKind::ViewEnd { duration_ms }) => {
                Ok(if duration_ms > min_duration_ms { 1.0 } else { 0.0 })
            }
            (Contribution::LikeCounter, EventKind::Like { like_counter }) => Ok(*like_counter),
            (Contribution::GiftQuantity, EventKind::Gift { quantity, .. }) => Ok(*quantity),
            (
                Contribution::GiftValue,
                EventKind::Gift {
                    quantity,
                    cheers_value,
                },
            ) => Ok(quantity * cheers_value),
            (contribution, kind) => Err(FeatureError::record(
                ErrorCode::RECORD_PAYLOAD_MISMATCH,
                format!(
                    "contribution {:?} cannot read a '{}' event",
                    contribution,
                    kind.name()
                ),
            )),
        }
    }
}

/// Configuration of one decay counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterSpec {
    /// Accumulator name used in the output field
    pub name: String,
    /// Only events with this `event_name` update the counter
    pub event_name: String,
    /// Decay interval
    #[serde(with = "humantime_serde")]
    pub decay: Duration,
    pub contribution: Contribution,
}

/// Stateful decay counter
///
/// `value := exp(-(t - last_update) / decay) * value + contribution(event)`.
/// Before the first matching event there is no `last_update`; the first
/// update applies no decay and may sit at any instant, pre-epoch included.
#[derive(Debug, Clone, PartialEq)]
pub struct DecayCounter {
    name: String,
    event_name: String,
    decay_secs: f64,
    contribution: Contribution,
    value: f64,
    last_update: Option<i64>,
}

impl DecayCounter {
    pub fn new(spec: &CounterSpec) -> Self {
        Self {
            name: spec.name.clone(),
            event_name: spec.event_name.clone(),
            decay_secs: spec.decay.as_secs_f64(),
            contribution: spec.contribution.clone(),
            value: 0.0,
            last_update: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Consume one event positioned at `at` (its adjusted time)
    ///
    /// Events of any other name leave the counter untouched. An event older
    /// than the last update means the group was not sequenced and fails with a
    /// sequencing error instead of amplifying the value.
    pub fn observe(&mut self, event: &Event, at: i64) -> Result<()> {
        if event.name() != self.event_name {
            return Ok(());
        }
        if let Some(last) = self.last_update.filter(|last| at < *last) {
            return Err(FeatureError::out_of_order(last, at));
        }
        let increment = self.contribution.extract(event.kind())?;
        self.value = self.decay_factor(at) * self.value + increment;
        self.last_update = Some(at);
        Ok(())
    }

    /// Value as of the last update
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn last_update(&self) -> Option<i64> {
        self.last_update
    }

    /// Value decayed forward to `at` without touching state
    pub fn value_at(&self, at: i64) -> f64 {
        debug_assert!(
            self.last_update.map_or(true, |last| at >= last),
            "snapshot read before last update"
        );
        self.decay_factor(at) * self.value
    }

    fn decay_factor(&self, at: i64) -> f64 {
        match self.last_update {
            Some(last) => (-((at - last).max(0) as f64) / self.decay_secs).exp(),
            None => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THIRTY_DAYS: u64 = 30 * 24 * 3600;

    fn like(time: i64, count: i64) -> Event {
        Event::from_json_line(&format!(
            r#"{{"event_name":"like","event_time":{},"like_counter":{}}}"#,
            time, count
        ))
        .unwrap()
    }

    fn like_counter() -> DecayCounter {
        DecayCounter::new(&CounterSpec {
            name: "like_count".to_string(),
            event_name: "like".to_string(),
            decay: Duration::from_secs(THIRTY_DAYS),
            contribution: Contribution::LikeCounter,
        })
    }

    #[test]
    fn test_two_event_decay() {
        let mut counter = like_counter();
        counter.observe(&like(1_000, 2), 1_000).unwrap();
        counter.observe(&like(500_000, 3), 500_000).unwrap();

        let expected = (-(499_000.0) / THIRTY_DAYS as f64).exp() * 2.0 + 3.0;
        assert!((counter.value() - expected).abs() < 1e-9);
        assert_eq!(counter.last_update(), Some(500_000));
    }

    #[test]
    fn test_first_update_has_no_effective_decay() {
        let mut counter = like_counter();
        counter.observe(&like(1_680_000_000, 4), 1_680_000_000).unwrap();
        assert_eq!(counter.value(), 4.0);
    }

    #[test]
    fn test_first_update_may_precede_the_epoch() {
        let mut counter = like_counter();
        assert_eq!(counter.last_update(), None);
        counter.observe(&like(-86_400, 2), -86_400).unwrap();
        counter.observe(&like(-3_600, 1), -3_600).unwrap();

        let expected = (-(82_800.0) / THIRTY_DAYS as f64).exp() * 2.0 + 1.0;
        assert!((counter.value() - expected).abs() < 1e-12);
        assert_eq!(counter.last_update(), Some(-3_600));
    }

    #[test]
    fn test_non_matching_event_is_pass_through() {
        let mut counter = like_counter();
        counter.observe(&like(10, 1), 10).unwrap();
        let share = Event::from_json_line(r#"{"event_name":"share","event_time":99}"#).unwrap();
        counter.observe(&share, 99).unwrap();
        assert_eq!(counter.value(), 1.0);
        assert_eq!(counter.last_update(), Some(10));
    }

    #[test]
    fn test_zero_delta_is_allowed_and_negative_is_rejected() {
        let mut counter = like_counter();
        counter.observe(&like(10, 1), 10).unwrap();
        counter.observe(&like(10, 1), 10).unwrap();
        assert_eq!(counter.value(), 2.0);

        let err = counter.observe(&like(9, 1), 9).unwrap_err();
        assert_eq!(err.code(), ErrorCode::SEQ_OUT_OF_ORDER);
        assert_eq!(counter.value(), 2.0);
    }

    #[test]
    fn test_value_at_is_a_pure_read() {
        let mut counter = like_counter();
        counter.observe(&like(100, 1), 100).unwrap();
        let read = counter.value_at(150);
        assert!((read - (-50.0 / THIRTY_DAYS as f64).exp()).abs() < 1e-12);
        assert_eq!(counter.value(), 1.0);
        assert_eq!(counter.last_update(), Some(100));
    }

    #[test]
    fn test_contributions() {
        let view = EventKind::ViewEnd {
            duration_ms: 120_000.0,
        };
        let short_view = EventKind::ViewEnd {
            duration_ms: 1_000.0,
        };
        let gift = EventKind::Gift {
            quantity: 3.0,
            cheers_value: 10.0,
        };
        let long_view = Contribution::LongView {
            min_duration_ms: 90_000.0,
        };

        assert_eq!(Contribution::DurationMs.extract(&view).unwrap(), 120_000.0);
        assert_eq!(long_view.extract(&view).unwrap(), 1.0);
        assert_eq!(long_view.extract(&short_view).unwrap(), 0.0);
        assert_eq!(Contribution::GiftQuantity.extract(&gift).unwrap(), 3.0);
        assert_eq!(Contribution::GiftValue.extract(&gift).unwrap(), 30.0);
        assert_eq!(Contribution::Unit.extract(&EventKind::Share).unwrap(), 1.0);

        let err = Contribution::LikeCounter.extract(&gift).unwrap_err();
        assert_eq!(err.code(), ErrorCode::RECORD_PAYLOAD_MISMATCH);
    }
}

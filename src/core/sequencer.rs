//! Causal ordering of one group's records
//!
//! Auxiliary records are shifted forward by the pass gap before sorting so that
//! a primary record never observes auxiliary evidence from its own instant.
//! The shift lives in the [`Sequenced`] view only; records keep their original
//! timestamps, so every pass starts from unshifted data.

use super::event::{Role, TaggedEvent};
use std::cmp::Ordering;
use std::time::Duration;

/// Anything the sequencer can order
pub trait Timestamped {
    fn role(&self) -> Role;

    /// Original timestamp in epoch seconds
    fn event_time(&self) -> i64;
}

impl Timestamped for TaggedEvent {
    fn role(&self) -> Role {
        self.role
    }

    fn event_time(&self) -> i64 {
        self.event.event_time()
    }
}

/// A record positioned in the adjusted sequence
#[derive(Debug)]
pub struct Sequenced<'a, T> {
    pub record: &'a T,
    /// Position of the record in the input slice
    pub index: usize,
    pub role: Role,
    /// Timestamp after the auxiliary gap shift
    pub adjusted_time: i64,
}

impl<T> Clone for Sequenced<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Sequenced<'_, T> {}

impl<'a, T: Timestamped> Sequenced<'a, T> {
    pub fn original_time(&self) -> i64 {
        self.record.event_time()
    }
}

/// Orders a group's records for a single pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CausalSequencer {
    gap_secs: i64,
}

impl CausalSequencer {
    pub fn new(gap: Duration) -> Self {
        Self {
            gap_secs: i64::try_from(gap.as_secs()).unwrap_or(i64::MAX),
        }
    }

    pub fn gap_secs(&self) -> i64 {
        self.gap_secs
    }

    /// Adjusted timestamp of a record for this pass
    pub fn adjusted_time<T: Timestamped>(&self, record: &T) -> i64 {
        match record.role() {
            Role::Primary => record.event_time(),
            Role::Auxiliary => record.event_time().saturating_add(self.gap_secs),
        }
    }

    /// Produce the adjusted, time-ascending sequence
    ///
    /// Input order is irrelevant except on exact ties of both adjusted time and
    /// role, where arrival order is kept (the sort is stable). At equal adjusted
    /// time a primary record sorts before an auxiliary one.
    pub fn sequence<'a, T: Timestamped>(&self, records: &'a [T]) -> Vec<Sequenced<'a, T>> {
        let mut sequenced: Vec<Sequenced<'a, T>> = records
            .iter()
            .enumerate()
            .map(|(index, record)| Sequenced {
                record,
                index,
                role: record.role(),
                adjusted_time: self.adjusted_time(record),
            })
            .collect();
        sequenced.sort_by(compare_sequenced);
        sequenced
    }
}

fn compare_sequenced<T>(a: &Sequenced<'_, T>, b: &Sequenced<'_, T>) -> Ordering {
    a.adjusted_time
        .cmp(&b.adjusted_time)
        .then_with(|| a.role.cmp(&b.role))
}

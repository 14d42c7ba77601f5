//! Core feature logic with pure functions
//!
//! This module contains the per-key temporal aggregation logic without any I/O operations.
//! Following the "functional core, imperative shell" pattern, all functions here:
//! - Take inputs and return outputs
//! - Have no side effects
//! - Keep accumulator state private to one group invocation
//! - Are easily testable without a shuffle engine

pub mod accumulator;
pub mod event;
pub mod key;
pub mod sequencer;
pub mod snapshot;

pub use accumulator::{
    AccumulatorSet, AccumulatorSpec, Contribution, CounterSpec, DecayCounter, HistoryBuffer,
    HistorySpec, Polarity,
};
pub use event::{Event, EventKind, Role, TaggedEvent, ROLE_FIELD};
pub use key::{GroupKey, KeyExtractor, KEY_SENTINEL};
pub use sequencer::{CausalSequencer, Sequenced, Timestamped};
pub use snapshot::{FeatureNaming, FeatureSnapshot, FeatureValue, SnapshotWriter};

//! Stateful accumulators consumed in sequence order
//!
//! Every accumulator receives every record of a pass and decides internally
//! whether it updates. An [`AccumulatorSet`] is created per group and per
//! pass and never shared.

pub mod counter;
pub mod history;

pub use counter::{Contribution, CounterSpec, DecayCounter};
pub use history::{HistoryBuffer, HistorySpec, Polarity};

use super::event::{Event, Role};
use super::snapshot::{FeatureSnapshot, FeatureValue};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Configuration of one accumulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccumulatorSpec {
    DecayCounter(CounterSpec),
    History(HistorySpec),
}

impl AccumulatorSpec {
    pub fn name(&self) -> &str {
        match self {
            AccumulatorSpec::DecayCounter(spec) => &spec.name,
            AccumulatorSpec::History(spec) => &spec.name,
        }
    }
}

/// The fixed set of accumulator kinds
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    Decay(DecayCounter),
    History(HistoryBuffer),
}

impl Accumulator {
    pub fn from_spec(spec: &AccumulatorSpec) -> Self {
        match spec {
            AccumulatorSpec::DecayCounter(spec) => Accumulator::Decay(DecayCounter::new(spec)),
            AccumulatorSpec::History(spec) => Accumulator::History(HistoryBuffer::new(spec)),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Accumulator::Decay(counter) => counter.name(),
            Accumulator::History(buffer) => buffer.name(),
        }
    }

    pub fn observe(&mut self, role: Role, event: &Event, at: i64) -> Result<()> {
        match self {
            Accumulator::Decay(counter) => counter.observe(event, at),
            Accumulator::History(buffer) => buffer.observe(role, event),
        }
    }

    /// Current value as seen from instant `at`
    pub fn snapshot(&self, at: i64) -> FeatureValue {
        match self {
            Accumulator::Decay(counter) => FeatureValue::Number(counter.value_at(at)),
            Accumulator::History(buffer) => FeatureValue::History(buffer.items().to_vec()),
        }
    }
}

/// Accumulators for one group and one pass
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatorSet {
    accumulators: Vec<Accumulator>,
}

impl AccumulatorSet {
    pub fn from_specs(specs: &[AccumulatorSpec]) -> Self {
        Self {
            accumulators: specs.iter().map(Accumulator::from_spec).collect(),
        }
    }

    /// Feed one sequenced record to every accumulator
    pub fn observe(&mut self, role: Role, event: &Event, at: i64) -> Result<()> {
        for accumulator in &mut self.accumulators {
            accumulator.observe(role, event, at)?;
        }
        Ok(())
    }

    /// Read every accumulator, in configuration order
    pub fn snapshot(&self, at: i64) -> Vec<FeatureSnapshot> {
        self.accumulators
            .iter()
            .map(|accumulator| FeatureSnapshot {
                name: accumulator.name().to_string(),
                value: accumulator.snapshot(at),
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Accumulator> {
        self.accumulators.iter()
    }

    pub fn len(&self) -> usize {
        self.accumulators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accumulators.is_empty()
    }
}

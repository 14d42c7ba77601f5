//! Feature jobs expressed as map and reduce functions
//!
//! Each job exposes a pure `map_record` / `reduce_group` pair plus a
//! [`ShuffleJob`] implementation so any executor (the in-process runner or an
//! external streaming engine) can drive it.

pub mod counters;
pub mod history;

pub use counters::{CounterPipeline, ReducedGroup};
pub use history::{HistoryPipeline, InteractionRow};

use crate::core::key::GroupKey;
use crate::error::Result;

/// Logical input stream a raw record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum InputStream {
    /// Rows that must appear, enriched, in the output
    Dataset,
    /// Signals that only feed accumulator state
    Signals,
}

/// Serialized output of one reduced group
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupOutput {
    pub records: Vec<String>,
    /// Primary rows processed but withheld by the cutoff
    pub suppressed: usize,
}

/// A job the runner can map, shuffle and reduce
pub trait ShuffleJob: Send + Sync + 'static {
    type Value: Send + 'static;

    fn name(&self) -> &str;

    fn map_line(&self, line: &str, stream: InputStream) -> Result<(GroupKey, Self::Value)>;

    fn encode_value(&self, value: &Self::Value) -> Result<String>;

    fn decode_value(&self, raw: &str) -> Result<Self::Value>;

    /// Reduce one complete group; any error fails the whole group
    fn reduce(&self, key: &GroupKey, values: Vec<Self::Value>) -> Result<GroupOutput>;
}

//! Decay-counter job over JSON-lines events
//!
//! Dataset rows are primary, signal events are auxiliary. Every configured
//! window runs its own pass over the group with a fresh accumulator set, and
//! each eligible dataset row receives one field per accumulator per window.

use super::{GroupOutput, InputStream, ShuffleJob};
use crate::config::CounterJobConfig;
use crate::core::accumulator::{AccumulatorSet, AccumulatorSpec};
use crate::core::event::{Event, Role, TaggedEvent};
use crate::core::key::{GroupKey, KeyExtractor};
use crate::core::sequencer::CausalSequencer;
use crate::core::snapshot::{FeatureNaming, SnapshotWriter};
use crate::error::Result;
use std::collections::HashMap;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
struct WindowPass {
    label: String,
    sequencer: CausalSequencer,
    writer: SnapshotWriter,
}

/// Enriched rows of one group
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReducedGroup {
    pub rows: Vec<Event>,
    pub suppressed: usize,
}

/// Counter job for one key group
#[derive(Debug, Clone)]
pub struct CounterPipeline {
    name: String,
    extractor: KeyExtractor,
    windows: Vec<WindowPass>,
    accumulators: Vec<AccumulatorSpec>,
    cutoff: Option<i64>,
}

impl CounterPipeline {
    pub fn new(config: &CounterJobConfig, extractor: KeyExtractor) -> Self {
        let windows = config
            .windows
            .iter()
            .map(|window| {
                let label = window.label();
                let naming = FeatureNaming::new(
                    extractor.dimensions(),
                    config.label_windows.then_some(label.as_str()),
                );
                WindowPass {
                    sequencer: CausalSequencer::new(window.gap),
                    writer: SnapshotWriter::new(naming),
                    label,
                }
            })
            .collect();

        Self {
            name: format!("counters[{}]", extractor),
            extractor,
            windows,
            accumulators: config.accumulators.clone(),
            cutoff: config.cutoff,
        }
    }

    pub fn extractor(&self) -> &KeyExtractor {
        &self.extractor
    }

    /// Key and tag one raw record; the role is fixed by its input stream
    pub fn map_record(&self, line: &str, role: Role) -> Result<(GroupKey, TaggedEvent)> {
        let event = Event::from_json_line(line)?;
        let key = self.extractor.extract(event.fields())?;
        trace!(key = %key, role = %role, event = event.name(), "mapped record");
        Ok((key, TaggedEvent::new(role, event)))
    }

    /// Enrich the eligible primary records of one group
    ///
    /// Arrival order of `records` is irrelevant. Rows come back ordered by
    /// their timestamp.
    pub fn reduce_group(&self, key: &GroupKey, records: Vec<TaggedEvent>) -> Result<ReducedGroup> {
        let mut rows: HashMap<usize, Event> = HashMap::new();
        let mut order = Vec::new();
        let mut suppressed = 0;

        for (pass, window) in self.windows.iter().enumerate() {
            let mut accumulators = AccumulatorSet::from_specs(&self.accumulators);
            for item in window.sequencer.sequence(&records) {
                accumulators
                    .observe(item.role, &item.record.event, item.adjusted_time)
                    .map_err(|e| {
                        e.with_group_key(key.as_str())
                            .with_context(format!("window {}", window.label))
                    })?;

                if item.role != Role::Primary {
                    continue;
                }
                if !self.is_eligible(item.original_time()) {
                    if pass == 0 {
                        suppressed += 1;
                    }
                    continue;
                }

                let snapshot = accumulators.snapshot(item.adjusted_time);
                let row = rows.entry(item.index).or_insert_with(|| {
                    order.push(item.index);
                    item.record.event.clone()
                });
                window.writer.write_event(row, &snapshot);
            }
        }

        let rows = order
            .into_iter()
            .filter_map(|index| rows.remove(&index))
            .collect::<Vec<_>>();
        debug!(
            key = %key,
            records = records.len(),
            emitted = rows.len(),
            suppressed,
            "reduced counter group"
        );
        Ok(ReducedGroup { rows, suppressed })
    }

    fn is_eligible(&self, event_time: i64) -> bool {
        self.cutoff.map_or(true, |cutoff| event_time >= cutoff)
    }
}

impl ShuffleJob for CounterPipeline {
    type Value = TaggedEvent;

    fn name(&self) -> &str {
        &self.name
    }

    fn map_line(&self, line: &str, stream: InputStream) -> Result<(GroupKey, TaggedEvent)> {
        let role = match stream {
            InputStream::Dataset => Role::Primary,
            InputStream::Signals => Role::Auxiliary,
        };
        self.map_record(line, role)
    }

    fn encode_value(&self, value: &TaggedEvent) -> Result<String> {
        value.to_wire()
    }

    fn decode_value(&self, raw: &str) -> Result<TaggedEvent> {
        TaggedEvent::from_wire(raw)
    }

    fn reduce(&self, key: &GroupKey, values: Vec<TaggedEvent>) -> Result<GroupOutput> {
        let reduced = self.reduce_group(key, values)?;
        let records = reduced
            .rows
            .iter()
            .map(Event::to_json_line)
            .collect::<Result<Vec<_>>>()?;
        Ok(GroupOutput {
            records,
            suppressed: reduced.suppressed,
        })
    }
}

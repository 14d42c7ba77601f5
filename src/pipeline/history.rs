//! Per-member interaction history over CSV rows
//!
//! Every row of a member plays both roles: once as a primary row to emit and
//! once, shifted by the gap, as an auxiliary interaction feeding the positive
//! and negative host histories. A row therefore never sees itself.

use super::{GroupOutput, InputStream, ShuffleJob};
use crate::config::HistoryJobConfig;
use crate::core::accumulator::{AccumulatorSet, AccumulatorSpec};
use crate::core::event::{Event, Role, EVENT_NAME_FIELD, EVENT_TIME_FIELD};
use crate::core::key::{GroupKey, KeyExtractor};
use crate::core::sequencer::{CausalSequencer, Timestamped};
use crate::core::snapshot::{FeatureNaming, SnapshotWriter};
use crate::error::{ErrorCode, FeatureError, Result};
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use serde_json::{Map, Value};
use tracing::debug;

/// Number of positional columns in an interaction row
pub const ROW_FIELDS: usize = 8;

/// Column names, in position order, as seen by key extraction
pub const COLUMNS: [&str; ROW_FIELDS] = [
    "livestreamId",
    "hostId",
    "memberId",
    "interactionDate",
    "totalTimespentMins",
    "exitTimeEpochSeconds",
    "label",
    "evaluationFlag",
];

const INTERACTION_EVENT: &str = "interaction";

/// One positional interaction row
///
/// Columns are listed in [`COLUMNS`]. The last column keeps any further
/// commas verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionRow {
    pub livestream_id: String,
    pub host_id: String,
    pub member_id: String,
    pub interaction_date: String,
    pub total_timespent_mins: String,
    pub exit_time: i64,
    pub label: i64,
    pub evaluation_flag: String,
}

impl InteractionRow {
    pub fn parse(line: &str) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .quoting(false)
            .flexible(true)
            .from_reader(line.as_bytes());
        let mut record = StringRecord::new();
        let found = reader.read_record(&mut record).map_err(|e| {
            FeatureError::record(ErrorCode::RECORD_MALFORMED_CSV, e.to_string()).with_source(e)
        })?;
        if !found || record.len() < ROW_FIELDS {
            return Err(FeatureError::record(
                ErrorCode::RECORD_MALFORMED_CSV,
                format!(
                    "expected at least {} columns, got {}",
                    ROW_FIELDS,
                    record.len()
                ),
            ));
        }

        let exit_time = record[5].trim().parse::<i64>().map_err(|e| {
            FeatureError::invalid_field(COLUMNS[5], format!("'{}': {}", &record[5], e))
        })?;
        let label = record[6]
            .trim()
            .parse::<i64>()
            .map_err(|e| FeatureError::invalid_field(COLUMNS[6], format!("'{}': {}", &record[6], e)))?;
        let evaluation_flag = record
            .iter()
            .skip(ROW_FIELDS - 1)
            .collect::<Vec<_>>()
            .join(",");

        Ok(Self {
            livestream_id: record[0].to_string(),
            host_id: record[1].to_string(),
            member_id: record[2].to_string(),
            interaction_date: record[3].to_string(),
            total_timespent_mins: record[4].to_string(),
            exit_time,
            label,
            evaluation_flag,
        })
    }

    /// Event view used by the key extractor and the history buffers
    pub fn to_event(&self) -> Result<Event> {
        let mut fields = Map::new();
        fields.insert(EVENT_NAME_FIELD.to_string(), Value::from(INTERACTION_EVENT));
        fields.insert(EVENT_TIME_FIELD.to_string(), Value::from(self.exit_time));
        let columns = [
            Value::from(self.livestream_id.as_str()),
            Value::from(self.host_id.as_str()),
            Value::from(self.member_id.as_str()),
            Value::from(self.interaction_date.as_str()),
            Value::from(self.total_timespent_mins.as_str()),
            Value::from(self.exit_time),
            Value::from(self.label),
            Value::from(self.evaluation_flag.as_str()),
        ];
        for (name, value) in COLUMNS.iter().zip(columns) {
            fields.insert(name.to_string(), value);
        }
        Event::from_fields(fields)
    }

    /// Render the row followed by extra trailing columns
    pub fn to_csv_line(&self, extra: &[String]) -> Result<String> {
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        let exit_time = self.exit_time.to_string();
        let label = self.label.to_string();
        let columns = [
            self.livestream_id.as_str(),
            self.host_id.as_str(),
            self.member_id.as_str(),
            self.interaction_date.as_str(),
            self.total_timespent_mins.as_str(),
            exit_time.as_str(),
            label.as_str(),
            self.evaluation_flag.as_str(),
        ];
        writer
            .write_record(columns.iter().copied().chain(extra.iter().map(String::as_str)))
            .map_err(|e| {
                FeatureError::record(ErrorCode::RECORD_MALFORMED_CSV, e.to_string()).with_source(e)
            })?;
        let bytes = writer.into_inner().map_err(|e| {
            FeatureError::record(ErrorCode::RECORD_MALFORMED_CSV, e.to_string())
        })?;
        let mut line = String::from_utf8(bytes).map_err(|e| {
            FeatureError::record(ErrorCode::RECORD_MALFORMED_CSV, e.to_string()).with_source(e)
        })?;
        if line.ends_with('\n') {
            line.pop();
        }
        Ok(line)
    }
}

/// A row in one of its two roles
#[derive(Debug, Clone)]
struct RoleRow {
    role: Role,
    row: InteractionRow,
    event: Event,
}

impl Timestamped for RoleRow {
    fn role(&self) -> Role {
        self.role
    }

    fn event_time(&self) -> i64 {
        self.row.exit_time
    }
}

/// History job keyed by member
#[derive(Debug, Clone)]
pub struct HistoryPipeline {
    extractor: KeyExtractor,
    sequencer: CausalSequencer,
    writer: SnapshotWriter,
    accumulators: Vec<AccumulatorSpec>,
    cutoff: Option<i64>,
}

impl HistoryPipeline {
    pub fn new(config: &HistoryJobConfig) -> Result<Self> {
        let extractor = KeyExtractor::new(config.key_fields.clone())?;
        let writer = SnapshotWriter::new(FeatureNaming::new(extractor.dimensions(), None));
        Ok(Self {
            extractor,
            sequencer: CausalSequencer::new(config.gap),
            writer,
            accumulators: config.accumulators.clone(),
            cutoff: config.cutoff,
        })
    }

    pub fn map_record(&self, line: &str) -> Result<(GroupKey, InteractionRow)> {
        let row = InteractionRow::parse(line)?;
        let key = self.extractor.extract(row.to_event()?.fields())?;
        Ok((key, row))
    }

    /// Emit every eligible row of one member with its history columns
    pub fn reduce_group(&self, key: &GroupKey, rows: Vec<InteractionRow>) -> Result<GroupOutput> {
        let mut tagged = Vec::with_capacity(rows.len() * 2);
        for row in rows {
            let event = row.to_event()?;
            tagged.push(RoleRow {
                role: Role::Primary,
                row: row.clone(),
                event: event.clone(),
            });
            tagged.push(RoleRow {
                role: Role::Auxiliary,
                row,
                event,
            });
        }

        let mut accumulators = AccumulatorSet::from_specs(&self.accumulators);
        let mut output = GroupOutput::default();
        for item in self.sequencer.sequence(&tagged) {
            accumulators
                .observe(item.role, &item.record.event, item.adjusted_time)
                .map_err(|e| e.with_group_key(key.as_str()))?;
            if item.role != Role::Primary {
                continue;
            }
            if self.cutoff.is_some_and(|cutoff| item.original_time() < cutoff) {
                output.suppressed += 1;
                continue;
            }
            let columns = self
                .writer
                .render_columns(&accumulators.snapshot(item.adjusted_time));
            output.records.push(item.record.row.to_csv_line(&columns)?);
        }

        debug!(
            key = %key,
            rows = tagged.len() / 2,
            emitted = output.records.len(),
            suppressed = output.suppressed,
            "reduced history group"
        );
        Ok(output)
    }
}

impl ShuffleJob for HistoryPipeline {
    type Value = InteractionRow;

    fn name(&self) -> &str {
        "history"
    }

    fn map_line(&self, line: &str, _stream: InputStream) -> Result<(GroupKey, InteractionRow)> {
        self.map_record(line)
    }

    fn encode_value(&self, value: &InteractionRow) -> Result<String> {
        value.to_csv_line(&[])
    }

    fn decode_value(&self, raw: &str) -> Result<InteractionRow> {
        InteractionRow::parse(raw)
    }

    fn reduce(&self, key: &GroupKey, values: Vec<InteractionRow>) -> Result<GroupOutput> {
        self.reduce_group(key, values)
    }
}

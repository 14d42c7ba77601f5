//! Streaming map and reduce stages
//!
//! These follow the line contract of Hadoop-style streaming engines: the map
//! stage turns raw lines into `key<TAB>value` lines, the engine sorts them by
//! key, and the reduce stage consumes the sorted `key<TAB>value` lines one
//! group at a time.

use super::sink::RecordSink;
use super::RunStats;
use crate::core::key::GroupKey;
use crate::error::{ErrorCode, FeatureError, Result};
use crate::pipeline::{InputStream, ShuffleJob};
use std::io::{BufRead, Write};
use tracing::{debug, info};

/// Map every raw line on `input` to a shuffle line on `output`
pub fn stream_map<J, R, W>(job: &J, stream: InputStream, input: R, mut output: W) -> Result<usize>
where
    J: ShuffleJob,
    R: BufRead,
    W: Write,
{
    let mut mapped = 0;
    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) = job
            .map_line(line, stream)
            .map_err(|e| e.with_context(format!("input line {}", index + 1)))?;
        if key.as_str().contains(['\t', '\n']) {
            return Err(FeatureError::record(
                ErrorCode::RECORD_MALFORMED_SHUFFLE,
                format!("group key {:?} cannot be streamed", key.as_str()),
            ));
        }
        writeln!(output, "{}\t{}", key, job.encode_value(&value)?)?;
        mapped += 1;
    }
    output.flush()?;
    info!(job = job.name(), mapped, "map stage finished");
    Ok(mapped)
}

/// Reduce key-sorted shuffle lines from `input`, emitting into `sink`
///
/// Each group is reduced as soon as its last line has been read. A key that
/// reappears after a different key means the input was not sorted and fails
/// the stage.
pub fn stream_reduce<J, R, S>(job: &J, input: R, sink: &mut S) -> Result<RunStats>
where
    J: ShuffleJob,
    R: BufRead,
    S: RecordSink,
{
    let mut stats = RunStats::default();
    let mut current: Option<(GroupKey, Vec<J::Value>)> = None;

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let (raw_key, raw_value) = line.split_once('\t').ok_or_else(|| {
            FeatureError::record(
                ErrorCode::RECORD_MALFORMED_SHUFFLE,
                format!("line {} has no key separator", index + 1),
            )
        })?;
        let value = job.decode_value(raw_value)?;
        stats.input_records += 1;

        match current.as_mut() {
            Some((key, values)) if key.as_str() == raw_key => values.push(value),
            _ => {
                let key = GroupKey::from_raw(raw_key);
                if let Some((previous, values)) = current.take() {
                    if key < previous {
                        return Err(FeatureError::record(
                            ErrorCode::RECORD_MALFORMED_SHUFFLE,
                            format!("input is not sorted by key at line {}", index + 1),
                        ));
                    }
                    reduce_into(job, previous, values, sink, &mut stats)?;
                }
                current = Some((key, vec![value]));
            }
        }
    }
    if let Some((key, values)) = current {
        reduce_into(job, key, values, sink, &mut stats)?;
    }

    info!(
        job = job.name(),
        groups = stats.groups,
        emitted = stats.emitted,
        suppressed = stats.suppressed,
        "reduce stage finished"
    );
    Ok(stats)
}

fn reduce_into<J, S>(
    job: &J,
    key: GroupKey,
    values: Vec<J::Value>,
    sink: &mut S,
    stats: &mut RunStats,
) -> Result<()>
where
    J: ShuffleJob,
    S: RecordSink,
{
    debug!(key = %key, values = values.len(), "reducing streamed group");
    let output = job.reduce(&key, values)?;
    for record in &output.records {
        sink.emit(&key, record)?;
    }
    stats.groups += 1;
    stats.emitted += output.records.len();
    stats.suppressed += output.suppressed;
    Ok(())
}

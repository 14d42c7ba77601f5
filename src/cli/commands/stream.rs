//! `map` and `reduce` streaming stages over stdin and stdout

use super::load_config;
use crate::cli::args::JobKind;
use crate::config::JobConfig;
use crate::core::key::KeyExtractor;
use crate::error::{ErrorCode, FeatureError};
use crate::pipeline::{CounterPipeline, HistoryPipeline, InputStream};
use crate::runner::{stream_map, stream_reduce, WriterSink};
use anyhow::{Context, Result};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tokio::task;

/// Pick the key group a counters stage runs with
fn counter_extractor(config: &JobConfig, reduce_by: Option<&str>) -> Result<KeyExtractor> {
    let group = match (reduce_by, config.counters.dimension_groups.as_slice()) {
        (Some(group), _) => group,
        (None, [only]) => only.as_str(),
        (None, groups) => {
            return Err(FeatureError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                format!(
                    "{} key groups are configured; pass --reduce-by to pick one",
                    groups.len()
                ),
            )
            .into())
        }
    };
    Ok(KeyExtractor::parse(group)?)
}

pub async fn run_map_command(
    config_path: Option<PathBuf>,
    job: JobKind,
    stream: InputStream,
    reduce_by: Option<String>,
) -> Result<()> {
    let config = load_config(config_path.as_deref()).await?;
    let extractor = match job {
        JobKind::Counters => Some(counter_extractor(&config, reduce_by.as_deref())?),
        JobKind::History => None,
    };

    task::spawn_blocking(move || -> Result<()> {
        let input = io::stdin().lock();
        let output = BufWriter::new(io::stdout().lock());
        match extractor {
            Some(extractor) => {
                let pipeline = CounterPipeline::new(&config.counters, extractor);
                stream_map(&pipeline, stream, input, output)?;
            }
            None => {
                let pipeline = HistoryPipeline::new(&config.history)?;
                stream_map(&pipeline, stream, input, output)?;
            }
        }
        Ok(())
    })
    .await
    .context("map stage panicked")?
    .context("Map stage failed")
}

pub async fn run_reduce_command(
    config_path: Option<PathBuf>,
    job: JobKind,
    reduce_by: Option<String>,
) -> Result<()> {
    let config = load_config(config_path.as_deref()).await?;
    let extractor = match job {
        JobKind::Counters => Some(counter_extractor(&config, reduce_by.as_deref())?),
        JobKind::History => None,
    };

    task::spawn_blocking(move || -> Result<()> {
        let input = io::stdin().lock();
        let mut sink = WriterSink::new(BufWriter::new(io::stdout().lock()));
        match extractor {
            Some(extractor) => {
                let pipeline = CounterPipeline::new(&config.counters, extractor);
                stream_reduce(&pipeline, input, &mut sink)?;
            }
            None => {
                let pipeline = HistoryPipeline::new(&config.history)?;
                stream_reduce(&pipeline, input, &mut sink)?;
            }
        }
        sink.into_inner()?;
        Ok(())
    })
    .await
    .context("reduce stage panicked")?
    .context("Reduce stage failed")
}

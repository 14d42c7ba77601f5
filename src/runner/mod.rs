//! In-process map, shuffle and reduce executor
//!
//! The [`LocalRunner`] stands in for a distributed engine: it maps every
//! input line, shuffles records into a key-ordered map and reduces groups
//! concurrently on blocking worker threads. Groups never share state, so the
//! only coordination is ordering the emitted output by key.

pub mod io;
pub mod sink;
pub mod stream;

pub use sink::{LineFileSink, RecordSink, VecSink, WriterSink};
pub use stream::{stream_map, stream_reduce};

use crate::config::{CounterJobConfig, HistoryJobConfig, RunnerSettings};
use crate::core::key::{GroupKey, KeyExtractor};
use crate::pipeline::{CounterPipeline, HistoryPipeline, InputStream, ShuffleJob};
use anyhow::{Context, Result};
use futures::stream::{self as futures_stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One input path and the stream its records belong to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSource {
    pub path: PathBuf,
    pub stream: InputStream,
}

impl InputSource {
    pub fn new(path: impl Into<PathBuf>, stream: InputStream) -> Self {
        Self {
            path: path.into(),
            stream,
        }
    }
}

/// Counts for one executed job or stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub input_records: usize,
    pub groups: usize,
    pub emitted: usize,
    pub suppressed: usize,
}

/// Statistics of one chained counter pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassStats {
    pub dimensions: String,
    pub output: PathBuf,
    pub stats: RunStats,
}

pub struct LocalRunner {
    settings: RunnerSettings,
    run_id: Uuid,
}

impl LocalRunner {
    pub fn new(settings: RunnerSettings) -> Self {
        Self {
            settings,
            run_id: Uuid::new_v4(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    /// Map, shuffle and reduce `inputs`, emitting into `sink` in key order
    ///
    /// The first failing group aborts the run.
    pub async fn run<J, S>(&self, job: Arc<J>, inputs: &[InputSource], sink: &mut S) -> Result<RunStats>
    where
        J: ShuffleJob,
        S: RecordSink + Send,
    {
        let started = Instant::now();
        info!(run_id = %self.run_id, job = job.name(), "Starting job");

        let mut groups: BTreeMap<GroupKey, Vec<J::Value>> = BTreeMap::new();
        let mut stats = RunStats::default();
        for input in inputs {
            let mapped = self.map_input(Arc::clone(&job), input.clone()).await?;
            stats.input_records += mapped.len();
            for (key, value) in mapped {
                groups.entry(key).or_default().push(value);
            }
        }
        stats.groups = groups.len();
        debug!(
            job = job.name(),
            records = stats.input_records,
            groups = stats.groups,
            "Shuffle complete"
        );

        let progress = self.progress_bar(stats.groups as u64, job.name());
        let mut reduced = futures_stream::iter(groups.into_iter().map(|(key, values)| {
            let job = Arc::clone(&job);
            task::spawn_blocking(move || {
                let output = job.reduce(&key, values);
                (key, output)
            })
        }))
        .buffered(self.settings.parallelism.max(1));

        while let Some(joined) = reduced.next().await {
            let (key, output) = joined.context("reduce worker panicked")?;
            let output = output.with_context(|| format!("Failed to reduce group {}", key))?;
            for record in &output.records {
                sink.emit(&key, record)?;
            }
            stats.emitted += output.records.len();
            stats.suppressed += output.suppressed;
            progress.inc(1);
        }
        progress.finish_and_clear();

        info!(
            run_id = %self.run_id,
            job = job.name(),
            records = stats.input_records,
            groups = stats.groups,
            emitted = stats.emitted,
            suppressed = stats.suppressed,
            elapsed = ?started.elapsed(),
            "Job finished"
        );
        Ok(stats)
    }

    /// Run a job and commit its output to `output` only if every group succeeds
    pub async fn run_to_file<J: ShuffleJob>(
        &self,
        job: Arc<J>,
        inputs: &[InputSource],
        output: &Path,
    ) -> Result<RunStats> {
        let mut sink = LineFileSink::create(output)?;
        let stats = self.run(job, inputs, &mut sink).await?;
        let path = sink.commit()?;
        debug!("Wrote {} records to {}", stats.emitted, path.display());
        Ok(stats)
    }

    /// Run one counter pass per dimension group
    ///
    /// The enriched dataset of each pass is the dataset of the next one; the
    /// signals are re-read by every pass. Intermediate outputs live in a
    /// per-run directory under the configured temporary prefix.
    pub async fn run_counters(
        &self,
        config: &CounterJobConfig,
        dataset: &Path,
        signals: &Path,
        output: &Path,
    ) -> Result<Vec<PassStats>> {
        let extractors = config
            .dimension_groups
            .iter()
            .map(|group| KeyExtractor::parse(group))
            .collect::<crate::error::Result<Vec<_>>>()?;

        let job_dir = self.job_dir();
        let passes = extractors.len();
        if passes > 1 {
            std::fs::create_dir_all(&job_dir).with_context(|| {
                format!("Failed to create job directory {}", job_dir.display())
            })?;
        }

        let mut results = Vec::with_capacity(passes);
        let mut current_dataset = dataset.to_path_buf();
        for (index, extractor) in extractors.into_iter().enumerate() {
            let pass_output = if index + 1 == passes {
                output.to_path_buf()
            } else {
                job_dir.join(format!("pass-{:02}-{}.jsonl", index, extractor.dimensions().join("_")))
            };
            let dimensions = extractor.to_string();
            info!(
                run_id = %self.run_id,
                pass = index + 1,
                of = passes,
                dimensions = %dimensions,
                "Running counter pass"
            );

            let job = Arc::new(CounterPipeline::new(config, extractor));
            let inputs = [
                InputSource::new(&current_dataset, InputStream::Dataset),
                InputSource::new(signals, InputStream::Signals),
            ];
            let stats = self
                .run_to_file(job, &inputs, &pass_output)
                .await
                .with_context(|| format!("Counter pass over [{}] failed", dimensions))?;

            results.push(PassStats {
                dimensions,
                output: pass_output.clone(),
                stats,
            });
            current_dataset = pass_output;
        }

        if passes > 1 {
            if self.settings.keep_intermediate {
                info!("Keeping intermediate outputs in {}", job_dir.display());
            } else if let Err(e) = std::fs::remove_dir_all(&job_dir) {
                warn!("Failed to remove job directory {}: {}", job_dir.display(), e);
            }
        }
        Ok(results)
    }

    pub async fn run_history(
        &self,
        config: &HistoryJobConfig,
        input: &Path,
        output: &Path,
    ) -> Result<RunStats> {
        let job = Arc::new(HistoryPipeline::new(config)?);
        self.run_to_file(job, &[InputSource::new(input, InputStream::Dataset)], output)
            .await
    }

    /// Directory for this run's intermediate outputs
    pub fn job_dir(&self) -> PathBuf {
        let prefix = self
            .settings
            .tmp_prefix
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        prefix.join(format!("featurecook-{}", self.run_id))
    }

    async fn map_input<J: ShuffleJob>(
        &self,
        job: Arc<J>,
        input: InputSource,
    ) -> Result<Vec<(GroupKey, J::Value)>> {
        let path = input.path.clone();
        let mapped = task::spawn_blocking(move || -> crate::error::Result<_> {
            let mut mapped = Vec::new();
            for file in io::input_files(&input.path)? {
                io::for_each_line(&file, |line_number, line| {
                    let pair = job.map_line(line, input.stream).map_err(|e| {
                        e.with_context(format!("{}:{}", file.display(), line_number))
                    })?;
                    mapped.push(pair);
                    Ok(())
                })?;
            }
            Ok(mapped)
        })
        .await
        .context("map worker panicked")?
        .with_context(|| format!("Failed to map {}", path.display()))?;

        debug!("Mapped {} records from {}", mapped.len(), path.display());
        Ok(mapped)
    }

    fn progress_bar(&self, groups: u64, job: &str) -> ProgressBar {
        if !self.settings.progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(groups);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} groups {msg}")
        {
            bar.set_style(style);
        }
        bar.set_message(job.to_string());
        bar
    }
}

use super::{cutoff_flag, load_config, revalidate};
use crate::config::WindowSpec;
use crate::runner::LocalRunner;
use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Flags of the `counters` command
#[derive(Debug, Clone, Default)]
pub struct CountersParams {
    pub config: Option<PathBuf>,
    pub input_dataset: PathBuf,
    pub input_signals: PathBuf,
    pub output: PathBuf,
    pub reduce_by: Vec<String>,
    pub windows: Vec<Duration>,
    pub label_windows: bool,
    pub cutoff: Option<String>,
    pub parallelism: Option<usize>,
    pub tmp_prefix: Option<PathBuf>,
    pub keep_intermediate: bool,
    pub progress: bool,
}

pub async fn run_counters_command(params: CountersParams) -> Result<()> {
    let mut config = load_config(params.config.as_deref()).await?;

    if !params.reduce_by.is_empty() {
        config.counters.dimension_groups = params.reduce_by.clone();
    }
    if !params.windows.is_empty() {
        config.counters.windows = params.windows.iter().copied().map(WindowSpec::new).collect();
    }
    if params.label_windows {
        config.counters.label_windows = true;
    }
    if let Some(cutoff) = cutoff_flag(params.cutoff.as_deref())? {
        config.counters.cutoff = Some(cutoff);
    }
    if let Some(parallelism) = params.parallelism {
        config.runner.parallelism = parallelism;
    }
    if params.tmp_prefix.is_some() {
        config.runner.tmp_prefix = params.tmp_prefix.clone();
    }
    config.runner.keep_intermediate |= params.keep_intermediate;
    config.runner.progress |= params.progress;
    revalidate(&config)?;

    let runner = LocalRunner::new(config.runner.clone());
    info!(
        run_id = %runner.run_id(),
        passes = config.counters.dimension_groups.len(),
        windows = config.counters.windows.len(),
        "Computing counter features"
    );
    let passes = runner
        .run_counters(
            &config.counters,
            &params.input_dataset,
            &params.input_signals,
            &params.output,
        )
        .await?;

    let total = passes.len();
    for (index, pass) in passes.iter().enumerate() {
        println!(
            "Pass {}/{} [{}]: {} records, {} groups, {} rows written, {} withheld by cutoff",
            index + 1,
            total,
            pass.dimensions,
            pass.stats.input_records,
            pass.stats.groups,
            pass.stats.emitted,
            pass.stats.suppressed
        );
    }
    println!("Features written to {}", params.output.display());
    Ok(())
}

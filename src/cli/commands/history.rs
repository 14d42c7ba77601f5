use super::{cutoff_flag, load_config, revalidate};
use crate::runner::LocalRunner;
use anyhow::Result;
use std::path::PathBuf;

/// Flags of the `history` command
#[derive(Debug, Clone, Default)]
pub struct HistoryParams {
    pub config: Option<PathBuf>,
    pub input: PathBuf,
    pub output: PathBuf,
    pub cutoff: Option<String>,
    pub parallelism: Option<usize>,
    pub progress: bool,
}

pub async fn run_history_command(params: HistoryParams) -> Result<()> {
    let mut config = load_config(params.config.as_deref()).await?;
    if let Some(cutoff) = cutoff_flag(params.cutoff.as_deref())? {
        config.history.cutoff = Some(cutoff);
    }
    if let Some(parallelism) = params.parallelism {
        config.runner.parallelism = parallelism;
    }
    config.runner.progress |= params.progress;
    revalidate(&config)?;

    let runner = LocalRunner::new(config.runner.clone());
    let stats = runner
        .run_history(&config.history, &params.input, &params.output)
        .await?;

    println!(
        "History: {} rows, {} members, {} rows written, {} withheld by cutoff",
        stats.input_records, stats.groups, stats.emitted, stats.suppressed
    );
    println!("Rows written to {}", params.output.display());
    Ok(())
}

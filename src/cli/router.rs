//! Command routing and execution
//!
//! This module handles routing CLI commands to their respective implementations.

use crate::cli::args::Commands;
use crate::cli::commands::*;
use anyhow::Result;
use std::path::PathBuf;

/// Execute a CLI command based on the parsed arguments
pub async fn execute_command(command: Commands, config: Option<PathBuf>) -> Result<()> {
    match command {
        Commands::Counters {
            input_dataset,
            input_signals,
            output,
            reduce_by,
            windows,
            label_windows,
            cutoff,
            parallelism,
            tmp_prefix,
            keep_intermediate,
            progress,
        } => {
            run_counters_command(CountersParams {
                config,
                input_dataset,
                input_signals,
                output,
                reduce_by,
                windows,
                label_windows,
                cutoff,
                parallelism,
                tmp_prefix,
                keep_intermediate,
                progress,
            })
            .await
        }
        Commands::History {
            input,
            output,
            cutoff,
            parallelism,
            progress,
        } => {
            run_history_command(HistoryParams {
                config,
                input,
                output,
                cutoff,
                parallelism,
                progress,
            })
            .await
        }
        Commands::Map {
            job,
            stream,
            reduce_by,
        } => run_map_command(config, job, stream, reduce_by).await,
        Commands::Reduce { job, reduce_by } => run_reduce_command(config, job, reduce_by).await,
        Commands::ShowConfig => run_show_config(config).await,
    }
}

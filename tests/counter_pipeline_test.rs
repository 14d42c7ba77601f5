//! Integration tests for the counter job through the local runner

mod common;

use common::*;
use featurecook::config::{presets, CounterJobConfig, RunnerSettings, WindowSpec};
use featurecook::core::{GroupKey, KeyExtractor, Role};
use featurecook::pipeline::CounterPipeline;
use featurecook::runner::LocalRunner;
use std::time::Duration;

const LIKE_FIELD: &str = "feature_hostId_memberId_like_count_decay_30days";

fn settings(ctx: &TestContext) -> RunnerSettings {
    RunnerSettings {
        parallelism: 4,
        tmp_prefix: Some(ctx.path().join("tmp")),
        keep_intermediate: false,
        progress: false,
    }
}

fn single_group(group: &str) -> CounterJobConfig {
    CounterJobConfig {
        dimension_groups: vec![group.to_string()],
        ..CounterJobConfig::default()
    }
}

#[tokio::test]
async fn test_like_one_hour_before_row_is_decayed_not_leaked() {
    let ctx = TestContext::new().unwrap();
    let dataset = ctx
        .create_file(
            "dataset.jsonl",
            &lines(&[dataset_row(150, "host1", "member1"), dataset_row(3750, "host1", "member1")]),
        )
        .unwrap();
    let signals = ctx
        .create_file("signals.jsonl", &lines(&[like(100, "host1", "member1", 1)]))
        .unwrap();
    let output = ctx.path().join("out.jsonl");

    let runner = LocalRunner::new(settings(&ctx));
    let passes = runner
        .run_counters(&single_group("hostId,memberId"), &dataset, &signals, &output)
        .await
        .unwrap();
    assert_eq!(passes.len(), 1);
    assert_eq!(passes[0].stats.emitted, 2);

    let rows = ctx.read_json_lines("out.jsonl").unwrap();
    // the like is shifted to 3700: invisible at 150, decayed by 50s at 3750
    assert_eq!(number(&rows[0], LIKE_FIELD), 0.0);
    let expected = (-50.0 / THIRTY_DAYS_SECS).exp();
    assert!((number(&rows[1], LIKE_FIELD) - expected).abs() < 1e-12);
    assert_eq!(rows[1]["hostId"], "host1");
    assert!(!rows[1].contains_key("£role"));
}

#[tokio::test]
async fn test_cutoff_withholds_rows_but_keeps_their_signals() {
    let ctx = TestContext::new().unwrap();
    let dataset = ctx
        .create_file(
            "dataset.jsonl",
            &lines(&[dataset_row(1_000, "h", "m"), dataset_row(20_000, "h", "m")]),
        )
        .unwrap();
    let signals = ctx
        .create_file("signals.jsonl", &lines(&[share(500, "h", "m")]))
        .unwrap();
    let output = ctx.path().join("out.jsonl");

    let mut config = single_group("hostId,memberId");
    config.cutoff = Some(10_000);
    let runner = LocalRunner::new(settings(&ctx));
    let passes = runner
        .run_counters(&config, &dataset, &signals, &output)
        .await
        .unwrap();
    assert_eq!(passes[0].stats.suppressed, 1);

    let rows = ctx.read_json_lines("out.jsonl").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["event_time"], 20_000);
    assert!(number(&rows[0], "feature_hostId_memberId_shares_count_decay_30days") > 0.99);
}

#[tokio::test]
async fn test_chained_passes_accumulate_feature_columns() {
    let ctx = TestContext::new().unwrap();
    let dataset = ctx
        .create_gz_file(
            "dataset.jsonl.gz",
            &lines(&[dataset_row(10_000, "h1", "m1"), dataset_row(10_000, "h2", "m1")]),
        )
        .unwrap();
    let signals = ctx
        .create_file(
            "signals.jsonl",
            &lines(&[like(0, "h1", "m1", 2), like(0, "h2", "m1", 3)]),
        )
        .unwrap();
    let output = ctx.path().join("out.jsonl.gz");

    let config = CounterJobConfig::default();
    let runner = LocalRunner::new(settings(&ctx));
    let passes = runner
        .run_counters(&config, &dataset, &signals, &output)
        .await
        .unwrap();
    assert_eq!(passes.len(), 4);
    assert!(passes.iter().all(|pass| pass.stats.emitted == 2));

    let rows = ctx.read_json_lines("out.jsonl.gz").unwrap();
    assert_eq!(rows.len(), 2);
    for row in &rows {
        for name in presets::counter_names() {
            for prefix in ["hostId", "memberId", "livestreamId", "hostId_memberId"] {
                let field = format!("feature_{}_{}", prefix, name);
                assert!(row.contains_key(&field), "missing {}", field);
            }
        }
    }

    // member m1 saw both hosts' likes, each host only its own
    let host_likes = number(&rows[0], "feature_hostId_like_count_decay_30days");
    let member_likes = number(&rows[0], "feature_memberId_like_count_decay_30days");
    assert!(member_likes > host_likes);
    assert!((member_likes - 5.0 * (-6400.0 / THIRTY_DAYS_SECS).exp()).abs() < 1e-9);

    // intermediates are removed after success
    let job_dir = runner.job_dir();
    assert!(!job_dir.exists());
}

#[tokio::test]
async fn test_keep_intermediate_leaves_pass_outputs() {
    let ctx = TestContext::new().unwrap();
    let dataset = ctx
        .create_file("dataset.jsonl", &lines(&[dataset_row(10, "h", "m")]))
        .unwrap();
    let signals = ctx.create_file("signals.jsonl", "").unwrap();
    let output = ctx.path().join("out.jsonl");

    let mut runner_settings = settings(&ctx);
    runner_settings.keep_intermediate = true;
    let runner = LocalRunner::new(runner_settings);
    let passes = runner
        .run_counters(&CounterJobConfig::default(), &dataset, &signals, &output)
        .await
        .unwrap();

    for pass in &passes[..passes.len() - 1] {
        assert!(pass.output.starts_with(runner.job_dir()));
        assert!(pass.output.exists());
    }
    assert_eq!(passes.last().unwrap().output, output);
}

#[tokio::test]
async fn test_window_passes_write_labelled_columns() {
    let ctx = TestContext::new().unwrap();
    let dataset = ctx
        .create_file("dataset.jsonl", &lines(&[dataset_row(1_000, "h", "m")]))
        .unwrap();
    let signals = ctx
        .create_file("signals.jsonl", &lines(&[like(0, "h", "m", 1)]))
        .unwrap();
    let output = ctx.path().join("out.jsonl");

    let mut config = single_group("hostId");
    config.windows = presets::multi_windows();
    config.label_windows = true;
    let runner = LocalRunner::new(settings(&ctx));
    runner
        .run_counters(&config, &dataset, &signals, &output)
        .await
        .unwrap();

    let rows = ctx.read_json_lines("out.jsonl").unwrap();
    let row = &rows[0];
    assert!(number(row, "feature_hostId_1m_like_count_decay_30days") > 0.99);
    assert_eq!(number(row, "feature_hostId_1h_like_count_decay_30days"), 0.0);
    assert_eq!(number(row, "feature_hostId_1day_like_count_decay_30days"), 0.0);
}

#[test]
fn test_reduce_is_independent_of_arrival_order() {
    let job = CounterPipeline::new(
        &single_group("hostId"),
        KeyExtractor::parse("hostId").unwrap(),
    );
    let raw = [
        (like(5, "h", "m", 1), Role::Auxiliary),
        (dataset_row(4_000, "h", "m"), Role::Primary),
        (share(4_000, "h", "m"), Role::Auxiliary),
        (like(3_000, "h", "m", 4), Role::Auxiliary),
        (dataset_row(9_000, "h", "m"), Role::Primary),
    ];
    let records: Vec<_> = raw
        .iter()
        .map(|(line, role)| job.map_record(line, *role).unwrap().1)
        .collect();
    let key = GroupKey::from_raw("h£");

    let forward = job.reduce_group(&key, records.clone()).unwrap();
    let mut reversed_input = records;
    reversed_input.reverse();
    let reversed = job.reduce_group(&key, reversed_input).unwrap();
    assert_eq!(forward, reversed);
    assert_eq!(forward.rows.len(), 2);
}

#[test]
fn test_window_gap_override_changes_visibility() {
    let mut config = single_group("hostId");
    config.windows = vec![WindowSpec::new(Duration::ZERO)];
    let job = CounterPipeline::new(&config, KeyExtractor::parse("hostId").unwrap());
    let (key, aux) = job.map_record(&like(100, "h", "m", 1), Role::Auxiliary).unwrap();
    let (_, same_instant) = job
        .map_record(&dataset_row(100, "h", "m"), Role::Primary)
        .unwrap();
    let (_, later) = job
        .map_record(&dataset_row(101, "h", "m"), Role::Primary)
        .unwrap();

    let reduced = job
        .reduce_group(&key, vec![later, aux, same_instant])
        .unwrap();
    let values: Vec<f64> = reduced
        .rows
        .iter()
        .map(|row| {
            row.field("feature_hostId_like_count_decay_30days")
                .and_then(|v| v.as_f64())
                .unwrap()
        })
        .collect();
    assert_eq!(values[0], 0.0);
    assert!(values[1] > 0.99);
}

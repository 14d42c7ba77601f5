//! Common test utilities and helpers

#![allow(dead_code)]

use anyhow::Result;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{json, Map, Value};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test context that manages a temporary working directory
pub struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    /// Get the path to the test directory
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a file in the test directory
    pub fn create_file(&self, path: impl AsRef<Path>, content: &str) -> Result<PathBuf> {
        let full_path = self.temp_dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full_path, content)?;
        Ok(full_path)
    }

    /// Create a gzip-compressed file in the test directory
    pub fn create_gz_file(&self, path: impl AsRef<Path>, content: &str) -> Result<PathBuf> {
        let full_path = self.temp_dir.path().join(path);
        let mut encoder = GzEncoder::new(File::create(&full_path)?, Compression::default());
        encoder.write_all(content.as_bytes())?;
        encoder.finish()?;
        Ok(full_path)
    }

    /// Read a file, decompressing `.gz` files
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<String> {
        let full_path = self.temp_dir.path().join(path);
        let mut text = String::new();
        if full_path.extension().is_some_and(|ext| ext == "gz") {
            MultiGzDecoder::new(File::open(full_path)?).read_to_string(&mut text)?;
        } else {
            text = fs::read_to_string(full_path)?;
        }
        Ok(text)
    }

    /// Read a JSON-lines output file
    pub fn read_json_lines(&self, path: impl AsRef<Path>) -> Result<Vec<Map<String, Value>>> {
        self.read_file(path)?
            .lines()
            .map(|line| match serde_json::from_str::<Value>(line)? {
                Value::Object(map) => Ok(map),
                other => anyhow::bail!("expected an object, got {}", other),
            })
            .collect()
    }

    pub fn file_exists(&self, path: impl AsRef<Path>) -> bool {
        self.temp_dir.path().join(path).exists()
    }
}

/// Build one JSON-lines event
pub fn event(name: &str, time: i64, extra: Value) -> String {
    let mut object = json!({ "event_name": name, "event_time": time });
    if let (Some(target), Value::Object(fields)) = (object.as_object_mut(), extra) {
        target.extend(fields);
    }
    object.to_string()
}

/// A dataset row for a host/member pair
pub fn dataset_row(time: i64, host: &str, member: &str) -> String {
    event(
        "timespent_target",
        time,
        json!({ "hostId": host, "memberId": member, "livestreamId": "ls1" }),
    )
}

pub fn like(time: i64, host: &str, member: &str, count: i64) -> String {
    event(
        "like",
        time,
        json!({ "hostId": host, "memberId": member, "livestreamId": "ls1", "like_counter": count }),
    )
}

pub fn share(time: i64, host: &str, member: &str) -> String {
    event(
        "share",
        time,
        json!({ "hostId": host, "memberId": member, "livestreamId": "ls1" }),
    )
}

/// One positional interaction CSV row
pub fn interaction(host: &str, member: &str, exit_time: i64, label: i64) -> String {
    format!(
        "ls-{},{},{},2023-04-05,15,{},{},train",
        exit_time, host, member, exit_time, label
    )
}

pub fn lines(records: &[String]) -> String {
    let mut text = records.join("\n");
    text.push('\n');
    text
}

pub fn number(row: &Map<String, Value>, field: &str) -> f64 {
    row.get(field)
        .and_then(Value::as_f64)
        .unwrap_or_else(|| panic!("missing numeric field {} in {:?}", field, row))
}

pub const THIRTY_DAYS_SECS: f64 = 30.0 * 24.0 * 3600.0;

//! Snapshot writing and feature naming
//!
//! Output fields are named `feature_<dim>_..._[<window>_]<accumulator>`.

use super::event::Event;
use serde_json::Value;
use std::time::Duration;

/// Separator used when a history snapshot is rendered as one string
pub const HISTORY_SEPARATOR: &str = " ";

/// Value read from one accumulator
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Number(f64),
    History(Vec<String>),
}

impl FeatureValue {
    pub fn to_json(&self) -> Value {
        match self {
            FeatureValue::Number(n) => Value::from(*n),
            FeatureValue::History(items) => Value::String(items.join(HISTORY_SEPARATOR)),
        }
    }

    /// Plain-text rendering for delimited outputs
    pub fn render(&self) -> String {
        match self {
            FeatureValue::Number(n) => n.to_string(),
            FeatureValue::History(items) => items.join(HISTORY_SEPARATOR),
        }
    }
}

/// A named accumulator reading
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSnapshot {
    pub name: String,
    pub value: FeatureValue,
}

/// Default label for a window gap, e.g. `1m`, `1h`, `1day`, `1h30m`
pub fn window_label(gap: Duration) -> String {
    humantime::format_duration(gap).to_string().replace(' ', "")
}

/// Deterministic output field naming for one key group and window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureNaming {
    prefix: String,
}

impl FeatureNaming {
    pub fn new(dimensions: &[String], window_label: Option<&str>) -> Self {
        let mut prefix = String::from("feature_");
        for dimension in dimensions {
            prefix.push_str(dimension);
            prefix.push('_');
        }
        if let Some(label) = window_label {
            prefix.push_str(label);
            prefix.push('_');
        }
        Self { prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn field_name(&self, accumulator: &str) -> String {
        format!("{}{}", self.prefix, accumulator)
    }
}

/// Writes accumulator snapshots onto primary records
///
/// Only reads snapshots that were already taken; accumulator state is never
/// reachable from here.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    naming: FeatureNaming,
}

impl SnapshotWriter {
    pub fn new(naming: FeatureNaming) -> Self {
        Self { naming }
    }

    pub fn naming(&self) -> &FeatureNaming {
        &self.naming
    }

    /// Add one field per snapshot entry to a JSON record
    pub fn write_event(&self, event: &mut Event, snapshot: &[FeatureSnapshot]) {
        for entry in snapshot {
            event.insert_field(self.naming.field_name(&entry.name), entry.value.to_json());
        }
    }

    /// Render snapshot entries as trailing columns, in accumulator order
    pub fn render_columns(&self, snapshot: &[FeatureSnapshot]) -> Vec<String> {
        snapshot.iter().map(|entry| entry.value.render()).collect()
    }
}

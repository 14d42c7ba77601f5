//! Bounded interaction history

use crate::core::event::{read_f64, read_string, Event, Role};
use crate::error::Result;
use serde::{Deserialize, Serialize};

fn default_label_field() -> String {
    "label".to_string()
}

fn default_max_size() -> usize {
    32
}

/// Which labelled records a history buffer keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// label > 0
    Positive,
    /// label <= 0
    Negative,
    Any,
}

impl Polarity {
    pub fn accepts(&self, label: f64) -> bool {
        match self {
            Polarity::Positive => label > 0.0,
            Polarity::Negative => label <= 0.0,
            Polarity::Any => true,
        }
    }
}

/// Configuration of one history buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySpec {
    pub name: String,
    /// Field whose value is appended (e.g. `hostId`)
    pub id_field: String,
    #[serde(default = "default_label_field")]
    pub label_field: String,
    pub polarity: Polarity,
    #[serde(default = "default_max_size")]
    pub max_size: usize,
}

/// Insertion-ordered buffer of the most recent identifiers
///
/// Storage grows to `2 * max_size` before it is cut back to the newest
/// `max_size` items; reads always expose at most `max_size` items.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBuffer {
    name: String,
    id_field: String,
    label_field: String,
    polarity: Polarity,
    max_size: usize,
    items: Vec<String>,
}

impl HistoryBuffer {
    pub fn new(spec: &HistorySpec) -> Self {
        Self {
            name: spec.name.clone(),
            id_field: spec.id_field.clone(),
            label_field: spec.label_field.clone(),
            polarity: spec.polarity,
            max_size: spec.max_size,
            items: Vec::with_capacity(spec.max_size * 2 + 1),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Consume one record; only auxiliary records of the right polarity count
    pub fn observe(&mut self, role: Role, event: &Event) -> Result<()> {
        if role != Role::Auxiliary {
            return Ok(());
        }
        if self.polarity != Polarity::Any {
            let label = read_f64(event.fields(), &self.label_field)?;
            if !self.polarity.accepts(label) {
                return Ok(());
            }
        }
        let id = read_string(event.fields(), &self.id_field)?;
        self.push(id);
        Ok(())
    }

    pub fn push(&mut self, id: String) {
        self.items.push(id);
        if self.items.len() > 2 * self.max_size {
            let excess = self.items.len() - self.max_size;
            self.items.drain(..excess);
        }
    }

    /// The newest `max_size` items, oldest first
    pub fn items(&self) -> &[String] {
        let start = self.items.len().saturating_sub(self.max_size);
        &self.items[start..]
    }

    /// Number of items currently held, including the not-yet-trimmed tail
    pub fn stored_len(&self) -> usize {
        self.items.len()
    }
}

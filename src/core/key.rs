//! Group key extraction
//!
//! A group key is the concatenation of the configured dimension values, each
//! followed by a sentinel that cannot occur inside a value. Terminating every
//! component (not just separating them) keeps the mapping injective:
//! `("ab", "c")` and `("a", "bc")` yield different keys.

use super::event::scalar_text;
use crate::error::{ErrorCode, FeatureError, Result};
use serde_json::{Map, Value};
use std::fmt;

/// Sentinel appended after every key component
pub const KEY_SENTINEL: char = '£';

/// Opaque per-entity partition key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey(String);

impl GroupKey {
    /// Build a key from already-extracted component values
    pub fn from_components<I, S>(components: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut key = String::new();
        for component in components {
            let component = component.as_ref();
            if component.contains(KEY_SENTINEL) {
                return Err(FeatureError::record(
                    ErrorCode::RECORD_SENTINEL_IN_KEY,
                    format!("key component '{}' contains '{}'", component, KEY_SENTINEL),
                ));
            }
            key.push_str(component);
            key.push(KEY_SENTINEL);
        }
        Ok(Self(key))
    }

    /// Wrap a key read back from the shuffle wire
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The individual component values
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split_terminator(KEY_SENTINEL)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives group keys from a static list of dimension field names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyExtractor {
    dimensions: Vec<String>,
}

impl KeyExtractor {
    pub fn new(dimensions: Vec<String>) -> Result<Self> {
        if dimensions.is_empty() {
            return Err(FeatureError::config_with_code(
                ErrorCode::CONFIG_EMPTY_DIMENSIONS,
                "at least one key dimension is required",
            ));
        }
        if let Some(blank) = dimensions.iter().find(|d| d.trim().is_empty()) {
            return Err(FeatureError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                format!("blank key dimension in {:?} ('{}')", dimensions, blank),
            ));
        }
        Ok(Self { dimensions })
    }

    /// Parse a comma-separated dimension list such as `hostId,memberId`
    pub fn parse(spec: &str) -> Result<Self> {
        let dimensions = spec
            .split(',')
            .map(|d| d.trim().to_string())
            .collect::<Vec<_>>();
        if dimensions.len() == 1 && dimensions[0].is_empty() {
            return Self::new(Vec::new());
        }
        Self::new(dimensions)
    }

    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    /// Extract the key of one record
    pub fn extract(&self, fields: &Map<String, Value>) -> Result<GroupKey> {
        let mut components = Vec::with_capacity(self.dimensions.len());
        for dimension in &self.dimensions {
            let value = fields
                .get(dimension)
                .ok_or_else(|| FeatureError::missing_field(dimension))?;
            components.push(scalar_text(dimension, value)?);
        }
        GroupKey::from_components(components)
    }
}

impl fmt::Display for KeyExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dimensions.join(","))
    }
}

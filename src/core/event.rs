//! Typed event records
//!
//! Raw events arrive as schema-less JSON objects. They are validated once, at
//! the parse boundary, into an [`Event`] whose [`EventKind`] carries the typed
//! payload each counter contribution needs. The original object is retained so
//! enriched rows are emitted with every input field intact.

use crate::error::{ErrorCode, FeatureError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Field carrying the record role on the shuffle wire.
///
/// The `£` prefix keeps it from colliding with any input field.
pub const ROLE_FIELD: &str = "£role";

pub const EVENT_NAME_FIELD: &str = "event_name";
pub const EVENT_TIME_FIELD: &str = "event_time";

/// Role of a record inside a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Emitted, enriched with accumulator snapshots
    Primary,
    /// Only feeds accumulator state, never emitted
    Auxiliary,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Primary => "primary",
            Role::Auxiliary => "auxiliary",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "primary" => Ok(Role::Primary),
            "auxiliary" => Ok(Role::Auxiliary),
            other => Err(FeatureError::record(
                ErrorCode::RECORD_UNKNOWN_ROLE,
                format!("unknown role '{}'", other),
            )),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of signal an event represents, with its typed payload
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    ViewEnd { duration_ms: f64 },
    Like { like_counter: f64 },
    Gift { quantity: f64, cheers_value: f64 },
    Share,
    Comment,
    /// Dataset rows and signals no counter understands
    Other(String),
}

impl EventKind {
    pub const VIEW_END: &'static str = "view_end";
    pub const LIKE: &'static str = "like";
    pub const GIFT: &'static str = "gift";
    pub const SHARE: &'static str = "share";
    pub const COMMENT: &'static str = "comment";

    /// The `event_name` this kind was parsed from
    pub fn name(&self) -> &str {
        match self {
            EventKind::ViewEnd { .. } => Self::VIEW_END,
            EventKind::Like { .. } => Self::LIKE,
            EventKind::Gift { .. } => Self::GIFT,
            EventKind::Share => Self::SHARE,
            EventKind::Comment => Self::COMMENT,
            EventKind::Other(name) => name,
        }
    }

    fn from_fields(name: &str, fields: &Map<String, Value>) -> Result<Self> {
        let kind = match name {
            Self::VIEW_END => EventKind::ViewEnd {
                duration_ms: read_f64(fields, "duration_ms")?,
            },
            Self::LIKE => EventKind::Like {
                like_counter: read_f64(fields, "like_counter")?,
            },
            Self::GIFT => EventKind::Gift {
                quantity: read_f64(fields, "gift_quantity")?,
                cheers_value: read_f64(fields, "gift_cheers_value")?,
            },
            Self::SHARE => EventKind::Share,
            Self::COMMENT => EventKind::Comment,
            other => EventKind::Other(other.to_string()),
        };
        Ok(kind)
    }
}

/// A validated event record
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    kind: EventKind,
    event_time: i64,
    fields: Map<String, Value>,
}

impl Event {
    /// Parse one JSON-lines record
    pub fn from_json_line(line: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(line).map_err(|e| {
            FeatureError::record(ErrorCode::RECORD_MALFORMED_JSON, e.to_string()).with_source(e)
        })?;
        match value {
            Value::Object(fields) => Self::from_fields(fields),
            other => Err(FeatureError::record(
                ErrorCode::RECORD_MALFORMED_JSON,
                format!("expected a JSON object, got {}", json_type_name(&other)),
            )),
        }
    }

    /// Validate an already-decoded object
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self> {
        let name = read_string(&fields, EVENT_NAME_FIELD)?;
        let event_time = read_i64(&fields, EVENT_TIME_FIELD)?;
        let kind = EventKind::from_fields(&name, &fields)?;
        Ok(Self {
            kind,
            event_time,
            fields,
        })
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// Original (unshifted) timestamp in epoch seconds
    pub fn event_time(&self) -> i64 {
        self.event_time
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Add or replace an output field
    pub fn insert_field(&mut self, name: String, value: Value) {
        self.fields.insert(name, value);
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// Serialize as one JSON line (keys sorted, so output bytes are stable)
    pub fn to_json_line(&self) -> Result<String> {
        serde_json::to_string(&self.fields).map_err(|e| {
            FeatureError::record(ErrorCode::RECORD_GENERIC, e.to_string()).with_source(e)
        })
    }
}

/// An event tagged with its role for the reduce step
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedEvent {
    pub role: Role,
    pub event: Event,
}

impl TaggedEvent {
    pub fn new(role: Role, event: Event) -> Self {
        Self { role, event }
    }

    /// Encode for the shuffle: the record JSON plus the role field
    pub fn to_wire(&self) -> Result<String> {
        let mut fields = self.event.fields.clone();
        fields.insert(
            ROLE_FIELD.to_string(),
            Value::String(self.role.as_str().to_string()),
        );
        serde_json::to_string(&fields).map_err(|e| {
            FeatureError::record(ErrorCode::RECORD_GENERIC, e.to_string()).with_source(e)
        })
    }

    /// Decode a shuffle value, stripping the role field
    pub fn from_wire(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw).map_err(|e| {
            FeatureError::record(ErrorCode::RECORD_MALFORMED_JSON, e.to_string()).with_source(e)
        })?;
        let Value::Object(mut fields) = value else {
            return Err(FeatureError::record(
                ErrorCode::RECORD_MALFORMED_JSON,
                "shuffle value is not a JSON object",
            ));
        };
        let role = match fields.remove(ROLE_FIELD) {
            Some(Value::String(role)) => Role::parse(&role)?,
            Some(_) => return Err(FeatureError::invalid_field(ROLE_FIELD, "is not a string")),
            None => return Err(FeatureError::missing_field(ROLE_FIELD)),
        };
        Ok(Self {
            role,
            event: Event::from_fields(fields)?,
        })
    }
}

/// Read an integer field, accepting JSON numbers and numeric strings
pub fn read_i64(fields: &Map<String, Value>, name: &str) -> Result<i64> {
    match fields.get(name) {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| FeatureError::invalid_field(name, format!("is not an integer: {}", n))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| FeatureError::invalid_field(name, format!("'{}': {}", s, e))),
        Some(other) => Err(FeatureError::invalid_field(
            name,
            format!("has unexpected type {}", json_type_name(other)),
        )),
        None => Err(FeatureError::missing_field(name)),
    }
}

/// Read a float field, accepting JSON numbers and numeric strings
pub fn read_f64(fields: &Map<String, Value>, name: &str) -> Result<f64> {
    match fields.get(name) {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| FeatureError::invalid_field(name, format!("is not a number: {}", n))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| FeatureError::invalid_field(name, format!("'{}': {}", s, e))),
        Some(other) => Err(FeatureError::invalid_field(
            name,
            format!("has unexpected type {}", json_type_name(other)),
        )),
        None => Err(FeatureError::missing_field(name)),
    }
}

/// Read a field as text: strings verbatim, numbers and booleans as JSON text
pub fn read_string(fields: &Map<String, Value>, name: &str) -> Result<String> {
    match fields.get(name) {
        Some(value) => scalar_text(name, value),
        None => Err(FeatureError::missing_field(name)),
    }
}

pub(crate) fn scalar_text(name: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(FeatureError::invalid_field(
            name,
            format!("has non-scalar type {}", json_type_name(other)),
        )),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

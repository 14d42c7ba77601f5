use std::fmt::Display;
use std::path::PathBuf;
use thiserror::Error;

pub mod codes;

pub use codes::{describe_error_code, ErrorCode};

/// Result alias used throughout the library
pub type Result<T, E = FeatureError> = std::result::Result<T, E>;

/// The unified error type for featurecook
#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("[E{code:04}] Configuration error: {message}")]
    Config {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Record error: {message}")]
    Record {
        code: u16,
        message: String,
        field: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Sequencing error: {message}")]
    Sequencing {
        code: u16,
        message: String,
        key: Option<String>,
    },

    #[error("[E{code:04}] I/O error: {message}")]
    Io {
        code: u16,
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl FeatureError {
    /// Create a configuration error with default code
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::CONFIG_GENERIC,
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with specific code
    pub fn config_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Config {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create a record error with specific code
    pub fn record(code: u16, message: impl Into<String>) -> Self {
        Self::Record {
            code,
            message: message.into(),
            field: None,
            source: None,
        }
    }

    /// Required field absent from a record
    pub fn missing_field(field: &str) -> Self {
        Self::Record {
            code: ErrorCode::RECORD_MISSING_FIELD,
            message: format!("missing required field '{}'", field),
            field: Some(field.to_string()),
            source: None,
        }
    }

    /// Field present but its value cannot be used
    pub fn invalid_field(field: &str, reason: impl Display) -> Self {
        Self::Record {
            code: ErrorCode::RECORD_INVALID_FIELD,
            message: format!("field '{}' {}", field, reason),
            field: Some(field.to_string()),
            source: None,
        }
    }

    /// A record reached an accumulator with a timestamp older than its state
    pub fn out_of_order(last_update: i64, event_time: i64) -> Self {
        Self::Sequencing {
            code: ErrorCode::SEQ_OUT_OF_ORDER,
            message: format!(
                "unsorted timestamps detected: event at {} after last update at {}",
                event_time, last_update
            ),
            key: None,
        }
    }

    /// Create an I/O error with specific code and path
    pub fn io(code: u16, message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Io {
            code,
            message: message.into(),
            path,
            source: None,
        }
    }

    /// Add a source error to this error
    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        match &mut self {
            Self::Config { source: src, .. }
            | Self::Record { source: src, .. }
            | Self::Io { source: src, .. } => {
                *src = Some(source.into());
            }
            Self::Sequencing { .. } => {}
        }
        self
    }

    /// Add context to the error message
    pub fn with_context(mut self, context: impl Display) -> Self {
        match &mut self {
            Self::Config { message, .. }
            | Self::Record { message, .. }
            | Self::Sequencing { message, .. }
            | Self::Io { message, .. } => {
                *message = format!("{}: {}", message, context);
            }
        }
        self
    }

    /// Attach the group key a sequencing failure occurred in
    pub fn with_group_key(mut self, group_key: impl Into<String>) -> Self {
        if let Self::Sequencing { ref mut key, .. } = self {
            *key = Some(group_key.into());
        }
        self
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::Record { .. } => 3,
            Self::Sequencing { .. } => 4,
            Self::Io { .. } => 5,
        }
    }

    /// Get the error code
    pub fn code(&self) -> u16 {
        match self {
            Self::Config { code, .. }
            | Self::Record { code, .. }
            | Self::Sequencing { code, .. }
            | Self::Io { code, .. } => *code,
        }
    }

    /// Whether this error comes from a single malformed record
    pub fn is_record_error(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Config { message, .. } => format!("Configuration problem: {}", message),
            Self::Record { message, field, .. } => match field {
                Some(f) => format!("Bad record (field '{}'): {}", f, message),
                None => format!("Bad record: {}", message),
            },
            Self::Sequencing { message, key, .. } => match key {
                Some(k) => format!("Internal ordering failure in group {}: {}", k, message),
                None => format!("Internal ordering failure: {}", message),
            },
            Self::Io { message, path, .. } => match path {
                Some(p) => format!("I/O error at {}: {}", p.display(), message),
                None => format!("I/O error: {}", message),
            },
        }
    }

    /// Get a developer-friendly error message with full chain
    pub fn developer_message(&self) -> String {
        let mut msg = format!("{}", self);
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            msg.push_str(&format!("\n  caused by: {}", cause));
            source = cause.source();
        }
        msg
    }
}

impl From<std::io::Error> for FeatureError {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::IO_NOT_FOUND,
            _ => ErrorCode::IO_GENERIC,
        };
        FeatureError::io(code, err.to_string(), None).with_source(err)
    }
}

impl From<serde_yaml::Error> for FeatureError {
    fn from(err: serde_yaml::Error) -> Self {
        FeatureError::config_with_code(ErrorCode::CONFIG_INVALID_YAML, err.to_string())
            .with_source(err)
    }
}

impl From<toml::de::Error> for FeatureError {
    fn from(err: toml::de::Error) -> Self {
        FeatureError::config_with_code(ErrorCode::CONFIG_INVALID_TOML, err.to_string())
            .with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_render_in_display() {
        let err = FeatureError::missing_field("event_time");
        assert_eq!(err.code(), ErrorCode::RECORD_MISSING_FIELD);
        assert!(err.to_string().starts_with("[E2003]"));
        assert!(err.to_string().contains("event_time"));
    }

    #[test]
    fn test_exit_codes_per_category() {
        assert_eq!(FeatureError::config("x").exit_code(), 2);
        assert_eq!(FeatureError::missing_field("x").exit_code(), 3);
        assert_eq!(FeatureError::out_of_order(10, 5).exit_code(), 4);
        assert_eq!(FeatureError::io(ErrorCode::IO_GENERIC, "x", None).exit_code(), 5);
    }

    #[test]
    fn test_with_context_and_group_key() {
        let err = FeatureError::out_of_order(10, 5)
            .with_group_key("host1£")
            .with_context("window 1h");
        let message = err.user_message();
        assert!(message.contains("host1£"));
        assert!(message.contains("window 1h"));
    }

    #[test]
    fn test_source_chain_in_developer_message() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: FeatureError = io.into();
        assert_eq!(err.code(), ErrorCode::IO_NOT_FOUND);
        assert!(err.developer_message().contains("caused by: gone"));
    }

    #[test]
    fn test_describe_known_and_unknown_codes() {
        assert_eq!(
            describe_error_code(ErrorCode::SEQ_OUT_OF_ORDER),
            "Record reached an accumulator out of time order"
        );
        assert_eq!(describe_error_code(9999), "Unknown error code");
    }
}

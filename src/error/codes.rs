/// Error code registry for featurecook
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 2000-2999: Record errors (parse boundary)
/// - 3000-3999: Sequencing errors (internal consistency)
/// - 4000-4999: I/O errors
#[allow(dead_code)]
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_GENERIC: u16 = 1000;
    pub const CONFIG_NOT_FOUND: u16 = 1001;
    pub const CONFIG_INVALID_YAML: u16 = 1002;
    pub const CONFIG_INVALID_TOML: u16 = 1003;
    pub const CONFIG_INVALID_VALUE: u16 = 1004;
    pub const CONFIG_VALIDATION_FAILED: u16 = 1005;
    pub const CONFIG_EMPTY_DIMENSIONS: u16 = 1006;

    // Record errors (2000-2999)
    pub const RECORD_GENERIC: u16 = 2000;
    pub const RECORD_MALFORMED_JSON: u16 = 2001;
    pub const RECORD_MALFORMED_CSV: u16 = 2002;
    pub const RECORD_MISSING_FIELD: u16 = 2003;
    pub const RECORD_INVALID_FIELD: u16 = 2004;
    pub const RECORD_SENTINEL_IN_KEY: u16 = 2005;
    pub const RECORD_UNKNOWN_ROLE: u16 = 2006;
    pub const RECORD_PAYLOAD_MISMATCH: u16 = 2007;
    pub const RECORD_MALFORMED_SHUFFLE: u16 = 2008;

    // Sequencing errors (3000-3999)
    pub const SEQ_GENERIC: u16 = 3000;
    pub const SEQ_OUT_OF_ORDER: u16 = 3001;

    // I/O errors (4000-4999)
    pub const IO_GENERIC: u16 = 4000;
    pub const IO_READ_FAILED: u16 = 4001;
    pub const IO_WRITE_FAILED: u16 = 4002;
    pub const IO_NOT_FOUND: u16 = 4003;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        ErrorCode::CONFIG_GENERIC => "General configuration error",
        ErrorCode::CONFIG_NOT_FOUND => "Configuration file not found",
        ErrorCode::CONFIG_INVALID_YAML => "Invalid YAML syntax in configuration",
        ErrorCode::CONFIG_INVALID_TOML => "Invalid TOML syntax in configuration",
        ErrorCode::CONFIG_INVALID_VALUE => "Invalid configuration value",
        ErrorCode::CONFIG_VALIDATION_FAILED => "Configuration validation failed",
        ErrorCode::CONFIG_EMPTY_DIMENSIONS => "No grouping dimensions configured",

        ErrorCode::RECORD_GENERIC => "General record error",
        ErrorCode::RECORD_MALFORMED_JSON => "Record is not a JSON object",
        ErrorCode::RECORD_MALFORMED_CSV => "Record does not have the expected CSV shape",
        ErrorCode::RECORD_MISSING_FIELD => "Required field missing from record",
        ErrorCode::RECORD_INVALID_FIELD => "Field has an unusable value",
        ErrorCode::RECORD_SENTINEL_IN_KEY => "Key dimension value contains the key sentinel",
        ErrorCode::RECORD_UNKNOWN_ROLE => "Unknown record role on the shuffle wire",
        ErrorCode::RECORD_PAYLOAD_MISMATCH => "Event payload does not fit the counter contribution",
        ErrorCode::RECORD_MALFORMED_SHUFFLE => "Shuffle line is not a key/value pair",

        ErrorCode::SEQ_GENERIC => "General sequencing error",
        ErrorCode::SEQ_OUT_OF_ORDER => "Record reached an accumulator out of time order",

        ErrorCode::IO_GENERIC => "General I/O error",
        ErrorCode::IO_READ_FAILED => "Failed to read input",
        ErrorCode::IO_WRITE_FAILED => "Failed to write output",
        ErrorCode::IO_NOT_FOUND => "Input path not found",

        _ => "Unknown error code",
    }
}

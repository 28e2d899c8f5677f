//! Error types for Daywatch
//!
//! This module defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Daywatch operations
pub type Result<T> = std::result::Result<T, DaywatchError>;

/// Main error type for Daywatch operations
#[derive(Error, Debug)]
pub enum DaywatchError {
    /// Startup configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Schema loading or validation error
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Data generation error
    #[error("Generation error: {0}")]
    Generate(#[from] GenerateError),

    /// Activity log read/write error
    #[error("Log error: {0}")]
    Log(#[from] LogError),
}

/// Errors detected before any engine work starts
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A source file path does not exist
    #[error("File not found: {path}")]
    MissingFile { path: PathBuf },

    /// Day count must be strictly positive
    #[error("Day count must be greater than 0, got {days}")]
    InvalidDayCount { days: usize },
}

/// Errors while loading or validating the event schema
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Source file unreadable
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The leading count line is missing or not an integer
    #[error("Invalid count line in {file}: {content:?}")]
    InvalidCount { file: String, content: String },

    /// Fewer records than the count line declares
    #[error("{file} declares {declared} records but contains {found}")]
    TruncatedFile {
        file: String,
        declared: usize,
        found: usize,
    },

    /// Event and stat files declare different record counts
    #[error("Record counts are inconsistent: {events} events vs {stats} stat entries")]
    CountMismatch { events: usize, stats: usize },

    /// Event names disagree at the same position in the two files
    #[error("Inconsistency at line {line}: event {event:?} vs stat entry {stat:?}")]
    NameMismatch {
        line: usize,
        event: String,
        stat: String,
    },

    /// A record has fewer colon-delimited fields than required
    #[error("Malformed record at line {line}: expected {expected} fields, found {found}")]
    TooFewFields {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A required field is empty
    #[error("Empty {field} field at line {line}")]
    EmptyField { line: usize, field: &'static str },

    /// Event kind tag is not one of the recognized tags
    #[error("Event kind must be C or D at line {line}, got {value:?}")]
    InvalidKind { line: usize, value: String },

    /// Weight contains a fractional separator
    #[error("Weight must be an integer at line {line}, got {value:?}")]
    FractionalWeight { line: usize, value: String },

    /// Discrete event bound contains a fractional separator
    #[error("Float bound in a discrete event at line {line}: {value:?}")]
    FractionalBound { line: usize, value: String },

    /// A field failed numeric parsing
    #[error("Invalid {field} at line {line}: {value:?}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },

    /// Minimum exceeds maximum
    #[error("Minimum {minimum} exceeds maximum {maximum} at line {line}")]
    InvalidRange {
        line: usize,
        minimum: f64,
        maximum: f64,
    },

    /// Target standard deviation is negative
    #[error("Standard deviation must be non-negative at line {line}, got {value}")]
    NegativeStdDev { line: usize, value: f64 },
}

/// Errors while generating synthetic day series
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerateError {
    /// The rejection-sampling loop hit its retry ceiling without an
    /// accepted batch (degenerate or inconsistent mean/stddev/bounds)
    #[error("No accepted batch for event {event:?} after {attempts} attempts")]
    RetryLimitExceeded { event: String, attempts: usize },

    /// The target distribution cannot be constructed
    #[error("Invalid distribution for event {event:?}: {reason}")]
    InvalidDistribution { event: String, reason: String },
}

/// Errors while writing or replaying a day-block activity log
#[derive(Error, Debug)]
pub enum LogError {
    /// Destination unwritable or source unreadable
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON sink error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No series was supplied for a table event
    #[error("No series for event {event:?}")]
    MissingSeries { event: String },

    /// A series is shorter than the day count being serialized
    #[error("Series for event {event:?} has {actual} values, expected {expected}")]
    ShortSeries {
        event: String,
        expected: usize,
        actual: usize,
    },

    /// A day header line is not `Day <k>`
    #[error("Invalid day header at line {line}: {content:?}")]
    InvalidDayHeader { line: usize, content: String },

    /// The per-day event count line is not an integer
    #[error("Invalid event count at line {line}: {content:?}")]
    InvalidEventCount { line: usize, content: String },

    /// An event record line is not `name:kind:value:`
    #[error("Malformed log entry at line {line}: {content:?}")]
    MalformedEntry { line: usize, content: String },

    /// The log ended inside a day block
    #[error("Unexpected end of log at line {line}")]
    UnexpectedEof { line: usize },

    /// A log record names an event absent from the event table
    #[error("Day {day} names unknown event {name:?}")]
    UnknownEvent { day: usize, name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DaywatchError::Schema(SchemaError::NameMismatch {
            line: 3,
            event: "Logins".to_string(),
            stat: "Traffic".to_string(),
        });
        let msg = format!("{}", err);
        assert!(msg.contains("line 3"));
        assert!(msg.contains("Logins"));
    }

    #[test]
    fn test_error_conversion() {
        let gen_err = GenerateError::RetryLimitExceeded {
            event: "Logins".to_string(),
            attempts: 1000,
        };
        let err: DaywatchError = gen_err.into();
        assert!(matches!(err, DaywatchError::Generate(_)));
    }
}

//! Error types for the tally_core library.

use chrono::NaiveDate;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for tally_core operations
///
/// The projection engine never produces one of these; only the stores and
/// bookkeeping modules around it do.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejected user input (empty names, bad amounts, inconsistent imports)
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Referenced subject, row, task or expense does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Subject already has a mark for the given day
    #[error("Already marked {subject} for {date}")]
    AlreadyMarked { subject: String, date: NaiveDate },
}

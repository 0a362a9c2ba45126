//! Centralized error handling for oraload.
//!
//! Every fallible library operation returns [`Result`], whose error type is
//! [`OraloadError`]. The variants follow the two failure families of a run:
//!
//! - [`OraloadError::UnsupportedInput`]: the input is neither a spreadsheet
//!   nor a delimited text file. Raised before anything is read.
//! - everything else: a failure while reading the input or writing the
//!   artifacts. The binary catches these once, logs them and prints the
//!   diagnostic checklist.
//!
//! ## Context Extension Trait
//!
//! [`ResultExt`] adds `.context()` to any `Result` whose error converts into
//! [`OraloadError`]:
//!
//! ```no_run
//! use oraload::error::ResultExt as _;
//!
//! fn load() -> oraload::error::Result<String> {
//!     let text = std::fs::read_to_string("input.csv").context("Failed to read input")?;
//!     Ok(text)
//! }
//! ```

use std::fmt;

/// Main error type for oraload operations.
#[derive(Debug)]
pub enum OraloadError {
    /// I/O errors (reading the input, writing artifacts)
    Io(std::io::Error),

    /// Input kind is neither spreadsheet nor delimited text
    UnsupportedInput(String),

    /// Spreadsheet could not be opened or read
    Spreadsheet(String),

    /// Dataset building or serialization errors (Polars, parsing, etc.)
    DataProcessing(String),

    /// Configuration errors
    Config(String),

    /// File not found or invalid path
    InvalidPath(String),

    /// Generic error with context
    Other(String),
}

impl fmt::Display for OraloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::UnsupportedInput(msg) => write!(f, "Unsupported input: {msg}"),
            Self::Spreadsheet(msg) => write!(f, "Spreadsheet error: {msg}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::InvalidPath(msg) => write!(f, "Invalid path: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for OraloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for OraloadError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for OraloadError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<serde_json::Error> for OraloadError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for OraloadError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

impl From<calamine::Error> for OraloadError {
    fn from(err: calamine::Error) -> Self {
        Self::Spreadsheet(err.to_string())
    }
}

/// Result type alias for oraload operations.
pub type Result<T> = std::result::Result<T, OraloadError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<OraloadError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: OraloadError = e.into();
            OraloadError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: OraloadError = e.into();
            OraloadError::Other(format!("{}: {}", f(), err))
        })
    }
}

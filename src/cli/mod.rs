//! CLI support for recipe-filter
//!
//! Provides programmatic access to the `rfilter` commands so that other
//! tools can embed them.

mod check;
mod sample;

pub use check::{CheckOptions, CheckResult, execute_check};
pub use sample::{execute_bucket_sample, execute_fraction_to_key, execute_stable_sample};

use std::io;

/// Errors that can occur during CLI operations
#[derive(Debug)]
pub enum CliError {
    /// Tokenizing, parsing or evaluating the expression failed
    Expression(crate::Error),
    /// A sampling primitive rejected its arguments
    Range(crate::RangeError),
    /// JSON parsing error
    Json(serde_json::Error),
    /// IO error
    Io(io::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Expression(e) => write!(f, "{}", e),
            CliError::Range(e) => write!(f, "Range error: {}", e),
            CliError::Json(e) => write!(f, "Invalid JSON: {}", e),
            CliError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Expression(e) => Some(e),
            CliError::Range(e) => Some(e),
            CliError::Json(e) => Some(e),
            CliError::Io(e) => Some(e),
        }
    }
}

impl From<crate::Error> for CliError {
    fn from(e: crate::Error) -> Self {
        CliError::Expression(e)
    }
}

impl From<crate::SyntaxError> for CliError {
    fn from(e: crate::SyntaxError) -> Self {
        CliError::Expression(e.into())
    }
}

impl From<crate::RangeError> for CliError {
    fn from(e: crate::RangeError) -> Self {
        CliError::Range(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

/// Parses a JSON document into an engine value
fn parse_json(json: &str) -> Result<crate::Value, CliError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    Ok(crate::Value::from(value))
}

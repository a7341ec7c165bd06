//! Errors
//!
//! Custom error types used throughout the `treesplit` crate.
use thiserror::Error;

/// Errors that can occur while configuring split evaluation.
#[derive(Debug, Error)]
pub enum TreeSplitError {
    /// Invalid value parsing.
    #[error("Invalid value {0} passed for {1}, expected one of {2}.")]
    ParseString(String, String, String),
    /// A class count vector with no classes was requested.
    #[error("At least one target class is required, but an empty class count vector was requested.")]
    EmptyClassCounts,
}

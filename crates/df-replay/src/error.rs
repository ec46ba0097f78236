//! Error types for the replay engine
//!
//! Anomalies here degrade to a visible terminal UI state; nothing in this
//! crate throws into the hosting page.

use thiserror::Error;

/// Replay engine error type
#[derive(Error, Debug)]
pub enum ReplayError {
    /// The result-generation service returned no record for this draw
    #[error("Draw result unavailable")]
    ResultUnavailable,

    /// The fetched payload failed normalization or structural validation
    #[error("Malformed draw result: {0}")]
    Malformed(#[from] df_draw::DrawError),

    /// The external source itself failed
    #[error("Result source error: {0}")]
    Source(String),
}

/// Result type alias for replay operations
pub type ReplayResult<T> = Result<T, ReplayError>;

//! Error types for df-draw

use thiserror::Error;

use crate::result::TicketId;

/// Draw model error type
#[derive(Error, Debug)]
pub enum DrawError {
    #[error("Missing stage data: {0}")]
    MissingStage(&'static str),

    #[error("Unknown result format version {0}")]
    UnknownFormat(String),

    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("Ticket {0} is not part of the prior stage's output")]
    NotASubset(TicketId),

    #[error("Rank {0} assigned more than once")]
    DuplicateRank(u8),

    #[error("Assigned ranks are not a permutation of 1..={expected}")]
    RankGap { expected: u8 },

    #[error("Elimination rank {rank} for ticket {ticket} does not match recorded order")]
    EliminationOrder { ticket: TicketId, rank: u8 },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for DrawError {
    fn from(err: serde_json::Error) -> Self {
        DrawError::Serialization(err.to_string())
    }
}

/// Result type alias for draw model operations
pub type DfResult<T> = Result<T, DrawError>;

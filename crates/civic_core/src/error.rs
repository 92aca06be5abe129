use thiserror::Error;

#[derive(Debug, Error)]
pub enum CivicError {
    #[error("invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("invalid timestamp {value:?}: {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: time::error::Parse,
    },

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("unknown status: {0}")]
    UnknownStatus(String),

    #[error("unknown priority tier: {0}")]
    UnknownTier(String),

    #[error("unknown vote direction: {0}")]
    UnknownVoteDirection(String),

    #[error("unknown infrastructure condition: {0}")]
    UnknownCondition(String),

    #[error("status transition {from} -> {to} is not allowed")]
    InvalidTransition { from: String, to: String },

    #[error("user {voter_id} already voted on idea {idea_id}")]
    DuplicateVote { idea_id: String, voter_id: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CivicError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CivicError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type CivicResult<T> = Result<T, CivicError>;

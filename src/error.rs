use thiserror::Error;

use crate::adaptive::types::SessionStatus;
use crate::services::llm_provider::LlmError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown topic: {0}")]
    InvalidTopic(String),
    #[error("session {session_id} is {status} and no longer accepts changes")]
    InvalidState {
        session_id: String,
        status: SessionStatus,
    },
    #[error("text generation unavailable: {0}")]
    GenerationUnavailable(String),
    #[error("no score could be extracted from feedback")]
    MalformedScore,
    #[error("session not found: user={user_id}, session={session_id}")]
    SessionNotFound { user_id: String, session_id: String },
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<LlmError> for EngineError {
    fn from(value: LlmError) -> Self {
        EngineError::GenerationUnavailable(value.to_string())
    }
}

impl EngineError {
    /// Stable machine-readable code for callers that surface errors over a wire.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTopic(_) => "INVALID_TOPIC",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::GenerationUnavailable(_) => "GENERATION_UNAVAILABLE",
            Self::MalformedScore => "MALFORMED_SCORE",
            Self::SessionNotFound { .. } => "NOT_FOUND",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Store(StoreError::Validation(_)) => "VALIDATION_ERROR",
            Self::Store(_) => "INTERNAL_ERROR",
        }
    }

    /// Operational errors are caused by the caller or a transient dependency;
    /// the rest point at a bug or broken storage.
    pub fn is_operational(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::Store(_))
            || matches!(self, Self::Store(StoreError::Validation(_)))
    }
}

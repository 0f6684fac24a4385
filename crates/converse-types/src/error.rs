use std::time::Duration;

use thiserror::Error;

use crate::llm::InferenceError;

/// Errors from repository operations (used by trait definitions in
/// converse-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Terminal outcome of a chat request, as seen by the transport layer.
///
/// Every variant carries a stable category; no provider internals or stack
/// traces leak past this boundary.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The per-user window is exhausted; retry after the carried duration.
    #[error("rate limit exceeded, retry in {0:?}")]
    RateLimitExceeded(Duration),

    /// Caller error: empty input, bad pagination, malformed identifiers.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The inference provider failed after internal retries were exhausted.
    #[error("inference unavailable: {0}")]
    InferenceUnavailable(String),

    /// Requested chat, turn, or message does not exist.
    #[error("not found")]
    NotFound,

    /// The model produced a response but persisting it failed. Surfaced
    /// distinctly so the caller is never told of a false success.
    #[error("response generated but not saved: {0}")]
    ResponseNotSaved(String),

    /// A freshly generated response_session_id collided in the store.
    /// Indicates an identity-generation defect; alert-worthy, not retried.
    #[error("internal consistency error: {0}")]
    Internal(String),
}

impl From<InferenceError> for ChatError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::InvalidRequest(msg) => ChatError::InvalidRequest(msg),
            // Throttled past the gateway means retries were exhausted.
            InferenceError::Throttled { .. } => {
                ChatError::InferenceUnavailable("provider throttled".to_string())
            }
            InferenceError::Unavailable(msg) => ChatError::InferenceUnavailable(msg),
        }
    }
}

//! Inference request parameters and error classification.

use serde::{Deserialize, Serialize};

/// Generation parameters sent alongside a prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Provider model identifier (e.g., a Bedrock inference profile id).
    pub model_id: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model_id: "anthropic.claude-3-5-sonnet-20241022-v2:0".to_string(),
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

/// Provider errors collapsed into the three categories the orchestrator
/// understands.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InferenceError {
    /// Malformed or oversized prompt; never retried.
    #[error("invalid inference request: {0}")]
    InvalidRequest(String),

    /// Provider-side rate limiting; retried with backoff, bounded.
    #[error("provider throttled (retry after {retry_after_ms:?}ms)")]
    Throttled { retry_after_ms: Option<u64> },

    /// Connectivity or service failure; retried while attempts remain,
    /// then surfaced to the caller.
    #[error("inference unavailable: {0}")]
    Unavailable(String),
}

impl InferenceError {
    /// Whether the gateway may retry this failure.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, InferenceError::InvalidRequest(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_request_not_retryable() {
        assert!(!InferenceError::InvalidRequest("too large".into()).is_retryable());
        assert!(InferenceError::Throttled { retry_after_ms: None }.is_retryable());
        assert!(InferenceError::Unavailable("timeout".into()).is_retryable());
    }

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert_eq!(opts.max_tokens, 4096);
        assert!(opts.model_id.contains("anthropic"));
    }
}

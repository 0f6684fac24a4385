//! Inference gateway: the provider trait and the retrying wrapper.
//!
//! `InferenceProvider` is the narrow seam to the remote model. The gateway
//! adds bounded retry with backoff on transient failures and guarantees the
//! orchestrator only ever sees the three-category error classification.

use std::time::Duration;

use tracing::{debug, warn};

use converse_types::llm::{GenerationOptions, InferenceError};

/// Backend capable of one synchronous "generate text" call.
///
/// Implementations live in converse-infra (e.g., `BedrockInference`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait InferenceProvider: Send + Sync {
    /// Human-readable provider name (e.g., "bedrock").
    fn name(&self) -> &str;

    /// Send a prompt plus generation parameters; returns the response text
    /// or a classified error. Must apply its own bounded request timeout.
    fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> impl std::future::Future<Output = Result<String, InferenceError>> + Send;
}

/// Retry policy for transient provider failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Backoff before the first retry; doubles per attempt.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(250),
        }
    }
}

/// Wraps a provider with retry, backoff, and error-category mapping.
///
/// `Throttled` and `Unavailable` failures are retried while attempts
/// remain; `InvalidRequest` is surfaced immediately. When retries exhaust,
/// the last transient failure is surfaced as `Unavailable`.
pub struct InferenceGateway<P: InferenceProvider> {
    provider: P,
    policy: RetryPolicy,
}

impl<P: InferenceProvider> InferenceGateway<P> {
    pub fn new(provider: P, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    /// Invoke the provider, retrying transient failures per the policy.
    pub async fn invoke(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, InferenceError> {
        let mut backoff = self.policy.initial_backoff;
        let mut attempt = 0u32;

        loop {
            match self.provider.generate(prompt, options).await {
                Ok(text) => {
                    debug!(provider = self.provider.name(), attempt, "inference succeeded");
                    return Ok(text);
                }
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) if attempt >= self.policy.max_retries => {
                    warn!(
                        provider = self.provider.name(),
                        attempts = attempt + 1,
                        error = %err,
                        "inference retries exhausted"
                    );
                    return Err(match err {
                        InferenceError::Unavailable(msg) => InferenceError::Unavailable(msg),
                        other => InferenceError::Unavailable(other.to_string()),
                    });
                }
                Err(err) => {
                    // Honor a provider-supplied retry hint when it exceeds
                    // the scheduled backoff.
                    let wait = match &err {
                        InferenceError::Throttled {
                            retry_after_ms: Some(ms),
                        } => backoff.max(Duration::from_millis(*ms)),
                        _ => backoff,
                    };
                    warn!(
                        provider = self.provider.name(),
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        error = %err,
                        "transient inference failure, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    backoff *= 2;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Provider that plays back a scripted sequence of outcomes.
    struct ScriptedProvider {
        script: Mutex<Vec<Result<String, InferenceError>>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<String, InferenceError>>) -> Self {
            Self {
                script: Mutex::new(script),
            }
        }
    }

    impl InferenceProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(
            &self,
            _prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<String, InferenceError> {
            self.script
                .lock()
                .unwrap()
                .remove(0)
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            initial_backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let gateway = InferenceGateway::new(
            ScriptedProvider::new(vec![Ok("hello".to_string())]),
            fast_policy(),
        );
        let text = gateway
            .invoke("hi", &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn test_transient_failure_retried_until_success() {
        let gateway = InferenceGateway::new(
            ScriptedProvider::new(vec![
                Err(InferenceError::Unavailable("connection reset".into())),
                Err(InferenceError::Throttled { retry_after_ms: Some(1) }),
                Ok("recovered".to_string()),
            ]),
            fast_policy(),
        );
        let text = gateway
            .invoke("hi", &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "recovered");
    }

    #[tokio::test]
    async fn test_invalid_request_never_retried() {
        let gateway = InferenceGateway::new(
            ScriptedProvider::new(vec![
                Err(InferenceError::InvalidRequest("prompt too large".into())),
                Ok("should not be reached".to_string()),
            ]),
            fast_policy(),
        );
        let err = gateway
            .invoke("hi", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_unavailable() {
        let gateway = InferenceGateway::new(
            ScriptedProvider::new(vec![
                Err(InferenceError::Unavailable("down".into())),
                Err(InferenceError::Unavailable("down".into())),
                Err(InferenceError::Throttled { retry_after_ms: None }),
            ]),
            fast_policy(),
        );
        let err = gateway
            .invoke("hi", &GenerationOptions::default())
            .await
            .unwrap_err();
        // Even a final Throttled maps to Unavailable once retries exhaust.
        assert!(matches!(err, InferenceError::Unavailable(_)));
    }
}

//! BedrockInference -- concrete [`InferenceProvider`] for AWS Bedrock.
//!
//! Sends Anthropic-schema requests to the Bedrock Runtime `invoke` endpoint
//! with Bearer token authentication. The token is wrapped in
//! [`secrecy::SecretString`] and is never logged or included in Debug
//! output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use converse_core::gateway::InferenceProvider;
use converse_types::llm::{GenerationOptions, InferenceError};

/// AWS Bedrock inference provider.
pub struct BedrockInference {
    client: reqwest::Client,
    api_key: SecretString,
    region: String,
    base_url: Option<String>,
}

/// Anthropic-on-Bedrock request body.
#[derive(Debug, Serialize)]
struct BedrockRequest {
    anthropic_version: String,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<BedrockMessage>,
}

#[derive(Debug, Serialize)]
struct BedrockMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct BedrockResponse {
    content: Vec<BedrockContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BedrockContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

impl BedrockInference {
    /// The Anthropic API version for Bedrock.
    const API_VERSION: &'static str = "bedrock-2023-05-31";

    /// Per-attempt request timeout; the gateway's retry budget sits on top.
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(api_key: SecretString, region: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_key,
            region,
            base_url: None,
        }
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    fn invoke_url(&self, model_id: &str) -> String {
        match &self.base_url {
            Some(base) => format!("{base}/model/{model_id}/invoke"),
            None => format!(
                "https://bedrock-runtime.{}.amazonaws.com/model/{}/invoke",
                self.region, model_id
            ),
        }
    }
}

// BedrockInference intentionally does NOT derive Debug so the bearer token
// cannot leak through formatting.

impl InferenceProvider for BedrockInference {
    fn name(&self) -> &str {
        "bedrock"
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, InferenceError> {
        let body = BedrockRequest {
            anthropic_version: Self::API_VERSION.to_string(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            messages: vec![BedrockMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };
        let url = self.invoke_url(&options.model_id);

        tracing::debug!(model_id = %options.model_id, region = %self.region, "Bedrock invoke request");

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Unavailable("request timed out".to_string())
                } else {
                    InferenceError::Unavailable(format!("HTTP request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %error_body, "Bedrock API error response");
            return Err(match status.as_u16() {
                400 | 413 | 422 => {
                    InferenceError::InvalidRequest(format!("HTTP {status}: {error_body}"))
                }
                429 => InferenceError::Throttled {
                    retry_after_ms: None,
                },
                _ => InferenceError::Unavailable(format!("HTTP {status}")),
            });
        }

        let parsed: BedrockResponse = response.json().await.map_err(|e| {
            InferenceError::Unavailable(format!("failed to parse response: {e}"))
        })?;

        let text = parsed
            .content
            .iter()
            .filter_map(|block| match block {
                BedrockContentBlock::Text { text } => Some(text.as_str()),
                BedrockContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(InferenceError::Unavailable(
                "empty response content from Bedrock".to_string(),
            ));
        }

        Ok(text)
    }
}

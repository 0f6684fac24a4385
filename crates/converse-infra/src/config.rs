//! Service configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.converse/` in
//! production, overridable via `CONVERSE_DATA_DIR`) and deserializes it
//! into [`ServiceConfig`]. Falls back to defaults when the file is missing
//! or malformed. The Bedrock bearer token is deliberately not part of the
//! file; it comes from the environment and is wrapped in a secret at the
//! binary boundary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use converse_types::llm::GenerationOptions;

/// Rate limiting settings: fixed window per user.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            max_requests: 10,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Inference settings forwarded to the Bedrock provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub model_id: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub region: String,
    /// Retries after the initial attempt on transient failures.
    pub max_retries: u32,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        let options = GenerationOptions::default();
        Self {
            model_id: options.model_id,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            region: "us-east-1".to_string(),
            max_retries: 2,
        }
    }
}

impl InferenceConfig {
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            model_id: self.model_id.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub rate_limit: RateLimitConfig,
    pub inference: InferenceConfig,
}

/// Resolve the data directory from `CONVERSE_DATA_DIR`, defaulting to
/// `~/.converse`.
pub fn resolve_data_dir() -> PathBuf {
    match std::env::var("CONVERSE_DATA_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".converse")
        }
    }
}

/// Load service configuration from `{data_dir}/config.toml`.
///
/// - Missing file: returns defaults.
/// - Malformed file: logs a warning and returns defaults.
pub async fn load_config(data_dir: &Path) -> ServiceConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(
                "No config.toml found at {}, using defaults",
                config_path.display()
            );
            return ServiceConfig::default();
        }
        Err(err) => {
            tracing::warn!(
                "Failed to read {}: {err}, using defaults",
                config_path.display()
            );
            return ServiceConfig::default();
        }
    };

    match toml::from_str::<ServiceConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ServiceConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.rate_limit.max_requests, 10);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.inference.max_tokens, 4096);
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[rate_limit]
window_secs = 30
max_requests = 5

[inference]
model_id = "anthropic.claude-3-haiku-20240307-v1:0"
region = "eu-west-1"
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.rate_limit.window(), Duration::from_secs(30));
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.inference.region, "eu-west-1");
        // Unspecified fields keep their defaults.
        assert_eq!(config.inference.temperature, 0.7);
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_defaults() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.rate_limit.max_requests, 10);
    }
}

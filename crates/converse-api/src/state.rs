//! Application state wiring the service graph together.
//!
//! `AppState` is generic over the inference provider so integration tests
//! can substitute a deterministic stand-in; production pins
//! [`BedrockInference`] via [`AppState::init`].

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use converse_core::gateway::{InferenceProvider, RetryPolicy};
use converse_core::limiter::RateLimiter;
use converse_core::service::ChatService;
use converse_infra::bedrock::BedrockInference;
use converse_infra::config::{load_config, resolve_data_dir, ServiceConfig};
use converse_infra::sqlite::conversation::SqliteConversationRepository;
use converse_infra::sqlite::pool::DatabasePool;

/// Shared application state holding the chat service.
pub struct AppState<P: InferenceProvider> {
    pub service: Arc<ChatService<SqliteConversationRepository, P>>,
}

impl<P: InferenceProvider> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<P: InferenceProvider> AppState<P> {
    /// Wire a state from pre-built parts (used by tests with mock providers).
    pub fn with_parts(
        repo: SqliteConversationRepository,
        provider: P,
        config: &ServiceConfig,
    ) -> Self {
        let service = ChatService::new(
            repo,
            provider,
            RetryPolicy {
                max_retries: config.inference.max_retries,
                initial_backoff: Duration::from_millis(250),
            },
            RateLimiter::new(
                config.rate_limit.window(),
                config.rate_limit.max_requests,
            ),
            config.inference.generation_options(),
        );
        Self {
            service: Arc::new(service),
        }
    }
}

impl AppState<BedrockInference> {
    /// Initialize production state: data dir, config, database, Bedrock.
    ///
    /// The Bedrock bearer token is read from `CONVERSE_BEDROCK_API_KEY`.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;

        let db_url = format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("converse.db").display()
        );
        let pool = DatabasePool::new(&db_url).await?;
        let repo = SqliteConversationRepository::new(pool);

        let api_key = std::env::var("CONVERSE_BEDROCK_API_KEY")
            .map(SecretString::from)
            .map_err(|_| anyhow::anyhow!("CONVERSE_BEDROCK_API_KEY is not set"))?;
        let provider = BedrockInference::new(api_key, config.inference.region.clone());

        Ok(Self::with_parts(repo, provider, &config))
    }
}

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::auth::session::SessionVerifier;
use crate::config::{Config, StorageBackend};
use crate::db::create_pool;
use crate::llm_client::{ChatModel, LlmClient};
use crate::store::{MemoryStore, PgStore, PostRepository, TemplateRepository, UserRepository};
use crate::webhooks::signature::WebhookVerifier;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub templates: Arc<dyn TemplateRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub llm: Arc<dyn ChatModel>,
    pub sessions: Arc<SessionVerifier>,
    /// `None` when CLERK_WEBHOOK_SECRET is unset; the webhook route then answers 500.
    pub webhooks: Option<Arc<WebhookVerifier>>,
}

impl AppState {
    /// Wires one store behind all three repository traits.
    pub fn new<S>(
        store: Arc<S>,
        llm: Arc<dyn ChatModel>,
        sessions: SessionVerifier,
        webhooks: Option<WebhookVerifier>,
    ) -> Self
    where
        S: UserRepository + TemplateRepository + PostRepository + 'static,
    {
        Self {
            users: store.clone(),
            templates: store.clone(),
            posts: store,
            llm,
            sessions: Arc::new(sessions),
            webhooks: webhooks.map(Arc::new),
        }
    }

    pub async fn from_config(config: &Config) -> Result<Self> {
        let llm = LlmClient::new(
            config.openai_api_key.clone(),
            config.openai_base_url.as_str(),
            config.openai_model.as_str(),
            Duration::from_secs(config.llm_timeout_secs),
        )
        .context("Failed to build LLM client")?;
        if llm.has_api_key() {
            info!("LLM client initialized (model: {})", llm.model());
        } else {
            warn!("OPENAI_API_KEY is not set; formatting will use fallback templates");
        }
        let llm: Arc<dyn ChatModel> = Arc::new(llm);

        let sessions = SessionVerifier::from_config_key(&config.clerk_jwt_key)
            .context("CLERK_JWT_KEY is not a usable verification key")?;

        let webhooks = config
            .clerk_webhook_secret
            .as_deref()
            .map(WebhookVerifier::new)
            .transpose()
            .context("CLERK_WEBHOOK_SECRET is not a valid whsec_ secret")?;
        if webhooks.is_none() {
            warn!("CLERK_WEBHOOK_SECRET is not set; /api/webhooks/clerk will reject deliveries");
        }

        let state = match config.storage_backend {
            StorageBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is required for the postgres backend")?;
                let pool = create_pool(url).await?;
                Self::new(Arc::new(PgStore::new(pool)), llm, sessions, webhooks)
            }
            StorageBackend::Memory => {
                warn!("Using in-memory storage; data is lost on restart");
                Self::new(Arc::new(MemoryStore::new()), llm, sessions, webhooks)
            }
        };

        Ok(state)
    }
}

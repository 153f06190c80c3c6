//! Shared fixtures for unit and router tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use crate::auth::session::{SessionClaims, SessionVerifier};
use crate::llm_client::{ChatModel, ChatRequest, LlmError};
use crate::models::template::Template;
use crate::state::AppState;
use crate::store::MemoryStore;
use crate::webhooks::signature::WebhookVerifier;

pub const SESSION_SECRET: &str = "test-session-secret";
/// base64("test-webhook-secret")
pub const WEBHOOK_SECRET: &str = "whsec_dGVzdC13ZWJob29rLXNlY3JldA==";

/// Owned copy of the last `ChatRequest` a `StubModel` received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Canned chat model: answers every call with the same text, or fails every call.
pub struct StubModel {
    reply: Option<String>,
    calls: AtomicUsize,
    last: Mutex<Option<RecordedRequest>>,
}

impl StubModel {
    pub fn reply(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for StubModel {
    fn model(&self) -> &str {
        "stub-model"
    }

    async fn complete(&self, request: ChatRequest<'_>) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(RecordedRequest {
            system: request.system.to_string(),
            user: request.user.to_string(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        });

        self.reply.clone().ok_or(LlmError::Api {
            status: 503,
            message: "stub model is unavailable".to_string(),
        })
    }
}

pub fn sample_template(name: &str) -> Template {
    let now = Utc::now();
    Template {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        name: name.to_string(),
        description: "A template used in tests".to_string(),
        platform: "all".to_string(),
        prompt: "Keep it short and friendly.".to_string(),
        created_at: now,
        updated_at: now,
    }
}

/// State over a fresh `MemoryStore`, with the test session and webhook secrets.
pub fn test_state(llm: Arc<dyn ChatModel>) -> AppState {
    AppState::new(
        Arc::new(MemoryStore::new()),
        llm,
        SessionVerifier::from_config_key(SESSION_SECRET).unwrap(),
        Some(WebhookVerifier::new(WEBHOOK_SECRET).unwrap()),
    )
}

/// HS256 session token for `clerk_id`, valid for an hour.
pub fn session_token(clerk_id: &str) -> String {
    let claims = SessionClaims {
        sub: clerk_id.to_string(),
        email: Some(format!("{clerk_id}@example.com")),
        name: None,
        exp: Utc::now().timestamp() + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SESSION_SECRET.as_bytes()),
    )
    .unwrap()
}

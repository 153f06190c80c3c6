//! Axum route handler for Clerk user webhooks.

use anyhow::anyhow;
use axum::{extract::State, http::HeaderMap, Json};
use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::user::UserProfile;
use crate::state::AppState;
use crate::webhooks::signature::SvixHeaders;

#[derive(Debug, Deserialize)]
struct ClerkEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct ClerkUserData {
    id: String,
    #[serde(default)]
    email_addresses: Vec<ClerkEmailAddress>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClerkEmailAddress {
    email_address: String,
}

impl ClerkUserData {
    fn profile(self) -> UserProfile {
        let name = format!(
            "{} {}",
            self.first_name.unwrap_or_default(),
            self.last_name.unwrap_or_default()
        )
        .trim()
        .to_string();

        UserProfile {
            email: self
                .email_addresses
                .into_iter()
                .next()
                .map(|e| e.email_address)
                .unwrap_or_default(),
            name: (!name.is_empty()).then_some(name),
            clerk_id: self.id,
        }
    }
}

fn user_data(data: Value) -> Result<ClerkUserData, AppError> {
    serde_json::from_value(data)
        .map_err(|e| AppError::Validation(format!("Invalid user payload: {e}")))
}

/// POST /api/webhooks/clerk
///
/// Unauthenticated; trust comes from the Svix signature. Unknown event types are
/// acknowledged and ignored.
pub async fn handle_clerk_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let svix = SvixHeaders::from_headers(&headers).map_err(|e| {
        warn!("Rejected webhook: {e}");
        AppError::Validation(e.to_string())
    })?;

    let verifier = state
        .webhooks
        .as_ref()
        .ok_or_else(|| anyhow!("CLERK_WEBHOOK_SECRET is not configured"))?;

    verifier
        .verify(&svix, &body, Utc::now().timestamp())
        .map_err(|e| {
            warn!("Rejected webhook {}: {e}", svix.id);
            AppError::Validation(format!("Invalid webhook signature: {e}"))
        })?;

    let event: ClerkEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Invalid webhook payload: {e}")))?;

    match event.event_type.as_str() {
        "user.created" | "user.updated" => {
            let mut profile = user_data(event.data)?.profile();
            if profile.email.is_empty() {
                // Payload without addresses: keep whatever email is already mirrored.
                if let Some(existing) = state.users.find_by_clerk_id(&profile.clerk_id).await? {
                    profile.email = existing.email;
                }
            }
            let user = state.users.upsert(&profile).await?;
            info!("Webhook {}: synced user {} ({})", event.event_type, user.id, user.clerk_id);
        }
        "user.deleted" => {
            let data = user_data(event.data)?;
            let deleted = state.users.delete_by_clerk_id(&data.id).await?;
            info!("Webhook user.deleted: {} (existed: {deleted})", data.id);
        }
        other => {
            info!("Ignoring webhook event type '{other}'");
        }
    }

    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_from_clerk_payload() {
        let data: ClerkUserData = serde_json::from_value(json!({
            "id": "user_2abc",
            "email_addresses": [
                {"email_address": "first@example.com"},
                {"email_address": "second@example.com"}
            ],
            "first_name": "Ada",
            "last_name": null
        }))
        .unwrap();

        assert_eq!(
            data.profile(),
            UserProfile {
                clerk_id: "user_2abc".to_string(),
                email: "first@example.com".to_string(),
                name: Some("Ada".to_string()),
            }
        );
    }

    #[test]
    fn test_profile_without_names_or_emails() {
        let data: ClerkUserData = serde_json::from_value(json!({ "id": "user_2abc" })).unwrap();
        let profile = data.profile();

        assert_eq!(profile.email, "");
        assert_eq!(profile.name, None);
    }
}

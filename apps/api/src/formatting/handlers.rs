//! Axum route handlers for the Format API.

use axum::{extract::State, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::ApiJson;
use crate::formatting::formatter::{format_content, FormattedVariants};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatRequest {
    pub content: Option<String>,
    pub template_id: Option<Uuid>,
    /// Extra guidance appended to the system prompt.
    pub instructions: Option<String>,
}

/// POST /api/format
///
/// Returns `{linkedin, twitter}` for the caller's template. Model failures are
/// answered with fallback formatting, never with an error.
pub async fn handle_format(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<FormatRequest>,
) -> Result<Json<FormattedVariants>, AppError> {
    let (Some(content), Some(template_id)) = (request.content, request.template_id) else {
        return Err(AppError::Validation(
            "Missing required fields: content and templateId".to_string(),
        ));
    };
    if content.trim().is_empty() {
        return Err(AppError::Validation("content cannot be empty".to_string()));
    }

    let template = state
        .templates
        .get(user.user_id, template_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Template {template_id} not found")))?;

    let variants = format_content(
        state.llm.as_ref(),
        &content,
        &template,
        request.instructions.as_deref(),
    )
    .await?;

    Ok(Json(variants))
}

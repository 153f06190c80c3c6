//! Axum route handlers for the Template API.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::models::template::Template;
use crate::state::AppState;
use crate::templates::service::{list_templates, validate_new, validate_patch, TemplateFields};

#[derive(Debug, Deserialize)]
pub struct TemplateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub platform: Option<String>,
    pub prompt: Option<String>,
}

impl From<TemplateRequest> for TemplateFields {
    fn from(request: TemplateRequest) -> Self {
        TemplateFields {
            name: request.name,
            description: request.description,
            platform: request.platform,
            prompt: request.prompt,
        }
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Template {id} not found"))
}

/// GET /api/templates
pub async fn handle_list_templates(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Template>>, AppError> {
    let templates = list_templates(state.templates.as_ref(), user.user_id).await?;
    Ok(Json(templates))
}

/// POST /api/templates
pub async fn handle_create_template(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<TemplateRequest>,
) -> Result<(StatusCode, Json<Template>), AppError> {
    let new_template = validate_new(request.into())?;
    let template = state.templates.create(user.user_id, &new_template).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// GET /api/templates/:id
pub async fn handle_get_template(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Template>, AppError> {
    let template = state
        .templates
        .get(user.user_id, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(template))
}

/// PATCH /api/templates/:id
pub async fn handle_update_template(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<TemplateRequest>,
) -> Result<Json<Template>, AppError> {
    let patch = validate_patch(request.into())?;
    let template = state
        .templates
        .update(user.user_id, id, &patch)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(template))
}

/// DELETE /api/templates/:id
pub async fn handle_delete_template(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !state.templates.delete(user.user_id, id).await? {
        return Err(not_found(id));
    }
    Ok(Json(json!({ "success": true })))
}

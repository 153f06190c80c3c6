//! Axum route handlers for the Post API.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::models::post::PostWithPlatforms;
use crate::posts::drafts::{self, DraftRequest};
use crate::state::AppState;

/// GET /api/posts
pub async fn handle_list_posts(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<PostWithPlatforms>>, AppError> {
    let posts = state.posts.list(user.user_id).await?;
    Ok(Json(posts))
}

/// POST /api/posts
pub async fn handle_create_post(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<DraftRequest>,
) -> Result<(StatusCode, Json<PostWithPlatforms>), AppError> {
    let post = drafts::create_draft(state.posts.as_ref(), user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /api/posts/:id
pub async fn handle_get_post(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<PostWithPlatforms>, AppError> {
    let post = drafts::get_post(state.posts.as_ref(), user.user_id, id).await?;
    Ok(Json(post))
}

/// PUT /api/posts/:id
///
/// Full replacement: title, content, and image are overwritten and the platform
/// set becomes exactly what `formattedContent` carries.
pub async fn handle_update_post(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<DraftRequest>,
) -> Result<Json<PostWithPlatforms>, AppError> {
    let post = drafts::update_draft(state.posts.as_ref(), user.user_id, id, request).await?;
    Ok(Json(post))
}

/// DELETE /api/posts/:id
pub async fn handle_delete_post(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    drafts::delete_post(state.posts.as_ref(), user.user_id, id).await?;
    Ok(Json(json!({ "success": true })))
}

/// POST /api/posts/:id/publish
pub async fn handle_publish_post(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<PostWithPlatforms>, AppError> {
    let post = drafts::publish_post(state.posts.as_ref(), user.user_id, id).await?;
    Ok(Json(post))
}

/// POST /api/posts/:id/platforms/:name/publish
pub async fn handle_publish_platform(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((id, name)): ApiPath<(Uuid, String)>,
) -> Result<Json<PostWithPlatforms>, AppError> {
    let post = drafts::publish_platform(state.posts.as_ref(), user.user_id, id, &name).await?;
    Ok(Json(post))
}

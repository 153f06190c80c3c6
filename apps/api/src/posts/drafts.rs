use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::post::{DraftInput, FormattedContent, PlatformName, PostWithPlatforms};
use crate::store::PostRepository;

/// Body of `POST /api/posts` and `PUT /api/posts/:id`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(default)]
    pub formatted_content: Option<FormattedContent>,
    pub image_url: Option<String>,
}

pub fn validate_draft(request: DraftRequest) -> Result<DraftInput, AppError> {
    let title = request.title.filter(|t| !t.trim().is_empty());
    let content = request.content.filter(|c| !c.trim().is_empty());
    let (Some(title), Some(content)) = (title, content) else {
        return Err(AppError::Validation(
            "Missing required fields: title and content".to_string(),
        ));
    };

    Ok(DraftInput {
        title,
        content,
        image_url: request.image_url.filter(|u| !u.trim().is_empty()),
        formatted_content: request.formatted_content.unwrap_or_default(),
    })
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Post {id} not found"))
}

pub async fn create_draft(
    repo: &dyn PostRepository,
    user_id: Uuid,
    request: DraftRequest,
) -> Result<PostWithPlatforms, AppError> {
    let input = validate_draft(request)?;
    let post = repo.create_draft(user_id, &input).await?;
    info!(
        "Created draft {} with {} platform(s) for user {user_id}",
        post.post.id,
        post.platforms.len()
    );
    Ok(post)
}

/// Rewrites the draft and replaces its platform set. A post owned by someone else
/// is reported exactly like a missing one.
pub async fn update_draft(
    repo: &dyn PostRepository,
    user_id: Uuid,
    post_id: Uuid,
    request: DraftRequest,
) -> Result<PostWithPlatforms, AppError> {
    let input = validate_draft(request)?;
    let post = repo
        .update_draft(user_id, post_id, &input)
        .await?
        .ok_or_else(|| not_found(post_id))?;
    info!(
        "Updated draft {post_id} with {} platform(s) for user {user_id}",
        post.platforms.len()
    );
    Ok(post)
}

pub async fn get_post(
    repo: &dyn PostRepository,
    user_id: Uuid,
    post_id: Uuid,
) -> Result<PostWithPlatforms, AppError> {
    repo.get(user_id, post_id)
        .await?
        .ok_or_else(|| not_found(post_id))
}

pub async fn delete_post(
    repo: &dyn PostRepository,
    user_id: Uuid,
    post_id: Uuid,
) -> Result<(), AppError> {
    if !repo.delete(user_id, post_id).await? {
        return Err(not_found(post_id));
    }
    info!("Deleted post {post_id} for user {user_id}");
    Ok(())
}

pub async fn publish_post(
    repo: &dyn PostRepository,
    user_id: Uuid,
    post_id: Uuid,
) -> Result<PostWithPlatforms, AppError> {
    let post = repo
        .publish(user_id, post_id)
        .await?
        .ok_or_else(|| not_found(post_id))?;
    info!("Published post {post_id} for user {user_id}");
    Ok(post)
}

pub async fn publish_platform(
    repo: &dyn PostRepository,
    user_id: Uuid,
    post_id: Uuid,
    platform: &str,
) -> Result<PostWithPlatforms, AppError> {
    let name = PlatformName::parse(platform).ok_or_else(|| {
        AppError::Validation(format!(
            "platform must be 'linkedin' or 'twitter', got '{platform}'"
        ))
    })?;
    let post = repo
        .publish_platform(user_id, post_id, name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {post_id} has no {name} content")))?;
    info!("Marked {name} published on post {post_id} for user {user_id}");
    Ok(post)
}

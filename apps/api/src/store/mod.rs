//! Owner-scoped repositories.
//!
//! Every template and post method takes the caller's user id and filters on it, so a
//! record owned by someone else behaves exactly like a missing one (`None` / `false`).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::post::{DraftInput, PlatformName, PostWithPlatforms};
use crate::models::template::{NewTemplate, Template, TemplatePatch};
use crate::models::user::{User, UserProfile};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_clerk_id(&self, clerk_id: &str) -> Result<Option<User>, AppError>;

    /// Returns the existing user for `profile.clerk_id`, inserting it if absent.
    /// An existing row is never overwritten.
    async fn ensure(&self, profile: &UserProfile) -> Result<User, AppError>;

    /// Inserts or overwrites email/name for `profile.clerk_id`.
    async fn upsert(&self, profile: &UserProfile) -> Result<User, AppError>;

    async fn delete_by_clerk_id(&self, clerk_id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Newest first.
    async fn list(&self, user_id: Uuid) -> Result<Vec<Template>, AppError>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<Template>, AppError>;

    /// Fails with `Conflict` when `(user, name, platform)` is taken.
    async fn create(&self, user_id: Uuid, template: &NewTemplate) -> Result<Template, AppError>;

    /// Inserts every template whose `(user, name, platform)` key is free and skips the
    /// rest. Returns the number of rows inserted.
    async fn insert_missing(
        &self,
        user_id: Uuid,
        templates: &[NewTemplate],
    ) -> Result<u64, AppError>;

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: &TemplatePatch,
    ) -> Result<Option<Template>, AppError>;

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Newest first.
    async fn list(&self, user_id: Uuid) -> Result<Vec<PostWithPlatforms>, AppError>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<PostWithPlatforms>, AppError>;

    /// Inserts the post and its platform rows atomically.
    async fn create_draft(
        &self,
        user_id: Uuid,
        input: &DraftInput,
    ) -> Result<PostWithPlatforms, AppError>;

    /// Updates the post and replaces its platform rows atomically.
    async fn update_draft(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: &DraftInput,
    ) -> Result<Option<PostWithPlatforms>, AppError>;

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError>;

    async fn publish(&self, user_id: Uuid, id: Uuid)
        -> Result<Option<PostWithPlatforms>, AppError>;

    /// `None` when the post is not owned or has no row for `platform`.
    async fn publish_platform(
        &self,
        user_id: Uuid,
        id: Uuid,
        platform: PlatformName,
    ) -> Result<Option<PostWithPlatforms>, AppError>;
}

pub(crate) fn duplicate_template(template: &NewTemplate) -> AppError {
    AppError::Conflict(format!(
        "A template named '{}' already exists for platform '{}'",
        template.name, template.platform
    ))
}

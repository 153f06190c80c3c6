//! In-memory repositories for local development and tests.
//!
//! All tables sit behind one async `RwLock`, so each repository call is atomic the way
//! a single database transaction is. Data is lost on process restart.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::post::{
    DraftInput, FormattedContent, Platform, PlatformName, Post, PostWithPlatforms,
};
use crate::models::template::{NewTemplate, Template, TemplatePatch};
use crate::models::user::{User, UserProfile};
use crate::store::{duplicate_template, PostRepository, TemplateRepository, UserRepository};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    templates: HashMap<Uuid, Template>,
    posts: HashMap<Uuid, Post>,
    platforms: Vec<Platform>,
}

impl Tables {
    fn user_by_clerk_id(&self, clerk_id: &str) -> Option<&User> {
        self.users.values().find(|u| u.clerk_id == clerk_id)
    }

    fn template_key_taken(&self, user_id: Uuid, name: &str, platform: &str, except: Option<Uuid>) -> bool {
        self.templates.values().any(|t| {
            t.user_id == user_id
                && t.name == name
                && t.platform == platform
                && Some(t.id) != except
        })
    }

    fn insert_template(&mut self, user_id: Uuid, template: &NewTemplate) -> Template {
        let now = Utc::now();
        let row = Template {
            id: Uuid::new_v4(),
            user_id,
            name: template.name.clone(),
            description: template.description.clone(),
            platform: template.platform.as_str().to_string(),
            prompt: template.prompt.clone(),
            created_at: now,
            updated_at: now,
        };
        self.templates.insert(row.id, row.clone());
        row
    }

    fn owned_post(&self, user_id: Uuid, id: Uuid) -> Option<&Post> {
        self.posts.get(&id).filter(|p| p.user_id == user_id)
    }

    fn platforms_of(&self, post_id: Uuid) -> Vec<Platform> {
        let mut rows: Vec<Platform> = self
            .platforms
            .iter()
            .filter(|p| p.post_id == post_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }

    fn with_platforms(&self, post: &Post) -> PostWithPlatforms {
        PostWithPlatforms::new(post.clone(), self.platforms_of(post.id))
    }

    /// Same contract as the Postgres `replace_platforms`: the old set is dropped
    /// completely before the new one is written.
    fn replace_platforms(&mut self, post_id: Uuid, contents: &FormattedContent) -> Vec<Platform> {
        self.platforms.retain(|p| p.post_id != post_id);

        let now = Utc::now();
        let fresh: Vec<Platform> = contents
            .entries()
            .into_iter()
            .map(|(name, content)| Platform {
                id: Uuid::new_v4(),
                post_id,
                name: name.as_str().to_string(),
                content: content.to_string(),
                published: false,
                created_at: now,
                updated_at: now,
            })
            .collect();
        self.platforms.extend(fresh.iter().cloned());
        fresh
    }

    fn delete_post(&mut self, id: Uuid) {
        self.posts.remove(&id);
        self.platforms.retain(|p| p.post_id != id);
    }
}

pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_clerk_id(&self, clerk_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.tables.read().await.user_by_clerk_id(clerk_id).cloned())
    }

    async fn ensure(&self, profile: &UserProfile) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if let Some(user) = tables.user_by_clerk_id(&profile.clerk_id) {
            return Ok(user.clone());
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            clerk_id: profile.clerk_id.clone(),
            email: profile.email.clone(),
            name: profile.name.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn upsert(&self, profile: &UserProfile) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        if let Some(user) = tables
            .users
            .values_mut()
            .find(|u| u.clerk_id == profile.clerk_id)
        {
            user.email = profile.email.clone();
            user.name = profile.name.clone();
            user.updated_at = now;
            return Ok(user.clone());
        }

        let user = User {
            id: Uuid::new_v4(),
            clerk_id: profile.clerk_id.clone(),
            email: profile.email.clone(),
            name: profile.name.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete_by_clerk_id(&self, clerk_id: &str) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let Some(user_id) = tables.user_by_clerk_id(clerk_id).map(|u| u.id) else {
            return Ok(false);
        };

        // ON DELETE CASCADE
        tables.users.remove(&user_id);
        tables.templates.retain(|_, t| t.user_id != user_id);
        let owned: Vec<Uuid> = tables
            .posts
            .values()
            .filter(|p| p.user_id == user_id)
            .map(|p| p.id)
            .collect();
        for post_id in owned {
            tables.delete_post(post_id);
        }
        Ok(true)
    }
}

#[async_trait]
impl TemplateRepository for MemoryStore {
    async fn list(&self, user_id: Uuid) -> Result<Vec<Template>, AppError> {
        let tables = self.tables.read().await;
        let mut templates: Vec<Template> = tables
            .templates
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        templates.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(templates)
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<Template>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .templates
            .get(&id)
            .filter(|t| t.user_id == user_id)
            .cloned())
    }

    async fn create(&self, user_id: Uuid, template: &NewTemplate) -> Result<Template, AppError> {
        let mut tables = self.tables.write().await;
        if tables.template_key_taken(user_id, &template.name, template.platform.as_str(), None) {
            return Err(duplicate_template(template));
        }
        Ok(tables.insert_template(user_id, template))
    }

    async fn insert_missing(
        &self,
        user_id: Uuid,
        templates: &[NewTemplate],
    ) -> Result<u64, AppError> {
        let mut tables = self.tables.write().await;
        let mut inserted = 0;
        for template in templates {
            if !tables.template_key_taken(user_id, &template.name, template.platform.as_str(), None) {
                tables.insert_template(user_id, template);
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: &TemplatePatch,
    ) -> Result<Option<Template>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(current) = tables.templates.get(&id).filter(|t| t.user_id == user_id) else {
            return Ok(None);
        };

        let name = patch.name.clone().unwrap_or_else(|| current.name.clone());
        let platform = patch
            .platform
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| current.platform.clone());
        if tables.template_key_taken(user_id, &name, &platform, Some(id)) {
            return Err(AppError::Conflict(
                "Another template with this name and platform already exists".to_string(),
            ));
        }

        let Some(template) = tables.templates.get_mut(&id) else {
            return Ok(None);
        };
        template.name = name;
        template.platform = platform;
        if let Some(description) = &patch.description {
            template.description = description.clone();
        }
        if let Some(prompt) = &patch.prompt {
            template.prompt = prompt.clone();
        }
        template.updated_at = Utc::now();
        Ok(Some(template.clone()))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .templates
            .get(&id)
            .is_some_and(|t| t.user_id == user_id);
        if owned {
            tables.templates.remove(&id);
        }
        Ok(owned)
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn list(&self, user_id: Uuid) -> Result<Vec<PostWithPlatforms>, AppError> {
        let tables = self.tables.read().await;
        let mut posts: Vec<&Post> = tables
            .posts
            .values()
            .filter(|p| p.user_id == user_id)
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts.into_iter().map(|p| tables.with_platforms(p)).collect())
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<PostWithPlatforms>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .owned_post(user_id, id)
            .map(|p| tables.with_platforms(p)))
    }

    async fn create_draft(
        &self,
        user_id: Uuid,
        input: &DraftInput,
    ) -> Result<PostWithPlatforms, AppError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            user_id,
            title: input.title.clone(),
            content: input.content.clone(),
            image_url: input.image_url.clone(),
            published: false,
            created_at: now,
            updated_at: now,
        };
        tables.posts.insert(post.id, post.clone());
        let platforms = tables.replace_platforms(post.id, &input.formatted_content);
        Ok(PostWithPlatforms::new(post, platforms))
    }

    async fn update_draft(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: &DraftInput,
    ) -> Result<Option<PostWithPlatforms>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(post) = tables.posts.get_mut(&id).filter(|p| p.user_id == user_id) else {
            return Ok(None);
        };

        post.title = input.title.clone();
        post.content = input.content.clone();
        post.image_url = input.image_url.clone();
        post.updated_at = Utc::now();
        let post = post.clone();

        let platforms = tables.replace_platforms(id, &input.formatted_content);
        Ok(Some(PostWithPlatforms::new(post, platforms)))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if tables.owned_post(user_id, id).is_none() {
            return Ok(false);
        }
        tables.delete_post(id);
        Ok(true)
    }

    async fn publish(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<PostWithPlatforms>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(post) = tables.posts.get_mut(&id).filter(|p| p.user_id == user_id) else {
            return Ok(None);
        };
        post.published = true;
        post.updated_at = Utc::now();
        let post = post.clone();
        Ok(Some(tables.with_platforms(&post)))
    }

    async fn publish_platform(
        &self,
        user_id: Uuid,
        id: Uuid,
        platform: PlatformName,
    ) -> Result<Option<PostWithPlatforms>, AppError> {
        let mut tables = self.tables.write().await;
        if tables.owned_post(user_id, id).is_none() {
            return Ok(None);
        }

        let now = Utc::now();
        let mut updated = false;
        for row in tables
            .platforms
            .iter_mut()
            .filter(|p| p.post_id == id && p.name == platform.as_str())
        {
            row.published = true;
            row.updated_at = now;
            updated = true;
        }
        if !updated {
            return Ok(None);
        }

        Ok(tables.owned_post(user_id, id).map(|p| tables.with_platforms(p)))
    }
}

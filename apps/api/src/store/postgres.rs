use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::post::{
    DraftInput, FormattedContent, Platform, PlatformName, Post, PostWithPlatforms,
};
use crate::models::template::{NewTemplate, Template, TemplatePatch};
use crate::models::user::{User, UserProfile};
use crate::store::{duplicate_template, PostRepository, TemplateRepository, UserRepository};

/// sqlx-backed repositories over the schema in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

// ────────────────────────────────────────────────────────────────────────────
// Users
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_clerk_id(&self, clerk_id: &str) -> Result<Option<User>, AppError> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE clerk_id = $1")
                .bind(clerk_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn ensure(&self, profile: &UserProfile) -> Result<User, AppError> {
        if let Some(user) = self.find_by_clerk_id(&profile.clerk_id).await? {
            return Ok(user);
        }

        // A concurrent first request may win the insert; either way the row exists after.
        let inserted = sqlx::query(
            r#"
            INSERT INTO users (id, clerk_id, email, name)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (clerk_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&profile.clerk_id)
        .bind(&profile.email)
        .bind(&profile.name)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted > 0 {
            info!("Created user for identity {}", profile.clerk_id);
        }

        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE clerk_id = $1")
                .bind(&profile.clerk_id)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn upsert(&self, profile: &UserProfile) -> Result<User, AppError> {
        Ok(sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, clerk_id, email, name)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (clerk_id) DO UPDATE
                SET email = EXCLUDED.email,
                    name = EXCLUDED.name,
                    updated_at = now()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&profile.clerk_id)
        .bind(&profile.email)
        .bind(&profile.name)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn delete_by_clerk_id(&self, clerk_id: &str) -> Result<bool, AppError> {
        let deleted = sqlx::query("DELETE FROM users WHERE clerk_id = $1")
            .bind(clerk_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Templates
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl TemplateRepository for PgStore {
    async fn list(&self, user_id: Uuid) -> Result<Vec<Template>, AppError> {
        Ok(sqlx::query_as::<_, Template>(
            "SELECT * FROM templates WHERE user_id = $1 ORDER BY created_at DESC, name ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<Template>, AppError> {
        Ok(
            sqlx::query_as::<_, Template>("SELECT * FROM templates WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn create(&self, user_id: Uuid, template: &NewTemplate) -> Result<Template, AppError> {
        sqlx::query_as::<_, Template>(
            r#"
            INSERT INTO templates (id, user_id, name, description, platform, prompt)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&template.name)
        .bind(&template.description)
        .bind(template.platform.as_str())
        .bind(&template.prompt)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                duplicate_template(template)
            } else {
                AppError::Database(e)
            }
        })
    }

    async fn insert_missing(
        &self,
        user_id: Uuid,
        templates: &[NewTemplate],
    ) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for template in templates {
            inserted += sqlx::query(
                r#"
                INSERT INTO templates (id, user_id, name, description, platform, prompt)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (user_id, name, platform) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(&template.name)
            .bind(&template.description)
            .bind(template.platform.as_str())
            .bind(&template.prompt)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: &TemplatePatch,
    ) -> Result<Option<Template>, AppError> {
        sqlx::query_as::<_, Template>(
            r#"
            UPDATE templates
            SET name = COALESCE($3, name),
                description = COALESCE($4, description),
                platform = COALESCE($5, platform),
                prompt = COALESCE($6, prompt),
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(patch.platform.map(|p| p.as_str()))
        .bind(&patch.prompt)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(
                    "Another template with this name and platform already exists".to_string(),
                )
            } else {
                AppError::Database(e)
            }
        })
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let deleted = sqlx::query("DELETE FROM templates WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Posts
// ────────────────────────────────────────────────────────────────────────────

/// Deletes every platform row of `post_id` and inserts one row per non-blank entry of
/// `contents`. Must run on the same transaction as the post write.
pub async fn replace_platforms(
    conn: &mut PgConnection,
    post_id: Uuid,
    contents: &FormattedContent,
) -> Result<Vec<Platform>, sqlx::Error> {
    sqlx::query("DELETE FROM platforms WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut *conn)
        .await?;

    let mut platforms = Vec::new();
    for (name, content) in contents.entries() {
        let platform = sqlx::query_as::<_, Platform>(
            r#"
            INSERT INTO platforms (id, post_id, name, content, published)
            VALUES ($1, $2, $3, $4, false)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(name.as_str())
        .bind(content)
        .fetch_one(&mut *conn)
        .await?;
        platforms.push(platform);
    }

    Ok(platforms)
}

impl PgStore {
    async fn platforms_for(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Platform>>, AppError> {
        let rows = sqlx::query_as::<_, Platform>(
            "SELECT * FROM platforms WHERE post_id = ANY($1) ORDER BY name ASC",
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<Platform>> = HashMap::new();
        for row in rows {
            grouped.entry(row.post_id).or_default().push(row);
        }
        Ok(grouped)
    }

    async fn with_platforms(&self, post: Post) -> Result<PostWithPlatforms, AppError> {
        let mut grouped = self.platforms_for(&[post.id]).await?;
        let platforms = grouped.remove(&post.id).unwrap_or_default();
        Ok(PostWithPlatforms::new(post, platforms))
    }
}

#[async_trait]
impl PostRepository for PgStore {
    async fn list(&self, user_id: Uuid) -> Result<Vec<PostWithPlatforms>, AppError> {
        let posts = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let mut grouped = self.platforms_for(&ids).await?;

        Ok(posts
            .into_iter()
            .map(|post| {
                let platforms = grouped.remove(&post.id).unwrap_or_default();
                PostWithPlatforms::new(post, platforms)
            })
            .collect())
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<PostWithPlatforms>, AppError> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        match post {
            Some(post) => Ok(Some(self.with_platforms(post).await?)),
            None => Ok(None),
        }
    }

    async fn create_draft(
        &self,
        user_id: Uuid,
        input: &DraftInput,
    ) -> Result<PostWithPlatforms, AppError> {
        let mut tx = self.pool.begin().await?;

        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, user_id, title, content, image_url, published)
            VALUES ($1, $2, $3, $4, $5, false)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&input.title)
        .bind(&input.content)
        .bind(&input.image_url)
        .fetch_one(&mut *tx)
        .await?;

        let platforms = replace_platforms(&mut *tx, post.id, &input.formatted_content).await?;
        tx.commit().await?;

        Ok(PostWithPlatforms::new(post, platforms))
    }

    async fn update_draft(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: &DraftInput,
    ) -> Result<Option<PostWithPlatforms>, AppError> {
        let mut tx = self.pool.begin().await?;

        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET title = $3, content = $4, image_url = $5, updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&input.title)
        .bind(&input.content)
        .bind(&input.image_url)
        .fetch_optional(&mut *tx)
        .await?;

        // Dropping the transaction rolls it back.
        let Some(post) = post else {
            return Ok(None);
        };

        let platforms = replace_platforms(&mut *tx, post.id, &input.formatted_content).await?;
        tx.commit().await?;

        Ok(Some(PostWithPlatforms::new(post, platforms)))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn publish(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<PostWithPlatforms>, AppError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts SET published = true, updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match post {
            Some(post) => Ok(Some(self.with_platforms(post).await?)),
            None => Ok(None),
        }
    }

    async fn publish_platform(
        &self,
        user_id: Uuid,
        id: Uuid,
        platform: PlatformName,
    ) -> Result<Option<PostWithPlatforms>, AppError> {
        let updated = sqlx::query(
            r#"
            UPDATE platforms SET published = true, updated_at = now()
            WHERE post_id = $1
              AND name = $2
              AND EXISTS (SELECT 1 FROM posts WHERE id = $1 AND user_id = $3)
            "#,
        )
        .bind(id)
        .bind(platform.as_str())
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Ok(None);
        }
        PostRepository::get(self, user_id, id).await
    }
}

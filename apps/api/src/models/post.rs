use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Social network a post variant is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformName {
    Linkedin,
    Twitter,
}

impl PlatformName {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformName::Linkedin => "linkedin",
            PlatformName::Twitter => "twitter",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "linkedin" => Some(PlatformName::Linkedin),
            "twitter" => Some(PlatformName::Twitter),
            _ => None,
        }
    }
}

impl fmt::Display for PlatformName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    /// Raw, unformatted text as the user typed it.
    pub content: String,
    pub image_url: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Formatted copy of a post for a single network.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Platform {
    pub id: Uuid,
    pub post_id: Uuid,
    pub name: String,
    pub content: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Pending,
    Published,
}

/// Status is never stored: a published post wins, then any published platform.
pub fn derive_status(post_published: bool, platforms: &[Platform]) -> PostStatus {
    if post_published {
        PostStatus::Published
    } else if platforms.iter().any(|p| p.published) {
        PostStatus::Pending
    } else {
        PostStatus::Draft
    }
}

/// A post together with its platform rows, as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostWithPlatforms {
    #[serde(flatten)]
    pub post: Post,
    pub platforms: Vec<Platform>,
    pub status: PostStatus,
}

impl PostWithPlatforms {
    pub fn new(post: Post, platforms: Vec<Platform>) -> Self {
        let status = derive_status(post.published, &platforms);
        Self {
            post,
            platforms,
            status,
        }
    }
}

/// Per-network content supplied with a draft. Absent or blank entries produce no row.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormattedContent {
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
}

impl FormattedContent {
    /// Entries that should become platform rows, in a stable order.
    pub fn entries(&self) -> Vec<(PlatformName, &str)> {
        [
            (PlatformName::Linkedin, self.linkedin.as_deref()),
            (PlatformName::Twitter, self.twitter.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, content)| match content {
            Some(text) if !text.trim().is_empty() => Some((name, text)),
            _ => None,
        })
        .collect()
    }
}

/// Validated draft fields shared by create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftInput {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub formatted_content: FormattedContent,
}

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Destination a template is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplatePlatform {
    Linkedin,
    Twitter,
    All,
}

impl TemplatePlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplatePlatform::Linkedin => "linkedin",
            TemplatePlatform::Twitter => "twitter",
            TemplatePlatform::All => "all",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "linkedin" => Some(TemplatePlatform::Linkedin),
            "twitter" => Some(TemplatePlatform::Twitter),
            "all" => Some(TemplatePlatform::All),
            _ => None,
        }
    }
}

impl fmt::Display for TemplatePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
    /// One of `linkedin`, `twitter`, `all` (CHECK constraint in the schema).
    pub platform: String,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a template insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTemplate {
    pub name: String,
    pub description: String,
    pub platform: TemplatePlatform,
    pub prompt: String,
}

/// Partial update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub platform: Option<TemplatePlatform>,
    pub prompt: Option<String>,
}

use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::template::{NewTemplate, Template, TemplatePatch, TemplatePlatform};
use crate::store::TemplateRepository;
use crate::templates::defaults::default_templates;

/// Lists the user's templates, seeding the defaults the first time the list is empty.
///
/// Seeding goes through `insert_missing`, so two concurrent first listings cannot
/// produce duplicates: the `(user, name, platform)` key rejects the second insert.
pub async fn list_templates(
    repo: &dyn TemplateRepository,
    user_id: Uuid,
) -> Result<Vec<Template>, AppError> {
    let templates = repo.list(user_id).await?;
    if !templates.is_empty() {
        return Ok(templates);
    }

    let inserted = repo.insert_missing(user_id, &default_templates()).await?;
    info!("Seeded {inserted} default templates for user {user_id}");

    repo.list(user_id).await
}

/// Template fields as they arrive over the wire, before validation.
#[derive(Debug, Clone, Default)]
pub struct TemplateFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub platform: Option<String>,
    pub prompt: Option<String>,
}

fn parse_platform(value: &str) -> Result<TemplatePlatform, AppError> {
    TemplatePlatform::parse(value.trim()).ok_or_else(|| {
        AppError::Validation(format!(
            "platform must be one of 'linkedin', 'twitter', 'all', got '{value}'"
        ))
    })
}

fn non_blank(field: &str, value: Option<String>) -> Result<Option<String>, AppError> {
    match value {
        Some(v) if v.trim().is_empty() => {
            Err(AppError::Validation(format!("{field} cannot be empty")))
        }
        other => Ok(other),
    }
}

/// All four fields are required on create.
pub fn validate_new(fields: TemplateFields) -> Result<NewTemplate, AppError> {
    let missing: Vec<&str> = [
        ("name", &fields.name),
        ("description", &fields.description),
        ("platform", &fields.platform),
        ("prompt", &fields.prompt),
    ]
    .into_iter()
    .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
    .map(|(field, _)| field)
    .collect();

    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let platform = parse_platform(fields.platform.as_deref().unwrap_or_default())?;
    Ok(NewTemplate {
        name: fields.name.unwrap_or_default().trim().to_string(),
        description: fields.description.unwrap_or_default(),
        platform,
        prompt: fields.prompt.unwrap_or_default(),
    })
}

/// Absent fields stay unchanged; present ones are validated like on create.
pub fn validate_patch(fields: TemplateFields) -> Result<TemplatePatch, AppError> {
    let platform = match non_blank("platform", fields.platform)? {
        Some(value) => Some(parse_platform(&value)?),
        None => None,
    };
    Ok(TemplatePatch {
        name: non_blank("name", fields.name)?.map(|n| n.trim().to_string()),
        description: non_blank("description", fields.description)?,
        platform,
        prompt: non_blank("prompt", fields.prompt)?,
    })
}

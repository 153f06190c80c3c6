//! Content formatting pipeline.
//!
//! Flow: build system/user prompts from the template → one chat completion →
//!       parse `{linkedin, twitter}` → validate both non-empty.
//!
//! Any failure along the way is logged and replaced by `fallback::format_with_template`.
//! The response looks the same either way.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::formatting::fallback::format_with_template;
use crate::formatting::prompts::{build_system_prompt, build_user_prompt};
use crate::llm_client::{call_json, ChatModel, ChatRequest, LlmError};
use crate::models::template::Template;

pub const TEMPERATURE: f32 = 0.7;
pub const MAX_TOKENS: u32 = 1500;

/// Per-network output of the formatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedVariants {
    pub linkedin: String,
    pub twitter: String,
}

#[derive(Debug, Error)]
enum FormatError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("model response is missing linkedin or twitter content")]
    Incomplete,
}

/// Formats `raw_content` with `template`, never failing because of the model.
///
/// Only blank content is an error; everything the model can do wrong is absorbed
/// by the fallback.
pub async fn format_content(
    llm: &dyn ChatModel,
    raw_content: &str,
    template: &Template,
    instructions: Option<&str>,
) -> Result<FormattedVariants, AppError> {
    if raw_content.trim().is_empty() {
        return Err(AppError::Validation("content cannot be empty".to_string()));
    }

    match generate_variants(llm, raw_content, template, instructions).await {
        Ok(variants) => {
            info!(
                "Formatted content with template '{}' via {}",
                template.name,
                llm.model()
            );
            Ok(variants)
        }
        Err(e) => {
            warn!(
                "AI formatting failed for template '{}', using fallback: {e}",
                template.name
            );
            Ok(format_with_template(raw_content, &template.name))
        }
    }
}

async fn generate_variants(
    llm: &dyn ChatModel,
    raw_content: &str,
    template: &Template,
    instructions: Option<&str>,
) -> Result<FormattedVariants, FormatError> {
    let system = build_system_prompt(template, instructions);
    let user = build_user_prompt(raw_content);

    let variants: FormattedVariants = call_json(
        llm,
        ChatRequest {
            system: &system,
            user: &user,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        },
    )
    .await?;

    if variants.linkedin.trim().is_empty() || variants.twitter.trim().is_empty() {
        return Err(FormatError::Incomplete);
    }

    Ok(variants)
}

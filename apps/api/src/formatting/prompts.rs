// Prompt text for the content formatter.

use crate::models::template::Template;

/// Fixed per-network style rules appended to every system prompt.
pub const PLATFORM_REQUIREMENTS: &str = "\
LinkedIn:
- Professional tone
- Can be longer (up to 3000 characters)
- Encourage engagement
- Professional formatting with line breaks
- NO hashtags

Twitter:
- Concise and engaging
- Maximum 280 characters
- Clear call-to-action when appropriate
- Thread-friendly if content is complex
- NO hashtags";

/// Output contract the formatter parses.
pub const OUTPUT_SCHEMA: &str = r#"Please return ONLY a valid JSON object with this exact structure:
{
  "linkedin": "LinkedIn optimized content here",
  "twitter": "Twitter optimized content here"
}
Do NOT include any text outside the JSON object. Do NOT use markdown code fences."#;

pub fn build_system_prompt(template: &Template, instructions: Option<&str>) -> String {
    let instructions = instructions
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("None");

    format!(
        "You are a professional social media content creator. Your task is to transform raw \
content into platform-optimized posts for LinkedIn and Twitter.

TEMPLATE INFORMATION:
- Name: {name}
- Description: {description}
- Platform Focus: {platform}
- Template Instructions: {prompt}

ADDITIONAL INSTRUCTIONS:
{instructions}

PLATFORM REQUIREMENTS:
{requirements}

{schema}",
        name = template.name,
        description = template.description,
        platform = template.platform,
        prompt = template.prompt,
        instructions = instructions,
        requirements = PLATFORM_REQUIREMENTS,
        schema = OUTPUT_SCHEMA,
    )
}

pub fn build_user_prompt(raw_content: &str) -> String {
    format!(
        "Raw content to transform: \"{raw_content}\"

Please apply the template instructions and create optimized versions for both LinkedIn and \
Twitter. Ensure the content maintains the original message while being platform-appropriate. \
Do not include any hashtags in the output."
    )
}

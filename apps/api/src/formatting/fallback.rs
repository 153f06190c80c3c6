//! Deterministic formatting used whenever the model call fails.
//!
//! Keyed by exact template name. Unknown names get the same treatment as a post
//! written without a template: LinkedIn passes through, Twitter is truncated.

use crate::formatting::formatter::FormattedVariants;
use crate::templates::defaults::{
    ENGAGEMENT_QUESTION, PROFESSIONAL_ANNOUNCEMENT, QUICK_TIP, TRENDING_TOPIC_COMMENTARY,
};

pub const TWEET_LIMIT: usize = 280;
const ELLIPSIS: &str = "...";

/// Cuts `text` to at most `TWEET_LIMIT` characters, ending in `...` when it had to cut.
/// Counts Unicode scalar values, never splits one.
pub fn fit_tweet(text: &str) -> String {
    if text.chars().count() <= TWEET_LIMIT {
        return text.to_string();
    }
    let kept: String = text.chars().take(TWEET_LIMIT - ELLIPSIS.len()).collect();
    format!("{kept}{ELLIPSIS}")
}

pub fn plain_variants(content: &str) -> FormattedVariants {
    FormattedVariants {
        linkedin: content.to_string(),
        twitter: fit_tweet(content),
    }
}

pub fn format_with_template(content: &str, template_name: &str) -> FormattedVariants {
    let (linkedin, twitter) = match template_name {
        PROFESSIONAL_ANNOUNCEMENT => (
            format!("I'm excited to announce: {content}"),
            format!("Announcement: {content}"),
        ),
        ENGAGEMENT_QUESTION => (
            format!(
                "{content}\n\nWhat are your thoughts on this? Let me know in the comments below."
            ),
            format!("{content}\n\nWhat do you think? Reply with your thoughts!"),
        ),
        QUICK_TIP => (
            format!("Quick tip for professionals:\n\n{content}"),
            format!("Pro tip: {content}"),
        ),
        TRENDING_TOPIC_COMMENTARY => (
            format!("My take on this trending topic:\n\n{content}"),
            format!("Hot take: {content}"),
        ),
        _ => return plain_variants(content),
    };

    FormattedVariants {
        linkedin,
        twitter: fit_tweet(&twitter),
    }
}

use crate::models::template::{NewTemplate, TemplatePlatform};

pub const PROFESSIONAL_ANNOUNCEMENT: &str = "Professional Announcement";
pub const ENGAGEMENT_QUESTION: &str = "Engagement Question";
pub const TRENDING_TOPIC_COMMENTARY: &str = "Trending Topic Commentary";
pub const QUICK_TIP: &str = "Quick Tip";

/// Templates every new user starts with. The names double as fallback-formatter keys.
const DEFAULTS: [(&str, &str, TemplatePlatform, &str); 4] = [
    (
        PROFESSIONAL_ANNOUNCEMENT,
        "Formal announcement of news, achievements, or milestones",
        TemplatePlatform::Linkedin,
        "Format the following content as a professional LinkedIn announcement \
         with a clear call to action.",
    ),
    (
        ENGAGEMENT_QUESTION,
        "Post ending with a question to drive audience engagement",
        TemplatePlatform::All,
        "Format the following content and end with an engaging question to encourage responses.",
    ),
    (
        TRENDING_TOPIC_COMMENTARY,
        "Your perspective on a trending industry topic",
        TemplatePlatform::Twitter,
        "Format the following content as a Twitter post commenting on a trending topic. \
         Keep it concise.",
    ),
    (
        QUICK_TIP,
        "Share a valuable tip related to your expertise",
        TemplatePlatform::All,
        "Format the following content as a quick professional tip. \
         Structure it to be easily scannable and valuable.",
    ),
];

pub fn default_templates() -> Vec<NewTemplate> {
    DEFAULTS
        .iter()
        .map(|(name, description, platform, prompt)| NewTemplate {
            name: name.to_string(),
            description: description.to_string(),
            platform: *platform,
            prompt: prompt.to_string(),
        })
        .collect()
}

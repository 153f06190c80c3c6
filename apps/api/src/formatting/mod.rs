// Content Formatter: raw text + template → per-network variants.
// All model calls go through llm_client; any failure degrades to `fallback`.

pub mod fallback;
pub mod formatter;
pub mod handlers;
pub mod prompts;

// Post Store: draft lifecycle with transactional platform replacement.

pub mod drafts;
pub mod handlers;

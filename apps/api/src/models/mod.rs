pub mod post;
pub mod template;
pub mod user;

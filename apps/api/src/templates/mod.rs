// Template Store: owner-scoped CRUD plus first-use seeding of the defaults.

pub mod defaults;
pub mod handlers;
pub mod service;

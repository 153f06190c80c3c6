// Clerk → local user mirror.

pub mod handlers;
pub mod signature;

//! API handlers for the Campus Market backend

pub mod auth;
pub mod flag;
pub mod health;
pub mod listing;
pub mod message;
pub mod question;

// Re-export the auth extractors for handler use
pub use crate::middleware::auth::{AuthenticatedUser, OptionalUser};

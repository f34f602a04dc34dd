//! Command implementations.

pub mod auth;

pub use auth::{handle_login, handle_reset, handle_status, handle_token};

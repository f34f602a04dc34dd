//! Credential resolution for dstore.
//!
//! This module selects among credential sources (platform identity,
//! service-account key, interactive OAuth2 authorization-code grant) and
//! produces a single usable access credential, caching the refresh token
//! on disk between runs.

pub mod exchanger;
pub mod platform;
pub mod resolver;
pub mod secrets;
pub mod service_account;
pub mod token_store;
pub mod tokens;

pub use exchanger::{AuthorizationCodeExchanger, AuthorizationCodeProvider, ConsoleCodeProvider};
pub use resolver::{CredentialResolver, CredentialSource};
pub use secrets::ClientSecrets;
pub use token_store::{FileRefreshTokenStore, RefreshTokenStore};
pub use tokens::Credential;

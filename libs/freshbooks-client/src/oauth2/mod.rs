//! Access token lifecycle for the FreshBooks API.
//!
//! A configured long-lived token is used as-is. Otherwise a refresh token
//! plus client credentials are exchanged at the token endpoint on first
//! use and again whenever the issued access token nears its expiry.

pub mod config;
pub mod error;
pub(crate) mod source;
pub mod token;
pub(crate) mod types;

pub use config::{RefreshPolicy, RefreshTokenConfig};
pub use error::TokenError;
pub use token::TokenManager;

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]
//! Read-only FreshBooks API access for identity sync.
//!
//! [`FreshBooksClient`] authenticates with either a static bearer token or a
//! refresh-token credential, resolves the business the credentials belong
//! to, and pages through `team_members`.
//!
//! ```ignore
//! let credentials = Credentials::from_parts(Some(token), None, None, None)?;
//! let client = FreshBooksClient::builder(credentials).build()?;
//! let page = client.list_team_members(PageOptions::default()).await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod oauth2;
pub mod pagination;
pub mod secret;
mod tenant;
pub mod transport;

pub use client::{FreshBooksClient, FreshBooksClientBuilder};
pub use config::{ClientConfig, Credentials, DEFAULT_BASE_URL};
pub use error::ClientError;
pub use models::{BusinessId, PageMeta, ROLES, Role, TeamMember};
pub use oauth2::{RefreshPolicy, TokenError, TokenManager};
pub use pagination::{DEFAULT_PER_PAGE, MAX_PER_PAGE, Page, PageOptions};
pub use secret::SecretString;
pub use transport::{HttpClient, HttpError};

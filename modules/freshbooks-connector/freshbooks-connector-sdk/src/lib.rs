#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Connector SDK
//!
//! Contract between an identity connector and the governance engine that
//! consumes it:
//!
//! - [`ConnectorApi`], [`ResourceSyncer`] - traits a connector implements
//! - [`Resource`], [`Entitlement`], [`Grant`] - normalized identity model
//! - [`PageToken`], [`ListPage`] - paging
//! - [`SyncError`] - error type
//!
//! ```ignore
//! for syncer in connector.resource_syncers() {
//!     let page = syncer.list(None, &PageToken::first(50)).await?;
//!     for resource in &page.items {
//!         let grants = syncer.grants(resource, &PageToken::default()).await?;
//!     }
//! }
//! ```

pub mod api;
pub mod error;
pub mod models;

pub use api::{ConnectorApi, ResourceSyncer};
pub use error::SyncError;
pub use models::{
    ConnectorMetadata, Email, Entitlement, EntitlementPurpose, Grant, ListPage, PageToken,
    Resource, ResourceId, ResourceTrait, ResourceType, RoleTrait, TraitKind, UserStatus,
    UserTrait,
};

//! Traits a connector implements for the sync engine.

use async_trait::async_trait;

use crate::error::SyncError;
use crate::models::{
    ConnectorMetadata, Entitlement, Grant, ListPage, PageToken, Resource, ResourceId, ResourceType,
};

/// Enumerates one resource type together with its entitlements and
/// grants.
///
/// The engine drives every method through page tokens until a page with
/// no `next_token` is returned, and may call methods of different
/// syncers concurrently.
#[async_trait]
pub trait ResourceSyncer: Send + Sync {
    /// The type this syncer enumerates.
    fn resource_type(&self) -> &ResourceType;

    /// List resources of this type.
    ///
    /// # Errors
    ///
    /// - `InvalidPageToken` if `token` was not produced by this syncer
    /// - `Upstream` if the upstream system failed
    async fn list(
        &self,
        parent: Option<&ResourceId>,
        token: &PageToken,
    ) -> Result<ListPage<Resource>, SyncError>;

    /// List the entitlements offered by `resource`.
    ///
    /// # Errors
    ///
    /// - `Upstream` if the upstream system failed
    async fn entitlements(
        &self,
        resource: &Resource,
        token: &PageToken,
    ) -> Result<ListPage<Entitlement>, SyncError>;

    /// List the grants of `resource`'s entitlements.
    ///
    /// # Errors
    ///
    /// - `Upstream` if the upstream system failed
    async fn grants(
        &self,
        resource: &Resource,
        token: &PageToken,
    ) -> Result<ListPage<Grant>, SyncError>;
}

/// Entry point of a connector.
#[async_trait]
pub trait ConnectorApi: Send + Sync {
    fn metadata(&self) -> ConnectorMetadata;

    /// Exercise the configured credentials against the upstream system.
    ///
    /// # Errors
    ///
    /// - `Upstream` if the credentials are rejected or the system is
    ///   unreachable
    async fn validate(&self) -> Result<(), SyncError>;

    /// One syncer per resource type. Each call returns fresh syncers, so
    /// per-run caches start empty.
    fn resource_syncers(&self) -> Vec<Box<dyn ResourceSyncer>>;
}

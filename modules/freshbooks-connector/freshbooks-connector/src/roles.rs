use std::sync::Arc;

use async_trait::async_trait;
use freshbooks_client::{FreshBooksClient, ROLES, Role};
use freshbooks_connector_sdk::{
    Entitlement, Grant, ListPage, PageToken, Resource, ResourceId, ResourceSyncer, ResourceTrait,
    ResourceType, RoleTrait, SyncError,
};
use serde_json::{Map, json};

use crate::cache::TeamMemberCache;
use crate::resource_types;

/// The built-in FreshBooks roles and who holds them.
///
/// Roles are a fixed table. Grants come from the full team member list,
/// which is fetched once per syncer and shared by every role.
pub struct RoleSyncer {
    resource_type: ResourceType,
    user_type: ResourceType,
    members: TeamMemberCache,
}

impl RoleSyncer {
    #[must_use]
    pub fn new(client: Arc<FreshBooksClient>, page_size: i64) -> Self {
        Self {
            resource_type: resource_types::role(),
            user_type: resource_types::user(),
            members: TeamMemberCache::new(client, page_size),
        }
    }
}

#[async_trait]
impl ResourceSyncer for RoleSyncer {
    fn resource_type(&self) -> &ResourceType {
        &self.resource_type
    }

    async fn list(
        &self,
        _parent: Option<&ResourceId>,
        _token: &PageToken,
    ) -> Result<ListPage<Resource>, SyncError> {
        Ok(ListPage::last(ROLES.iter().map(role_resource).collect()))
    }

    async fn entitlements(
        &self,
        resource: &Resource,
        _token: &PageToken,
    ) -> Result<ListPage<Entitlement>, SyncError> {
        Ok(ListPage::last(vec![Entitlement::permission(
            resource,
            resource_types::ASSIGNED,
            &[&self.user_type],
        )]))
    }

    #[tracing::instrument(skip_all, fields(role = %resource.id.resource))]
    async fn grants(
        &self,
        resource: &Resource,
        _token: &PageToken,
    ) -> Result<ListPage<Grant>, SyncError> {
        let members = self.members.get_all().await.map_err(SyncError::upstream)?;

        let grants: Vec<Grant> = members
            .iter()
            .filter(|m| m.business_role_name == resource.id.resource)
            .map(|m| {
                Grant::new(
                    resource,
                    resource_types::ASSIGNED,
                    ResourceId::new(resource_types::USER, m.uuid.clone()),
                )
            })
            .collect();

        tracing::debug!(count = grants.len(), "derived role grants");
        Ok(ListPage::last(grants))
    }
}

pub(crate) fn role_resource(role: &Role) -> Resource {
    let mut profile = Map::new();
    profile.insert("id".into(), json!(role.business_role_name));
    profile.insert("name".into(), json!(role.role_name));

    Resource::new(&resource_types::role(), role.business_role_name, role.role_name)
        .with_trait(ResourceTrait::Role(RoleTrait { profile }))
}

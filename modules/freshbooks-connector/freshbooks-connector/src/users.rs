use std::sync::Arc;

use async_trait::async_trait;
use freshbooks_client::{FreshBooksClient, PageOptions, TeamMember};
use freshbooks_connector_sdk::{
    Email, Entitlement, Grant, ListPage, PageToken, Resource, ResourceId, ResourceSyncer,
    ResourceTrait, ResourceType, SyncError, UserStatus, UserTrait,
};
use serde_json::{Map, Value, json};

use crate::resource_types;

/// Team members as user resources, paged straight from the API.
pub struct UserSyncer {
    client: Arc<FreshBooksClient>,
    resource_type: ResourceType,
}

impl UserSyncer {
    #[must_use]
    pub fn new(client: Arc<FreshBooksClient>) -> Self {
        Self {
            client,
            resource_type: resource_types::user(),
        }
    }
}

#[async_trait]
impl ResourceSyncer for UserSyncer {
    fn resource_type(&self) -> &ResourceType {
        &self.resource_type
    }

    #[tracing::instrument(skip_all, fields(token = %token.token))]
    async fn list(
        &self,
        parent: Option<&ResourceId>,
        token: &PageToken,
    ) -> Result<ListPage<Resource>, SyncError> {
        let opts = PageOptions {
            page: parse_page_token(token)?,
            per_page: i64::from(token.size),
        };

        let page = self
            .client
            .list_team_members(opts)
            .await
            .map_err(SyncError::upstream)?;

        let items = page
            .items
            .iter()
            .map(|member| user_resource(member, parent.cloned()))
            .collect();

        Ok(ListPage {
            items,
            next_token: page.next_page.map(|n| n.to_string()),
        })
    }

    async fn entitlements(
        &self,
        _resource: &Resource,
        _token: &PageToken,
    ) -> Result<ListPage<Entitlement>, SyncError> {
        Ok(ListPage::empty())
    }

    async fn grants(
        &self,
        _resource: &Resource,
        _token: &PageToken,
    ) -> Result<ListPage<Grant>, SyncError> {
        Ok(ListPage::empty())
    }
}

/// An empty token is the first page; anything else must be a page number.
fn parse_page_token(token: &PageToken) -> Result<i64, SyncError> {
    if token.is_first() {
        return Ok(1);
    }
    token
        .token
        .parse::<i64>()
        .map_err(|_| SyncError::InvalidPageToken(token.token.clone()))
}

/// Map a team member to a user resource keyed by UUID.
///
/// Status is always enabled; `active` is reported only in the profile.
pub(crate) fn user_resource(member: &TeamMember, parent: Option<ResourceId>) -> Resource {
    let mut profile = Map::new();
    profile.insert("uuid".into(), json!(member.uuid));
    profile.insert("email".into(), json!(member.email));
    profile.insert("first_name".into(), json!(member.first_name));
    profile.insert("last_name".into(), json!(member.last_name));
    profile.insert("active".into(), json!(member.active));
    profile.insert(
        "invitation_accepted".into(),
        member
            .invitation_date_accepted
            .clone()
            .map_or(Value::Null, Value::String),
    );

    let user = UserTrait {
        profile,
        status: UserStatus::Enabled,
        login: member.email.clone(),
        emails: vec![Email {
            address: member.email.clone(),
            primary: true,
        }],
    };

    Resource::new(&resource_types::user(), member.uuid.clone(), display_name(member))
        .with_parent(parent)
        .with_trait(ResourceTrait::User(user))
}

/// `first last`, or the email when both name parts are empty. Parts are
/// used verbatim, so a lone first name keeps its trailing space.
fn display_name(member: &TeamMember) -> String {
    if member.first_name.is_empty() && member.last_name.is_empty() {
        member.email.clone()
    } else {
        format!("{} {}", member.first_name, member.last_name)
    }
}

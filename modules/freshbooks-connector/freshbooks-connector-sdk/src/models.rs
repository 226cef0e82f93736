//! Normalized identity model exchanged with the governance engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Capability a resource type carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitKind {
    User,
    Role,
}

/// Kind of object a syncer enumerates, e.g. `user` or `role`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceType {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<TraitKind>,
}

impl ResourceType {
    #[must_use]
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, traits: Vec<TraitKind>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            traits,
        }
    }
}

/// Stable reference to one resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    pub resource_type: String,
    pub resource: String,
}

impl ResourceId {
    #[must_use]
    pub fn new(resource_type: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource: resource.into(),
        }
    }
}

/// Lifecycle state reported for a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[default]
    Unspecified,
    Enabled,
    Disabled,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub address: String,
    pub primary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserTrait {
    pub profile: Map<String, Value>,
    pub status: UserStatus,
    pub login: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<Email>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleTrait {
    pub profile: Map<String, Value>,
}

/// Type-specific attributes of a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "trait", rename_all = "snake_case")]
pub enum ResourceTrait {
    User(UserTrait),
    Role(RoleTrait),
}

/// One synchronized object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ResourceId>,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<ResourceTrait>,
}

impl Resource {
    /// Resource of type `resource_type` with id `id` and no traits.
    #[must_use]
    pub fn new(resource_type: &ResourceType, id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(resource_type.id.clone(), id),
            parent: None,
            display_name: display_name.into(),
            description: None,
            traits: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: Option<ResourceId>) -> Self {
        self.parent = parent;
        self
    }

    #[must_use]
    pub fn with_trait(mut self, resource_trait: ResourceTrait) -> Self {
        self.traits.push(resource_trait);
        self
    }

    /// The user trait, if this resource has one.
    #[must_use]
    pub fn user_trait(&self) -> Option<&UserTrait> {
        self.traits.iter().find_map(|t| match t {
            ResourceTrait::User(u) => Some(u),
            ResourceTrait::Role(_) => None,
        })
    }

    /// The role trait, if this resource has one.
    #[must_use]
    pub fn role_trait(&self) -> Option<&RoleTrait> {
        self.traits.iter().find_map(|t| match t {
            ResourceTrait::Role(r) => Some(r),
            ResourceTrait::User(_) => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementPurpose {
    Permission,
}

/// Something a principal can be granted on a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    /// `<resource_type>:<resource>:<slug>`.
    pub id: String,
    pub resource: ResourceId,
    pub slug: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub purpose: EntitlementPurpose,
    /// Resource type ids of principals that may hold this entitlement.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grantable_to: Vec<String>,
}

impl Entitlement {
    /// Permission entitlement `slug` on `resource`, labelled like the
    /// resource.
    #[must_use]
    pub fn permission(resource: &Resource, slug: &str, grantable_to: &[&ResourceType]) -> Self {
        Self {
            id: entitlement_id(&resource.id, slug),
            resource: resource.id.clone(),
            slug: slug.to_owned(),
            display_name: resource.display_name.clone(),
            description: resource.description.clone(),
            purpose: EntitlementPurpose::Permission,
            grantable_to: grantable_to.iter().map(|rt| rt.id.clone()).collect(),
        }
    }
}

/// A principal holding an entitlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    /// `<entitlement id>:<principal type>:<principal>`.
    pub id: String,
    pub entitlement_id: String,
    pub principal: ResourceId,
}

impl Grant {
    #[must_use]
    pub fn new(resource: &Resource, slug: &str, principal: ResourceId) -> Self {
        let entitlement_id = entitlement_id(&resource.id, slug);
        Self {
            id: format!(
                "{entitlement_id}:{}:{}",
                principal.resource_type, principal.resource
            ),
            entitlement_id,
            principal,
        }
    }
}

fn entitlement_id(resource: &ResourceId, slug: &str) -> String {
    format!("{}:{}:{slug}", resource.resource_type, resource.resource)
}

/// Paging request from the engine. An empty `token` asks for the first
/// page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageToken {
    /// Requested page size; `0` lets the syncer choose.
    pub size: u32,
    pub token: String,
}

impl PageToken {
    #[must_use]
    pub fn first(size: u32) -> Self {
        Self {
            size,
            token: String::new(),
        }
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.token.is_empty()
    }
}

/// One page of a listing plus the token for the next call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    /// `None` once enumeration is complete.
    pub next_token: Option<String>,
}

impl<T> ListPage<T> {
    /// Final page with the given items.
    #[must_use]
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::last(Vec::new())
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.next_token.is_none()
    }
}

/// Static description of a connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorMetadata {
    pub display_name: String,
    pub description: String,
}

//! Wire models for the FreshBooks identity API.
//!
//! Only the fields the sync needs are modelled; everything else in the
//! payloads is ignored.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Opaque tenant identifier. The API sends it as a number; strings are
/// accepted too and stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BusinessId(String);

impl BusinessId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BusinessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for BusinessId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for BusinessId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self::from(n),
            Raw::Text(s) => Self(s),
        })
    }
}

/// A user of the business as returned by `team_members`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TeamMember {
    #[serde(default, deserialize_with = "null_as_default")]
    pub uuid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub middle_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    /// The API spells this field `job_tittle`.
    #[serde(
        default,
        rename = "job_tittle",
        alias = "job_title",
        deserialize_with = "null_as_default"
    )]
    pub job_title: String,
    #[serde(default)]
    pub business_id: Option<i64>,
    /// Exact-match key into the static role table.
    #[serde(default, deserialize_with = "null_as_default")]
    pub business_role_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active: bool,
    /// The API spells this field `identity_it`.
    #[serde(default, rename = "identity_it", alias = "identity_id")]
    pub identity_id: Option<i64>,
    #[serde(default)]
    pub invitation_date_accepted: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Built-in FreshBooks role. The set is fixed by the platform and never
/// fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Role {
    /// Human-facing name, e.g. `admin`.
    pub role_name: &'static str,
    /// Identifier used in `TeamMember::business_role_name`, e.g. `owner`.
    pub business_role_name: &'static str,
}

pub const ROLES: [Role; 5] = [
    Role {
        role_name: "admin",
        business_role_name: "owner",
    },
    Role {
        role_name: "manager",
        business_role_name: "business_manager",
    },
    Role {
        role_name: "employee",
        business_role_name: "business_employee",
    },
    Role {
        role_name: "contractor",
        business_role_name: "contractor",
    },
    Role {
        role_name: "accountant",
        business_role_name: "no_seat_employee",
    },
];

/// Body `meta` block of list endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub total: u64,
}

/// Envelope of list endpoints such as `team_members`.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct ListResponse<T> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub response: Vec<T>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

/// `GET .../users/me` envelope, reduced to the membership list.
#[derive(Debug, Deserialize)]
pub(crate) struct CurrentUserResponse {
    pub response: CurrentUser,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CurrentUser {
    #[serde(default, deserialize_with = "null_as_default")]
    pub business_memberships: Vec<BusinessMembership>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BusinessMembership {
    pub business: Business,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Business {
    pub id: BusinessId,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn team_member_decodes_upstream_spelling() {
        let m: TeamMember = serde_json::from_value(json!({
            "uuid": "u-1",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com",
            "job_tittle": "Analyst",
            "business_id": 42,
            "business_role_name": "owner",
            "active": true,
            "identity_it": 7,
            "invitation_date_accepted": "2024-01-02T03:04:05Z",
            "phone_number": "555"
        }))
        .unwrap();

        assert_eq!(m.uuid, "u-1");
        assert_eq!(m.job_title, "Analyst");
        assert_eq!(m.identity_id, Some(7));
        assert_eq!(m.business_id, Some(42));
        assert!(m.active);
        assert_eq!(m.invitation_date_accepted.as_deref(), Some("2024-01-02T03:04:05Z"));
    }

    #[test]
    fn nulls_decode_as_empty() {
        let m: TeamMember = serde_json::from_value(json!({
            "uuid": "u-2",
            "first_name": null,
            "middle_name": null,
            "active": null,
            "business_role_name": null
        }))
        .unwrap();

        assert_eq!(m.first_name, "");
        assert_eq!(m.middle_name, "");
        assert!(!m.active);
        assert_eq!(m.business_role_name, "");
    }

    #[test]
    fn business_id_accepts_number_or_string() {
        let n: BusinessId = serde_json::from_value(json!(123)).unwrap();
        let s: BusinessId = serde_json::from_value(json!("abc")).unwrap();
        assert_eq!(n.as_str(), "123");
        assert_eq!(s.as_str(), "abc");
    }

    #[test]
    fn users_me_memberships_decode() {
        let r: CurrentUserResponse = serde_json::from_value(json!({
            "response": {
                "id": 1,
                "business_memberships": [
                    {"role": "owner", "business": {"id": 99, "name": "Acme"}},
                    {"business": {"id": 100}}
                ]
            }
        }))
        .unwrap();
        assert_eq!(r.response.business_memberships[0].business.id.as_str(), "99");
    }

    #[test]
    fn users_me_null_memberships_is_empty() {
        let r: CurrentUserResponse =
            serde_json::from_value(json!({"response": {"business_memberships": null}})).unwrap();
        assert!(r.response.business_memberships.is_empty());
    }

    #[test]
    fn list_envelope_with_meta() {
        let r: ListResponse<TeamMember> = serde_json::from_value(json!({
            "response": [{"uuid": "a"}, {"uuid": "b"}],
            "meta": {"page": 1, "per_page": 2, "total": 5}
        }))
        .unwrap();
        assert_eq!(r.response.len(), 2);
        assert_eq!(r.meta, Some(PageMeta { page: 1, per_page: 2, total: 5 }));
    }

    #[test]
    fn role_table_is_fixed() {
        let keys: Vec<_> = ROLES.iter().map(|r| r.business_role_name).collect();
        assert_eq!(
            keys,
            [
                "owner",
                "business_manager",
                "business_employee",
                "contractor",
                "no_seat_employee"
            ]
        );
    }
}

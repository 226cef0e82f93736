use freshbooks_connector_sdk::{ResourceType, TraitKind};

pub const USER: &str = "user";
pub const ROLE: &str = "role";

/// Slug of the single permission each role offers.
pub const ASSIGNED: &str = "assigned";

#[must_use]
pub fn user() -> ResourceType {
    ResourceType::new(USER, "User", vec![TraitKind::User])
}

#[must_use]
pub fn role() -> ResourceType {
    ResourceType::new(ROLE, "Role", vec![TraitKind::Role])
}

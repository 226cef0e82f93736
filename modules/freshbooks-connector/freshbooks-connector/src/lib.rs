#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! FreshBooks identity connector.
//!
//! Team members become user resources, the five built-in business roles
//! become role resources, and each member's `business_role_name` becomes
//! an `assigned` grant on the matching role.

pub mod cache;
pub mod connector;
pub mod resource_types;
pub mod roles;
pub mod users;

pub use cache::TeamMemberCache;
pub use connector::Connector;
pub use roles::RoleSyncer;
pub use users::UserSyncer;

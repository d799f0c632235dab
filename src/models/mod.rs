//! Domain models for the usergroups service.
//!
//! This module contains the database-backed rows for groups, their
//! memberships, join applications and invitations.

pub mod application;
pub mod group;
pub mod group_member;
pub mod invitation;
pub mod user;

// Re-export all models for convenient access
pub use application::UserGroupApplication;
pub use group::Group;
pub use group_member::{GroupMember, Member, MemberRole};
pub use invitation::{EmailInvitation, UserGroupInvitation};
pub use user::User;

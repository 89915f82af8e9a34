//! Permission system types and utilities.
//!
//! Layers, leaf first:
//! - Bitmask algebra over the permission table
//! - Role hierarchy ordering
//! - Channel permission overrides
//! - Effective permission resolution
//! - Hierarchy interaction checks

pub mod guild;
pub mod helpers;
pub mod hierarchy;
pub mod interaction;
pub mod models;
pub mod overrides;
pub mod resolver;

pub use guild::GuildPermissions;
pub use helpers::{filter_accessible_channels, require_channel_permission, MemberPermissionContext};
pub use hierarchy::{compare_hierarchy, highest_role, sequence_from_id, sorted_roles, PUBLIC_ROLE_POSITION};
pub use interaction::{can_interact, can_manage_role, can_moderate_member, AccessError, Holder, ModerationAction};
pub use models::*;
pub use overrides::{CombinedOverride, HolderKind, OverrideHolder, PermissionOverride};
pub use resolver::{resolve_channel_permissions, resolve_guild_permissions, PermissionError};

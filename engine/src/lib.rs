//! Guild Permission Engine
//!
//! Resolves effective permissions for guild members from immutable
//! snapshots of roles, members and channel overrides, and decides whether
//! one role or member may act on another.

pub mod config;
pub mod inspect;
pub mod permissions;

//! Channel permission overrides.
//!
//! An override splits the permission table into three disjoint categories
//! for one holder: allowed, denied, and inherited. Only `allowed` and
//! `denied` are stored; `inherited` is whatever is left.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::guild::GuildPermissions;
use super::resolver::PermissionError;

/// Kind of holder an override is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HolderKind {
    Role,
    Member,
}

/// The role or member an override applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverrideHolder {
    /// A guild role, including the public role.
    Role(Uuid),
    /// A single guild member, keyed by user id.
    Member(Uuid),
}

impl OverrideHolder {
    #[must_use]
    pub const fn kind(self) -> HolderKind {
        match self {
            Self::Role(_) => HolderKind::Role,
            Self::Member(_) => HolderKind::Member,
        }
    }

    #[must_use]
    pub const fn id(self) -> Uuid {
        match self {
            Self::Role(id) | Self::Member(id) => id,
        }
    }
}

/// Per-channel, per-holder exception to base permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PermissionOverrideData", into = "PermissionOverrideData")]
pub struct PermissionOverride {
    holder: OverrideHolder,
    allowed: GuildPermissions,
    denied: GuildPermissions,
}

impl PermissionOverride {
    /// Create an override, rejecting bits that are both allowed and denied.
    pub fn new(
        holder: OverrideHolder,
        allowed: GuildPermissions,
        denied: GuildPermissions,
    ) -> Result<Self, PermissionError> {
        let overlap = allowed & denied;
        if !overlap.is_empty() {
            return Err(PermissionError::OverlappingOverride { holder, overlap });
        }

        Ok(Self {
            holder,
            allowed,
            denied,
        })
    }

    /// Create an override from raw masks. Unknown bits are dropped first.
    pub fn from_raw(holder: OverrideHolder, allow: u64, deny: u64) -> Result<Self, PermissionError> {
        Self::new(
            holder,
            GuildPermissions::from_raw(allow),
            GuildPermissions::from_raw(deny),
        )
    }

    #[must_use]
    pub const fn holder(&self) -> OverrideHolder {
        self.holder
    }

    #[must_use]
    pub const fn allowed(&self) -> GuildPermissions {
        self.allowed
    }

    #[must_use]
    pub const fn denied(&self) -> GuildPermissions {
        self.denied
    }

    /// Permissions this override leaves untouched.
    #[must_use]
    pub const fn inherited(&self) -> GuildPermissions {
        GuildPermissions::all()
            .difference(self.allowed)
            .difference(self.denied)
    }

    /// Apply this override to a running mask: deny first, then allow.
    #[must_use]
    pub const fn apply(&self, permissions: GuildPermissions) -> GuildPermissions {
        permissions.apply_override(self.denied, self.allowed)
    }
}

/// Allow and deny masks merged across several overrides of the same tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CombinedOverride {
    pub allowed: GuildPermissions,
    pub denied: GuildPermissions,
}

impl CombinedOverride {
    /// Union the allow and deny masks of every override given.
    pub fn combine<'a, I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = &'a PermissionOverride>,
    {
        overrides
            .into_iter()
            .fold(Self::default(), |acc, ovr| Self {
                allowed: acc.allowed | ovr.allowed,
                denied: acc.denied | ovr.denied,
            })
    }

    /// Deny first, then allow. A bit allowed by any override stays set.
    #[must_use]
    pub const fn apply(&self, permissions: GuildPermissions) -> GuildPermissions {
        permissions.apply_override(self.denied, self.allowed)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.allowed.is_empty() && self.denied.is_empty()
    }
}

/// Wire form of an override: `{ "type": "role", "id": ..., "allow": 0, "deny": 0 }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionOverrideData {
    #[serde(rename = "type")]
    pub kind: HolderKind,
    pub id: Uuid,
    #[serde(default)]
    pub allow: u64,
    #[serde(default)]
    pub deny: u64,
}

impl TryFrom<PermissionOverrideData> for PermissionOverride {
    type Error = PermissionError;

    fn try_from(data: PermissionOverrideData) -> Result<Self, Self::Error> {
        let holder = match data.kind {
            HolderKind::Role => OverrideHolder::Role(data.id),
            HolderKind::Member => OverrideHolder::Member(data.id),
        };
        Self::from_raw(holder, data.allow, data.deny)
    }
}

impl From<PermissionOverride> for PermissionOverrideData {
    fn from(ovr: PermissionOverride) -> Self {
        Self {
            kind: ovr.holder.kind(),
            id: ovr.holder.id(),
            allow: ovr.allowed.raw(),
            deny: ovr.denied.raw(),
        }
    }
}

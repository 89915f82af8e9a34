//! Snapshot models consumed by the permission engine.
//!
//! Snapshots are immutable deep copies handed over by the cache layer. Every
//! type here is plain owned data without interior mutability, so a snapshot
//! can be shared across threads (wrap it in `Arc`) while resolutions run.
//! Invariants are checked once, when a snapshot is constructed or
//! deserialized.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::guild::{raw_mask, GuildPermissions};
use super::hierarchy::{sequence_from_id, PUBLIC_ROLE_POSITION};
use super::overrides::{OverrideHolder, PermissionOverride};
use super::resolver::PermissionError;

/// Guild role with permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RoleData", into = "RoleData")]
pub struct Role {
    pub id: Uuid,
    pub guild_id: Uuid,
    pub name: String,
    pub permissions: GuildPermissions,
    /// Higher is more senior.
    pub position: i32,
    /// Creation order. Lower values were created earlier.
    pub sequence: u64,
    /// Controlled by an external integration, not by guild admins.
    pub managed: bool,
    pub is_public: bool,
}

/// Wire form of [`Role`]. A missing `sequence` is read from the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleData {
    pub id: Uuid,
    pub guild_id: Uuid,
    pub name: String,
    #[serde(with = "raw_mask")]
    pub permissions: GuildPermissions,
    pub position: i32,
    #[serde(default)]
    pub sequence: Option<u64>,
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub is_public: bool,
}

impl From<RoleData> for Role {
    fn from(data: RoleData) -> Self {
        Self {
            sequence: data.sequence.unwrap_or_else(|| sequence_from_id(&data.id)),
            id: data.id,
            guild_id: data.guild_id,
            name: data.name,
            permissions: data.permissions,
            position: data.position,
            managed: data.managed,
            is_public: data.is_public,
        }
    }
}

impl From<Role> for RoleData {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            guild_id: role.guild_id,
            name: role.name,
            permissions: role.permissions,
            position: role.position,
            sequence: Some(role.sequence),
            managed: role.managed,
            is_public: role.is_public,
        }
    }
}

impl Role {
    /// Create an explicit role. The sequence value is read from the id.
    pub fn new(
        id: Uuid,
        guild_id: Uuid,
        name: impl Into<String>,
        permissions: GuildPermissions,
        position: i32,
    ) -> Self {
        Self {
            id,
            guild_id,
            name: name.into(),
            permissions,
            position,
            sequence: sequence_from_id(&id),
            managed: false,
            is_public: false,
        }
    }

    /// Create the public role of a guild. It shares the guild's id.
    pub fn public(guild_id: Uuid, permissions: GuildPermissions) -> Self {
        Self {
            id: guild_id,
            guild_id,
            name: "@everyone".to_string(),
            permissions,
            position: PUBLIC_ROLE_POSITION,
            sequence: 0,
            managed: false,
            is_public: true,
        }
    }

    #[must_use]
    pub const fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    #[must_use]
    pub const fn with_managed(mut self, managed: bool) -> Self {
        self.managed = managed;
        self
    }
}

/// A guild's roles and owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "GuildSnapshotData", into = "GuildSnapshotData")]
pub struct GuildSnapshot {
    id: Uuid,
    owner_id: Uuid,
    roles: Vec<Role>,
    public_index: usize,
}

/// Unvalidated wire form of [`GuildSnapshot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildSnapshotData {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub roles: Vec<Role>,
}

impl GuildSnapshot {
    /// Build a snapshot, validating the role set.
    ///
    /// Requires exactly one public role whose id equals the guild id, and
    /// every role to belong to this guild. The public role's stored position
    /// is replaced by the sentinel.
    pub fn new(id: Uuid, owner_id: Uuid, mut roles: Vec<Role>) -> Result<Self, PermissionError> {
        let mut seen = HashSet::with_capacity(roles.len());
        let mut public_index = None;

        for (index, role) in roles.iter().enumerate() {
            if role.guild_id != id {
                return Err(PermissionError::ForeignRole {
                    role_id: role.id,
                    guild_id: role.guild_id,
                });
            }
            if !seen.insert(role.id) {
                return Err(PermissionError::DuplicateRole(role.id));
            }
            if role.is_public {
                if public_index.is_some() {
                    return Err(PermissionError::MultiplePublicRoles(id));
                }
                if role.id != id {
                    return Err(PermissionError::PublicRoleIdMismatch {
                        guild_id: id,
                        role_id: role.id,
                    });
                }
                public_index = Some(index);
            }
        }

        let public_index = public_index.ok_or(PermissionError::MissingPublicRole(id))?;
        roles[public_index].position = PUBLIC_ROLE_POSITION;

        Ok(Self {
            id,
            owner_id,
            roles,
            public_index,
        })
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    #[must_use]
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    /// All roles, public role included, in snapshot order.
    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    #[must_use]
    pub fn public_role(&self) -> &Role {
        &self.roles[self.public_index]
    }

    #[must_use]
    pub fn role(&self, role_id: Uuid) -> Option<&Role> {
        self.roles.iter().find(|r| r.id == role_id)
    }

    /// Every role except the public role.
    pub fn explicit_roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.iter().filter(|r| !r.is_public)
    }

    /// Look up a member's explicit roles.
    ///
    /// Fails if the member belongs to another guild or references a role
    /// this snapshot does not know.
    pub fn member_roles(&self, member: &MemberSnapshot) -> Result<Vec<&Role>, PermissionError> {
        self.ensure_guild(member.guild_id())?;

        member
            .role_ids()
            .iter()
            .map(|&role_id| {
                self.role(role_id).ok_or(PermissionError::UnknownRole {
                    guild_id: self.id,
                    role_id,
                })
            })
            .collect()
    }

    pub(crate) fn ensure_guild(&self, guild_id: Uuid) -> Result<(), PermissionError> {
        if guild_id == self.id {
            Ok(())
        } else {
            Err(PermissionError::GuildMismatch {
                expected: self.id,
                found: guild_id,
            })
        }
    }
}

impl TryFrom<GuildSnapshotData> for GuildSnapshot {
    type Error = PermissionError;

    fn try_from(data: GuildSnapshotData) -> Result<Self, Self::Error> {
        Self::new(data.id, data.owner_id, data.roles)
    }
}

impl From<GuildSnapshot> for GuildSnapshotData {
    fn from(snapshot: GuildSnapshot) -> Self {
        Self {
            id: snapshot.id,
            owner_id: snapshot.owner_id,
            roles: snapshot.roles,
        }
    }
}

/// A guild member and the roles explicitly assigned to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MemberSnapshotData", into = "MemberSnapshotData")]
pub struct MemberSnapshot {
    guild_id: Uuid,
    user_id: Uuid,
    role_ids: Vec<Uuid>,
}

/// Wire form of [`MemberSnapshot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberSnapshotData {
    pub guild_id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub role_ids: Vec<Uuid>,
}

impl MemberSnapshot {
    /// Create a member snapshot.
    ///
    /// Duplicate role ids are collapsed (first occurrence kept) and the
    /// public role is removed, since every member holds it implicitly.
    pub fn new(guild_id: Uuid, user_id: Uuid, role_ids: impl IntoIterator<Item = Uuid>) -> Self {
        let mut seen = HashSet::new();
        let role_ids = role_ids
            .into_iter()
            .filter(|&role_id| role_id != guild_id && seen.insert(role_id))
            .collect();

        Self {
            guild_id,
            user_id,
            role_ids,
        }
    }

    #[must_use]
    pub const fn guild_id(&self) -> Uuid {
        self.guild_id
    }

    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Explicit role ids, public role excluded.
    #[must_use]
    pub fn role_ids(&self) -> &[Uuid] {
        &self.role_ids
    }

    #[must_use]
    pub fn has_role(&self, role_id: Uuid) -> bool {
        self.role_ids.contains(&role_id)
    }
}

impl From<MemberSnapshotData> for MemberSnapshot {
    fn from(data: MemberSnapshotData) -> Self {
        Self::new(data.guild_id, data.user_id, data.role_ids)
    }
}

impl From<MemberSnapshot> for MemberSnapshotData {
    fn from(member: MemberSnapshot) -> Self {
        Self {
            guild_id: member.guild_id,
            user_id: member.user_id,
            role_ids: member.role_ids,
        }
    }
}

/// A guild channel and its permission overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ChannelSnapshotData", into = "ChannelSnapshotData")]
pub struct ChannelSnapshot {
    id: Uuid,
    guild_id: Uuid,
    overrides: Vec<PermissionOverride>,
}

/// Unvalidated wire form of [`ChannelSnapshot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSnapshotData {
    pub id: Uuid,
    pub guild_id: Uuid,
    #[serde(default)]
    pub overrides: Vec<PermissionOverride>,
}

impl ChannelSnapshot {
    /// Build a channel snapshot. At most one override per holder.
    pub fn new(
        id: Uuid,
        guild_id: Uuid,
        overrides: Vec<PermissionOverride>,
    ) -> Result<Self, PermissionError> {
        let mut seen = HashSet::with_capacity(overrides.len());
        for ovr in &overrides {
            if !seen.insert(ovr.holder()) {
                return Err(PermissionError::DuplicateOverride {
                    channel_id: id,
                    holder: ovr.holder(),
                });
            }
        }

        Ok(Self {
            id,
            guild_id,
            overrides,
        })
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn guild_id(&self) -> Uuid {
        self.guild_id
    }

    #[must_use]
    pub fn overrides(&self) -> &[PermissionOverride] {
        &self.overrides
    }

    #[must_use]
    pub fn override_for(&self, holder: OverrideHolder) -> Option<&PermissionOverride> {
        self.overrides.iter().find(|o| o.holder() == holder)
    }
}

impl TryFrom<ChannelSnapshotData> for ChannelSnapshot {
    type Error = PermissionError;

    fn try_from(data: ChannelSnapshotData) -> Result<Self, Self::Error> {
        Self::new(data.id, data.guild_id, data.overrides)
    }
}

impl From<ChannelSnapshot> for ChannelSnapshotData {
    fn from(channel: ChannelSnapshot) -> Self {
        Self {
            id: channel.id,
            guild_id: channel.guild_id,
            overrides: channel.overrides,
        }
    }
}

/// A guild together with the members and channels a cache exported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotBundle {
    pub guild: GuildSnapshot,
    #[serde(default)]
    pub members: Vec<MemberSnapshot>,
    #[serde(default)]
    pub channels: Vec<ChannelSnapshot>,
}

impl SnapshotBundle {
    #[must_use]
    pub fn member(&self, user_id: Uuid) -> Option<&MemberSnapshot> {
        self.members.iter().find(|m| m.user_id() == user_id)
    }

    #[must_use]
    pub fn channel(&self, channel_id: Uuid) -> Option<&ChannelSnapshot> {
        self.channels.iter().find(|c| c.id() == channel_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn public_role(guild_id: Uuid) -> Role {
        Role::public(guild_id, GuildPermissions::PUBLIC_DEFAULT)
    }

    // === Guild Snapshot Tests ===

    #[test]
    fn test_guild_snapshot_valid() {
        let guild_id = Uuid::new_v4();
        let mod_role = Role::new(Uuid::new_v4(), guild_id, "Mod", GuildPermissions::KICK_MEMBERS, 1);

        let guild =
            GuildSnapshot::new(guild_id, Uuid::new_v4(), vec![public_role(guild_id), mod_role.clone()])
                .unwrap();

        assert_eq!(guild.public_role().id, guild_id);
        assert_eq!(guild.role(mod_role.id), Some(&mod_role));
        assert_eq!(guild.explicit_roles().count(), 1);
    }

    #[test]
    fn test_guild_snapshot_forces_public_position() {
        let guild_id = Uuid::new_v4();
        let mut public = public_role(guild_id);
        public.position = 42;

        let guild = GuildSnapshot::new(guild_id, Uuid::new_v4(), vec![public]).unwrap();
        assert_eq!(guild.public_role().position, PUBLIC_ROLE_POSITION);
    }

    #[test]
    fn test_guild_snapshot_missing_public_role() {
        let guild_id = Uuid::new_v4();
        let role = Role::new(Uuid::new_v4(), guild_id, "Member", GuildPermissions::empty(), 0);

        let result = GuildSnapshot::new(guild_id, Uuid::new_v4(), vec![role]);
        assert_eq!(result.unwrap_err(), PermissionError::MissingPublicRole(guild_id));
    }

    #[test]
    fn test_guild_snapshot_multiple_public_roles() {
        let guild_id = Uuid::new_v4();
        let mut second = Role::new(Uuid::new_v4(), guild_id, "Other", GuildPermissions::empty(), 0);
        second.is_public = true;

        let result = GuildSnapshot::new(guild_id, Uuid::new_v4(), vec![public_role(guild_id), second]);
        assert!(matches!(result, Err(PermissionError::MultiplePublicRoles(_))));
    }

    #[test]
    fn test_guild_snapshot_public_role_must_share_guild_id() {
        let guild_id = Uuid::new_v4();
        let mut public = public_role(guild_id);
        public.id = Uuid::new_v4();

        let result = GuildSnapshot::new(guild_id, Uuid::new_v4(), vec![public]);
        assert!(matches!(result, Err(PermissionError::PublicRoleIdMismatch { .. })));
    }

    #[test]
    fn test_guild_snapshot_rejects_foreign_role() {
        let guild_id = Uuid::new_v4();
        let foreign = Role::new(Uuid::new_v4(), Uuid::new_v4(), "Foreign", GuildPermissions::empty(), 0);

        let result = GuildSnapshot::new(guild_id, Uuid::new_v4(), vec![public_role(guild_id), foreign]);
        assert!(matches!(result, Err(PermissionError::ForeignRole { .. })));
    }

    #[test]
    fn test_guild_snapshot_rejects_duplicate_role() {
        let guild_id = Uuid::new_v4();
        let role = Role::new(Uuid::new_v4(), guild_id, "Member", GuildPermissions::empty(), 0);

        let result = GuildSnapshot::new(
            guild_id,
            Uuid::new_v4(),
            vec![public_role(guild_id), role.clone(), role.clone()],
        );
        assert_eq!(result.unwrap_err(), PermissionError::DuplicateRole(role.id));
    }

    #[test]
    fn test_member_roles_unknown_role() {
        let guild_id = Uuid::new_v4();
        let guild = GuildSnapshot::new(guild_id, Uuid::new_v4(), vec![public_role(guild_id)]).unwrap();
        let missing = Uuid::new_v4();
        let member = MemberSnapshot::new(guild_id, Uuid::new_v4(), [missing]);

        let result = guild.member_roles(&member);
        assert_eq!(
            result.unwrap_err(),
            PermissionError::UnknownRole {
                guild_id,
                role_id: missing
            }
        );
    }

    // === Member Snapshot Tests ===

    #[test]
    fn test_member_snapshot_dedupes_and_drops_public_role() {
        let guild_id = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let member = MemberSnapshot::new(guild_id, Uuid::new_v4(), [a, guild_id, b, a]);

        assert_eq!(member.role_ids(), &[a, b]);
        assert!(member.has_role(b));
        assert!(!member.has_role(guild_id));
    }

    // === Channel Snapshot Tests ===

    #[test]
    fn test_channel_snapshot_rejects_duplicate_holder() {
        let role_id = Uuid::new_v4();
        let first = PermissionOverride::new(
            OverrideHolder::Role(role_id),
            GuildPermissions::SEND_MESSAGES,
            GuildPermissions::empty(),
        )
        .unwrap();
        let second = PermissionOverride::new(
            OverrideHolder::Role(role_id),
            GuildPermissions::empty(),
            GuildPermissions::SEND_MESSAGES,
        )
        .unwrap();

        let result = ChannelSnapshot::new(Uuid::new_v4(), Uuid::new_v4(), vec![first, second]);
        assert!(matches!(result, Err(PermissionError::DuplicateOverride { .. })));
    }

    #[test]
    fn test_channel_snapshot_role_and_member_override_coexist() {
        let id = Uuid::new_v4();
        let role_ovr = PermissionOverride::new(
            OverrideHolder::Role(id),
            GuildPermissions::SEND_MESSAGES,
            GuildPermissions::empty(),
        )
        .unwrap();
        let member_ovr = PermissionOverride::new(
            OverrideHolder::Member(id),
            GuildPermissions::empty(),
            GuildPermissions::SEND_MESSAGES,
        )
        .unwrap();

        let channel =
            ChannelSnapshot::new(Uuid::new_v4(), Uuid::new_v4(), vec![role_ovr, member_ovr]).unwrap();

        assert!(channel.override_for(OverrideHolder::Role(id)).is_some());
        assert!(channel.override_for(OverrideHolder::Member(id)).is_some());
        assert!(channel.override_for(OverrideHolder::Role(Uuid::new_v4())).is_none());
    }

    // === Serde Tests ===

    #[test]
    fn test_guild_snapshot_deserialize_validates() {
        let guild_id = Uuid::new_v4();
        let json = serde_json::json!({
            "id": guild_id,
            "owner_id": Uuid::new_v4(),
            "roles": [{
                "id": Uuid::new_v4(),
                "guild_id": guild_id,
                "name": "Member",
                "permissions": 2048,
                "position": 0,
                "sequence": 1
            }]
        });

        let result: Result<GuildSnapshot, _> = serde_json::from_value(json);
        assert!(result.is_err(), "snapshot without a public role must not deserialize");
    }

    #[test]
    fn test_guild_snapshot_serde_roundtrip() {
        let guild_id = Uuid::new_v4();
        let role = Role::new(Uuid::new_v4(), guild_id, "Mod", GuildPermissions::KICK_MEMBERS, 3)
            .with_managed(true);
        let guild =
            GuildSnapshot::new(guild_id, Uuid::new_v4(), vec![public_role(guild_id), role]).unwrap();

        let json = serde_json::to_string(&guild).unwrap();
        let restored: GuildSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.roles(), guild.roles());
        assert_eq!(restored.owner_id(), guild.owner_id());
    }

    #[test]
    fn test_role_without_sequence_reads_it_from_id() {
        let ts = uuid::Timestamp::from_unix(uuid::NoContext, 1_650_000_000, 0);
        let id = Uuid::new_v7(ts);
        let json = serde_json::json!({
            "id": id,
            "guild_id": Uuid::new_v4(),
            "name": "Veteran",
            "permissions": 2048,
            "position": 2
        });

        let role: Role = serde_json::from_value(json).unwrap();
        assert_eq!(role.sequence, 1_650_000_000_000);
        assert_eq!(role.permissions, GuildPermissions::SEND_MESSAGES);
        assert!(!role.managed);
        assert!(!role.is_public);
    }

    #[test]
    fn test_role_explicit_sequence_wins_over_id() {
        let ts = uuid::Timestamp::from_unix(uuid::NoContext, 1_650_000_000, 0);
        let json = serde_json::json!({
            "id": Uuid::new_v7(ts),
            "guild_id": Uuid::new_v4(),
            "name": "Imported",
            "permissions": 0,
            "position": 0,
            "sequence": 7
        });

        let role: Role = serde_json::from_value(json).unwrap();
        assert_eq!(role.sequence, 7);
    }
}

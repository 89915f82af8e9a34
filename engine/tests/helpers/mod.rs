//! Shared fixtures for integration tests.

#![allow(dead_code)]

use guild_perms::permissions::{
    ChannelSnapshot, GuildPermissions, GuildSnapshot, MemberSnapshot, OverrideHolder,
    PermissionOverride, Role,
};
use uuid::Uuid;

/// Guild with the roles `[Public(-1, 0), Member(0, SEND), Mod(1, SEND|KICK)]`.
pub struct TestGuild {
    pub guild: GuildSnapshot,
    pub member_role: Role,
    pub mod_role: Role,
}

impl TestGuild {
    pub fn new() -> Self {
        Self::with_extra_roles(|_| Vec::new())
    }

    /// Build the standard guild plus whatever `extra` returns for its id.
    pub fn with_extra_roles(extra: impl FnOnce(Uuid) -> Vec<Role>) -> Self {
        let guild_id = Uuid::new_v4();
        let member_role = Role::new(
            Uuid::new_v4(),
            guild_id,
            "Member",
            GuildPermissions::SEND_MESSAGES,
            0,
        )
        .with_sequence(10);
        let mod_role = Role::new(
            Uuid::new_v4(),
            guild_id,
            "Mod",
            GuildPermissions::SEND_MESSAGES | GuildPermissions::KICK_MEMBERS,
            1,
        )
        .with_sequence(20);

        let mut roles = vec![
            Role::public(guild_id, GuildPermissions::empty()),
            member_role.clone(),
            mod_role.clone(),
        ];
        roles.extend(extra(guild_id));

        let guild = GuildSnapshot::new(guild_id, Uuid::new_v4(), roles)
            .expect("Failed to build test guild - check role invariants");

        Self {
            guild,
            member_role,
            mod_role,
        }
    }

    pub fn id(&self) -> Uuid {
        self.guild.id()
    }

    pub fn member(&self, role_ids: &[Uuid]) -> MemberSnapshot {
        MemberSnapshot::new(self.id(), Uuid::new_v4(), role_ids.iter().copied())
    }

    pub fn owner(&self) -> MemberSnapshot {
        MemberSnapshot::new(self.id(), self.guild.owner_id(), std::iter::empty())
    }

    pub fn channel(&self, overrides: Vec<PermissionOverride>) -> ChannelSnapshot {
        ChannelSnapshot::new(Uuid::new_v4(), self.id(), overrides)
            .expect("Failed to build test channel - duplicate override holder")
    }
}

pub fn role_override(role_id: Uuid, allow: GuildPermissions, deny: GuildPermissions) -> PermissionOverride {
    PermissionOverride::new(OverrideHolder::Role(role_id), allow, deny)
        .expect("Override masks must be disjoint")
}

pub fn member_override(user_id: Uuid, allow: GuildPermissions, deny: GuildPermissions) -> PermissionOverride {
    PermissionOverride::new(OverrideHolder::Member(user_id), allow, deny)
        .expect("Override masks must be disjoint")
}

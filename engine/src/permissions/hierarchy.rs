//! Role hierarchy ordering.
//!
//! Roles are ranked by position (higher is more senior). Ties on position
//! are broken by creation order: the role created first ranks higher. The
//! public role sits below every explicit role.

use std::cmp::Ordering;

use uuid::Uuid;

use super::models::{GuildSnapshot, MemberSnapshot, Role};
use super::resolver::PermissionError;

/// Position sentinel of the public role.
pub const PUBLIC_ROLE_POSITION: i32 = -1;

/// Derive a creation-order sequence value from a time-ordered id.
///
/// Returns the millisecond Unix timestamp embedded in a v7 id, and `0` for
/// every other version. Gregorian v1/v6 timestamps can predate the Unix
/// epoch and do not convert to a meaningful creation order.
#[must_use]
pub fn sequence_from_id(id: &Uuid) -> u64 {
    if id.get_version() != Some(uuid::Version::SortRand) {
        return 0;
    }
    id.get_timestamp()
        .map(|ts| {
            let (secs, nanos) = ts.to_unix();
            secs * 1000 + u64::from(nanos) / 1_000_000
        })
        .unwrap_or(0)
}

/// Compare two roles of the same guild.
///
/// `Greater` means `a` is senior to `b`. Comparing roles from different
/// guilds is rejected.
pub fn compare_hierarchy(a: &Role, b: &Role) -> Result<Ordering, PermissionError> {
    if a.guild_id != b.guild_id {
        tracing::warn!(
            left_guild = %a.guild_id,
            right_guild = %b.guild_id,
            "Refusing to compare roles across guilds"
        );
        return Err(PermissionError::GuildMismatch {
            expected: a.guild_id,
            found: b.guild_id,
        });
    }

    Ok(precedence(a, b))
}

/// Ordering used once both roles are known to share a guild.
pub(crate) fn precedence(a: &Role, b: &Role) -> Ordering {
    if a.id == b.id {
        return Ordering::Equal;
    }

    match (a.is_public, b.is_public) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (true, true) => return Ordering::Equal,
        (false, false) => {}
    }

    a.position
        .cmp(&b.position)
        // Older role wins a position tie
        .then_with(|| b.sequence.cmp(&a.sequence))
        .then_with(|| b.id.cmp(&a.id))
}

/// The member's most senior role, or the public role if they have none.
pub fn highest_role<'g>(
    guild: &'g GuildSnapshot,
    member: &MemberSnapshot,
) -> Result<&'g Role, PermissionError> {
    let roles = guild.member_roles(member)?;

    Ok(roles
        .into_iter()
        .max_by(|a, b| precedence(a, b))
        .unwrap_or_else(|| guild.public_role()))
}

/// All roles of a guild, most senior first. The public role is last.
#[must_use]
pub fn sorted_roles(guild: &GuildSnapshot) -> Vec<&Role> {
    let mut roles: Vec<&Role> = guild.roles().iter().collect();
    roles.sort_by(|a, b| precedence(b, a));
    roles
}

//! Guild-level permissions using bitflags.
//!
//! Bit offsets follow the platform's documented permission table, so raw
//! masks handed over by the gateway or REST layer can be used unchanged:
//! - General (bits 0-9): Invites, moderation, guild management
//! - Text (bits 10-19): Channel visibility and messaging
//! - Voice (bits 20-25): Voice channel permissions
//! - Administration (bits 26-34): Nicknames, roles, webhooks, events
//! - Threads and activities (bits 35-40)

use bitflags::bitflags;

bitflags! {
    /// Guild permissions represented as a 64-bit bitfield.
    ///
    /// Unknown bits are never retained: every constructor that accepts a raw
    /// mask truncates it to the defined table.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    #[serde(transparent)]
    pub struct GuildPermissions: u64 {
        // === General (bits 0-9) ===
        /// Permission to create invite links
        const CREATE_INSTANT_INVITE = 1 << 0;
        /// Permission to kick members from the guild
        const KICK_MEMBERS          = 1 << 1;
        /// Permission to ban members from the guild
        const BAN_MEMBERS           = 1 << 2;
        /// Grants every permission and bypasses channel overrides
        const ADMINISTRATOR         = 1 << 3;
        /// Permission to create, edit, and delete channels
        const MANAGE_CHANNELS       = 1 << 4;
        /// Permission to modify guild settings
        const MANAGE_GUILD          = 1 << 5;
        /// Permission to add reactions to messages
        const ADD_REACTIONS         = 1 << 6;
        /// Permission to view the guild audit log
        const VIEW_AUDIT_LOG        = 1 << 7;
        /// Permission to be heard over other speakers
        const PRIORITY_SPEAKER      = 1 << 8;
        /// Permission to stream video in voice channels
        const STREAM                = 1 << 9;

        // === Text (bits 10-19) ===
        /// Permission to view a channel and read it
        const VIEW_CHANNEL          = 1 << 10;
        /// Permission to send text messages in channels
        const SEND_MESSAGES         = 1 << 11;
        /// Permission to send text-to-speech messages
        const SEND_TTS_MESSAGES     = 1 << 12;
        /// Permission to delete and pin messages from other members
        const MANAGE_MESSAGES       = 1 << 13;
        /// Permission to embed links in messages (auto-preview)
        const EMBED_LINKS           = 1 << 14;
        /// Permission to attach files to messages
        const ATTACH_FILES          = 1 << 15;
        /// Permission to read the message history of a channel
        const READ_MESSAGE_HISTORY  = 1 << 16;
        /// Permission to mention @everyone and @here
        const MENTION_EVERYONE      = 1 << 17;
        /// Permission to use emoji from other guilds
        const USE_EXTERNAL_EMOJIS   = 1 << 18;
        /// Permission to view guild insights
        const VIEW_GUILD_INSIGHTS   = 1 << 19;

        // === Voice (bits 20-25) ===
        /// Permission to connect to voice channels
        const CONNECT               = 1 << 20;
        /// Permission to speak in voice channels
        const SPEAK                 = 1 << 21;
        /// Permission to mute other members in voice channels
        const MUTE_MEMBERS          = 1 << 22;
        /// Permission to deafen other members in voice channels
        const DEAFEN_MEMBERS        = 1 << 23;
        /// Permission to move members between voice channels
        const MOVE_MEMBERS          = 1 << 24;
        /// Permission to use voice activity detection
        const USE_VAD               = 1 << 25;

        // === Administration (bits 26-34) ===
        /// Permission to change one's own nickname
        const CHANGE_NICKNAME       = 1 << 26;
        /// Permission to change other members' nicknames
        const MANAGE_NICKNAMES      = 1 << 27;
        /// Permission to create, edit, and delete roles
        const MANAGE_ROLES          = 1 << 28;
        /// Permission to create, edit, and delete webhooks
        const MANAGE_WEBHOOKS       = 1 << 29;
        /// Permission to manage custom emoji and stickers
        const MANAGE_EMOJIS_AND_STICKERS = 1 << 30;
        /// Permission to invoke application commands
        const USE_APPLICATION_COMMANDS = 1 << 31;
        /// Permission to request to speak in stage channels
        const REQUEST_TO_SPEAK      = 1 << 32;
        /// Permission to create and edit scheduled events
        const MANAGE_EVENTS         = 1 << 33;
        /// Permission to archive, lock, and delete threads
        const MANAGE_THREADS        = 1 << 34;

        // === Threads and activities (bits 35-40) ===
        /// Permission to create public threads
        const CREATE_PUBLIC_THREADS = 1 << 35;
        /// Permission to create private threads
        const CREATE_PRIVATE_THREADS = 1 << 36;
        /// Permission to use stickers from other guilds
        const USE_EXTERNAL_STICKERS = 1 << 37;
        /// Permission to send messages inside threads
        const SEND_MESSAGES_IN_THREADS = 1 << 38;
        /// Permission to launch embedded activities
        const USE_EMBEDDED_ACTIVITIES = 1 << 39;
        /// Permission to time out members
        const MODERATE_MEMBERS      = 1 << 40;
    }
}

impl GuildPermissions {
    // === Preset Combinations ===

    /// Permissions a freshly created public role carries.
    pub const PUBLIC_DEFAULT: Self = Self::CREATE_INSTANT_INVITE
        .union(Self::ADD_REACTIONS)
        .union(Self::STREAM)
        .union(Self::VIEW_CHANNEL)
        .union(Self::SEND_MESSAGES)
        .union(Self::EMBED_LINKS)
        .union(Self::ATTACH_FILES)
        .union(Self::READ_MESSAGE_HISTORY)
        .union(Self::USE_EXTERNAL_EMOJIS)
        .union(Self::CONNECT)
        .union(Self::SPEAK)
        .union(Self::USE_VAD)
        .union(Self::CHANGE_NICKNAME)
        .union(Self::USE_APPLICATION_COMMANDS)
        .union(Self::CREATE_PUBLIC_THREADS)
        .union(Self::SEND_MESSAGES_IN_THREADS);

    /// Every permission that only has meaning inside a text channel.
    pub const ALL_TEXT: Self = Self::SEND_MESSAGES
        .union(Self::SEND_TTS_MESSAGES)
        .union(Self::MANAGE_MESSAGES)
        .union(Self::EMBED_LINKS)
        .union(Self::ATTACH_FILES)
        .union(Self::READ_MESSAGE_HISTORY)
        .union(Self::MENTION_EVERYONE)
        .union(Self::USE_EXTERNAL_EMOJIS)
        .union(Self::ADD_REACTIONS)
        .union(Self::MANAGE_THREADS)
        .union(Self::CREATE_PUBLIC_THREADS)
        .union(Self::CREATE_PRIVATE_THREADS)
        .union(Self::USE_EXTERNAL_STICKERS)
        .union(Self::SEND_MESSAGES_IN_THREADS);

    /// Every permission that only has meaning inside a voice channel.
    pub const ALL_VOICE: Self = Self::CONNECT
        .union(Self::SPEAK)
        .union(Self::MUTE_MEMBERS)
        .union(Self::DEAFEN_MEMBERS)
        .union(Self::MOVE_MEMBERS)
        .union(Self::USE_VAD)
        .union(Self::PRIORITY_SPEAKER)
        .union(Self::STREAM)
        .union(Self::REQUEST_TO_SPEAK)
        .union(Self::USE_EMBEDDED_ACTIVITIES);

    /// Permissions the public role can NEVER have.
    ///
    /// Used for validation when the public role is edited.
    pub const PUBLIC_FORBIDDEN: Self = Self::ADMINISTRATOR
        .union(Self::KICK_MEMBERS)
        .union(Self::BAN_MEMBERS)
        .union(Self::MANAGE_CHANNELS)
        .union(Self::MANAGE_GUILD)
        .union(Self::VIEW_AUDIT_LOG)
        .union(Self::VIEW_GUILD_INSIGHTS)
        .union(Self::MANAGE_MESSAGES)
        .union(Self::MENTION_EVERYONE)
        .union(Self::MUTE_MEMBERS)
        .union(Self::DEAFEN_MEMBERS)
        .union(Self::MOVE_MEMBERS)
        .union(Self::MANAGE_NICKNAMES)
        .union(Self::MANAGE_ROLES)
        .union(Self::MANAGE_WEBHOOKS)
        .union(Self::MANAGE_EMOJIS_AND_STICKERS)
        .union(Self::MANAGE_EVENTS)
        .union(Self::MANAGE_THREADS)
        .union(Self::MODERATE_MEMBERS);

    // === Raw Conversion ===

    /// Create permissions from a raw 64-bit mask.
    ///
    /// Bits outside the defined table are silently dropped so that masks
    /// carrying permissions introduced after this build still resolve.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self::from_bits_truncate(raw)
    }

    /// The raw 64-bit mask.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.bits()
    }

    /// Split a raw mask into the individual permissions it grants.
    ///
    /// # Examples
    ///
    /// ```
    /// use guild_perms::permissions::GuildPermissions;
    ///
    /// let set = GuildPermissions::to_set((1 << 11) | (1 << 1) | (1 << 62));
    /// assert_eq!(set, vec![GuildPermissions::KICK_MEMBERS, GuildPermissions::SEND_MESSAGES]);
    /// ```
    #[must_use]
    pub fn to_set(raw: u64) -> Vec<Self> {
        Self::from_raw(raw).iter().collect()
    }

    /// Combine individual permissions back into a raw mask.
    ///
    /// An empty input yields `0`.
    pub fn to_raw<I>(permissions: I) -> u64
    where
        I: IntoIterator<Item = Self>,
    {
        permissions
            .into_iter()
            .fold(0, |acc, permission| acc | permission.bits())
    }

    /// True if every bit of `required` is present in `raw`.
    #[must_use]
    pub const fn contains_raw(raw: u64, required: u64) -> bool {
        raw & required == required
    }

    // === Permission Checking ===

    /// Check if this permission set includes the specified permission(s).
    ///
    /// # Examples
    ///
    /// ```
    /// use guild_perms::permissions::GuildPermissions;
    ///
    /// let perms = GuildPermissions::SEND_MESSAGES | GuildPermissions::CONNECT;
    /// assert!(perms.has(GuildPermissions::SEND_MESSAGES));
    /// assert!(!perms.has(GuildPermissions::BAN_MEMBERS));
    /// ```
    #[must_use]
    pub const fn has(self, permission: Self) -> bool {
        self.contains(permission)
    }

    /// Clear `denied`, then set `allowed`.
    ///
    /// Allowed bits win over denied bits passed in the same call.
    #[must_use]
    pub const fn apply_override(self, denied: Self, allowed: Self) -> Self {
        self.difference(denied).union(allowed)
    }

    /// Validate that these permissions are safe for the public role.
    ///
    /// Returns `true` if none of the forbidden permissions are present.
    #[must_use]
    pub const fn validate_for_public(self) -> bool {
        !self.intersects(Self::PUBLIC_FORBIDDEN)
    }

    /// Bit offset of a single permission.
    ///
    /// Returns `None` for empty sets and for sets holding more than one
    /// permission.
    #[must_use]
    pub const fn offset(self) -> Option<u32> {
        if self.bits().count_ones() == 1 {
            Some(self.bits().trailing_zeros())
        } else {
            None
        }
    }

    /// Names of the permissions in this set, lowest bit first.
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

impl Default for GuildPermissions {
    fn default() -> Self {
        Self::empty()
    }
}

/// Serde adapter that stores permissions as a raw integer mask.
///
/// The derived serde form uses flag names; snapshots exchanged with the
/// platform carry integers instead.
pub mod raw_mask {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::GuildPermissions;

    pub fn serialize<S>(permissions: &GuildPermissions, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(permissions.raw())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<GuildPermissions, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(GuildPermissions::from_raw)
    }
}

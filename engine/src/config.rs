//! Inspection Configuration
//!
//! Loads configuration from environment variables.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable multi-line output
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// JSON file holding the guild, member and channel snapshots
    pub snapshot_path: PathBuf,

    /// User whose permissions are inspected
    pub member_id: Uuid,

    /// Channel scope (optional, guild scope when unset)
    pub channel_id: Option<Uuid>,

    /// Log output format (default: json)
    pub log_format: LogFormat,

    /// `EnvFilter` directives (default: `guild_perms=info`)
    pub log_filter: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            snapshot_path: env::var("SNAPSHOT_PATH")
                .context("SNAPSHOT_PATH must be set")?
                .into(),
            member_id: env::var("MEMBER_ID")
                .context("MEMBER_ID must be set")?
                .parse()
                .context("MEMBER_ID must be a UUID")?,
            channel_id: env::var("CHANNEL_ID")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.parse())
                .transpose()
                .context("CHANNEL_ID must be a UUID")?,
            log_format: env::var("LOG_FORMAT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            log_filter: env::var("RUST_LOG").unwrap_or_else(|_| "guild_perms=info".into()),
        })
    }

    /// Create a default configuration for testing.
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            snapshot_path: "snapshot.json".into(),
            member_id: Uuid::nil(),
            channel_id: None,
            log_format: LogFormat::Pretty,
            log_filter: "guild_perms=debug".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 5] = ["SNAPSHOT_PATH", "MEMBER_ID", "CHANNEL_ID", "LOG_FORMAT", "RUST_LOG"];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!(" Pretty ".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_default_for_test_filter_is_valid() {
        let config = Config::default_for_test();

        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(tracing_subscriber::EnvFilter::try_new(&config.log_filter).is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let member_id = Uuid::new_v4();
        env::set_var("SNAPSHOT_PATH", "/tmp/guild.json");
        env::set_var("MEMBER_ID", member_id.to_string());

        let config = Config::from_env().unwrap();

        assert_eq!(config.snapshot_path, PathBuf::from("/tmp/guild.json"));
        assert_eq!(config.member_id, member_id);
        assert_eq!(config.channel_id, None);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_filter, "guild_perms=info");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_with_channel() {
        clear_env();
        let channel_id = Uuid::new_v4();
        env::set_var("SNAPSHOT_PATH", "guild.json");
        env::set_var("MEMBER_ID", Uuid::new_v4().to_string());
        env::set_var("CHANNEL_ID", channel_id.to_string());
        env::set_var("LOG_FORMAT", "pretty");

        let config = Config::from_env().unwrap();

        assert_eq!(config.channel_id, Some(channel_id));
        assert_eq!(config.log_format, LogFormat::Pretty);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_missing_snapshot_path() {
        clear_env();
        env::set_var("MEMBER_ID", Uuid::new_v4().to_string());

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("SNAPSHOT_PATH"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_member_id() {
        clear_env();
        env::set_var("SNAPSHOT_PATH", "guild.json");
        env::set_var("MEMBER_ID", "not-a-uuid");

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("MEMBER_ID must be a UUID"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_unknown_log_format_falls_back_to_json() {
        clear_env();
        env::set_var("SNAPSHOT_PATH", "guild.json");
        env::set_var("MEMBER_ID", Uuid::new_v4().to_string());
        env::set_var("LOG_FORMAT", "xml");

        assert_eq!(Config::from_env().unwrap().log_format, LogFormat::Json);

        clear_env();
    }
}

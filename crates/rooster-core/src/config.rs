//! Rooster configuration system.
//!
//! Loaded once at startup from a TOML file. `validate()` enforces the
//! boot-time contract: an empty message catalog, an empty schedule, or a
//! missing bot token refuse to start rather than run half-configured.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, RoosterError};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RoosterConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
    #[serde(default)]
    pub schedule: Vec<FireTimeConfig>,
    #[serde(default)]
    pub admin: AdminConfig,
}

impl RoosterConfig {
    /// Load config from the default path (~/.rooster/config.toml).
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RoosterError::Config(format!("failed to read {}: {e}", path.display())))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| RoosterError::Config(format!("failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Rooster home directory (~/.rooster).
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".rooster")
    }

    /// Enforce the boot-time contract. Any failure here is fatal — the
    /// process must refuse to start rather than serve partially configured.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(RoosterError::Config("telegram.bot_token is not set".into()));
        }
        if self.broadcast.messages.is_empty() {
            return Err(RoosterError::Config(
                "broadcast.messages is empty — need at least one message".into(),
            ));
        }
        if self.broadcast.messages.iter().any(|m| m.trim().is_empty()) {
            return Err(RoosterError::Config(
                "broadcast.messages contains an empty string".into(),
            ));
        }
        if self.schedule.is_empty() {
            return Err(RoosterError::Config(
                "schedule is empty — need at least one fire time".into(),
            ));
        }
        for fire in &self.schedule {
            if fire.hour > 23 || fire.minute > 59 {
                return Err(RoosterError::Config(format!(
                    "invalid fire time {:02}:{:02}",
                    fire.hour, fire.minute
                )));
            }
        }
        if self.broadcast.max_in_flight == 0 {
            return Err(RoosterError::Config("broadcast.max_in_flight must be > 0".into()));
        }
        self.broadcast.utc_offset()?;
        Ok(())
    }
}

/// Telegram transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

fn default_poll_interval() -> u64 {
    1
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            poll_interval: default_poll_interval(),
        }
    }
}

/// Subscriber directory storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_db_path() -> PathBuf {
    RoosterConfig::home_dir().join("subscribers.db")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Broadcast content and fan-out configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Message catalog — one is picked uniformly at random per pass.
    #[serde(default)]
    pub messages: Vec<String>,
    /// Topic for image enrichment lookups.
    #[serde(default = "default_image_topic")]
    pub image_topic: String,
    /// Image search API key. Empty disables enrichment entirely.
    #[serde(default)]
    pub image_api_key: String,
    /// Bounded fan-out: max simultaneous in-flight sends per pass.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Fixed broadcast timezone as a UTC offset, e.g. "+03:00".
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

fn default_image_topic() -> String {
    "morning".into()
}
fn default_max_in_flight() -> usize {
    8
}
fn default_utc_offset() -> String {
    "+00:00".into()
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            image_topic: default_image_topic(),
            image_api_key: String::new(),
            max_in_flight: default_max_in_flight(),
            utc_offset: default_utc_offset(),
        }
    }
}

impl BroadcastConfig {
    /// Parse the configured offset into a `chrono::FixedOffset`.
    pub fn utc_offset(&self) -> Result<FixedOffset> {
        parse_utc_offset(&self.utc_offset)
    }
}

/// A scheduled fire time, wall clock in the configured offset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FireTimeConfig {
    pub hour: u32,
    pub minute: u32,
}

/// Admin / subscribe-flow configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdminConfig {
    /// Password gating the subscribe flow. Empty means no gate.
    #[serde(default)]
    pub password: String,
}

/// Parse "+HH:MM" / "-HH:MM" into a `FixedOffset`.
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset> {
    let err = || RoosterError::Config(format!("invalid utc_offset '{s}' (expected \"+HH:MM\")"));

    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1i32, &s[1..]),
        Some(b'-') => (-1i32, &s[1..]),
        _ => return Err(err()),
    };
    let (h, m) = rest.split_once(':').ok_or_else(err)?;
    let hours: i32 = h.parse().map_err(|_| err())?;
    let minutes: i32 = m.parse().map_err(|_| err())?;
    if hours > 23 || minutes > 59 {
        return Err(err());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> RoosterConfig {
        toml::from_str(
            r#"
            [telegram]
            bot_token = "123:abc"

            [broadcast]
            messages = ["good morning"]

            [[schedule]]
            hour = 8
            minute = 0
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_minimal_config_validates() {
        assert!(minimal_config().validate().is_ok());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = minimal_config();
        assert_eq!(config.telegram.poll_interval, 1);
        assert_eq!(config.broadcast.max_in_flight, 8);
        assert_eq!(config.broadcast.utc_offset, "+00:00");
    }

    #[test]
    fn test_empty_catalog_is_fatal() {
        let mut config = minimal_config();
        config.broadcast.messages.clear();
        assert!(matches!(
            config.validate(),
            Err(RoosterError::Config(_))
        ));
    }

    #[test]
    fn test_empty_schedule_is_fatal() {
        let mut config = minimal_config();
        config.schedule.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_range_fire_time_is_fatal() {
        let mut config = minimal_config();
        config.schedule.push(FireTimeConfig { hour: 24, minute: 0 });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(
            parse_utc_offset("+03:00").unwrap(),
            FixedOffset::east_opt(3 * 3600).unwrap()
        );
        assert_eq!(
            parse_utc_offset("-05:30").unwrap(),
            FixedOffset::west_opt(5 * 3600 + 30 * 60).unwrap()
        );
        assert!(parse_utc_offset("03:00").is_err());
        assert!(parse_utc_offset("+25:00").is_err());
        assert!(parse_utc_offset("garbage").is_err());
    }
}

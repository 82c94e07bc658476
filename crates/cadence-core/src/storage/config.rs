//! TOML-based configuration.
//!
//! Stores cadence tuning:
//! - Cooldown length per track
//! - Selfie track capacity
//! - Notice dwell time
//! - Optional prompt/action table files
//! - Display offset for grouping entries by date
//!
//! Configuration is stored at `~/.config/cadence/config.toml`.

use chrono::{Duration, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::cadence::CadenceGate;
use crate::error::ConfigError;
use crate::track::Track;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooldownConfig {
    #[serde(default = "default_daily_hours")]
    pub growth_hours: u32,
    #[serde(default = "default_weekly_hours")]
    pub weekly_hours: u32,
    #[serde(default = "default_daily_hours")]
    pub selfie_hours: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfieConfig {
    #[serde(default = "default_selfie_capacity")]
    pub capacity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticeConfig {
    /// Seconds the prominent notice stays up before collapsing.
    #[serde(default = "default_dwell_secs")]
    pub dwell_secs: u32,
}

/// External table files. Unset paths use the built-in tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptsConfig {
    #[serde(default)]
    pub growth_path: Option<PathBuf>,
    #[serde(default)]
    pub weekly_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Offset from UTC used when grouping entries by calendar date.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/cadence/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cooldowns: CooldownConfig,
    #[serde(default)]
    pub selfie: SelfieConfig,
    #[serde(default)]
    pub notice: NoticeConfig,
    #[serde(default)]
    pub prompts: PromptsConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

fn default_daily_hours() -> u32 {
    24
}
fn default_weekly_hours() -> u32 {
    7 * 24
}
fn default_selfie_capacity() -> u32 {
    100
}
fn default_dwell_secs() -> u32 {
    5
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            growth_hours: default_daily_hours(),
            weekly_hours: default_weekly_hours(),
            selfie_hours: default_daily_hours(),
        }
    }
}

impl Default for SelfieConfig {
    fn default() -> Self {
        Self {
            capacity: default_selfie_capacity(),
        }
    }
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            dwell_secs: default_dwell_secs(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        if let Some(parent_path) = parent_path {
            for part in parent_path.split('.') {
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }

        let obj = current.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => {
                let n = value
                    .parse::<i64>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as integer")))?;
                serde_json::Value::Number(n.into())
            }
            // Unset optional paths serialize as null.
            serde_json::Value::Null if value.is_empty() || value == "none" => serde_json::Value::Null,
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if nothing is there.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit file, writing defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Reject values that would make the gate meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let zero = |key: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be greater than zero".into(),
        };
        if self.cooldowns.growth_hours == 0 {
            return Err(zero("cooldowns.growth_hours"));
        }
        if self.cooldowns.weekly_hours == 0 {
            return Err(zero("cooldowns.weekly_hours"));
        }
        if self.cooldowns.selfie_hours == 0 {
            return Err(zero("cooldowns.selfie_hours"));
        }
        if self.selfie.capacity == 0 {
            return Err(zero("selfie.capacity"));
        }
        if offset_from_minutes(self.display.utc_offset_minutes).is_none() {
            return Err(ConfigError::InvalidValue {
                key: "display.utc_offset_minutes".into(),
                message: "offset must be within ±24h".into(),
            });
        }
        Ok(())
    }

    pub fn cooldown(&self, track: Track) -> Duration {
        let hours = match track {
            Track::Growth => self.cooldowns.growth_hours,
            Track::Weekly => self.cooldowns.weekly_hours,
            Track::Selfie => self.cooldowns.selfie_hours,
        };
        Duration::hours(i64::from(hours))
    }

    pub fn capacity(&self, track: Track) -> Option<u32> {
        match track {
            Track::Selfie => Some(self.selfie.capacity),
            Track::Growth | Track::Weekly => None,
        }
    }

    /// Gate configured for `track`.
    pub fn gate(&self, track: Track) -> CadenceGate {
        CadenceGate::new(self.cooldown(track), self.capacity(track))
    }

    pub fn notice_dwell(&self) -> Duration {
        Duration::seconds(i64::from(self.notice.dwell_secs))
    }

    pub fn display_offset(&self) -> FixedOffset {
        offset_from_minutes(self.display.utc_offset_minutes).unwrap_or_else(|| Utc.fix())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes.checked_mul(60).and_then(FixedOffset::east_opt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.cooldowns.weekly_hours, 168);
        assert_eq!(parsed.selfie.capacity, 100);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[cooldowns]\ngrowth_hours = 12\n").unwrap();
        assert_eq!(parsed.cooldowns.growth_hours, 12);
        assert_eq!(parsed.cooldowns.selfie_hours, 24);
        assert_eq!(parsed.notice.dwell_secs, 5);
    }

    #[test]
    fn gates_follow_config() {
        let mut cfg = Config::default();
        cfg.cooldowns.growth_hours = 12;
        assert_eq!(cfg.gate(Track::Growth).cooldown(), Duration::hours(12));
        assert_eq!(cfg.gate(Track::Weekly).cooldown(), Duration::days(7));
        assert_eq!(cfg.gate(Track::Selfie).capacity(), Some(100));
        assert_eq!(cfg.gate(Track::Weekly).capacity(), None);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("cooldowns.growth_hours").as_deref(), Some("24"));
        assert_eq!(cfg.get("notice.dwell_secs").as_deref(), Some("5"));
        assert!(cfg.get("cooldowns.missing").is_none());
    }

    #[test]
    fn set_updates_nested_number() {
        let mut cfg = Config::default();
        cfg.set("selfie.capacity", "30").unwrap();
        assert_eq!(cfg.selfie.capacity, 30);
    }

    #[test]
    fn set_updates_optional_path() {
        let mut cfg = Config::default();
        cfg.set("prompts.growth_path", "/tmp/prompts.json").unwrap();
        assert_eq!(cfg.prompts.growth_path, Some(PathBuf::from("/tmp/prompts.json")));
        cfg.set("prompts.growth_path", "none").unwrap();
        assert_eq!(cfg.prompts.growth_path, None);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(cfg.set("cooldowns.monthly_hours", "1"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_invalid_type_and_zero() {
        let mut cfg = Config::default();
        assert!(cfg.set("cooldowns.growth_hours", "soon").is_err());
        assert!(cfg.set("cooldowns.growth_hours", "0").is_err());
        assert_eq!(cfg.cooldowns.growth_hours, 24);
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.selfie.capacity, 100);
        assert!(path.exists());
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "cooldowns = 3").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::LoadFailed { .. })));
    }

    #[test]
    fn display_offset_from_minutes() {
        let mut cfg = Config::default();
        cfg.display.utc_offset_minutes = -300;
        assert_eq!(cfg.display_offset().local_minus_utc(), -300 * 60);
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("display.utc_offset_minutes", "50000000"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.set("display.utc_offset_minutes", "1440").is_err());
        assert!(cfg.set("display.utc_offset_minutes", "-1439").is_ok());

        cfg.display.utc_offset_minutes = i32::MAX;
        assert_eq!(cfg.display_offset().local_minus_utc(), 0);
    }
}

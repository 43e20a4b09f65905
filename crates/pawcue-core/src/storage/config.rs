//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Default reminder session shape and tick rate
//! - Notification preferences (tone backend, pitches, vibration)
//!
//! Configuration is stored at `~/.config/pawcue/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::error::ConfigError;
use crate::notify::ToneBackendKind;
use crate::reminder::{derive_field, PlanField, PlanInputs, ScheduleConfiguration};

/// Default session shape used when the CLI is not given explicit values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_total_time")]
    pub total_time_secs: f64,
    #[serde(default = "default_avg_duration")]
    pub avg_duration_secs: f64,
    /// `0` derives the count from total time and average duration.
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub max_interval_secs: f64,
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub tone_backend: ToneBackendKind,
    #[serde(default = "default_true")]
    pub vibration: bool,
    #[serde(default = "default_start_tone_hz")]
    pub start_tone_hz: f32,
    #[serde(default = "default_start_tone_ms")]
    pub start_tone_ms: u64,
    #[serde(default = "default_end_tone_hz")]
    pub end_tone_hz: f32,
    #[serde(default = "default_end_tone_ms")]
    pub end_tone_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pawcue/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub reminder: ReminderConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

// Default functions
fn default_total_time() -> f64 {
    300.0
}
fn default_avg_duration() -> f64 {
    5.0
}
fn default_tick_interval() -> u64 {
    200
}
fn default_true() -> bool {
    true
}
fn default_start_tone_hz() -> f32 {
    880.0
}
fn default_start_tone_ms() -> u64 {
    200
}
fn default_end_tone_hz() -> f32 {
    440.0
}
fn default_end_tone_ms() -> u64 {
    300
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            total_time_secs: default_total_time(),
            avg_duration_secs: default_avg_duration(),
            count: 0,
            max_interval_secs: 0.0,
            tick_interval_ms: default_tick_interval(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tone_backend: ToneBackendKind::default(),
            vibration: true,
            start_tone_hz: default_start_tone_hz(),
            start_tone_ms: default_start_tone_ms(),
            end_tone_hz: default_end_tone_hz(),
            end_tone_ms: default_end_tone_ms(),
        }
    }
}

impl ReminderConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// The configured session shape, deriving the count when it is `0`.
    pub fn schedule_configuration(&self) -> ScheduleConfiguration {
        let mut count = self.count;
        if count == 0 {
            let inputs = PlanInputs {
                total_time_secs: self.total_time_secs,
                avg_duration_secs: self.avg_duration_secs,
                count: 0,
                max_interval_secs: self.max_interval_secs,
            };
            count = derive_field(&inputs, Some(PlanField::TotalTime))
                .and_then(|d| d.as_count())
                .unwrap_or(0);
        }
        ScheduleConfiguration::new(self.total_time_secs, self.avg_duration_secs, count)
            .with_max_interval(self.max_interval_secs)
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

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// `~/.config/pawcue/config.toml`
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if !path.exists() {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            return Ok(cfg);
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
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

    /// Set a config value by dot-separated key, keeping the existing type.
    ///
    /// Does not persist; call [`Config::save`] afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// field.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.reminder.tick_interval_ms, 200);
        assert_eq!(parsed.notifications.start_tone_hz, 880.0);
        assert_eq!(parsed.notifications.tone_backend, ToneBackendKind::Bell);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[reminder]\ncount = 12\n").unwrap();
        assert_eq!(parsed.reminder.count, 12);
        assert_eq!(parsed.reminder.avg_duration_secs, 5.0);
        assert!(parsed.notifications.enabled);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("notifications.vibration").as_deref(), Some("true"));
        assert_eq!(cfg.get("reminder.tick_interval_ms").as_deref(), Some("200"));
        assert_eq!(cfg.get("notifications.tone_backend").as_deref(), Some("bell"));
        assert!(cfg.get("reminder.missing_key").is_none());
    }

    #[test]
    fn set_keeps_field_types() {
        let mut cfg = Config::default();
        cfg.set("notifications.vibration", "false").unwrap();
        cfg.set("reminder.count", "8").unwrap();
        cfg.set("reminder.max_interval_secs", "7.5").unwrap();
        cfg.set("notifications.tone_backend", "silent").unwrap();

        assert!(!cfg.notifications.vibration);
        assert_eq!(cfg.reminder.count, 8);
        assert_eq!(cfg.reminder.max_interval_secs, 7.5);
        assert_eq!(cfg.notifications.tone_backend, ToneBackendKind::Silent);
    }

    #[test]
    fn set_rejects_unknown_and_mistyped() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("reminder.nope", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("notifications.enabled", "maybe"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.set("notifications.tone_backend", "trumpet").is_err());
        assert!(cfg.set("", "1").is_err());
    }

    #[test]
    fn save_and_load_from_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = Config::default();
        cfg.reminder.total_time_secs = 600.0;
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.reminder.total_time_secs, 600.0);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded.reminder.total_time_secs, 300.0);
    }

    #[test]
    fn garbage_file_is_a_load_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "reminder = 3 = 4").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn zero_count_is_derived() {
        let cfg = ReminderConfig::default();
        // 300 / (5 + 5) = 30 repetitions.
        assert_eq!(cfg.schedule_configuration().count, 30);

        let capped = ReminderConfig {
            max_interval_secs: 1.0,
            ..ReminderConfig::default()
        };
        assert_eq!(capped.schedule_configuration().count, 50);
    }
}

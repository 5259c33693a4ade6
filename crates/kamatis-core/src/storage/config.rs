//! TOML-based application settings.
//!
//! A flat key/value record holding:
//! - Period lengths in minutes (`work`, `short_break`, `long_break`)
//! - Cycle length (`cycle`)
//! - Login autostart flag (`autostart`)
//! - Sound choice and recently chosen sound files
//!
//! Settings are stored at `~/.config/kamatis/config.toml`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, CoreError, Result};
use crate::sound::NO_SOUND;

/// Number of recently chosen sound files kept for quick selection.
pub const MAX_RECENT_SOUNDS: usize = 5;

/// Keys whose values must be whole numbers of at least one.
const POSITIVE_KEYS: [&str; 4] = ["work", "short_break", "long_break", "cycle"];

/// Read access to named configuration values.
///
/// The scheduler only ever reads through this trait; writing is the business
/// of whoever owns the store.
pub trait SettingsSource {
    fn get(&self, key: &str) -> Option<String>;

    fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key)?.trim().parse().ok()
    }
}

impl SettingsSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/kamatis/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Work period length in minutes.
    #[serde(default = "default_work")]
    pub work: u32,
    #[serde(default = "default_short_break")]
    pub short_break: u32,
    #[serde(default = "default_long_break")]
    pub long_break: u32,
    /// Short breaks taken before a long break.
    #[serde(default = "default_cycle")]
    pub cycle: u32,
    /// Start with the desktop session.
    #[serde(default = "default_true")]
    pub autostart: bool,
    /// Sound file path, or one of the "no sound" sentinels.
    #[serde(default = "default_chosen_sound")]
    pub chosen_sound: String,
    /// Directory offered when looking for sound files.
    #[serde(default = "default_search_dir")]
    pub search_dir: String,
    /// Most recently chosen sound files, newest first.
    #[serde(default)]
    pub recent_sounds: Vec<String>,
}

fn default_work() -> u32 {
    25
}
fn default_short_break() -> u32 {
    5
}
fn default_long_break() -> u32 {
    15
}
fn default_cycle() -> u32 {
    4
}
fn default_true() -> bool {
    true
}
fn default_chosen_sound() -> String {
    NO_SOUND.into()
}
fn default_search_dir() -> String {
    dirs::audio_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .to_string_lossy()
        .into_owned()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work: default_work(),
            short_break: default_short_break(),
            long_break: default_long_break(),
            cycle: default_cycle(),
            autostart: true,
            chosen_sound: default_chosen_sound(),
            search_dir: default_search_dir(),
            recent_sounds: Vec::new(),
        }
    }
}

impl SettingsSource for Config {
    fn get(&self, key: &str) -> Option<String> {
        Config::get(self, key)
    }
}

impl Config {
    fn set_json_value(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), ConfigError> {
        let obj = root
            .as_object_mut()
            .ok_or_else(|| ConfigError::UnknownKey(key.into()))?;
        let existing = obj
            .get(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.into()))?;

        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.into(),
            message,
        };

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
            ),
            serde_json::Value::Number(_) => {
                let n = value
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?;
                if POSITIVE_KEYS.contains(&key) && n < 1 {
                    return Err(invalid("must be at least 1".into()));
                }
                serde_json::Value::Number(n.into())
            }
            serde_json::Value::Array(_) => {
                serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
            }
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(key.to_string(), new_value);
        Ok(())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from `~/.config/kamatis/config.toml`, writing defaults if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                Ok(cfg)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(err) => Err(CoreError::Io(err)),
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|err| {
            tracing::warn!("Using default settings: {err}");
            Self::default()
        })
    }

    /// Get a value as string. Lists are rendered as JSON.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match json.get(key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by key, coercing it to the type of the current value.
    ///
    /// Period lengths and the cycle length must be at least 1. Does not save.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.into(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// All keys with their string values, in declaration order.
    pub fn entries(&self) -> Vec<(String, String)> {
        const KEYS: [&str; 8] = [
            "work",
            "short_break",
            "long_break",
            "cycle",
            "autostart",
            "chosen_sound",
            "search_dir",
            "recent_sounds",
        ];
        KEYS.iter()
            .filter_map(|k| self.get(k).map(|v| (k.to_string(), v)))
            .collect()
    }

    /// Make `path` the chosen sound.
    ///
    /// Its directory becomes the search directory and it moves to the front of
    /// the recent list, which keeps at most [`MAX_RECENT_SOUNDS`] entries.
    pub fn choose_sound(&mut self, path: &Path) {
        let chosen = path.to_string_lossy().into_owned();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            self.search_dir = dir.to_string_lossy().into_owned();
        }
        self.recent_sounds.retain(|p| *p != chosen);
        self.recent_sounds.insert(0, chosen.clone());
        self.recent_sounds.truncate(MAX_RECENT_SOUNDS);
        self.chosen_sound = chosen;
    }
}

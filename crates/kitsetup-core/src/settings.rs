use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("unknown setting '{0}' (expected one of: {keys})", keys = Settings::KEYS.join(", "))]
    UnknownKey(String),

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Interface theme. Names written by other frontends load as `Other` and are
/// saved back unchanged; `set` only accepts the built-in themes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Other(String),
}

impl From<String> for Theme {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Light" => Theme::Light,
            "Dark" => Theme::Dark,
            _ => Theme::Other(value),
        }
    }
}

impl From<Theme> for String {
    fn from(theme: Theme) -> Self {
        match theme {
            Theme::Other(value) => value,
            known => known.to_string(),
        }
    }
}

impl FromStr for Theme {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(SettingsError::InvalidValue {
                key: "theme",
                value: s.to_string(),
                reason: "expected Light or Dark",
            }),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => f.write_str("Light"),
            Theme::Dark => f.write_str("Dark"),
            Theme::Other(name) => f.write_str(name),
        }
    }
}

/// Frontend preferences, stored next to the database.
///
/// Passed explicitly to whatever presents the catalog; nothing reads them
/// from global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: Theme,
    /// Show a progress display while a batch runs
    pub show_progress: bool,
    /// Pre-select newly added entries
    pub auto_select_add: bool,
    /// Language code of the interface, e.g. `EN`
    pub language: String,
    /// Hide to the tray instead of minimizing
    pub auto_minimize_tray: bool,
    /// Keys this build does not know, kept so a save writes them back
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            show_progress: true,
            auto_select_add: false,
            language: "EN".to_string(),
            auto_minimize_tray: true,
            extra: serde_json::Map::new(),
        }
    }
}

impl Settings {
    pub const KEYS: &'static [&'static str] = &[
        "theme",
        "show_progress",
        "auto_select_add",
        "language",
        "auto_minimize_tray",
    ];

    /// Check values that the type system cannot.
    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_language(&self.language)
    }

    /// Current value of `key` as text.
    pub fn get(&self, key: &str) -> Result<String, SettingsError> {
        Ok(match key {
            "theme" => self.theme.to_string(),
            "show_progress" => self.show_progress.to_string(),
            "auto_select_add" => self.auto_select_add.to_string(),
            "language" => self.language.clone(),
            "auto_minimize_tray" => self.auto_minimize_tray.to_string(),
            _ => return Err(SettingsError::UnknownKey(key.to_string())),
        })
    }

    /// Parse and apply `value` to `key`. Settings are unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        match key {
            "theme" => self.theme = value.parse()?,
            "show_progress" => self.show_progress = parse_bool("show_progress", value)?,
            "auto_select_add" => self.auto_select_add = parse_bool("auto_select_add", value)?,
            "language" => {
                let language = value.to_ascii_uppercase();
                validate_language(&language)?;
                self.language = language;
            }
            "auto_minimize_tray" => {
                self.auto_minimize_tray = parse_bool("auto_minimize_tray", value)?
            }
            _ => return Err(SettingsError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, SettingsError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(SettingsError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "expected true or false",
        }),
    }
}

fn validate_language(language: &str) -> Result<(), SettingsError> {
    let valid = (2..=3).contains(&language.len())
        && language.chars().all(|c| c.is_ascii_uppercase());
    if valid {
        Ok(())
    } else {
        Err(SettingsError::InvalidValue {
            key: "language",
            value: language.to_string(),
            reason: "expected a two or three letter code",
        })
    }
}

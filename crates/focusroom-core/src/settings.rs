//! User-configurable settings.
//!
//! Stores user preferences including:
//! - Theme
//! - Notification and sound toggles
//! - Named timer presets
//! - The weekly focus goal (minutes)
//!
//! Settings are persisted as one JSON document under the `settings` key. The
//! weekly goal is also mirrored to `weeklyFocusGoal`.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, CoreError, Result, ValidationError};
use crate::progress::DEFAULT_WEEKLY_FOCUS_GOAL;
use crate::storage::{self, KeyValueStore};

pub const SETTINGS_KEY: &str = "settings";
pub const WEEKLY_FOCUS_GOAL_KEY: &str = "weeklyFocusGoal";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// A named countdown length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerPreset {
    pub name: String,
    /// Seconds.
    pub duration: u32,
}

impl TimerPreset {
    fn new(name: &str, duration: u32) -> Self {
        Self {
            name: name.to_string(),
            duration,
        }
    }
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_true")]
    pub notifications: bool,
    #[serde(default = "default_true")]
    pub sound: bool,
    #[serde(default = "default_presets")]
    pub timer_presets: Vec<TimerPreset>,
    #[serde(default = "default_weekly_focus_goal")]
    pub weekly_focus_goal: u32,
}

/// A partial settings update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub theme: Option<Theme>,
    pub notifications: Option<bool>,
    pub sound: Option<bool>,
    pub timer_presets: Option<Vec<TimerPreset>>,
    pub weekly_focus_goal: Option<u32>,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_weekly_focus_goal() -> u32 {
    DEFAULT_WEEKLY_FOCUS_GOAL
}
fn default_presets() -> Vec<TimerPreset> {
    vec![
        TimerPreset::new("Pomodoro", 1500),
        TimerPreset::new("Short Break", 300),
        TimerPreset::new("Custom", 1800),
    ]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            notifications: true,
            sound: true,
            timer_presets: default_presets(),
            weekly_focus_goal: default_weekly_focus_goal(),
        }
    }
}

impl Settings {
    /// Check every field's constraints.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.weekly_focus_goal == 0 {
            return Err(ValidationError::invalid(
                "weeklyFocusGoal",
                "must be greater than zero",
            ));
        }
        for preset in &self.timer_presets {
            if preset.name.trim().is_empty() {
                return Err(ValidationError::invalid("timerPresets", "preset name is empty"));
            }
            if preset.duration == 0 {
                return Err(ValidationError::invalid(
                    "timerPresets",
                    format!("preset '{}' has a zero duration", preset.name),
                ));
            }
        }
        Ok(())
    }

    /// Apply a partial update. Nothing changes unless the result validates.
    pub fn apply(&mut self, patch: SettingsPatch) -> Result<(), ValidationError> {
        let mut next = self.clone();
        if let Some(theme) = patch.theme {
            next.theme = theme;
        }
        if let Some(notifications) = patch.notifications {
            next.notifications = notifications;
        }
        if let Some(sound) = patch.sound {
            next.sound = sound;
        }
        if let Some(presets) = patch.timer_presets {
            next.timer_presets = presets;
        }
        if let Some(goal) = patch.weekly_focus_goal {
            next.weekly_focus_goal = goal;
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    pub fn preset(&self, name: &str) -> Option<&TimerPreset> {
        self.timer_presets
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

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
        let parse_failed = || ConfigError::ParseFailed {
            key: key.to_string(),
            value: value.to_string(),
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => {
                    serde_json::Value::Bool(value.parse::<bool>().map_err(|_| parse_failed())?)
                }
                serde_json::Value::Number(_) => {
                    serde_json::Value::Number(value.parse::<u64>().map_err(|_| parse_failed())?.into())
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|_| parse_failed())?
                }
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Get a setting as string by dot-separated camelCase key
    /// (e.g. `weeklyFocusGoal`, `timerPresets`).
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Build the patch that sets one key, parsing `value` into the key's type.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn patch_for(&self, key: &str, value: &str) -> Result<SettingsPatch> {
        let mut json = serde_json::to_value(self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Settings = serde_json::from_value(json).map_err(|_| ConfigError::ParseFailed {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        Ok(SettingsPatch {
            theme: Some(updated.theme),
            notifications: Some(updated.notifications),
            sound: Some(updated.sound),
            timer_presets: Some(updated.timer_presets),
            weekly_focus_goal: Some(updated.weekly_focus_goal),
        })
    }
}

/// Owns the settings document and its persistence.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    settings: Settings,
}

impl SettingsStore {
    /// Load from the store or return defaults.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let settings = storage::load_or_default(store, SETTINGS_KEY, Settings::default, |s: &Settings| {
            s.validate().map_err(|e| e.to_string())
        });
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn weekly_focus_goal(&self) -> u32 {
        self.settings.weekly_focus_goal
    }

    /// Apply a partial update and persist it.
    ///
    /// # Errors
    ///
    /// Returns a validation error and leaves settings untouched if the
    /// patched settings are invalid.
    pub fn update(&mut self, store: &dyn KeyValueStore, patch: SettingsPatch) -> Result<(), CoreError> {
        self.settings.apply(patch)?;
        self.persist(store);
        Ok(())
    }

    /// Restore defaults and persist them.
    pub fn reset(&mut self, store: &dyn KeyValueStore) {
        self.settings = Settings::default();
        self.persist(store);
    }

    fn persist(&self, store: &dyn KeyValueStore) {
        let entries = [
            storage::to_entry(SETTINGS_KEY, &self.settings),
            storage::to_entry(WEEKLY_FOCUS_GOAL_KEY, &self.settings.weekly_focus_goal),
        ];
        match entries.into_iter().collect::<std::result::Result<Vec<_>, _>>() {
            Ok(entries) => storage::save_batch(store, &entries),
            Err(e) => tracing::warn!(error = %e, "failed to serialize settings"),
        }
    }
}

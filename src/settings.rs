use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

pub const SETTINGS_ENV: &str = "GEOCLIP_SETTINGS";
pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct RefreshSettings {
    pub poll_interval_ms: u64,
    pub settle_delay_ms: u64,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 30_000,
            settle_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
struct UserSettings {
    save_path: Option<String>,
    refresh: RefreshSettings,
}

/// JSON-file backed user settings.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    /// Loads settings from `path`. A missing or malformed file yields defaults.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("ignoring malformed settings at {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    /// Resolves the settings file from `GEOCLIP_SETTINGS`, falling back to
    /// `settings.json` in the working directory.
    pub fn default_path() -> PathBuf {
        std::env::var_os(SETTINGS_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save_path(&self) -> Option<String> {
        self.read().save_path.clone()
    }

    /// Stores a new save directory. Blank input clears it.
    pub fn update_save_path(&self, save_path: Option<&str>) -> Result<()> {
        let normalized = save_path
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        let mut guard = self.write();
        guard.save_path = normalized;
        self.persist(&guard)
    }

    pub fn refresh(&self) -> RefreshSettings {
        self.read().refresh
    }

    pub fn update_refresh(&self, refresh: RefreshSettings) -> Result<()> {
        let mut guard = self.write();
        guard.refresh = refresh;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: UserSettings = serde_json::from_str(&contents)
            .with_context(|| format!("Malformed settings in {}", self.path.display()))?;
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, UserSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

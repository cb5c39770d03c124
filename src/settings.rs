use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::config::{
    DEFAULT_PANEL_HEIGHT, DEFAULT_PANEL_WIDTH, PANEL_MAX_PERCENT, PANEL_MIN_PERCENT,
};
use crate::entry::{join_arguments, LauncherEntry};

/// Every field falls back to its default on its own, so one malformed value
/// never costs the rest of the file.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
struct SettingsFile {
    #[serde(default, deserialize_with = "lenient")]
    items: Vec<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient")]
    window: WindowSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
struct StoredItem {
    #[serde(default, deserialize_with = "lenient")]
    alias: String,
    #[serde(default, deserialize_with = "lenient")]
    executable: String,
    #[serde(default, deserialize_with = "lenient")]
    arguments: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct WindowSettings {
    #[serde(default, deserialize_with = "lenient")]
    pub geometry: Option<Geometry>,
    #[serde(default, deserialize_with = "lenient")]
    pub state: Option<ViewState>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Geometry {
    pub width_percent: u16,
    pub height_percent: u16,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            width_percent: DEFAULT_PANEL_WIDTH,
            height_percent: DEFAULT_PANEL_HEIGHT,
        }
    }
}

impl Geometry {
    pub fn clamped(self) -> Self {
        Self {
            width_percent: self
                .width_percent
                .clamp(PANEL_MIN_PERCENT, PANEL_MAX_PERCENT),
            height_percent: self
                .height_percent
                .clamp(PANEL_MIN_PERCENT, PANEL_MAX_PERCENT),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ViewState {
    #[serde(default, deserialize_with = "lenient")]
    pub selected: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Settings {
    pub entries: Vec<LauncherEntry>,
    pub window: WindowSettings,
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|err| {
        warn!(%err, "malformed settings value, using default");
        T::default()
    }))
}

impl StoredItem {
    /// A slot that is not an object at all becomes an empty item.
    fn from_value(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or_else(|err| {
            warn!(%err, "malformed settings item, using empty fields");
            Self::default()
        })
    }

    fn from_entry(entry: &LauncherEntry) -> Self {
        Self {
            alias: entry.alias.clone(),
            executable: entry.executable.clone(),
            arguments: join_arguments(&entry.arguments),
        }
    }

    fn into_entry(self) -> LauncherEntry {
        let arguments = if self.arguments.is_empty() {
            Vec::new()
        } else {
            self.arguments.split('\n').map(str::to_string).collect()
        };
        LauncherEntry::new(self.alias, self.executable, arguments)
    }
}

pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "no stored settings, starting empty");
            return Ok(Settings::default());
        }
        let data = fs::read(&self.path)
            .with_context(|| format!("Unable to read {}", self.path.display()))?;
        let parsed: SettingsFile = match serde_json::from_slice(&data) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(%err, path = %self.path.display(), "settings unreadable, starting empty");
                self.back_up_unreadable();
                return Ok(Settings::default());
            }
        };
        let entries: Vec<LauncherEntry> = parsed
            .items
            .into_iter()
            .map(|slot| StoredItem::from_value(slot).into_entry())
            .collect();
        info!(count = entries.len(), "settings loaded");
        let mut window = parsed.window;
        window.geometry = window.geometry.map(Geometry::clamped);
        Ok(Settings { entries, window })
    }

    /// Replaces the stored file in one rename after the data is on disk.
    pub fn save(&self, entries: &[LauncherEntry], window: &WindowSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = SettingsFile {
            items: entries
                .iter()
                .map(|entry| serde_json::to_value(StoredItem::from_entry(entry)))
                .collect::<std::result::Result<_, _>>()?,
            window: window.clone(),
        };
        let data = serde_json::to_string_pretty(&file)?;

        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut tmp = File::create(&tmp_path)
                .with_context(|| format!("Unable to create {}", tmp_path.display()))?;
            tmp.write_all(data.as_bytes())?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Unable to replace {}", self.path.display()))?;
        info!(count = entries.len(), path = %self.path.display(), "settings saved");
        Ok(())
    }

    fn back_up_unreadable(&self) {
        let backup = self.path.with_extension("json.bak");
        if let Err(err) = fs::copy(&self.path, &backup) {
            warn!(%err, backup = %backup.display(), "could not back up unreadable settings");
        }
    }
}

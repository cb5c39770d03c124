use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

pub const HOME_ENV: &str = "LAUNCHER_HOME";
pub const TICK_RATE: Duration = Duration::from_millis(200);
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(400);

pub const DEFAULT_PANEL_WIDTH: u16 = 60;
pub const DEFAULT_PANEL_HEIGHT: u16 = 70;
pub const PANEL_MIN_PERCENT: u16 = 30;
pub const PANEL_MAX_PERCENT: u16 = 100;
pub const PANEL_STEP: u16 = 5;

pub struct AppPaths {
    pub config_dir: PathBuf,
    pub settings_file: PathBuf,
    pub log_file: PathBuf,
}

impl AppPaths {
    pub fn new() -> Result<Self> {
        let config_dir = match env::var_os(HOME_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()
                .context("Unable to determine home directory")?
                .join(".local/launcher"),
        };
        Self::at(&config_dir)
    }

    pub fn at(config_dir: &Path) -> Result<Self> {
        fs::create_dir_all(config_dir)
            .with_context(|| format!("Unable to create {}", config_dir.display()))?;
        Ok(Self {
            settings_file: config_dir.join("settings.json"),
            log_file: config_dir.join("launcher.log"),
            config_dir: config_dir.to_path_buf(),
        })
    }
}

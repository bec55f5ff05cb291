use crate::{
    gear::{GearGroups, PropertyGroup},
    login::Cookie,
};
use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SteamSettings {
    #[serde(default)]
    pub steam_id: Option<String>,
    #[serde(default)]
    pub machine_auth: Option<String>,
}

impl SteamSettings {
    pub fn remember(&mut self, cookie: &Cookie) {
        if let Some(steam_id) = cookie.steam_id() {
            self.steam_id = Some(steam_id.to_string());
            self.machine_auth = Some(cookie.value.clone());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub remember_me: bool,
    #[serde(default)]
    pub steam: SteamSettings,
    /// Replaces the built-in gear table when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gear_groups: Option<Vec<PropertyGroup>>,
}

impl AppConfig {
    pub fn load_or_create() -> Result<Self> {
        let path = config_path()?;
        if path.exists() {
            return Self::load_from(&path);
        }

        let config = AppConfig::default();
        config.save()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).context("read app config")?;
        let config: AppConfig = serde_json::from_str(&raw).context("parse app config")?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("create app data dir")?;
        }
        let raw = serde_json::to_string_pretty(self).context("serialize app config")?;
        fs::write(path, raw).context("write app config")?;
        Ok(())
    }

    pub fn gear_groups(&self) -> Result<GearGroups> {
        match &self.gear_groups {
            Some(groups) => GearGroups::new(groups.clone()).context("load gear groups"),
            None => Ok(GearGroups::default()),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(base_data_dir()?.join("config.json"))
}

pub fn log_path() -> Result<PathBuf> {
    Ok(base_data_dir()?.join("gearsum.log"))
}

fn base_data_dir() -> Result<PathBuf> {
    let base = BaseDirs::new().context("resolve home dir")?;
    Ok(base.data_local_dir().join("gearsum"))
}

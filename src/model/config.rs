use anyhow::{Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::plugin::catalog::CatalogEntry;

const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub instances: InstancesConfig,
    pub download: DownloadConfig,
    pub supervisor: SupervisorConfig,
    #[serde(default)]
    pub catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    pub root_dir: String,
}

#[derive(Debug, Deserialize)]
pub struct InstancesConfig {
    pub separator: String,
    pub mod_loaders: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadConfig {
    pub timeout_secs: u64,
    pub min_artifact_bytes: u64,
}

#[derive(Debug, Deserialize)]
pub struct SupervisorConfig {
    pub grace_secs: u64,
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    pub fn load() -> Result<Self> {
        let mut config = Self::parse(DEFAULT_CONFIG)?;

        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "aether-plugins") {
            let config_path = proj_dirs.config_dir().join("config.toml");
            if config_path.exists() {
                let user_str = fs::read_to_string(&config_path)?;
                config = Self::parse(&user_str)?;
            }
        }

        if config.general.root_dir.starts_with('~') {
            let home = dirs_home().ok_or_else(|| anyhow!("cannot determine home directory"))?;
            config.general.root_dir =
                config
                    .general
                    .root_dir
                    .replacen('~', &home.to_string_lossy(), 1);
        }

        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn root_dir(&self) -> PathBuf {
        PathBuf::from(&self.general.root_dir)
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root_dir().join("versions")
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.root_dir().join("temp")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root_dir().join("logs")
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download.timeout_secs)
    }

    pub fn restart_grace(&self) -> Duration {
        Duration::from_secs(self.supervisor.grace_secs)
    }
}

fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

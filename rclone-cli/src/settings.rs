use anyhow::{Context, Result};
use rclone_core::ExecutorOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persistent defaults for `rcw`, read from a TOML file
///
/// ```toml
/// rclone_config = "/etc/rclone/rclone.conf"
/// log_level = "info"
///
/// [executor]
/// binary = "/usr/local/bin/rclone"
/// timeout = "10m"
/// listing_format = "json"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// rclone configuration file to read remotes from
    pub rclone_config: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    pub executor: ExecutorOptions,
}

impl Settings {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load an explicitly named file, or the default one if it exists
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path)
                .await
                .with_context(|| format!("Failed to read settings from {}", path.display()));
        }

        match default_settings_path() {
            Some(path) if path.exists() => Self::load(&path)
                .await
                .with_context(|| format!("Failed to read settings from {}", path.display())),
            _ => Ok(Self::default()),
        }
    }
}

fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("rcw").join("settings.toml"))
}

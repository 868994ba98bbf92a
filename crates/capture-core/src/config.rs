use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::protocol::CHANNEL_NAME;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Method channel the plugin answers on
    #[serde(default = "default_channel_name")]
    pub channel_name: String,

    /// Log filter used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Largest accepted width * height
    #[serde(default = "default_max_capture_pixels")]
    pub max_capture_pixels: u64,
}

fn default_channel_name() -> String {
    CHANNEL_NAME.to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_max_capture_pixels() -> u64 {
    16384 * 16384
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            channel_name: default_channel_name(),
            log_level: default_log_level(),
            max_capture_pixels: default_max_capture_pixels(),
        }
    }
}

impl PluginConfig {
    /// Default config file path for this platform
    pub fn default_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "screen-capture", "plugin") {
            dirs.config_dir().join("config.json")
        } else {
            PathBuf::from("screen-capture-config.json")
        }
    }

    /// Load config from a file path
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let config: Self =
            serde_json::from_str(&data).with_context(|| "failed to parse config JSON")?;
        Ok(config)
    }

    /// Load from `path` when it exists, otherwise use defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to a file path
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create config dir {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PluginConfig::default();
        assert_eq!(config.channel_name, "flutter_screen_capture");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.max_capture_pixels, 16384 * 16384);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: PluginConfig = serde_json::from_str(r#"{"log_level": "debug"}"#).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.channel_name, "flutter_screen_capture");
        assert_eq!(config.max_capture_pixels, 16384 * 16384);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = PluginConfig {
            channel_name: "capture".to_string(),
            log_level: "trace".to_string(),
            max_capture_pixels: 1000,
        };
        config.save(&path).unwrap();

        let loaded = PluginConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = PluginConfig::load_or_default(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, PluginConfig::default());
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(PluginConfig::load(&path).is_err());
    }
}

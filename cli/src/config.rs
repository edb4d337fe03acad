//! CLI Configuration

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use formwright_core::DEFAULT_AUTO_SAVE_INTERVAL;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    pub storage_dir: Option<PathBuf>,
    pub auto_save_interval_secs: Option<u64>,
    pub default_format: Option<String>,
}

impl Config {
    pub fn load(profile: Option<&str>) -> anyhow::Result<Self> {
        let path = Self::config_path(profile)?;
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, profile: Option<&str>) -> anyhow::Result<PathBuf> {
        let path = Self::config_path(profile)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Configured storage directory, or the per-user data directory.
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(default_storage_dir)
    }

    pub fn auto_save_interval(&self) -> Duration {
        match self.auto_save_interval_secs {
            Some(secs) if secs > 0 => Duration::from_secs(secs),
            _ => DEFAULT_AUTO_SAVE_INTERVAL,
        }
    }

    fn config_path(profile: Option<&str>) -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir().context("Cannot find home directory")?;
        let filename = match profile {
            Some(p) => format!("config.{}.toml", p),
            None => "config.toml".to_string(),
        };
        Ok(home.join(".formwright").join(filename))
    }
}

fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("formwright")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let config: Config = toml::from_str("auto_save_interval_secs = 5\n").unwrap();
        assert_eq!(config.auto_save_interval(), Duration::from_secs(5));
        assert!(config.default_format.is_none());
    }

    #[test]
    fn test_zero_interval_falls_back() {
        let config = Config { auto_save_interval_secs: Some(0), ..Default::default() };
        assert_eq!(config.auto_save_interval(), DEFAULT_AUTO_SAVE_INTERVAL);
    }

    #[test]
    fn test_explicit_storage_dir_wins() {
        let config = Config { storage_dir: Some(PathBuf::from("/tmp/forms")), ..Default::default() };
        assert_eq!(config.storage_dir(), PathBuf::from("/tmp/forms"));
    }
}

//! Configuration management for the gacha CLI

use anyhow::{Context, Result};
use gacha::BannerConfig;
use gacha_store::DEFAULT_DB_PATH;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Ledger database path
    pub database: Option<PathBuf>,
    /// Banner definition (TOML); the built-in banner is used when unset
    pub banner: Option<PathBuf>,
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("gacha");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from file, or the defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        Ok(())
    }

    /// Database to use: the flag, then the config file, then the default
    pub fn database_path(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.database.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH))
    }

    /// Banner to use: the flag, then the config file, then the built-in banner
    pub fn banner_config(&self, flag: Option<&Path>) -> Result<BannerConfig> {
        match flag.or(self.banner.as_deref()) {
            Some(path) => BannerConfig::load(path)
                .with_context(|| format!("Invalid banner {}", path.display())),
            None => Ok(BannerConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("none.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            database: Some(PathBuf::from("/tmp/g.db")),
            banner: None,
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_flag_overrides_config() {
        let config = Config {
            database: Some(PathBuf::from("configured.db")),
            banner: None,
        };
        assert_eq!(
            config.database_path(Some(PathBuf::from("flag.db"))),
            PathBuf::from("flag.db")
        );
        assert_eq!(config.database_path(None), PathBuf::from("configured.db"));
        assert_eq!(
            Config::default().database_path(None),
            PathBuf::from(DEFAULT_DB_PATH)
        );
    }

    #[test]
    fn test_banner_file_is_validated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("banner.toml");
        fs::write(&path, "rate_top = 2.0").unwrap();

        let config = Config::default();
        assert!(config.banner_config(Some(&path)).is_err());
        assert_eq!(config.banner_config(None).unwrap(), BannerConfig::default());
    }
}

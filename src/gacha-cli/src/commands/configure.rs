//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting CLI defaults.

use crate::config::Config;
use anyhow::Result;
use std::path::PathBuf;

/// Handle the configure command
pub fn handle(database: Option<PathBuf>, banner: Option<PathBuf>, show: bool) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config);
        return Ok(());
    }

    if database.is_none() && banner.is_none() {
        show_usage();
        return Ok(());
    }

    if let Some(path) = database {
        println!("Database configured: {}", path.display());
        config.database = Some(path);
    }
    if let Some(path) = banner {
        gacha::BannerConfig::load(&path)?;
        println!("Banner configured: {}", path.display());
        config.banner = Some(path);
    }

    config.save()?;
    if let Ok(path) = Config::config_path() {
        println!("Config saved to: {}", path.display());
    }

    Ok(())
}

/// Display current configuration
fn show_config(config: &Config) {
    match &config.database {
        Some(path) => println!("Database: {}", path.display()),
        None => println!("Database: {} (default)", gacha_store::DEFAULT_DB_PATH),
    }
    match &config.banner {
        Some(path) => println!("Banner: {}", path.display()),
        None => println!("Banner: built-in"),
    }

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

fn show_usage() {
    println!("Usage: gacha configure --database PATH");
    println!("   or: gacha configure --banner-file PATH");
    println!("   or: gacha configure --show");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_config_defaults() {
        show_config(&Config::default());
    }

    #[test]
    fn test_config_path_exists() {
        assert!(Config::config_path().is_ok());
    }
}

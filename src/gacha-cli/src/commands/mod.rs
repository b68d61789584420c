//! Command handlers for the gacha CLI
//!
//! Each subcommand group has its own module with handler functions. Handlers
//! take an open [`Banner`] so they can run against any store.

pub mod account;
pub mod admin;
pub mod configure;
pub mod stats;
pub mod wish;

use anyhow::{Context, Result};
use gacha::{Banner, BannerConfig};
use gacha_store::{GachaRepository, SqliteDb};
use serde::Serialize;
use std::path::Path;

/// Open (creating if needed) the database and bind it to the banner
pub fn open_banner(db: &Path, config: BannerConfig) -> Result<Banner<SqliteDb>> {
    if let Some(parent) = db.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let store = SqliteDb::open(db)
        .with_context(|| format!("Failed to open database {}", db.display()))?;
    store.init()?;
    Ok(Banner::new(store, config)?)
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

//! Operator commands: database setup and pity overrides

use anyhow::Result;
use gacha::Banner;
use gacha_store::{GachaRepository, SqliteDb};
use std::path::Path;

/// Handle `init`
pub fn init(db: &Path) -> Result<()> {
    if let Some(parent) = db.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let store = SqliteDb::open(db)?;
    store.init()?;
    println!("Your database is ready at {}", db.display());
    Ok(())
}

/// Handle `set-pity`
pub fn set_pity<S: GachaRepository>(
    banner: &Banner<S>,
    user: &str,
    pity_5: u32,
    pity_4: u32,
    total_pulls: Option<u64>,
) -> Result<()> {
    let state = banner.admin_set_state(user, pity_5, pity_4, total_pulls)?;
    println!(
        "Pity for {} set to {}/{} ({} lifetime pulls)",
        state.user_id, state.pity_5, state.pity_4, state.total_pulls
    );
    Ok(())
}

//! Persistence for the gacha engine
//!
//! This library provides a trait-based abstraction over the three ledgers a
//! banner needs (per-user pity state, inventory, pull history), with a
//! SQLite implementation.
//!
//! # Features
//!
//! - `sqlite-sync` (default) - Synchronous SQLite using rusqlite
//!
//! # Example
//!
//! ```no_run
//! use gacha_store::{GachaRepository, SqliteDb};
//!
//! let db = SqliteDb::open("gacha.db").unwrap();
//! db.init().unwrap();
//!
//! let state = db.load_pity("user-1").unwrap();
//! assert_eq!(state.total_pulls, 0);
//! ```

pub mod repository;
pub mod types;

#[cfg(feature = "sqlite-sync")]
pub mod sqlite;

// Re-export types
pub use types::*;

// Re-export repository traits
pub use repository::{GachaRepository, RepoError, RepoResult, StatsRepository};

// Re-export implementations
#[cfg(feature = "sqlite-sync")]
pub use sqlite::{SqliteDb, DEFAULT_DB_PATH};

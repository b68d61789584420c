//! Gacha pull engine
//!
//! A [`Banner`] binds a validated [`BannerConfig`] to a persistence backend
//! from `gacha_store` and exposes pull sessions plus the account operations
//! around them.
//!
//! # Example
//!
//! ```no_run
//! use gacha::{Banner, BannerConfig};
//! use gacha_store::{GachaRepository, SqliteDb};
//!
//! let db = SqliteDb::open("gacha.db").unwrap();
//! db.init().unwrap();
//!
//! let banner = Banner::new(&db, BannerConfig::default()).unwrap();
//! let session = banner.wish("user-1", 10).unwrap();
//! for (rarity, items) in session.items_by_tier() {
//!     println!("{}: {}", rarity, items.join(", "));
//! }
//! ```

pub mod banner;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod consumable;
pub mod error;
pub mod resolver;
pub mod session;

pub use banner::{Banner, BannerStats, PityStatus};
pub use catalog::LootCatalog;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{BannerConfig, Checkpoint, SoftPity};
pub use consumable::{ConsumableKind, ItemUse};
pub use error::{ConfigError, GachaError, GachaResult, ValidationError};
pub use resolver::{resolve_pull, PullOutcome, PullReason, RandRolls, RollSource, ScriptedRolls};
pub use session::{Pull, PullSession};

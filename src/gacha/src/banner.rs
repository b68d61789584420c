//! The banner: a validated configuration bound to a persistence backend.
//!
//! [`Banner`] is the entry point for everything a caller can do with a
//! user's account. Pull sessions live in [`crate::session`]; this module
//! holds the account, admin and reporting operations.

use gacha_store::{
    GachaRepository, HistoryRecord, InventoryEntry, LeaderboardEntry, LedgerStats, PityState,
    StatsRepository,
};
use serde::Serialize;

use crate::catalog::LootCatalog;
use crate::clock::{Clock, SystemClock};
use crate::config::BannerConfig;
use crate::consumable::{ConsumableKind, ItemUse};
use crate::error::{GachaResult, ValidationError};

/// A user's pity state together with the thresholds it is measured against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PityStatus {
    pub state: PityState,
    pub hard_pity: u32,
    pub mid_pity: u32,
    pub soft_pity_start: Option<u32>,
}

impl PityStatus {
    /// Pulls left until five-star is guaranteed
    pub fn pulls_to_hard_pity(&self) -> u32 {
        self.hard_pity.saturating_sub(self.state.pity_5)
    }

    /// Pulls left until four-star-or-better is guaranteed
    pub fn pulls_to_mid_pity(&self) -> u32 {
        self.mid_pity.saturating_sub(self.state.pity_4)
    }
}

/// Observed pull counts across all users, next to the configured odds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BannerStats {
    pub ledger: LedgerStats,
    pub observed_top_rate: f64,
    pub observed_mid_rate: f64,
    pub expected_top_rate: f64,
    pub expected_mid_rate: f64,
}

fn share(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

pub(crate) fn check_user(user_id: &str) -> Result<(), ValidationError> {
    if user_id.trim().is_empty() {
        Err(ValidationError::InvalidUserId)
    } else {
        Ok(())
    }
}

/// Gacha banner backed by a repository `S`.
pub struct Banner<S> {
    pub(crate) store: S,
    pub(crate) config: BannerConfig,
    pub(crate) catalog: LootCatalog,
    pub(crate) clock: Box<dyn Clock>,
}

impl<S: GachaRepository> Banner<S> {
    /// Validate `config`, build its catalog and bind it to `store`.
    ///
    /// A configuration that fails validation never produces a banner.
    pub fn new(store: S, config: BannerConfig) -> GachaResult<Self> {
        config.validate()?;
        let catalog = LootCatalog::from_config(&config)?;
        Ok(Self {
            store,
            config,
            catalog,
            clock: Box::new(SystemClock::new()),
        })
    }

    /// Replace the clock used to timestamp history rows
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &BannerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &LootCatalog {
        &self.catalog
    }

    /// Current pity state. Users who never pulled read as fresh; nothing is
    /// written.
    pub fn get_state(&self, user_id: &str) -> GachaResult<PityState> {
        check_user(user_id)?;
        Ok(self
            .store
            .get_pity(user_id)?
            .unwrap_or_else(|| PityState::fresh(user_id)))
    }

    pub fn status(&self, user_id: &str) -> GachaResult<PityStatus> {
        Ok(PityStatus {
            state: self.get_state(user_id)?,
            hard_pity: self.config.hard_pity,
            mid_pity: self.config.mid_pity,
            soft_pity_start: self.config.soft_pity.start(),
        })
    }

    /// Overwrite a user's counters.
    ///
    /// `total_pulls` defaults to the stored lifetime count. The lifetime
    /// five-star count is never touched. Rejected overrides write nothing.
    pub fn admin_set_state(
        &self,
        user_id: &str,
        pity_5: u32,
        pity_4: u32,
        total_pulls: Option<u64>,
    ) -> GachaResult<PityState> {
        check_user(user_id)?;
        if pity_5 > self.config.hard_pity {
            return Err(ValidationError::PityOutOfRange {
                name: "pity_5",
                value: pity_5,
                max: self.config.hard_pity,
            }
            .into());
        }
        if pity_4 > self.config.mid_pity {
            return Err(ValidationError::PityOutOfRange {
                name: "pity_4",
                value: pity_4,
                max: self.config.mid_pity,
            }
            .into());
        }

        let current = self
            .store
            .get_pity(user_id)?
            .unwrap_or_else(|| PityState::fresh(user_id));
        let total_pulls = total_pulls.unwrap_or(current.total_pulls);
        let floor = pity_5.max(pity_4);
        if total_pulls < u64::from(floor) {
            return Err(ValidationError::TotalBelowPity {
                total: total_pulls,
                pity: floor,
            }
            .into());
        }

        let next = PityState {
            pity_5,
            pity_4,
            total_pulls,
            ..current
        };
        let saved = self.store.save_pity(&next)?;
        tracing::info!(
            user = user_id,
            pity_5,
            pity_4,
            total_pulls,
            "pity state overridden"
        );
        Ok(saved)
    }

    /// Held items, largest stacks first
    pub fn get_inventory(&self, user_id: &str) -> GachaResult<Vec<InventoryEntry>> {
        check_user(user_id)?;
        Ok(self.store.get_inventory(user_id)?)
    }

    /// Remove `amount` of an item.
    ///
    /// Fails with [`ValidationError::InsufficientQuantity`] and leaves the
    /// inventory alone when fewer are held.
    pub fn consume_item(&self, user_id: &str, item: &str, amount: u64) -> GachaResult<()> {
        check_user(user_id)?;
        if amount == 0 {
            return Err(ValidationError::InvalidConsumeAmount.into());
        }

        if self.store.consume_item(user_id, item, amount)? {
            tracing::debug!(user = user_id, item, amount, "item consumed");
            return Ok(());
        }

        let held = self.store.item_quantity(user_id, item)?;
        tracing::warn!(user = user_id, item, amount, held, "consume rejected");
        Err(ValidationError::InsufficientQuantity {
            item: item.to_string(),
            requested: amount,
            held,
        }
        .into())
    }

    /// Spend consumable items (XP crystals, crown bundles) and report their value.
    pub fn use_item(&self, user_id: &str, item: &str, amount: u64) -> GachaResult<ItemUse> {
        let kind = ConsumableKind::of(item)
            .ok_or_else(|| ValidationError::NotConsumable(item.to_string()))?;
        self.consume_item(user_id, item, amount)?;

        let used = ItemUse::new(item, amount, kind);
        tracing::info!(
            user = user_id,
            item,
            amount,
            value = ?used.total_value,
            "item used"
        );
        Ok(used)
    }

    /// Most recent pulls first
    pub fn get_history(&self, user_id: &str, limit: usize) -> GachaResult<Vec<HistoryRecord>> {
        check_user(user_id)?;
        Ok(self.store.get_history(user_id, limit)?)
    }
}

impl<S: GachaRepository + StatsRepository> Banner<S> {
    pub fn leaderboard(&self, limit: usize) -> GachaResult<Vec<LeaderboardEntry>> {
        Ok(self.store.leaderboard(limit)?)
    }

    pub fn stats(&self) -> GachaResult<BannerStats> {
        let ledger = self.store.ledger_stats()?;
        let recorded = ledger.exalted_pulled + ledger.rare_pulled + ledger.common_pulled;
        Ok(BannerStats {
            observed_top_rate: share(ledger.exalted_pulled, recorded),
            observed_mid_rate: share(ledger.rare_pulled, recorded),
            expected_top_rate: self.config.rate_top,
            expected_mid_rate: self.config.rate_mid,
            ledger,
        })
    }
}

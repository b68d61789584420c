//! Pull sessions: resolve a batch of pulls and persist them as one unit.
//!
//! A session loads the user's pity once, resolves every pull in memory and
//! hands the final state plus all grants to the store in a single commit.
//! If the commit fails nothing is granted and no result is returned.

use std::collections::BTreeMap;

use gacha_store::{GachaRepository, Grant, PityCounters, PityState, Rarity, SessionCommit};
use serde::Serialize;
use uuid::Uuid;

use crate::banner::{check_user, Banner};
use crate::error::{GachaError, GachaResult, ValidationError};
use crate::resolver::{resolve_pull, PullReason, RandRolls, RollSource};

/// One resolved pull
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pull {
    pub item: String,
    pub rarity: Rarity,
    pub reason: PullReason,
    /// Counters after this pull
    pub counters: PityCounters,
}

/// A committed pull session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PullSession {
    pub session_id: String,
    pub pulls: Vec<Pull>,
    /// Stored state after the commit
    pub state: PityState,
}

impl PullSession {
    /// Granted items grouped by tier, in pull order within each tier
    pub fn items_by_tier(&self) -> BTreeMap<Rarity, Vec<String>> {
        let mut tiers: BTreeMap<Rarity, Vec<String>> = BTreeMap::new();
        for pull in &self.pulls {
            tiers.entry(pull.rarity).or_default().push(pull.item.clone());
        }
        tiers
    }

    pub fn count(&self, rarity: Rarity) -> usize {
        self.pulls.iter().filter(|p| p.rarity == rarity).count()
    }
}

impl<S: GachaRepository> Banner<S> {
    /// Run `amount` pulls with the thread-local RNG.
    pub fn wish(&self, user_id: &str, amount: u32) -> GachaResult<PullSession> {
        self.run_pulls(user_id, amount, &mut RandRolls(rand::thread_rng()))
    }

    /// Run `amount` pulls drawing from `rolls`.
    ///
    /// `amount` must be within `1..=max_pulls`; otherwise the store is not
    /// touched. A conflicting concurrent session surfaces as a retryable
    /// persistence error.
    pub fn run_pulls<R: RollSource + ?Sized>(
        &self,
        user_id: &str,
        amount: u32,
        rolls: &mut R,
    ) -> GachaResult<PullSession> {
        check_user(user_id)?;
        if amount == 0 || amount > self.config.max_pulls {
            tracing::warn!(user = user_id, amount, "pull amount rejected");
            return Err(ValidationError::InvalidAmount {
                amount,
                max: self.config.max_pulls,
            }
            .into());
        }

        let loaded = self.store.load_pity(user_id)?;
        let mut counters = loaded.counters();
        let mut pulls = Vec::with_capacity(amount as usize);

        for n in 1..=amount {
            let outcome = resolve_pull(&self.config, counters, rolls);
            self.check_outcome(counters, outcome.counters)?;

            let item = self
                .catalog
                .pick(outcome.rarity, rolls)
                .map_err(|e| GachaError::Internal(format!("catalog cannot serve pull: {}", e)))?;

            tracing::debug!(
                user = user_id,
                pull = n,
                rarity = %outcome.rarity,
                reason = ?outcome.reason,
                pity_5 = outcome.counters.pity_5,
                pity_4 = outcome.counters.pity_4,
                item,
                "pull resolved"
            );

            pulls.push(Pull {
                item: item.to_string(),
                rarity: outcome.rarity,
                reason: outcome.reason,
                counters: outcome.counters,
            });
            counters = outcome.counters;
        }

        let tops = pulls.iter().filter(|p| p.rarity == Rarity::Exalted).count();
        let mids = pulls.iter().filter(|p| p.rarity == Rarity::Rare).count();
        let next = loaded.advanced(counters, u64::from(amount), tops as u64);
        let grants: Vec<Grant> = pulls
            .iter()
            .map(|p| Grant {
                item_name: p.item.clone(),
                rarity: p.rarity,
            })
            .collect();
        let session_id = Uuid::new_v4().to_string();

        let commit = SessionCommit {
            loaded: &loaded,
            state: &next,
            grants: &grants,
            session_id: &session_id,
            timestamp: self.clock.now_unix(),
        };
        let state = self.store.commit_session(&commit).map_err(|e| {
            tracing::warn!(user = user_id, session = %session_id, error = %e, "session commit failed");
            GachaError::from(e)
        })?;

        tracing::info!(
            user = user_id,
            session = %session_id,
            amount,
            tops,
            mids,
            pity_5 = state.pity_5,
            "session committed"
        );

        Ok(PullSession {
            session_id,
            pulls,
            state,
        })
    }

    /// Counters leaving the guaranteed ranges mean the resolver is broken.
    fn check_outcome(&self, before: PityCounters, after: PityCounters) -> GachaResult<()> {
        let advanced_or_reset = |old: u32, new: u32| new == 0 || new == old.saturating_add(1);
        if after.pity_5 >= self.config.hard_pity
            || after.pity_4 >= self.config.mid_pity
            || !advanced_or_reset(before.pity_5, after.pity_5)
            || !advanced_or_reset(before.pity_4, after.pity_4)
        {
            return Err(GachaError::Internal(format!(
                "pity counters moved from {:?} to {:?}",
                before, after
            )));
        }
        Ok(())
    }
}

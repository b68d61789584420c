//! Single-pull resolution.
//!
//! Given the pity counters before a pull and a source of uniform draws, the
//! resolver decides the rarity of the pull and returns the counters after
//! it. Rules are checked in a fixed order and the first match wins:
//!
//! 1. both counters are incremented
//! 2. hard pity: `pity_5 >= hard_pity` grants five-star
//! 3. checkpoint (optional): on exactly the configured pull, one draw decides
//!    between five-star and four-star; it never falls through to common
//! 4. mid pity: `pity_4 >= mid_pity` grants four-star
//! 5. base roll against `rate_top` (plus any soft-pity boost) and `rate_mid`
//!
//! A five-star resets both counters, a four-star resets `pity_4` only, a
//! common resets nothing.

use gacha_store::{PityCounters, Rarity};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::BannerConfig;

/// Source of the uniform draws a pull consumes.
pub trait RollSource {
    /// Uniform draw in `[0, 1)`.
    fn roll(&mut self) -> f64;

    /// Uniform index in `0..len`. Callers never pass `len == 0`.
    fn pick(&mut self, len: usize) -> usize;
}

/// Adapter turning any `rand` generator into a [`RollSource`].
#[derive(Debug, Clone)]
pub struct RandRolls<R>(pub R);

impl<R: Rng> RollSource for RandRolls<R> {
    fn roll(&mut self) -> f64 {
        self.0.gen::<f64>()
    }

    fn pick(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }
}

/// Replays a fixed sequence of draws, cycling when it runs out.
///
/// Item picks walk the tier round-robin so tests can predict items too.
#[derive(Debug, Clone)]
pub struct ScriptedRolls {
    rolls: Vec<f64>,
    next: usize,
    picks: usize,
}

impl ScriptedRolls {
    /// Replay `rolls` in order.
    ///
    /// # Panics
    ///
    /// Panics if `rolls` is empty.
    pub fn new(rolls: Vec<f64>) -> Self {
        assert!(!rolls.is_empty(), "scripted rolls need at least one value");
        Self {
            rolls,
            next: 0,
            picks: 0,
        }
    }

    /// Every draw returns `value`.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Number of uniform draws consumed so far
    pub fn consumed(&self) -> usize {
        self.next
    }
}

impl RollSource for ScriptedRolls {
    fn roll(&mut self) -> f64 {
        let value = self.rolls[self.next % self.rolls.len()];
        self.next += 1;
        value
    }

    fn pick(&mut self, len: usize) -> usize {
        let index = self.picks % len;
        self.picks += 1;
        index
    }
}

/// Which rule decided a pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullReason {
    HardPity,
    CheckpointWon,
    CheckpointLost,
    MidPity,
    Roll,
}

impl PullReason {
    /// Short tag for listings, empty for ordinary common rolls
    pub fn note(self, rarity: Rarity) -> &'static str {
        match (self, rarity) {
            (Self::HardPity, _) => "[HARD PITY]",
            (Self::CheckpointWon, _) => "[CHECKPOINT WIN]",
            (Self::CheckpointLost, _) => "[CHECKPOINT GUARANTEE]",
            (Self::MidPity, _) => "[GUARANTEED 4-STAR]",
            (Self::Roll, Rarity::Common) => "",
            (Self::Roll, _) => "[LUCKY PULL]",
        }
    }
}

/// Result of resolving one pull.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PullOutcome {
    pub rarity: Rarity,
    pub reason: PullReason,
    /// Counters after the pull, resets applied
    pub counters: PityCounters,
}

/// Five-star probability for the base roll at the given pity.
pub fn top_rate(config: &BannerConfig, pity_5: u32) -> f64 {
    let ceiling = 1.0 - config.rate_mid;
    (config.rate_top + config.soft_pity.boost(pity_5)).min(ceiling)
}

/// Resolve one pull from `current` counters.
pub fn resolve_pull<R: RollSource + ?Sized>(
    config: &BannerConfig,
    current: PityCounters,
    rolls: &mut R,
) -> PullOutcome {
    let pity_5 = current.pity_5.saturating_add(1);
    let pity_4 = current.pity_4.saturating_add(1);

    let (rarity, reason) = if pity_5 >= config.hard_pity {
        (Rarity::Exalted, PullReason::HardPity)
    } else if let Some(checkpoint) = config.checkpoint.filter(|c| c.pull == pity_5) {
        if rolls.roll() < checkpoint.chance {
            (Rarity::Exalted, PullReason::CheckpointWon)
        } else {
            (Rarity::Rare, PullReason::CheckpointLost)
        }
    } else if pity_4 >= config.mid_pity {
        (Rarity::Rare, PullReason::MidPity)
    } else {
        let r = rolls.roll();
        let top = top_rate(config, pity_5);
        let rarity = if r < top {
            Rarity::Exalted
        } else if r < top + config.rate_mid {
            Rarity::Rare
        } else {
            Rarity::Common
        };
        (rarity, PullReason::Roll)
    };

    let counters = match rarity {
        Rarity::Exalted => PityCounters::new(0, 0),
        Rarity::Rare => PityCounters::new(pity_5, 0),
        Rarity::Common => PityCounters::new(pity_5, pity_4),
    };

    PullOutcome {
        rarity,
        reason,
        counters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Checkpoint, SoftPity};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn flat() -> BannerConfig {
        BannerConfig {
            soft_pity: SoftPity::None,
            ..Default::default()
        }
    }

    #[test]
    fn test_hard_pity_ignores_the_roll() {
        let config = BannerConfig::default();
        let mut rolls = ScriptedRolls::constant(0.999);
        let outcome = resolve_pull(&config, PityCounters::new(59, 3), &mut rolls);

        assert_eq!(outcome.rarity, Rarity::Exalted);
        assert_eq!(outcome.reason, PullReason::HardPity);
        assert_eq!(outcome.counters, PityCounters::new(0, 0));
        assert_eq!(rolls.consumed(), 0);
    }

    #[test]
    fn test_mid_pity_forces_four_star_on_tenth_pull() {
        let config = flat();
        let mut rolls = ScriptedRolls::constant(0.99);
        let outcome = resolve_pull(&config, PityCounters::new(9, 9), &mut rolls);

        assert_eq!(outcome.rarity, Rarity::Rare);
        assert_eq!(outcome.reason, PullReason::MidPity);
        assert_eq!(outcome.counters, PityCounters::new(10, 0));
    }

    #[test]
    fn test_base_roll_bands() {
        let config = flat();
        let cases = [
            (0.0, Rarity::Exalted),
            (0.0059, Rarity::Exalted),
            (0.006, Rarity::Rare),
            (0.0559, Rarity::Rare),
            (0.0561, Rarity::Common),
            (0.99, Rarity::Common),
        ];

        for (roll, expected) in cases {
            let mut rolls = ScriptedRolls::constant(roll);
            let outcome = resolve_pull(&config, PityCounters::new(3, 3), &mut rolls);
            assert_eq!(outcome.rarity, expected, "roll {}", roll);
            assert_eq!(outcome.reason, PullReason::Roll);
        }
    }

    #[test]
    fn test_four_star_keeps_five_star_pity() {
        let config = flat();
        let mut rolls = ScriptedRolls::constant(0.01);
        let outcome = resolve_pull(&config, PityCounters::new(20, 4), &mut rolls);

        assert_eq!(outcome.rarity, Rarity::Rare);
        assert_eq!(outcome.counters, PityCounters::new(21, 0));
    }

    #[test]
    fn test_common_only_increments() {
        let config = flat();
        let mut rolls = ScriptedRolls::constant(0.5);
        let outcome = resolve_pull(&config, PityCounters::new(20, 4), &mut rolls);

        assert_eq!(outcome.rarity, Rarity::Common);
        assert_eq!(outcome.counters, PityCounters::new(21, 5));
    }

    #[test]
    fn test_checkpoint_fails_forward_to_four_star() {
        let config = BannerConfig {
            checkpoint: Some(Checkpoint {
                pull: 30,
                chance: 0.5,
            }),
            ..flat()
        };

        let mut losing = ScriptedRolls::constant(0.75);
        let lost = resolve_pull(&config, PityCounters::new(29, 2), &mut losing);
        assert_eq!(lost.rarity, Rarity::Rare);
        assert_eq!(lost.reason, PullReason::CheckpointLost);
        assert_eq!(lost.counters, PityCounters::new(30, 0));

        let mut winning = ScriptedRolls::constant(0.25);
        let won = resolve_pull(&config, PityCounters::new(29, 2), &mut winning);
        assert_eq!(won.rarity, Rarity::Exalted);
        assert_eq!(won.reason, PullReason::CheckpointWon);
        assert_eq!(won.counters, PityCounters::new(0, 0));
    }

    #[test]
    fn test_checkpoint_only_applies_on_its_pull() {
        let config = BannerConfig {
            checkpoint: Some(Checkpoint {
                pull: 30,
                chance: 0.5,
            }),
            ..flat()
        };
        let mut rolls = ScriptedRolls::constant(0.75);
        let outcome = resolve_pull(&config, PityCounters::new(30, 2), &mut rolls);
        assert_eq!(outcome.rarity, Rarity::Common);
    }

    #[test]
    fn test_soft_pity_ramp_raises_five_star_rate() {
        let config = BannerConfig::default();
        assert!((top_rate(&config, 10) - 0.006).abs() < 1e-12);
        assert!((top_rate(&config, 55) - 0.306).abs() < 1e-9);

        // 0.2 misses the base rate but lands inside the ramped band
        let mut rolls = ScriptedRolls::constant(0.2);
        let outcome = resolve_pull(&config, PityCounters::new(54, 2), &mut rolls);
        assert_eq!(outcome.rarity, Rarity::Exalted);
        assert_eq!(outcome.reason, PullReason::Roll);
    }

    #[test]
    fn test_ramp_never_swallows_four_star_band() {
        let config = BannerConfig {
            soft_pity: SoftPity::Linear {
                start: 1,
                step: 1.0,
            },
            ..Default::default()
        };
        assert!((top_rate(&config, 40) - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_seeded_streak_never_passes_hard_pity() {
        let config = flat();
        let mut rolls = RandRolls(StdRng::seed_from_u64(7));
        let mut counters = PityCounters::default();
        let mut streak = 0;

        for _ in 0..5_000 {
            let outcome = resolve_pull(&config, counters, &mut rolls);
            streak += 1;
            if outcome.rarity == Rarity::Exalted {
                assert!(streak <= config.hard_pity);
                streak = 0;
            }
            assert!(outcome.counters.pity_5 < config.hard_pity);
            assert!(outcome.counters.pity_4 < config.mid_pity);
            counters = outcome.counters;
        }
    }

    #[test]
    fn test_notes_match_reason() {
        assert_eq!(PullReason::Roll.note(Rarity::Common), "");
        assert_eq!(PullReason::Roll.note(Rarity::Exalted), "[LUCKY PULL]");
        assert_eq!(PullReason::HardPity.note(Rarity::Exalted), "[HARD PITY]");
    }
}

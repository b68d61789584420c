//! Banner configuration: rates, pity thresholds and the loot table.
//!
//! A banner is static per deployment. It is read once at startup (from TOML
//! or the built-in defaults) and validated before the engine accepts pulls.

use std::collections::BTreeMap;
use std::path::Path;

use gacha_store::Rarity;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Pull index at which five-star is guaranteed.
pub const DEFAULT_HARD_PITY: u32 = 60;
/// Pulls after which a four-star-or-better is guaranteed.
pub const DEFAULT_MID_PITY: u32 = 10;
pub const DEFAULT_RATE_TOP: f64 = 0.006;
pub const DEFAULT_RATE_MID: f64 = 0.05;
pub const DEFAULT_MAX_PULLS: u32 = 10;

/// Soft-pity strategy applied to the five-star base rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SoftPity {
    /// Base rate is flat until hard pity
    None,
    /// From `start` pulls on, every extra pull adds `step` to the base rate
    Linear { start: u32, step: f64 },
}

impl Default for SoftPity {
    fn default() -> Self {
        Self::Linear {
            start: 50,
            step: 0.06,
        }
    }
}

impl SoftPity {
    /// Extra five-star probability at the given (already incremented) pity.
    pub fn boost(&self, pity_5: u32) -> f64 {
        match *self {
            Self::None => 0.0,
            Self::Linear { start, step } if pity_5 >= start => f64::from(pity_5 - start) * step,
            Self::Linear { .. } => 0.0,
        }
    }

    /// First pull index the ramp affects, if any
    pub fn start(&self) -> Option<u32> {
        match *self {
            Self::None => None,
            Self::Linear { start, .. } => Some(start),
        }
    }
}

/// A fixed pull index with a fail-forward coin flip.
///
/// On exactly the `pull`-th pull since the last five-star, one draw with
/// probability `chance` grants five-star; otherwise the pull is four-star.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub pull: u32,
    pub chance: f64,
}

/// Everything static about a banner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BannerConfig {
    pub hard_pity: u32,
    pub mid_pity: u32,
    pub rate_top: f64,
    pub rate_mid: f64,
    /// Largest amount accepted by a single session
    pub max_pulls: u32,
    pub checkpoint: Option<Checkpoint>,
    pub soft_pity: SoftPity,
    /// Tier name (`common`/`rare`/`exalted` or `3`/`4`/`5`) to item names
    pub loot: BTreeMap<String, Vec<String>>,
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            hard_pity: DEFAULT_HARD_PITY,
            mid_pity: DEFAULT_MID_PITY,
            rate_top: DEFAULT_RATE_TOP,
            rate_mid: DEFAULT_RATE_MID,
            max_pulls: DEFAULT_MAX_PULLS,
            checkpoint: None,
            soft_pity: SoftPity::default(),
            loot: default_loot(),
        }
    }
}

fn default_loot() -> BTreeMap<String, Vec<String>> {
    let tiers: [(Rarity, &[&str]); 3] = [
        (
            Rarity::Common,
            &[
                "Rusted Seax",
                "Padded Furs & Wood",
                "10% XP Multiplier Token (1 Use)",
                "50 XP Crystal",
                "100 XP Crystal",
                "1,000 Crowns",
            ],
        ),
        (
            Rarity::Rare,
            &[
                "Huscarl Bearded Axe",
                "Huscarl Lamellar",
                "10% XP Multiplier Token (1 Week)",
                "250 XP Crystal",
                "10,000 Crowns",
                "The Einherjar's Edge",
                "The Einherjar's Hauberk",
            ],
        ),
        (
            Rarity::Exalted,
            &[
                "Exalted Grade Item",
                "20% XP Multiplier (1 Week)",
                "500 XP Crystal",
                "50,000 Crowns",
                "Legendary Warhorn",
            ],
        ),
    ];

    tiers
        .into_iter()
        .map(|(rarity, items)| {
            (
                rarity.to_string(),
                items.iter().map(|s| s.to_string()).collect(),
            )
        })
        .collect()
}

fn check_rate(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::RateOutOfRange { name, value })
    }
}

fn check_threshold(name: &'static str, value: u32) -> Result<(), ConfigError> {
    if value >= 1 {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold { name, value })
    }
}

impl BannerConfig {
    /// Parse and validate a TOML banner definition.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML banner file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Reject any configuration the resolver cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_rate("rate_top", self.rate_top)?;
        check_rate("rate_mid", self.rate_mid)?;
        let combined = self.rate_top + self.rate_mid;
        if combined > 1.0 {
            return Err(ConfigError::RatesExceedOne(combined));
        }

        check_threshold("hard_pity", self.hard_pity)?;
        check_threshold("mid_pity", self.mid_pity)?;
        check_threshold("max_pulls", self.max_pulls)?;

        if let Some(checkpoint) = self.checkpoint {
            check_rate("checkpoint.chance", checkpoint.chance)?;
            if checkpoint.pull == 0 || checkpoint.pull >= self.hard_pity {
                return Err(ConfigError::InvalidCheckpoint {
                    pull: checkpoint.pull,
                    hard_pity: self.hard_pity,
                });
            }
        }

        if let SoftPity::Linear { start, step } = self.soft_pity {
            if start >= self.hard_pity || !step.is_finite() || step < 0.0 {
                return Err(ConfigError::InvalidRamp);
            }
        }

        self.loot_tiers().map(|_| ())
    }

    /// Loot table keyed by rarity, with every tier present and non-empty.
    pub fn loot_tiers(&self) -> Result<BTreeMap<Rarity, Vec<String>>, ConfigError> {
        let mut tiers = BTreeMap::new();
        for (key, items) in &self.loot {
            let rarity: Rarity = key
                .parse()
                .map_err(|_| ConfigError::UnknownTier(key.clone()))?;
            if items.is_empty() {
                return Err(ConfigError::EmptyTier(rarity.tier()));
            }
            tiers.insert(rarity, items.clone());
        }

        if let Some(missing) = Rarity::ALL.iter().find(|r| !tiers.contains_key(r)) {
            return Err(ConfigError::MissingTier(missing.tier()));
        }

        Ok(tiers)
    }
}

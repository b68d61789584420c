//! Loot catalog: the items each rarity tier can grant.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use gacha_store::Rarity;

use crate::config::BannerConfig;
use crate::error::ConfigError;
use crate::resolver::RollSource;

/// Immutable tier → items table, validated when built.
#[derive(Debug, Clone, PartialEq)]
pub struct LootCatalog {
    tiers: BTreeMap<Rarity, Vec<String>>,
}

impl LootCatalog {
    /// Build the catalog, rejecting missing or empty tiers.
    pub fn from_config(config: &BannerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            tiers: config.loot_tiers()?,
        })
    }

    /// Items registered for a tier
    pub fn items(&self, rarity: Rarity) -> Result<&[String], ConfigError> {
        match self.tiers.get(&rarity) {
            Some(items) if !items.is_empty() => Ok(items.as_slice()),
            Some(_) => Err(ConfigError::EmptyTier(rarity.tier())),
            None => Err(ConfigError::MissingTier(rarity.tier())),
        }
    }

    /// Draw one item uniformly from a tier.
    pub fn pick<R: RollSource + ?Sized>(
        &self,
        rarity: Rarity,
        rolls: &mut R,
    ) -> Result<&str, ConfigError> {
        let items = self.items(rarity)?;
        let index = rolls.pick(items.len()).min(items.len() - 1);
        Ok(&items[index])
    }

    /// Which tier an item belongs to, if any
    pub fn rarity_of(&self, item: &str) -> Option<Rarity> {
        self.tiers
            .iter()
            .find(|(_, items)| items.iter().any(|i| i == item))
            .map(|(rarity, _)| *rarity)
    }

    /// Per-item odds under the base rates, for display.
    pub fn distribution<'a>(&'a self, config: &'a BannerConfig) -> impl Display + 'a {
        Distribution {
            catalog: self,
            config,
        }
    }
}

struct Distribution<'a> {
    catalog: &'a LootCatalog,
    config: &'a BannerConfig,
}

impl Display for Distribution<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let common = 1.0 - self.config.rate_top - self.config.rate_mid;
        for (rarity, items) in self.catalog.tiers.iter().rev() {
            let tier_rate = match rarity {
                Rarity::Exalted => self.config.rate_top,
                Rarity::Rare => self.config.rate_mid,
                Rarity::Common => common,
            };
            writeln!(
                f,
                "{} {} - {:.3}% ({} items)",
                rarity.stars(),
                rarity,
                tier_rate * 100.0,
                items.len()
            )?;
            let each = tier_rate / items.len() as f64;
            for item in items {
                writeln!(f, "\t{}: {:.4}%", item, each * 100.0)?;
            }
        }
        Ok(())
    }
}

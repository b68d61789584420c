//! Shared types for the gacha ledgers.
//!
//! These types are database-agnostic and used by every backend and by the
//! engine itself.

use serde::{Deserialize, Serialize};

/// Errors produced when parsing stored values back into typed values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid rarity tier: {0}")]
    InvalidRarity(String),
}

/// Rarity tier of a pulled item.
///
/// The numeric value is the tier number used in storage and in the loot
/// table (3 = common, 4 = mid, 5 = top).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    /// Three-star, the base-rate outcome
    Common = 3,
    /// Four-star, guaranteed by mid-tier pity
    Rare = 4,
    /// Five-star, guaranteed by hard pity
    Exalted = 5,
}

impl Rarity {
    /// All tiers, lowest first
    pub const ALL: [Rarity; 3] = [Rarity::Common, Rarity::Rare, Rarity::Exalted];

    /// Numeric tier (3, 4 or 5)
    pub fn tier(self) -> u8 {
        self as u8
    }

    /// Look up a rarity by its numeric tier
    pub fn from_tier(tier: u8) -> Option<Self> {
        match tier {
            3 => Some(Self::Common),
            4 => Some(Self::Rare),
            5 => Some(Self::Exalted),
            _ => None,
        }
    }

    /// Star string used in listings
    pub fn stars(self) -> &'static str {
        match self {
            Self::Common => "★★★",
            Self::Rare => "★★★★",
            Self::Exalted => "★★★★★",
        }
    }
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Common => write!(f, "common"),
            Self::Rare => write!(f, "rare"),
            Self::Exalted => write!(f, "exalted"),
        }
    }
}

impl std::str::FromStr for Rarity {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "common" | "3" => Ok(Self::Common),
            "rare" | "4" => Ok(Self::Rare),
            "exalted" | "5" => Ok(Self::Exalted),
            _ => Err(ParseError::InvalidRarity(s.to_string())),
        }
    }
}

impl TryFrom<i64> for Rarity {
    type Error = ParseError;
    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Self::from_tier)
            .ok_or_else(|| ParseError::InvalidRarity(value.to_string()))
    }
}

/// The two pity counters the resolver threads from pull to pull
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PityCounters {
    /// Pulls since the last five-star grant
    pub pity_5: u32,
    /// Pulls since the last four-star-or-better grant
    pub pity_4: u32,
}

impl PityCounters {
    pub fn new(pity_5: u32, pity_4: u32) -> Self {
        Self { pity_5, pity_4 }
    }
}

/// Persistent per-user pity state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PityState {
    pub user_id: String,
    pub pity_5: u32,
    pub pity_4: u32,
    /// Lifetime pull count, never reset by pulls
    pub total_pulls: u64,
    /// Lifetime five-star count
    pub total_top_rarity: u64,
    /// Row version for compare-and-swap saves
    pub version: i64,
}

impl PityState {
    /// Zeroed state for a user who has never pulled
    pub fn fresh(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            pity_5: 0,
            pity_4: 0,
            total_pulls: 0,
            total_top_rarity: 0,
            version: 0,
        }
    }

    pub fn counters(&self) -> PityCounters {
        PityCounters::new(self.pity_5, self.pity_4)
    }

    /// New state after `pulls` more pulls ending on `counters`.
    ///
    /// The version is carried over unchanged; the store bumps it when the
    /// returned state is saved.
    pub fn advanced(&self, counters: PityCounters, pulls: u64, top_grants: u64) -> Self {
        Self {
            user_id: self.user_id.clone(),
            pity_5: counters.pity_5,
            pity_4: counters.pity_4,
            total_pulls: self.total_pulls + pulls,
            total_top_rarity: self.total_top_rarity + top_grants,
            version: self.version,
        }
    }
}

/// One row of a user's inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub item_name: String,
    pub quantity: u64,
}

/// One pull, as recorded in the history ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub user_id: String,
    pub item_name: String,
    pub rarity: Rarity,
    pub timestamp: i64,
    pub session_id: String,
}

/// An item granted by a pull, staged until the session commits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub item_name: String,
    pub rarity: Rarity,
}

/// Everything a pull session writes, applied atomically by the store
#[derive(Debug, Clone)]
pub struct SessionCommit<'a> {
    /// State as loaded at session start; its version guards the save
    pub loaded: &'a PityState,
    /// State after the last pull of the session
    pub state: &'a PityState,
    /// One entry per pull, in pull order
    pub grants: &'a [Grant],
    pub session_id: &'a str,
    pub timestamp: i64,
}

/// Leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub total_pulls: u64,
    pub total_top_rarity: u64,
}

/// Aggregate counts across every user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub users: u64,
    pub total_pulls: u64,
    pub exalted_pulled: u64,
    pub rare_pulled: u64,
    pub common_pulled: u64,
}

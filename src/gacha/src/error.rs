//! Error types for the gacha engine.

use gacha_store::RepoError;
use thiserror::Error;

/// Result type for engine operations.
pub type GachaResult<T> = Result<T, GachaError>;

/// Top-level engine error.
#[derive(Debug, Error)]
pub enum GachaError {
    /// Banner configuration is unusable; the engine refuses to start.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Caller input was rejected before touching the store.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The store failed; nothing from the failed operation was applied.
    #[error("persistence error: {0}")]
    Persistence(#[from] RepoError),

    /// An engine invariant was broken.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GachaError {
    /// Whether repeating the whole operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Persistence(RepoError::Conflict { .. } | RepoError::Database(_))
        )
    }
}

/// Problems found while validating a banner configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("loot table has no tier {0}")]
    MissingTier(u8),

    #[error("loot table tier {0} is empty")]
    EmptyTier(u8),

    #[error("loot table has unknown tier {0:?}")]
    UnknownTier(String),

    #[error("{name} must be within [0, 1], got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },

    #[error("rate_top + rate_mid must not exceed 1, got {0}")]
    RatesExceedOne(f64),

    #[error("{name} must be at least 1, got {value}")]
    InvalidThreshold { name: &'static str, value: u32 },

    #[error("checkpoint pull {pull} must fall below hard pity {hard_pity}")]
    InvalidCheckpoint { pull: u32, hard_pity: u32 },

    #[error("soft pity ramp must start below hard pity and use a non-negative step")]
    InvalidRamp,

    #[error("failed to read banner config: {0}")]
    Read(String),

    #[error("failed to parse banner config: {0}")]
    Parse(String),
}

/// Caller input rejected by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("pull amount must be between 1 and {max}, got {amount}")]
    InvalidAmount { amount: u32, max: u32 },

    #[error("user id must not be empty")]
    InvalidUserId,

    #[error("{name} must be between 0 and {max}, got {value}")]
    PityOutOfRange {
        name: &'static str,
        value: u32,
        max: u32,
    },

    #[error("total pulls ({total}) cannot be below pity ({pity})")]
    TotalBelowPity { total: u64, pity: u32 },

    #[error("amount to consume must be at least 1")]
    InvalidConsumeAmount,

    #[error("you do not have {requested} of {item} (holding {held})")]
    InsufficientQuantity {
        item: String,
        requested: u64,
        held: u64,
    },

    #[error("{0} cannot be used (only Crystals and Crowns are consumable)")]
    NotConsumable(String),
}

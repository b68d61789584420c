//! Repository traits for the gacha ledgers.
//!
//! These traits define the interface every persistence backend provides.

use crate::types::*;

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    /// The stored row moved on since it was loaded
    #[error("Pity state for {user_id} changed concurrently (expected version {expected_version})")]
    Conflict {
        user_id: String,
        expected_version: i64,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Pity, inventory and history operations
pub trait GachaRepository {
    /// Initialize the database schema
    fn init(&self) -> RepoResult<()>;

    // === Pity state ===

    /// Load a user's pity state, creating a zeroed row if none exists.
    ///
    /// Concurrent first loads for the same user leave exactly one row.
    fn load_pity(&self, user_id: &str) -> RepoResult<PityState>;

    /// Read a user's pity state without creating it
    fn get_pity(&self, user_id: &str) -> RepoResult<Option<PityState>>;

    /// Overwrite a user's pity state if its version still matches.
    ///
    /// Returns the stored state with its bumped version, or
    /// [`RepoError::Conflict`] when another writer got there first.
    fn save_pity(&self, state: &PityState) -> RepoResult<PityState>;

    // === Sessions ===

    /// Apply a finished pull session in one transaction: the guarded pity
    /// save, one inventory increment and one history row per grant.
    ///
    /// On any error nothing is written.
    fn commit_session(&self, commit: &SessionCommit<'_>) -> RepoResult<PityState>;

    // === Inventory ===

    /// All held items, largest stacks first
    fn get_inventory(&self, user_id: &str) -> RepoResult<Vec<InventoryEntry>>;

    /// Quantity held of one item (0 when absent)
    fn item_quantity(&self, user_id: &str, item_name: &str) -> RepoResult<u64>;

    /// Remove `quantity` of an item, pruning the row when it reaches zero.
    ///
    /// Returns `false` (and changes nothing) when fewer are held.
    fn consume_item(&self, user_id: &str, item_name: &str, quantity: u64) -> RepoResult<bool>;

    // === History ===

    /// Most recent pulls first, at most `limit` rows
    fn get_history(&self, user_id: &str, limit: usize) -> RepoResult<Vec<HistoryRecord>>;
}

/// Extension trait for cross-user aggregate queries
pub trait StatsRepository {
    /// Users with the most lifetime pulls
    fn leaderboard(&self, limit: usize) -> RepoResult<Vec<LeaderboardEntry>>;

    /// Totals across every user
    fn ledger_stats(&self) -> RepoResult<LedgerStats>;
}

impl<T: GachaRepository + ?Sized> GachaRepository for &T {
    fn init(&self) -> RepoResult<()> {
        (**self).init()
    }

    fn load_pity(&self, user_id: &str) -> RepoResult<PityState> {
        (**self).load_pity(user_id)
    }

    fn get_pity(&self, user_id: &str) -> RepoResult<Option<PityState>> {
        (**self).get_pity(user_id)
    }

    fn save_pity(&self, state: &PityState) -> RepoResult<PityState> {
        (**self).save_pity(state)
    }

    fn commit_session(&self, commit: &SessionCommit<'_>) -> RepoResult<PityState> {
        (**self).commit_session(commit)
    }

    fn get_inventory(&self, user_id: &str) -> RepoResult<Vec<InventoryEntry>> {
        (**self).get_inventory(user_id)
    }

    fn item_quantity(&self, user_id: &str, item_name: &str) -> RepoResult<u64> {
        (**self).item_quantity(user_id, item_name)
    }

    fn consume_item(&self, user_id: &str, item_name: &str, quantity: u64) -> RepoResult<bool> {
        (**self).consume_item(user_id, item_name, quantity)
    }

    fn get_history(&self, user_id: &str, limit: usize) -> RepoResult<Vec<HistoryRecord>> {
        (**self).get_history(user_id, limit)
    }
}

impl<T: StatsRepository + ?Sized> StatsRepository for &T {
    fn leaderboard(&self, limit: usize) -> RepoResult<Vec<LeaderboardEntry>> {
        (**self).leaderboard(limit)
    }

    fn ledger_stats(&self) -> RepoResult<LedgerStats> {
        (**self).ledger_stats()
    }
}

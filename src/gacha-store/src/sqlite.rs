//! SQLite implementation using rusqlite (synchronous).
//!
//! One connection is owned per handle and guarded by a mutex, so a
//! `SqliteDb` can be shared between threads. Several handles may point at the
//! same file; writes are serialized by SQLite itself.

use crate::repository::*;
use crate::types::*;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

/// Default database location
pub const DEFAULT_DB_PATH: &str = "share/gacha.db";

/// How long a writer waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const PITY_COLUMNS: &str = "user_id, pity_5, pity_4, total_pulls, total_top_rarity, version";

/// SQLite-backed gacha ledgers
pub struct SqliteDb {
    conn: Mutex<Connection>,
}

fn db_err(e: rusqlite::Error) -> RepoError {
    RepoError::Database(e.to_string())
}

fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

fn row_to_pity(row: &rusqlite::Row<'_>) -> rusqlite::Result<PityState> {
    Ok(PityState {
        user_id: row.get(0)?,
        pity_5: row.get(1)?,
        pity_4: row.get(2)?,
        total_pulls: count(row.get(3)?),
        total_top_rarity: count(row.get(4)?),
        version: row.get(5)?,
    })
}

fn select_pity(conn: &Connection, user_id: &str) -> RepoResult<Option<PityState>> {
    let sql = format!("SELECT {} FROM pity WHERE user_id = ?1", PITY_COLUMNS);
    conn.query_row(&sql, params![user_id], row_to_pity)
        .optional()
        .map_err(db_err)
}

/// Compare-and-swap write of a pity row.
///
/// A missing row is inserted only when the caller started from a fresh
/// (version 0) state; any other mismatch is a conflict.
fn write_pity(conn: &Connection, expected_version: i64, state: &PityState) -> RepoResult<PityState> {
    let rows = conn
        .execute(
            "UPDATE pity SET
                pity_5 = ?2,
                pity_4 = ?3,
                total_pulls = ?4,
                total_top_rarity = ?5,
                version = version + 1,
                updated_at = CURRENT_TIMESTAMP
             WHERE user_id = ?1 AND version = ?6",
            params![
                state.user_id,
                state.pity_5,
                state.pity_4,
                state.total_pulls as i64,
                state.total_top_rarity as i64,
                expected_version
            ],
        )
        .map_err(db_err)?;

    if rows == 0 {
        let inserted = if expected_version == 0 {
            conn.execute(
                "INSERT INTO pity (user_id, pity_5, pity_4, total_pulls, total_top_rarity, version)
                 VALUES (?1, ?2, ?3, ?4, ?5, 1)
                 ON CONFLICT(user_id) DO NOTHING",
                params![
                    state.user_id,
                    state.pity_5,
                    state.pity_4,
                    state.total_pulls as i64,
                    state.total_top_rarity as i64
                ],
            )
            .map_err(db_err)?
        } else {
            0
        };

        if inserted == 0 {
            return Err(RepoError::Conflict {
                user_id: state.user_id.clone(),
                expected_version,
            });
        }
    }

    Ok(PityState {
        version: expected_version + 1,
        ..state.clone()
    })
}

impl SqliteDb {
    /// Open or create the database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path.as_ref())?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Check if a migration has been applied
    fn is_migration_applied(conn: &Connection, version: &str) -> RepoResult<bool> {
        let result: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM schema_migrations WHERE version = ?1",
                params![version],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;
        Ok(result.is_some())
    }

    /// Mark a migration as applied
    fn mark_migration_applied(conn: &Connection, version: &str) -> RepoResult<()> {
        conn.execute(
            "INSERT INTO schema_migrations (version) VALUES (?1)",
            params![version],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// Run pending migrations
    fn run_migrations(conn: &Connection) -> RepoResult<()> {
        // Migration 0001: pity, inventory and history ledgers
        if !Self::is_migration_applied(conn, "0001_base_schema")? {
            conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS pity (
                    user_id TEXT PRIMARY KEY NOT NULL,
                    pity_5 INTEGER NOT NULL DEFAULT 0 CHECK (pity_5 >= 0),
                    pity_4 INTEGER NOT NULL DEFAULT 0 CHECK (pity_4 >= 0),
                    total_pulls INTEGER NOT NULL DEFAULT 0 CHECK (total_pulls >= 0),
                    total_top_rarity INTEGER NOT NULL DEFAULT 0 CHECK (total_top_rarity >= 0),
                    version INTEGER NOT NULL DEFAULT 0,
                    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                );

                CREATE TABLE IF NOT EXISTS inventory (
                    user_id TEXT NOT NULL,
                    item_name TEXT NOT NULL,
                    quantity INTEGER NOT NULL DEFAULT 0 CHECK (quantity >= 0),
                    PRIMARY KEY (user_id, item_name)
                );

                CREATE TABLE IF NOT EXISTS pull_history (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id TEXT NOT NULL,
                    item_name TEXT NOT NULL,
                    rarity INTEGER NOT NULL,
                    timestamp INTEGER NOT NULL,
                    session_id TEXT NOT NULL
                );
                "#,
            )
            .map_err(db_err)?;

            Self::mark_migration_applied(conn, "0001_base_schema")?;
            tracing::info!("SQLite: applied migration 0001_base_schema");
        }

        // Create indexes AFTER all migrations
        conn.execute_batch(
            r#"
            CREATE INDEX IF NOT EXISTS idx_pull_history_user_time
                ON pull_history(user_id, timestamp);
            CREATE INDEX IF NOT EXISTS idx_pull_history_rarity ON pull_history(rarity);
            CREATE INDEX IF NOT EXISTS idx_pity_total_pulls ON pity(total_pulls);
            "#,
        )
        .map_err(db_err)?;

        Ok(())
    }
}

impl GachaRepository for SqliteDb {
    fn init(&self) -> RepoResult<()> {
        let conn = self.conn.lock();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version TEXT PRIMARY KEY NOT NULL,
                applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )
        .map_err(db_err)?;

        Self::run_migrations(&conn)
    }

    fn load_pity(&self, user_id: &str) -> RepoResult<PityState> {
        let conn = self.conn.lock();

        conn.execute(
            "INSERT INTO pity (user_id) VALUES (?1) ON CONFLICT(user_id) DO NOTHING",
            params![user_id],
        )
        .map_err(db_err)?;

        select_pity(&conn, user_id)?.ok_or_else(|| RepoError::NotFound(user_id.to_string()))
    }

    fn get_pity(&self, user_id: &str) -> RepoResult<Option<PityState>> {
        let conn = self.conn.lock();
        select_pity(&conn, user_id)
    }

    fn save_pity(&self, state: &PityState) -> RepoResult<PityState> {
        let conn = self.conn.lock();
        write_pity(&conn, state.version, state)
    }

    fn commit_session(&self, commit: &SessionCommit<'_>) -> RepoResult<PityState> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(db_err)?;

        let saved = write_pity(&tx, commit.loaded.version, commit.state)?;

        {
            let mut grant_item = tx
                .prepare_cached(
                    "INSERT INTO inventory (user_id, item_name, quantity) VALUES (?1, ?2, 1)
                     ON CONFLICT(user_id, item_name) DO UPDATE SET quantity = quantity + 1",
                )
                .map_err(db_err)?;
            let mut log_pull = tx
                .prepare_cached(
                    "INSERT INTO pull_history (user_id, item_name, rarity, timestamp, session_id)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(db_err)?;

            for grant in commit.grants {
                grant_item
                    .execute(params![commit.state.user_id, grant.item_name])
                    .map_err(db_err)?;
                log_pull
                    .execute(params![
                        commit.state.user_id,
                        grant.item_name,
                        grant.rarity.tier(),
                        commit.timestamp,
                        commit.session_id
                    ])
                    .map_err(db_err)?;
            }
        }

        tx.commit().map_err(db_err)?;
        Ok(saved)
    }

    fn get_inventory(&self, user_id: &str) -> RepoResult<Vec<InventoryEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT item_name, quantity FROM inventory
                 WHERE user_id = ?1 AND quantity > 0
                 ORDER BY quantity DESC, item_name ASC",
            )
            .map_err(db_err)?;

        let entries = stmt
            .query_map(params![user_id], |row| {
                Ok(InventoryEntry {
                    item_name: row.get(0)?,
                    quantity: count(row.get(1)?),
                })
            })
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;

        Ok(entries)
    }

    fn item_quantity(&self, user_id: &str, item_name: &str) -> RepoResult<u64> {
        let conn = self.conn.lock();
        let quantity: Option<i64> = conn
            .query_row(
                "SELECT quantity FROM inventory WHERE user_id = ?1 AND item_name = ?2",
                params![user_id, item_name],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;
        Ok(quantity.map(count).unwrap_or(0))
    }

    fn consume_item(&self, user_id: &str, item_name: &str, quantity: u64) -> RepoResult<bool> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(db_err)?;

        let rows = tx
            .execute(
                "UPDATE inventory SET quantity = quantity - ?3
                 WHERE user_id = ?1 AND item_name = ?2 AND quantity >= ?3",
                params![user_id, item_name, i64::try_from(quantity).unwrap_or(i64::MAX)],
            )
            .map_err(db_err)?;

        if rows == 0 {
            return Ok(false);
        }

        tx.execute(
            "DELETE FROM inventory WHERE user_id = ?1 AND item_name = ?2 AND quantity <= 0",
            params![user_id, item_name],
        )
        .map_err(db_err)?;

        tx.commit().map_err(db_err)?;
        Ok(true)
    }

    fn get_history(&self, user_id: &str, limit: usize) -> RepoResult<Vec<HistoryRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT user_id, item_name, rarity, timestamp, session_id
                 FROM pull_history
                 WHERE user_id = ?1
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?2",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map(params![user_id, limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;

        rows.into_iter()
            .map(
                |(user_id, item_name, rarity, timestamp, session_id)| -> RepoResult<HistoryRecord> {
                    Ok(HistoryRecord {
                        user_id,
                        item_name,
                        rarity: Rarity::try_from(rarity)?,
                        timestamp,
                        session_id,
                    })
                },
            )
            .collect()
    }
}

impl StatsRepository for SqliteDb {
    fn leaderboard(&self, limit: usize) -> RepoResult<Vec<LeaderboardEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT user_id, total_pulls, total_top_rarity FROM pity
                 WHERE total_pulls > 0
                 ORDER BY total_pulls DESC, total_top_rarity DESC, user_id ASC
                 LIMIT ?1",
            )
            .map_err(db_err)?;

        let entries = stmt
            .query_map(params![limit as i64], |row| {
                Ok(LeaderboardEntry {
                    user_id: row.get(0)?,
                    total_pulls: count(row.get(1)?),
                    total_top_rarity: count(row.get(2)?),
                })
            })
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;

        Ok(entries)
    }

    fn ledger_stats(&self) -> RepoResult<LedgerStats> {
        let conn = self.conn.lock();

        let (users, total_pulls): (i64, i64) = conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(total_pulls), 0) FROM pity",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(db_err)?;

        let mut stats = LedgerStats {
            users: count(users),
            total_pulls: count(total_pulls),
            ..Default::default()
        };

        let mut stmt = conn
            .prepare("SELECT rarity, COUNT(*) FROM pull_history GROUP BY rarity")
            .map_err(db_err)?;
        let per_rarity = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;

        for (rarity, pulled) in per_rarity {
            match Rarity::try_from(rarity)? {
                Rarity::Exalted => stats.exalted_pulled = count(pulled),
                Rarity::Rare => stats.rare_pulled = count(pulled),
                Rarity::Common => stats.common_pulled = count(pulled),
            }
        }

        Ok(stats)
    }
}

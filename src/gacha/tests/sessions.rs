//! End-to-end pull sessions against SQLite.

use gacha::{
    Banner, BannerConfig, FixedClock, GachaError, PullReason, ScriptedRolls, ValidationError,
};
use gacha_store::{
    GachaRepository, HistoryRecord, InventoryEntry, PityState, Rarity, RepoError, RepoResult,
    SessionCommit, SqliteDb, StatsRepository,
};
use std::collections::BTreeMap;
use tempfile::TempDir;

const T0: i64 = 1_700_000_000;

fn memory_db() -> SqliteDb {
    let db = SqliteDb::open_in_memory().unwrap();
    db.init().unwrap();
    db
}

fn banner_with(db: &SqliteDb, config: BannerConfig) -> Banner<&SqliteDb> {
    Banner::new(db, config).unwrap().with_clock(FixedClock::at(T0))
}

fn banner(db: &SqliteDb) -> Banner<&SqliteDb> {
    banner_with(db, BannerConfig::default())
}

fn single_item_config(common: &str) -> BannerConfig {
    let mut loot = BTreeMap::new();
    loot.insert("common".to_string(), vec![common.to_string()]);
    loot.insert("rare".to_string(), vec!["Gem".to_string()]);
    loot.insert("exalted".to_string(), vec!["Crown".to_string()]);
    BannerConfig {
        loot,
        ..Default::default()
    }
}

#[test]
fn test_hard_pity_on_sixtieth_pull() {
    let db = memory_db();
    let banner = banner(&db);
    banner.admin_set_state("u", 59, 0, Some(59)).unwrap();

    let mut rolls = ScriptedRolls::constant(0.99);
    let session = banner.run_pulls("u", 1, &mut rolls).unwrap();

    assert_eq!(session.pulls[0].rarity, Rarity::Exalted);
    assert_eq!(session.pulls[0].reason, PullReason::HardPity);
    assert_eq!(session.state.pity_5, 0);
    assert_eq!(session.state.pity_4, 0);
    assert_eq!(session.state.total_pulls, 60);
    assert_eq!(session.state.total_top_rarity, 1);
}

#[test]
fn test_tenth_pull_of_fresh_user_is_four_star() {
    let db = memory_db();
    let banner = banner(&db);
    let mut rolls = ScriptedRolls::constant(0.99);

    let session = banner.run_pulls("fresh", 10, &mut rolls).unwrap();

    assert!(session.pulls[..9].iter().all(|p| p.rarity == Rarity::Common));
    assert_eq!(session.pulls[9].rarity, Rarity::Rare);
    assert_eq!(session.pulls[9].reason, PullReason::MidPity);
    assert_eq!(session.state.pity_4, 0);
    assert_eq!(session.state.pity_5, 10);
    assert_eq!(session.state.total_pulls, 10);
}

#[test]
fn test_consuming_whole_stack_prunes_it() {
    let db = memory_db();
    let banner = banner_with(&db, single_item_config("X"));
    let mut rolls = ScriptedRolls::constant(0.99);
    banner.run_pulls("u", 3, &mut rolls).unwrap();

    assert_eq!(
        banner.get_inventory("u").unwrap(),
        vec![InventoryEntry {
            item_name: "X".into(),
            quantity: 3
        }]
    );

    banner.consume_item("u", "X", 3).unwrap();
    assert!(banner.get_inventory("u").unwrap().is_empty());

    let err = banner.consume_item("u", "X", 1).unwrap_err();
    assert!(matches!(
        err,
        GachaError::Validation(ValidationError::InsufficientQuantity { held: 0, .. })
    ));
}

#[test]
fn test_partial_consume_keeps_remainder() {
    let db = memory_db();
    let banner = banner_with(&db, single_item_config("X"));
    banner
        .run_pulls("u", 5, &mut ScriptedRolls::constant(0.99))
        .unwrap();

    assert!(banner.consume_item("u", "X", 6).is_err());
    banner.consume_item("u", "X", 2).unwrap();
    assert_eq!(db.item_quantity("u", "X").unwrap(), 3);
}

#[test]
fn test_amount_bounds_leave_state_unchanged() {
    let db = memory_db();
    let banner = banner(&db);
    let mut rolls = ScriptedRolls::constant(0.5);

    let session = banner.run_pulls("u", 10, &mut rolls).unwrap();
    let before = banner.get_state("u").unwrap();
    assert_eq!(before, session.state);

    for amount in [0, 11] {
        let err = banner.run_pulls("u", amount, &mut rolls).unwrap_err();
        assert!(matches!(
            err,
            GachaError::Validation(ValidationError::InvalidAmount { max: 10, .. })
        ));
        assert!(!err.is_retryable());
    }

    assert_eq!(banner.get_state("u").unwrap(), before);
    assert_eq!(banner.get_history("u", 100).unwrap().len(), 10);
}

#[test]
fn test_history_is_newest_first_across_sessions() {
    let db = memory_db();
    let banner = banner_with(&db, single_item_config("X"));
    let mut rolls = ScriptedRolls::constant(0.99);

    let first = banner.run_pulls("u", 2, &mut rolls).unwrap();
    let second = banner.run_pulls("u", 2, &mut rolls).unwrap();

    let history: Vec<HistoryRecord> = banner.get_history("u", 3).unwrap();
    assert_eq!(history.len(), 3);
    assert!(history[..2]
        .iter()
        .all(|h| h.session_id == second.session_id));
    assert_eq!(history[2].session_id, first.session_id);
    assert_ne!(first.session_id, second.session_id);
}

#[test]
fn test_using_crowns_reports_value() {
    let db = memory_db();
    let banner = banner_with(&db, single_item_config("1,000 Crowns"));
    banner
        .run_pulls("u", 2, &mut ScriptedRolls::constant(0.99))
        .unwrap();

    let used = banner.use_item("u", "1,000 Crowns", 2).unwrap();
    assert_eq!(used.total_value, Some(2_000));
    assert!(banner.get_inventory("u").unwrap().is_empty());
}

#[test]
fn test_leaderboard_orders_by_lifetime_pulls() {
    let db = memory_db();
    let banner = banner(&db);
    let mut rolls = ScriptedRolls::constant(0.5);
    banner.run_pulls("small", 2, &mut rolls).unwrap();
    banner.run_pulls("big", 10, &mut rolls).unwrap();
    banner.run_pulls("big", 1, &mut rolls).unwrap();

    let board = banner.leaderboard(10).unwrap();
    let order: Vec<(&str, u64)> = board
        .iter()
        .map(|e| (e.user_id.as_str(), e.total_pulls))
        .collect();
    assert_eq!(order, vec![("big", 11), ("small", 2)]);

    let stats = banner.stats().unwrap();
    assert_eq!(stats.ledger.users, 2);
    assert_eq!(stats.ledger.total_pulls, 13);
    assert_eq!(
        stats.ledger.common_pulled + stats.ledger.rare_pulled + stats.ledger.exalted_pulled,
        13
    );
}

#[test]
fn test_concurrent_first_load_creates_one_row() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gacha.db");
    SqliteDb::open(&path).unwrap().init().unwrap();

    let a = SqliteDb::open(&path).unwrap();
    let b = SqliteDb::open(&path).unwrap();

    let (left, right) = std::thread::scope(|s| {
        let left = s.spawn(|| a.load_pity("racer").unwrap());
        let right = s.spawn(|| b.load_pity("racer").unwrap());
        (left.join().unwrap(), right.join().unwrap())
    });

    assert_eq!(left, right);
    assert_eq!(left, PityState::fresh("racer"));
    assert_eq!(a.ledger_stats().unwrap().users, 1);
}

#[test]
fn test_concurrent_sessions_never_lose_pulls() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gacha.db");
    SqliteDb::open(&path).unwrap().init().unwrap();

    let handles = [
        SqliteDb::open(&path).unwrap(),
        SqliteDb::open(&path).unwrap(),
    ];

    std::thread::scope(|s| {
        for db in &handles {
            s.spawn(move || {
                let banner = Banner::new(db, BannerConfig::default()).unwrap();
                let mut rolls = ScriptedRolls::constant(0.5);
                for _ in 0..5 {
                    loop {
                        match banner.run_pulls("shared", 10, &mut rolls) {
                            Ok(_) => break,
                            Err(e) if e.is_retryable() => continue,
                            Err(e) => panic!("session failed: {}", e),
                        }
                    }
                }
            });
        }
    });

    let state = handles[0].get_pity("shared").unwrap().unwrap();
    assert_eq!(state.total_pulls, 100);
    assert_eq!(handles[0].get_history("shared", 1_000).unwrap().len(), 100);
}

/// Store wrapper that lets another writer save between a session's load and
/// its commit.
struct Interleaved<'a> {
    inner: &'a SqliteDb,
}

impl GachaRepository for Interleaved<'_> {
    fn init(&self) -> RepoResult<()> {
        self.inner.init()
    }

    fn load_pity(&self, user_id: &str) -> RepoResult<PityState> {
        let loaded = self.inner.load_pity(user_id)?;
        let rival = PityState {
            pity_5: 7,
            pity_4: 7,
            total_pulls: loaded.total_pulls + 7,
            ..loaded.clone()
        };
        self.inner.save_pity(&rival)?;
        Ok(loaded)
    }

    fn get_pity(&self, user_id: &str) -> RepoResult<Option<PityState>> {
        self.inner.get_pity(user_id)
    }

    fn save_pity(&self, state: &PityState) -> RepoResult<PityState> {
        self.inner.save_pity(state)
    }

    fn commit_session(&self, commit: &SessionCommit<'_>) -> RepoResult<PityState> {
        self.inner.commit_session(commit)
    }

    fn get_inventory(&self, user_id: &str) -> RepoResult<Vec<InventoryEntry>> {
        self.inner.get_inventory(user_id)
    }

    fn item_quantity(&self, user_id: &str, item_name: &str) -> RepoResult<u64> {
        self.inner.item_quantity(user_id, item_name)
    }

    fn consume_item(&self, user_id: &str, item_name: &str, quantity: u64) -> RepoResult<bool> {
        self.inner.consume_item(user_id, item_name, quantity)
    }

    fn get_history(&self, user_id: &str, limit: usize) -> RepoResult<Vec<HistoryRecord>> {
        self.inner.get_history(user_id, limit)
    }
}

#[test]
fn test_conflicting_session_grants_nothing() {
    let db = memory_db();
    let banner = Banner::new(Interleaved { inner: &db }, BannerConfig::default()).unwrap();

    let err = banner
        .run_pulls("u", 10, &mut ScriptedRolls::constant(0.5))
        .unwrap_err();
    assert!(matches!(
        err,
        GachaError::Persistence(RepoError::Conflict { .. })
    ));
    assert!(err.is_retryable());

    let state = db.get_pity("u").unwrap().unwrap();
    assert_eq!((state.pity_5, state.pity_4, state.total_pulls), (7, 7, 7));
    assert!(db.get_inventory("u").unwrap().is_empty());
    assert!(db.get_history("u", 10).unwrap().is_empty());
}

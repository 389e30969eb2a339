use crate::config::EngineConfig;
use crate::error::{MatchbookError, Result};
use crate::ledger::{PoolAudit, PoolLedger};
use crate::lifecycle;
use crate::odds;
use crate::settlement;
use crate::storage::{BalanceStore, BetStore, MatchStore, Storage};
use crate::types::{
    Bet, BetStatus, Match, MatchStatus, OddsPair, Outcome, PoolSnapshot, SettlementSummary,
    UserAccount,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Identity seam: answers only "does this user exist?". The default
/// implementation reads the local users table; a deployment with external
/// identity plugs its own resolver in here.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool>;
}

struct SqliteUserDirectory {
    storage: Arc<Storage>,
}

#[async_trait]
impl UserDirectory for SqliteUserDirectory {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool> {
        let conn = self.storage.get_connection().await;
        BalanceStore::exists(&conn, user_id)
    }
}

/// Process-wide wagering service. Owns the storage handle, the engine
/// configuration and the per-match lock registry; all mutation goes through
/// its operations.
///
/// `place_bet` and every lifecycle transition for a match acquire the same
/// per-match lock, so bet acceptance and freeze/resolve/void are serialized
/// against each other while matches remain independent of one another.
pub struct MatchbookEngine {
    storage: Arc<Storage>,
    config: EngineConfig,
    ledger: PoolLedger,
    users: Arc<dyn UserDirectory>,
    match_locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl MatchbookEngine {
    pub async fn new(data_dir: &Path, config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let db_path = data_dir.join("matchbook.db");
        let storage = Arc::new(Storage::new(&db_path).await?);

        Ok(Self {
            ledger: PoolLedger::new(storage.clone()),
            users: Arc::new(SqliteUserDirectory {
                storage: storage.clone(),
            }),
            storage,
            config,
            match_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Swap in an external identity resolver.
    pub fn with_user_directory(mut self, users: Arc<dyn UserDirectory>) -> Self {
        self.users = users;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn match_lock(&self, match_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.match_locks.lock();
        locks
            .entry(match_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Evict a match's lock once it reaches a terminal status. Waiters keep
    /// their own `Arc` clone, and anyone arriving later gets a fresh lock and
    /// then fails the status check inside the transaction.
    fn drop_match_lock(&self, match_id: Uuid) {
        self.match_locks.lock().remove(&match_id);
    }

    // ---- Markets ----

    pub async fn create_match(&self, outcome_a: &str, outcome_b: &str) -> Result<Match> {
        if outcome_a.trim().is_empty() || outcome_b.trim().is_empty() {
            return Err(MatchbookError::config("Outcome labels cannot be empty"));
        }

        let m = Match {
            id: Uuid::new_v4(),
            outcome_a: outcome_a.to_string(),
            outcome_b: outcome_b.to_string(),
            status: MatchStatus::Scheduled,
            winner: None,
            pool_a: 0,
            pool_b: 0,
            created_at: Utc::now(),
        };

        MatchStore::new(&self.storage).save(&m).await?;

        tracing::info!("Created match {}: '{}' vs '{}'", m.id, outcome_a, outcome_b);
        Ok(m)
    }

    pub async fn open_match(&self, match_id: Uuid) -> Result<Match> {
        self.transition(match_id, MatchStatus::Open).await
    }

    pub async fn freeze_match(&self, match_id: Uuid) -> Result<Match> {
        self.transition(match_id, MatchStatus::Frozen).await
    }

    async fn transition(&self, match_id: Uuid, to: MatchStatus) -> Result<Match> {
        let lock = self.match_lock(match_id);
        let _guard = lock.lock().await;

        let mut conn = self.storage.get_connection().await;
        let tx = conn.transaction()?;

        let mut m = MatchStore::get(&tx, match_id)?;
        lifecycle::check_transition(m.status, to)?;
        MatchStore::update_status(&tx, match_id, to, None)?;

        tx.commit()?;

        tracing::info!("Match {} moved {} -> {}", match_id, m.status, to);
        m.status = to;
        Ok(m)
    }

    /// Declare the winner and settle in one transaction.
    ///
    /// Repeating the call with the same winner is a no-op returning the
    /// recorded settlement; any other transition attempt on a finished
    /// match fails with `MatchAlreadyFinal`.
    pub async fn resolve_match(
        &self,
        match_id: Uuid,
        winner: Outcome,
    ) -> Result<SettlementSummary> {
        let lock = self.match_lock(match_id);
        let _guard = lock.lock().await;

        let mut conn = self.storage.get_connection().await;
        let tx = conn.transaction()?;

        let m = MatchStore::get(&tx, match_id)?;

        if m.status == MatchStatus::Resolved && m.winner == Some(winner) {
            let summary = settlement::reconstruct(&tx, &m)?;
            drop(tx);
            self.drop_match_lock(match_id);
            return Ok(summary);
        }

        lifecycle::check_transition(m.status, MatchStatus::Resolved)?;
        MatchStore::update_status(&tx, match_id, MatchStatus::Resolved, Some(winner))?;

        let resolved = Match {
            status: MatchStatus::Resolved,
            winner: Some(winner),
            ..m
        };
        let summary = settlement::settle(&tx, &resolved, winner, &self.config)?;

        tx.commit()?;
        self.drop_match_lock(match_id);

        tracing::info!("Resolved match {} with winner {}", match_id, winner);
        Ok(summary)
    }

    /// Cancel the match and refund every active stake in one transaction.
    /// Idempotent on an already-voided match.
    pub async fn void_match(&self, match_id: Uuid) -> Result<SettlementSummary> {
        let lock = self.match_lock(match_id);
        let _guard = lock.lock().await;

        let mut conn = self.storage.get_connection().await;
        let tx = conn.transaction()?;

        let m = MatchStore::get(&tx, match_id)?;

        if m.status == MatchStatus::Voided {
            let summary = settlement::reconstruct(&tx, &m)?;
            drop(tx);
            self.drop_match_lock(match_id);
            return Ok(summary);
        }

        lifecycle::check_transition(m.status, MatchStatus::Voided)?;
        MatchStore::update_status(&tx, match_id, MatchStatus::Voided, None)?;

        let voided = Match {
            status: MatchStatus::Voided,
            ..m
        };
        let summary = settlement::refund(&tx, &voided)?;

        tx.commit()?;
        self.drop_match_lock(match_id);

        tracing::info!("Voided match {}", match_id);
        Ok(summary)
    }

    // ---- Betting ----

    /// Validate and apply a wager as one atomic unit: debit the balance,
    /// insert the bet row, bump the pool. Any failed check rolls the whole
    /// transaction back, leaving zero side effects.
    pub async fn place_bet(
        &self,
        user_id: Uuid,
        match_id: Uuid,
        outcome: Outcome,
        amount: u64,
    ) -> Result<Bet> {
        if amount < self.config.min_bet {
            return Err(MatchbookError::BetTooSmall {
                min: self.config.min_bet,
                amount,
            });
        }

        if !self.users.user_exists(user_id).await? {
            return Err(MatchbookError::UnknownUser { id: user_id });
        }

        let lock = self.match_lock(match_id);
        let _guard = lock.lock().await;

        let mut conn = self.storage.get_connection().await;
        let tx = conn.transaction()?;

        let account = BalanceStore::get(&tx, user_id)?;
        if account.balance < amount {
            return Err(MatchbookError::InsufficientBalance {
                need: amount,
                available: account.balance,
            });
        }

        let m = MatchStore::get(&tx, match_id)?;
        if m.status != MatchStatus::Open {
            return Err(MatchbookError::MarketClosed { status: m.status });
        }

        BalanceStore::debit(&tx, user_id, amount)?;
        let snapshot = PoolLedger::increment_in_tx(&tx, match_id, outcome, amount)?;

        // Odds the user sees include their own stake's effect on the pool
        let odds = odds::compute_snapshot(&snapshot, &self.config);

        let bet = Bet {
            id: Uuid::new_v4(),
            match_id,
            user_id,
            outcome,
            amount,
            odds_at_placement: odds.for_outcome(outcome),
            status: BetStatus::Active,
            payout: None,
            created_at: Utc::now(),
        };
        BetStore::insert_row(&tx, &bet)?;

        tx.commit()?;

        tracing::info!(
            "Bet {}: user {} staked {} on {} of match {}",
            bet.id,
            user_id,
            amount,
            outcome,
            match_id
        );
        Ok(bet)
    }

    // ---- Reads ----

    pub async fn get_match(&self, match_id: Uuid) -> Result<Match> {
        MatchStore::new(&self.storage).load(match_id).await
    }

    pub async fn list_matches(&self) -> Result<Vec<Match>> {
        MatchStore::new(&self.storage).list().await
    }

    pub async fn pool_snapshot(&self, match_id: Uuid) -> Result<PoolSnapshot> {
        self.ledger.snapshot(match_id).await
    }

    pub async fn odds(&self, match_id: Uuid) -> Result<OddsPair> {
        let snapshot = self.ledger.snapshot(match_id).await?;
        Ok(odds::compute_snapshot(&snapshot, &self.config))
    }

    pub async fn audit_match(&self, match_id: Uuid) -> Result<PoolAudit> {
        self.ledger.audit(match_id).await
    }

    pub async fn bets_for_match(&self, match_id: Uuid) -> Result<Vec<Bet>> {
        // Surface UnknownMatch rather than an empty list
        MatchStore::new(&self.storage).load(match_id).await?;
        BetStore::new(&self.storage).bets_for_match(match_id).await
    }

    pub async fn bets_for_user(&self, user_id: Uuid) -> Result<Vec<Bet>> {
        BetStore::new(&self.storage).bets_for_user(user_id).await
    }

    // ---- Accounts ----

    pub async fn create_account(&self, name: &str) -> Result<UserAccount> {
        let store = BalanceStore::new(&self.storage);

        if store.exists_by_name(name).await? {
            return Err(MatchbookError::config(format!(
                "Account '{}' already exists",
                name
            )));
        }

        let account = UserAccount {
            id: Uuid::new_v4(),
            name: name.to_string(),
            balance: 0,
            created_at: Utc::now(),
        };
        store.save(&account).await?;

        tracing::info!("Created account '{}' with ID: {}", name, account.id);
        Ok(account)
    }

    /// Operator credit: the engine-side entry point for purchased currency.
    pub async fn deposit(&self, user_id: Uuid, amount: u64) -> Result<UserAccount> {
        if amount == 0 {
            return Err(MatchbookError::InvalidAmount);
        }

        let mut conn = self.storage.get_connection().await;
        let tx = conn.transaction()?;

        BalanceStore::credit(&tx, user_id, amount)?;
        let account = BalanceStore::get(&tx, user_id)?;

        tx.commit()?;

        tracing::info!("Deposited {} to account {}", amount, user_id);
        Ok(account)
    }

    pub async fn balance(&self, user_id: Uuid) -> Result<UserAccount> {
        BalanceStore::new(&self.storage).load(user_id).await
    }

    pub async fn account_by_name(&self, name: &str) -> Result<UserAccount> {
        BalanceStore::new(&self.storage).find_by_name(name).await
    }

    pub async fn list_accounts(&self) -> Result<Vec<UserAccount>> {
        BalanceStore::new(&self.storage).list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    async fn engine_with(config: EngineConfig) -> (TempDir, Arc<MatchbookEngine>) {
        let temp_dir = tempdir().unwrap();
        let engine = MatchbookEngine::new(temp_dir.path(), config).await.unwrap();
        (temp_dir, Arc::new(engine))
    }

    async fn engine() -> (TempDir, Arc<MatchbookEngine>) {
        engine_with(EngineConfig::default()).await
    }

    async fn funded(engine: &MatchbookEngine, name: &str, amount: u64) -> UserAccount {
        let account = engine.create_account(name).await.unwrap();
        engine.deposit(account.id, amount).await.unwrap()
    }

    async fn open_match(engine: &MatchbookEngine) -> Match {
        let m = engine.create_match("Red", "Blue").await.unwrap();
        engine.open_match(m.id).await.unwrap()
    }

    #[tokio::test]
    async fn pari_mutuel_worked_example() {
        let (_dir, engine) = engine().await;
        let alice = funded(&engine, "alice", 1_000).await;
        let bob = funded(&engine, "bob", 1_000).await;
        let m = open_match(&engine).await;

        engine
            .place_bet(alice.id, m.id, Outcome::A, 70)
            .await
            .unwrap();
        let bob_bet = engine
            .place_bet(bob.id, m.id, Outcome::B, 30)
            .await
            .unwrap();

        let odds = engine.odds(m.id).await.unwrap();
        assert!((odds.a - 100.0 / 70.0).abs() < 1e-9);
        assert!((odds.b - 100.0 / 30.0).abs() < 1e-9);

        engine.freeze_match(m.id).await.unwrap();
        let summary = engine.resolve_match(m.id, Outcome::A).await.unwrap();

        assert_eq!(summary.total_pool, 100);
        assert_eq!(summary.take, 0);
        assert_eq!(summary.credited, 100);
        assert_eq!(summary.winning_bets, 1);
        assert_eq!(summary.losing_bets, 1);

        // Alice gets her stake back plus the whole losing pool
        assert_eq!(engine.balance(alice.id).await.unwrap().balance, 1_030);
        assert_eq!(engine.balance(bob.id).await.unwrap().balance, 970);

        let bets = engine.bets_for_match(m.id).await.unwrap();
        let lost = bets.iter().find(|b| b.id == bob_bet.id).unwrap();
        assert_eq!(lost.status, BetStatus::Lost);
        assert_eq!(lost.payout, Some(0));
    }

    #[tokio::test]
    async fn resolve_is_idempotent() {
        let (_dir, engine) = engine().await;
        let alice = funded(&engine, "alice", 500).await;
        let bob = funded(&engine, "bob", 500).await;
        let m = open_match(&engine).await;

        engine
            .place_bet(alice.id, m.id, Outcome::A, 100)
            .await
            .unwrap();
        engine
            .place_bet(bob.id, m.id, Outcome::B, 50)
            .await
            .unwrap();
        engine.freeze_match(m.id).await.unwrap();

        let first = engine.resolve_match(m.id, Outcome::A).await.unwrap();
        let second = engine.resolve_match(m.id, Outcome::A).await.unwrap();

        assert_eq!(first.credited, second.credited);
        assert_eq!(first.take, second.take);
        assert_eq!(first.winning_bets, second.winning_bets);
        assert_eq!(engine.balance(alice.id).await.unwrap().balance, 550);
        assert_eq!(engine.balance(bob.id).await.unwrap().balance, 450);

        // A different winner is not a silent no-op
        let err = engine.resolve_match(m.id, Outcome::B).await.unwrap_err();
        assert!(matches!(err, MatchbookError::MatchAlreadyFinal { .. }));
    }

    #[tokio::test]
    async fn void_refunds_every_stake_in_full() {
        let (_dir, engine) = engine().await;
        let alice = funded(&engine, "alice", 100).await;
        let bob = funded(&engine, "bob", 100).await;
        let m = open_match(&engine).await;

        engine
            .place_bet(alice.id, m.id, Outcome::A, 40)
            .await
            .unwrap();
        engine
            .place_bet(bob.id, m.id, Outcome::B, 60)
            .await
            .unwrap();

        let summary = engine.void_match(m.id).await.unwrap();
        assert_eq!(summary.refunded_bets, 2);
        assert_eq!(summary.credited, 100);
        assert_eq!(summary.take, 0);

        assert_eq!(engine.balance(alice.id).await.unwrap().balance, 100);
        assert_eq!(engine.balance(bob.id).await.unwrap().balance, 100);

        for bet in engine.bets_for_match(m.id).await.unwrap() {
            assert_eq!(bet.status, BetStatus::Refunded);
        }

        // Voiding again changes nothing
        let again = engine.void_match(m.id).await.unwrap();
        assert_eq!(again.refunded_bets, 2);
        assert_eq!(engine.balance(alice.id).await.unwrap().balance, 100);
    }

    #[tokio::test]
    async fn rounding_remainder_goes_to_largest_stake() {
        let config = EngineConfig {
            min_bet: 1,
            ..EngineConfig::default()
        };
        let (_dir, engine) = engine_with(config).await;
        let alice = funded(&engine, "alice", 100).await;
        let bob = funded(&engine, "bob", 100).await;
        let carol = funded(&engine, "carol", 100).await;
        let m = open_match(&engine).await;

        engine
            .place_bet(alice.id, m.id, Outcome::A, 1)
            .await
            .unwrap();
        engine.place_bet(bob.id, m.id, Outcome::A, 2).await.unwrap();
        engine
            .place_bet(carol.id, m.id, Outcome::B, 10)
            .await
            .unwrap();

        engine.freeze_match(m.id).await.unwrap();
        let summary = engine.resolve_match(m.id, Outcome::A).await.unwrap();

        // total 13, winning pool 3: floor shares are 4 and 8, remainder 1
        // lands on the larger stake
        assert_eq!(summary.total_pool, 13);
        assert_eq!(summary.credited, 13);
        assert_eq!(engine.balance(alice.id).await.unwrap().balance, 103);
        assert_eq!(engine.balance(bob.id).await.unwrap().balance, 107);
        assert_eq!(engine.balance(carol.id).await.unwrap().balance, 90);

        // Money conserved across the whole book
        let total: u64 = engine
            .list_accounts()
            .await
            .unwrap()
            .iter()
            .map(|a| a.balance)
            .sum();
        assert_eq!(total, 300);
    }

    #[tokio::test]
    async fn take_rate_is_withheld_exactly() {
        let config = EngineConfig {
            take_rate_bps: 500, // 5%
            ..EngineConfig::default()
        };
        let (_dir, engine) = engine_with(config).await;
        let alice = funded(&engine, "alice", 1_000).await;
        let bob = funded(&engine, "bob", 1_000).await;
        let m = open_match(&engine).await;

        engine
            .place_bet(alice.id, m.id, Outcome::A, 70)
            .await
            .unwrap();
        engine
            .place_bet(bob.id, m.id, Outcome::B, 30)
            .await
            .unwrap();
        engine.freeze_match(m.id).await.unwrap();

        let summary = engine.resolve_match(m.id, Outcome::A).await.unwrap();
        assert_eq!(summary.take, 5);
        assert_eq!(summary.credited, 95);
        assert_eq!(summary.credited + summary.take, summary.total_pool);
        assert_eq!(engine.balance(alice.id).await.unwrap().balance, 1_025);
    }

    #[tokio::test]
    async fn empty_winning_pool_refunds_all() {
        let (_dir, engine) = engine().await;
        let alice = funded(&engine, "alice", 100).await;
        let bob = funded(&engine, "bob", 100).await;
        let m = open_match(&engine).await;

        engine
            .place_bet(alice.id, m.id, Outcome::B, 40)
            .await
            .unwrap();
        engine
            .place_bet(bob.id, m.id, Outcome::B, 25)
            .await
            .unwrap();
        engine.freeze_match(m.id).await.unwrap();

        // Nobody backed A; resolving for A returns every stake
        let summary = engine.resolve_match(m.id, Outcome::A).await.unwrap();
        assert_eq!(summary.refunded_bets, 2);
        assert_eq!(summary.take, 0);
        assert_eq!(engine.balance(alice.id).await.unwrap().balance, 100);
        assert_eq!(engine.balance(bob.id).await.unwrap().balance, 100);
    }

    #[tokio::test]
    async fn rejected_bets_leave_no_trace() {
        let (_dir, engine) = engine().await;
        let alice = funded(&engine, "alice", 50).await;
        let m = open_match(&engine).await;

        let err = engine
            .place_bet(alice.id, m.id, Outcome::A, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, MatchbookError::BetTooSmall { min: 10, .. }));

        let err = engine
            .place_bet(alice.id, m.id, Outcome::A, 500)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MatchbookError::InsufficientBalance {
                need: 500,
                available: 50
            }
        ));

        let err = engine
            .place_bet(Uuid::new_v4(), m.id, Outcome::A, 20)
            .await
            .unwrap_err();
        assert!(matches!(err, MatchbookError::UnknownUser { .. }));

        let err = engine
            .place_bet(alice.id, Uuid::new_v4(), Outcome::A, 20)
            .await
            .unwrap_err();
        assert!(matches!(err, MatchbookError::UnknownMatch { .. }));

        assert_eq!(engine.balance(alice.id).await.unwrap().balance, 50);
        assert_eq!(engine.pool_snapshot(m.id).await.unwrap().total(), 0);
        assert!(engine.bets_for_match(m.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn betting_is_rejected_outside_open() {
        let (_dir, engine) = engine().await;
        let alice = funded(&engine, "alice", 100).await;
        let m = engine.create_match("Red", "Blue").await.unwrap();

        let err = engine
            .place_bet(alice.id, m.id, Outcome::A, 20)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MatchbookError::MarketClosed {
                status: MatchStatus::Scheduled
            }
        ));

        engine.open_match(m.id).await.unwrap();
        engine
            .place_bet(alice.id, m.id, Outcome::A, 20)
            .await
            .unwrap();

        engine.freeze_match(m.id).await.unwrap();
        let err = engine
            .place_bet(alice.id, m.id, Outcome::A, 20)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MatchbookError::MarketClosed {
                status: MatchStatus::Frozen
            }
        ));

        engine.resolve_match(m.id, Outcome::A).await.unwrap();
        let err = engine
            .place_bet(alice.id, m.id, Outcome::A, 20)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MatchbookError::MarketClosed {
                status: MatchStatus::Resolved
            }
        ));
    }

    #[tokio::test]
    async fn lifecycle_transitions_are_enforced() {
        let (_dir, engine) = engine().await;
        let m = engine.create_match("Red", "Blue").await.unwrap();

        // Resolution requires Frozen
        let err = engine.resolve_match(m.id, Outcome::A).await.unwrap_err();
        assert!(matches!(err, MatchbookError::InvalidTransition { .. }));

        let err = engine.freeze_match(m.id).await.unwrap_err();
        assert!(matches!(err, MatchbookError::InvalidTransition { .. }));

        engine.open_match(m.id).await.unwrap();
        let err = engine.open_match(m.id).await.unwrap_err();
        assert!(matches!(err, MatchbookError::InvalidTransition { .. }));

        engine.freeze_match(m.id).await.unwrap();
        engine.resolve_match(m.id, Outcome::B).await.unwrap();

        let err = engine.open_match(m.id).await.unwrap_err();
        assert!(matches!(err, MatchbookError::MatchAlreadyFinal { .. }));
        let err = engine.void_match(m.id).await.unwrap_err();
        assert!(matches!(err, MatchbookError::MatchAlreadyFinal { .. }));
    }

    #[tokio::test]
    async fn concurrent_bets_are_all_applied() {
        let (_dir, engine) = engine().await;
        let alice = funded(&engine, "alice", 10_000).await;
        let m = open_match(&engine).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let engine = engine.clone();
            let match_id = m.id;
            let user_id = alice.id;
            handles.push(tokio::spawn(async move {
                engine.place_bet(user_id, match_id, Outcome::A, 25).await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let snapshot = engine.pool_snapshot(m.id).await.unwrap();
        assert_eq!(snapshot.pool_a, 200);
        assert_eq!(engine.balance(alice.id).await.unwrap().balance, 9_800);

        let audit = engine.audit_match(m.id).await.unwrap();
        assert!(audit.consistent());
    }

    #[tokio::test]
    async fn pools_match_active_bets_at_every_step() {
        let (_dir, engine) = engine().await;
        let alice = funded(&engine, "alice", 1_000).await;
        let bob = funded(&engine, "bob", 1_000).await;
        let m = open_match(&engine).await;

        for (user, outcome, amount) in [
            (alice.id, Outcome::A, 120),
            (bob.id, Outcome::B, 45),
            (alice.id, Outcome::B, 30),
            (bob.id, Outcome::A, 15),
        ] {
            engine.place_bet(user, m.id, outcome, amount).await.unwrap();
            let audit = engine.audit_match(m.id).await.unwrap();
            assert!(audit.consistent());
        }

        let snapshot = engine.pool_snapshot(m.id).await.unwrap();
        assert_eq!(snapshot.pool_a, 135);
        assert_eq!(snapshot.pool_b, 75);
    }

    #[tokio::test]
    async fn audit_stays_consistent_after_resolve_and_void() {
        let (_dir, engine) = engine().await;
        let alice = funded(&engine, "alice", 1_000).await;
        let bob = funded(&engine, "bob", 1_000).await;

        let resolved = open_match(&engine).await;
        engine
            .place_bet(alice.id, resolved.id, Outcome::A, 40)
            .await
            .unwrap();
        engine
            .place_bet(bob.id, resolved.id, Outcome::B, 60)
            .await
            .unwrap();
        engine.freeze_match(resolved.id).await.unwrap();
        engine.resolve_match(resolved.id, Outcome::A).await.unwrap();

        // Settlement marks the bets Won/Lost but the pools stay as staked
        let audit = engine.audit_match(resolved.id).await.unwrap();
        assert!(audit.consistent());
        assert_eq!(audit.recorded.pool_a, 40);
        assert_eq!(audit.recorded.pool_b, 60);

        let voided = open_match(&engine).await;
        engine
            .place_bet(alice.id, voided.id, Outcome::A, 25)
            .await
            .unwrap();
        engine
            .place_bet(bob.id, voided.id, Outcome::B, 75)
            .await
            .unwrap();
        engine.void_match(voided.id).await.unwrap();

        let audit = engine.audit_match(voided.id).await.unwrap();
        assert!(audit.consistent());
        assert_eq!(audit.recorded.pool_a, 25);
        assert_eq!(audit.recorded.pool_b, 75);
    }

    #[tokio::test]
    async fn terminal_matches_release_their_locks() {
        let (_dir, engine) = engine().await;
        let alice = funded(&engine, "alice", 1_000).await;
        let bob = funded(&engine, "bob", 1_000).await;

        let resolved = open_match(&engine).await;
        engine
            .place_bet(alice.id, resolved.id, Outcome::A, 50)
            .await
            .unwrap();
        engine.freeze_match(resolved.id).await.unwrap();

        let voided = open_match(&engine).await;
        engine
            .place_bet(bob.id, voided.id, Outcome::B, 50)
            .await
            .unwrap();

        assert_eq!(engine.match_locks.lock().len(), 2);

        engine.resolve_match(resolved.id, Outcome::A).await.unwrap();
        assert_eq!(engine.match_locks.lock().len(), 1);

        engine.void_match(voided.id).await.unwrap();
        assert!(engine.match_locks.lock().is_empty());

        // Idempotent repeats do not leave a fresh entry behind either
        engine.resolve_match(resolved.id, Outcome::A).await.unwrap();
        engine.void_match(voided.id).await.unwrap();
        assert!(engine.match_locks.lock().is_empty());
    }

    #[tokio::test]
    async fn placement_odds_reflect_own_stake() {
        let (_dir, engine) = engine().await;
        let alice = funded(&engine, "alice", 1_000).await;
        let m = open_match(&engine).await;

        // First bet makes its side the whole pool; raw odds of 1.0 clamp
        // to the configured floor
        let bet = engine
            .place_bet(alice.id, m.id, Outcome::A, 100)
            .await
            .unwrap();
        assert_eq!(bet.odds_at_placement, engine.config().min_odds);
    }

    #[tokio::test]
    async fn account_management() {
        let (_dir, engine) = engine().await;

        let alice = engine.create_account("alice").await.unwrap();
        assert_eq!(alice.balance, 0);

        let err = engine.create_account("alice").await.unwrap_err();
        assert!(matches!(err, MatchbookError::Config(_)));

        let err = engine.deposit(alice.id, 0).await.unwrap_err();
        assert!(matches!(err, MatchbookError::InvalidAmount));

        let err = engine.deposit(Uuid::new_v4(), 100).await.unwrap_err();
        assert!(matches!(err, MatchbookError::UnknownUser { .. }));

        let updated = engine.deposit(alice.id, 250).await.unwrap();
        assert_eq!(updated.balance, 250);

        let found = engine.account_by_name("alice").await.unwrap();
        assert_eq!(found.id, alice.id);
        assert_eq!(found.balance, 250);
    }
}

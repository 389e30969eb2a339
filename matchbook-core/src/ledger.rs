use crate::error::{MatchbookError, Result};
use crate::storage::{BetStore, MatchStore, Storage};
use crate::types::{Outcome, PoolSnapshot};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Authoritative view of per-match pool totals.
///
/// The cached totals on the match row are an aggregate over active bets;
/// `audit` recomputes them from the bet rows and reports any divergence.
pub struct PoolLedger {
    storage: Arc<Storage>,
}

/// Result of recomputing a match's pools from its active bets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolAudit {
    pub match_id: Uuid,
    pub recorded: PoolSnapshot,
    pub derived: PoolSnapshot,
}

impl PoolAudit {
    pub fn consistent(&self) -> bool {
        self.recorded == self.derived
    }
}

impl PoolLedger {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn snapshot(&self, match_id: Uuid) -> Result<PoolSnapshot> {
        let conn = self.storage.get_connection().await;
        let m = MatchStore::get(&conn, match_id)?;

        Ok(PoolSnapshot {
            pool_a: m.pool_a,
            pool_b: m.pool_b,
        })
    }

    /// Atomically add `amount` to one side's pool and return the new totals.
    pub async fn increment(
        &self,
        match_id: Uuid,
        outcome: Outcome,
        amount: u64,
    ) -> Result<PoolSnapshot> {
        let mut conn = self.storage.get_connection().await;
        let tx = conn.transaction()?;

        let snapshot = Self::increment_in_tx(&tx, match_id, outcome, amount)?;
        tx.commit()?;

        Ok(snapshot)
    }

    /// Same as `increment`, but runs against the caller's transaction so the
    /// pool update commits together with the bet row and balance debit.
    pub fn increment_in_tx(
        conn: &Connection,
        match_id: Uuid,
        outcome: Outcome,
        amount: u64,
    ) -> Result<PoolSnapshot> {
        if amount == 0 {
            return Err(MatchbookError::InvalidAmount);
        }

        MatchStore::add_to_pool(conn, match_id, outcome, amount)?;
        let m = MatchStore::get(conn, match_id)?;

        Ok(PoolSnapshot {
            pool_a: m.pool_a,
            pool_b: m.pool_b,
        })
    }

    /// Recompute pools from bet rows and compare to the cached totals. Live
    /// matches are checked against active stakes; once a match is terminal
    /// its bets have been marked Won/Lost/Refunded, so the append-only pools
    /// are checked against everything ever staked.
    pub async fn audit(&self, match_id: Uuid) -> Result<PoolAudit> {
        let conn = self.storage.get_connection().await;

        let m = MatchStore::get(&conn, match_id)?;
        let (derived_a, derived_b) = if m.status.is_terminal() {
            BetStore::staked_totals(&conn, match_id)?
        } else {
            BetStore::active_totals(&conn, match_id)?
        };

        let audit = PoolAudit {
            match_id,
            recorded: PoolSnapshot {
                pool_a: m.pool_a,
                pool_b: m.pool_b,
            },
            derived: PoolSnapshot {
                pool_a: derived_a,
                pool_b: derived_b,
            },
        };

        if !audit.consistent() {
            tracing::warn!(
                "Pool divergence on match {}: recorded {:?}, derived {:?}",
                match_id,
                audit.recorded,
                audit.derived
            );
        }

        Ok(audit)
    }
}

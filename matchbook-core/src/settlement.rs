//! Pari-mutuel settlement and refunds.
//!
//! All arithmetic is in integer minor units, widened to `u128` for the
//! intermediate products. Conservation is exact: after `settle`, the sum of
//! credited payouts plus the operator take equals the original total pool;
//! after `refund`, credits equal the total pool.
//!
//! Both entry points run against the caller's transaction, so the balance
//! credits and bet status updates commit together with the lifecycle
//! transition that triggered them.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::storage::{BalanceStore, BetStore};
use crate::types::{Bet, BetStatus, Match, Outcome, SettlementSummary};
use rusqlite::Connection;

/// Distribute the final pools to the winning side of a resolved match.
///
/// Each winning bet receives `amount * distributable / winning_pool`
/// (floor division), where `distributable` is the total pool less the
/// operator take. The rounding remainder goes to the largest winning stake
/// (earliest-placed on ties), keeping the distribution exact.
///
/// If nobody backed the winner, every active bet is refunded in full
/// instead; forfeiting stakes to an outcome no one could collect on would
/// be unearned operator profit.
///
/// Idempotent: with no active bets left, the recorded per-bet payouts are
/// summarized and returned without mutation.
pub fn settle(
    conn: &Connection,
    m: &Match,
    winner: Outcome,
    config: &EngineConfig,
) -> Result<SettlementSummary> {
    let active = BetStore::active_for_match(conn, m.id)?;
    if active.is_empty() {
        return reconstruct(conn, m);
    }

    let total = m.total_pool();
    let winning_pool = m.pool_for(winner);

    if winning_pool == 0 || !active.iter().any(|bet| bet.outcome == winner) {
        tracing::warn!(
            "Match {} resolved with empty winning pool; refunding all stakes",
            m.id
        );
        return refund_bets(conn, m, active);
    }

    let take = (total as u128 * config.take_rate_bps as u128 / 10_000) as u64;
    let distributable = total - take;

    let (mut winners, losers): (Vec<Bet>, Vec<Bet>) =
        active.into_iter().partition(|bet| bet.outcome == winner);

    // Remainder target first: largest stake, then placement order
    winners.sort_by(|x, y| {
        y.amount
            .cmp(&x.amount)
            .then(x.created_at.cmp(&y.created_at))
            .then(x.id.cmp(&y.id))
    });

    let mut payouts: Vec<u64> = winners
        .iter()
        .map(|bet| (bet.amount as u128 * distributable as u128 / winning_pool as u128) as u64)
        .collect();

    let paid: u64 = payouts.iter().sum();
    payouts[0] += distributable - paid;

    for (bet, payout) in winners.iter().zip(&payouts) {
        BalanceStore::credit(conn, bet.user_id, *payout)?;
        BetStore::mark_settled(conn, bet.id, BetStatus::Won, *payout)?;
    }

    for bet in &losers {
        BetStore::mark_settled(conn, bet.id, BetStatus::Lost, 0)?;
    }

    tracing::info!(
        "Settled match {}: winner {}, pool {} -> {} winners paid {}, take {}",
        m.id,
        winner,
        total,
        winners.len(),
        distributable,
        take
    );

    Ok(SettlementSummary {
        match_id: m.id,
        total_pool: total,
        take,
        credited: distributable,
        winning_bets: winners.len(),
        losing_bets: losers.len(),
        refunded_bets: 0,
    })
}

/// Return every active bet's full stake to its owner. No take is applied.
///
/// Idempotent in the same way as `settle`.
pub fn refund(conn: &Connection, m: &Match) -> Result<SettlementSummary> {
    let active = BetStore::active_for_match(conn, m.id)?;
    if active.is_empty() {
        return reconstruct(conn, m);
    }

    refund_bets(conn, m, active)
}

fn refund_bets(conn: &Connection, m: &Match, active: Vec<Bet>) -> Result<SettlementSummary> {
    let mut credited: u64 = 0;

    for bet in &active {
        BalanceStore::credit(conn, bet.user_id, bet.amount)?;
        BetStore::mark_settled(conn, bet.id, BetStatus::Refunded, bet.amount)?;
        credited += bet.amount;
    }

    tracing::info!(
        "Refunded {} bets totalling {} on match {}",
        active.len(),
        credited,
        m.id
    );

    Ok(SettlementSummary {
        match_id: m.id,
        total_pool: m.total_pool(),
        take: 0,
        credited,
        winning_bets: 0,
        losing_bets: 0,
        refunded_bets: active.len(),
    })
}

/// Rebuild the summary of an already-settled match from its bet rows,
/// mutating nothing. Backs the idempotence of repeated settle/refund calls.
pub fn reconstruct(conn: &Connection, m: &Match) -> Result<SettlementSummary> {
    let bets = BetStore::for_match(conn, m.id)?;

    let mut credited: u64 = 0;
    let mut winning_bets = 0;
    let mut losing_bets = 0;
    let mut refunded_bets = 0;

    for bet in &bets {
        match bet.status {
            BetStatus::Won => {
                credited += bet.payout.unwrap_or(0);
                winning_bets += 1;
            }
            BetStatus::Lost => losing_bets += 1,
            BetStatus::Refunded => {
                credited += bet.payout.unwrap_or(bet.amount);
                refunded_bets += 1;
            }
            BetStatus::Active => {}
        }
    }

    let total_pool = m.total_pool();

    Ok(SettlementSummary {
        match_id: m.id,
        total_pool,
        take: total_pool.saturating_sub(credited),
        credited,
        winning_bets,
        losing_bets,
        refunded_bets,
    })
}

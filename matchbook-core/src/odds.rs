//! Decimal odds derived from the live pool split.
//!
//! Odds here are a reporting function only. Settlement divides the final
//! pools; it never reads these values, so a bettor's realized return can
//! differ from the odds shown when they staked.

use crate::config::EngineConfig;
use crate::types::{OddsPair, PoolSnapshot};

/// Map a pool snapshot to decimal odds for both outcomes.
///
/// An empty market reports even money on both sides. An unbacked outcome
/// facing a backed one reports the configured maximum, since no payout
/// ratio exists for it yet. Everything else is the pari-mutuel multiple
/// `total * (1 - take) / pool`, clamped to the configured floor.
pub fn compute(pool_a: u64, pool_b: u64, config: &EngineConfig) -> OddsPair {
    let take = config.take_rate();
    let total = pool_a + pool_b;

    if total == 0 {
        let even = clamp(2.0 * (1.0 - take), config);
        return OddsPair { a: even, b: even };
    }

    let distributable = total as f64 * (1.0 - take);

    OddsPair {
        a: side_odds(pool_a, distributable, config),
        b: side_odds(pool_b, distributable, config),
    }
}

pub fn compute_snapshot(snapshot: &PoolSnapshot, config: &EngineConfig) -> OddsPair {
    compute(snapshot.pool_a, snapshot.pool_b, config)
}

fn side_odds(pool: u64, distributable: f64, config: &EngineConfig) -> f64 {
    if pool == 0 {
        return config.max_odds;
    }

    clamp(distributable / pool as f64, config)
}

fn clamp(odds: f64, config: &EngineConfig) -> f64 {
    odds.max(config.min_odds).min(config.max_odds)
}

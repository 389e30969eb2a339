use crate::error::{MatchbookError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Smallest accepted stake, in minor units.
    pub min_bet: u64,
    /// Operator's cut of the pool, in basis points (100 = 1%). Applied at
    /// settlement only; refunds always return stakes in full.
    pub take_rate_bps: u32,
    /// Floor for reported decimal odds. Pools skewed enough to imply a
    /// near-zero payout are clamped here, so displayed odds are not always
    /// exactly proportional to pool share. Intentional.
    pub min_odds: f64,
    /// Ceiling/sentinel for reported odds; also what an unbacked outcome
    /// reports, since no payout ratio exists for it yet.
    pub max_odds: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_bet: 10,
            take_rate_bps: 0,
            min_odds: 1.10,
            max_odds: 100.0,
        }
    }
}

impl EngineConfig {
    pub fn take_rate(&self) -> f64 {
        self.take_rate_bps as f64 / 10_000.0
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_bet == 0 {
            return Err(MatchbookError::config("Minimum bet must be greater than 0"));
        }

        if self.take_rate_bps >= 10_000 {
            return Err(MatchbookError::config(
                "Take rate must be below 10000 basis points",
            ));
        }

        if self.min_odds < 1.0 {
            return Err(MatchbookError::config("Minimum odds must be at least 1.0"));
        }

        if self.max_odds <= self.min_odds {
            return Err(MatchbookError::config(
                "Maximum odds must exceed minimum odds",
            ));
        }

        Ok(())
    }
}

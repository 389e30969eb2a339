use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The two sides of a match. All markets are strictly two-outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    A,
    B,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::A => "A",
            Outcome::B => "B",
        }
    }

    pub fn opponent(&self) -> Outcome {
        match self {
            Outcome::A => Outcome::B,
            Outcome::B => Outcome::A,
        }
    }

    pub fn parse(s: &str) -> Option<Outcome> {
        match s {
            "A" | "a" => Some(Outcome::A),
            "B" | "b" => Some(Outcome::B),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Outcome::parse(s).ok_or_else(|| format!("invalid outcome '{}', expected A or B", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Scheduled,
    Open,
    Frozen,
    Resolved,
    Voided,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "Scheduled",
            MatchStatus::Open => "Open",
            MatchStatus::Frozen => "Frozen",
            MatchStatus::Resolved => "Resolved",
            MatchStatus::Voided => "Voided",
        }
    }

    pub fn parse(s: &str) -> Option<MatchStatus> {
        match s {
            "Scheduled" => Some(MatchStatus::Scheduled),
            "Open" => Some(MatchStatus::Open),
            "Frozen" => Some(MatchStatus::Frozen),
            "Resolved" => Some(MatchStatus::Resolved),
            "Voided" => Some(MatchStatus::Voided),
            _ => None,
        }
    }

    /// Resolved and Voided accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchStatus::Resolved | MatchStatus::Voided)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A two-competitor match and its cached pool totals.
///
/// Pools are an aggregate over the match's active bets; the bet rows remain
/// the source of truth and the pools can be recomputed from them at any time
/// (see `PoolLedger::audit`). All amounts are integer minor units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: Uuid,
    pub outcome_a: String,
    pub outcome_b: String,
    pub status: MatchStatus,
    pub winner: Option<Outcome>,
    pub pool_a: u64,
    pub pool_b: u64,
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn pool_for(&self, outcome: Outcome) -> u64 {
        match outcome {
            Outcome::A => self.pool_a,
            Outcome::B => self.pool_b,
        }
    }

    pub fn total_pool(&self) -> u64 {
        self.pool_a + self.pool_b
    }

    pub fn label_for(&self, outcome: Outcome) -> &str {
        match outcome {
            Outcome::A => &self.outcome_a,
            Outcome::B => &self.outcome_b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetStatus {
    Active,
    Won,
    Lost,
    Refunded,
}

impl BetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetStatus::Active => "Active",
            BetStatus::Won => "Won",
            BetStatus::Lost => "Lost",
            BetStatus::Refunded => "Refunded",
        }
    }

    pub fn parse(s: &str) -> Option<BetStatus> {
        match s {
            "Active" => Some(BetStatus::Active),
            "Won" => Some(BetStatus::Won),
            "Lost" => Some(BetStatus::Lost),
            "Refunded" => Some(BetStatus::Refunded),
            _ => None,
        }
    }
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single stake on one outcome of one match.
///
/// Immutable once created except for `status` and `payout`.
/// `odds_at_placement` is informational only: payouts are pari-mutuel,
/// computed from the final pools at settlement, never from these odds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub id: Uuid,
    pub match_id: Uuid,
    pub user_id: Uuid,
    pub outcome: Outcome,
    pub amount: u64,
    pub odds_at_placement: f64,
    pub status: BetStatus,
    pub payout: Option<u64>,
    pub created_at: DateTime<Utc>,
}

/// A user's spendable balance, in minor units. Never negative after any
/// committed operation; only bet placement debits it and settlement credits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: Uuid,
    pub name: String,
    pub balance: u64,
    pub created_at: DateTime<Utc>,
}

/// Consistent point-in-time read of a match's pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub pool_a: u64,
    pub pool_b: u64,
}

impl PoolSnapshot {
    pub fn total(&self) -> u64 {
        self.pool_a + self.pool_b
    }

    pub fn pool_for(&self, outcome: Outcome) -> u64 {
        match outcome {
            Outcome::A => self.pool_a,
            Outcome::B => self.pool_b,
        }
    }
}

/// Decimal odds for both sides: the payout multiple per unit staked, as
/// implied by the current pool split. Reporting only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OddsPair {
    pub a: f64,
    pub b: f64,
}

impl OddsPair {
    pub fn for_outcome(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::A => self.a,
            Outcome::B => self.b,
        }
    }
}

/// Outcome of settling or refunding a match.
///
/// Conservation holds exactly: `credited + take == total_pool` for a payout
/// settlement, and `credited == total_pool` for a refund.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementSummary {
    pub match_id: Uuid,
    pub total_pool: u64,
    pub take: u64,
    pub credited: u64,
    pub winning_bets: usize,
    pub losing_bets: usize,
    pub refunded_bets: usize,
}

//! Matchbook - pari-mutuel wagering engine
//!
//! Tracks per-outcome stakes on two-competitor matches, derives decimal odds
//! from the live pool split, applies bets atomically against user balances,
//! and settles matches by distributing the final pool to the winning side.

pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod odds;
pub mod settlement;
pub mod storage;
pub mod types;

pub use config::EngineConfig;
pub use engine::{MatchbookEngine, UserDirectory};
pub use error::{MatchbookError, Result};
pub use ledger::{PoolAudit, PoolLedger};
pub use types::{
    Bet, BetStatus, Match, MatchStatus, OddsPair, Outcome, PoolSnapshot, SettlementSummary,
    UserAccount,
};

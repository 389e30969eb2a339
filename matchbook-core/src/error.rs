use crate::types::MatchStatus;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, MatchbookError>;

#[derive(Error, Debug)]
pub enum MatchbookError {
    #[error("Invalid amount: must be positive")]
    InvalidAmount,

    #[error("Bet too small: minimum {min}, got {amount}")]
    BetTooSmall { min: u64, amount: u64 },

    #[error("Insufficient balance: need {need}, have {available}")]
    InsufficientBalance { need: u64, available: u64 },

    #[error("Market closed: match is {status}")]
    MarketClosed { status: MatchStatus },

    #[error("Unknown match: {id}")]
    UnknownMatch { id: Uuid },

    #[error("Unknown user: {id}")]
    UnknownUser { id: Uuid },

    #[error("Account not found: {name}")]
    AccountNotFound { name: String },

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: MatchStatus,
        to: MatchStatus,
    },

    #[error("Match already final: {status}")]
    MatchAlreadyFinal { status: MatchStatus },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MatchbookError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

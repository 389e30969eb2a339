pub mod balance_store;
pub mod bet_store;
pub mod match_store;

pub use balance_store::BalanceStore;
pub use bet_store::BetStore;
pub use match_store::MatchStore;

use crate::error::{MatchbookError, Result};
use rusqlite::Connection;
use std::path::Path;
use tokio::sync::Mutex;

pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    pub async fn new(db_path: &Path) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MatchbookError::internal(format!("Failed to create directory: {}", e)))?;
        }

        let conn = Connection::open(db_path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };

        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        // Users table (balances in minor units)
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                balance INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        // Matches table; pool_a/pool_b are cached aggregates over active bets
        conn.execute(
            "CREATE TABLE IF NOT EXISTS matches (
                id TEXT PRIMARY KEY,
                outcome_a TEXT NOT NULL,
                outcome_b TEXT NOT NULL,
                status TEXT NOT NULL,
                winner TEXT,
                pool_a INTEGER NOT NULL DEFAULT 0,
                pool_b INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        // Bets table, append-only except for status/payout
        conn.execute(
            "CREATE TABLE IF NOT EXISTS bets (
                id TEXT PRIMARY KEY,
                match_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                outcome TEXT NOT NULL,
                amount INTEGER NOT NULL,
                odds_at_placement REAL NOT NULL,
                status TEXT NOT NULL,
                payout INTEGER,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (match_id) REFERENCES matches(id),
                FOREIGN KEY (user_id) REFERENCES users(id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_bets_match ON bets(match_id)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_bets_user ON bets(user_id)",
            [],
        )?;

        Ok(())
    }

    pub async fn get_connection(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}

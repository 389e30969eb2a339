use crate::error::{MatchbookError, Result};
use crate::storage::Storage;
use crate::types::UserAccount;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

pub struct BalanceStore<'a> {
    storage: &'a Storage,
}

impl<'a> BalanceStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn save(&self, account: &UserAccount) -> Result<()> {
        let conn = self.storage.get_connection().await;

        conn.execute(
            "INSERT INTO users (id, name, balance, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                account.id.to_string(),
                account.name,
                account.balance as i64,
                account.created_at.timestamp(),
            ],
        )?;

        Ok(())
    }

    pub async fn load(&self, user_id: Uuid) -> Result<UserAccount> {
        let conn = self.storage.get_connection().await;
        Self::get(&conn, user_id)
    }

    pub async fn find_by_name(&self, name: &str) -> Result<UserAccount> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn
            .prepare("SELECT id, name, balance, created_at FROM users WHERE name = ?1")?;

        stmt.query_row(params![name], Self::row_to_account)
            .optional()?
            .ok_or_else(|| MatchbookError::AccountNotFound {
                name: name.to_string(),
            })
    }

    pub async fn exists_by_name(&self, name: &str) -> Result<bool> {
        let conn = self.storage.get_connection().await;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    pub async fn list(&self) -> Result<Vec<UserAccount>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn
            .prepare("SELECT id, name, balance, created_at FROM users ORDER BY name ASC")?;

        let account_iter = stmt.query_map([], Self::row_to_account)?;

        let mut accounts = Vec::new();
        for account in account_iter {
            accounts.push(account?);
        }

        Ok(accounts)
    }

    // Connection-level helpers, usable inside engine transactions.

    pub fn get(conn: &Connection, user_id: Uuid) -> Result<UserAccount> {
        let mut stmt =
            conn.prepare("SELECT id, name, balance, created_at FROM users WHERE id = ?1")?;

        stmt.query_row(params![user_id.to_string()], Self::row_to_account)
            .optional()?
            .ok_or(MatchbookError::UnknownUser { id: user_id })
    }

    pub fn exists(conn: &Connection, user_id: Uuid) -> Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE id = ?1",
            params![user_id.to_string()],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    /// Debit guarded at the SQL level: the update only applies when the
    /// balance covers the amount, so no interleaving can drive it negative.
    pub fn debit(conn: &Connection, user_id: Uuid, amount: u64) -> Result<()> {
        let updated = conn.execute(
            "UPDATE users SET balance = balance - ?2 WHERE id = ?1 AND balance >= ?2",
            params![user_id.to_string(), amount as i64],
        )?;

        if updated == 0 {
            let account = Self::get(conn, user_id)?;
            return Err(MatchbookError::InsufficientBalance {
                need: amount,
                available: account.balance,
            });
        }

        Ok(())
    }

    pub fn credit(conn: &Connection, user_id: Uuid, amount: u64) -> Result<()> {
        let updated = conn.execute(
            "UPDATE users SET balance = balance + ?2 WHERE id = ?1",
            params![user_id.to_string(), amount as i64],
        )?;

        if updated == 0 {
            return Err(MatchbookError::UnknownUser { id: user_id });
        }

        Ok(())
    }

    fn row_to_account(row: &rusqlite::Row) -> rusqlite::Result<UserAccount> {
        let id_str: String = row.get(0)?;
        let balance: i64 = row.get(2)?;
        let created_ts: i64 = row.get(3)?;

        let id = Uuid::parse_str(&id_str).map_err(|_| {
            rusqlite::Error::InvalidColumnType(0, "id".to_string(), rusqlite::types::Type::Text)
        })?;

        Ok(UserAccount {
            id,
            name: row.get(1)?,
            balance: balance as u64,
            created_at: chrono::DateTime::from_timestamp(created_ts, 0).unwrap_or_else(Utc::now),
        })
    }
}

use crate::error::{MatchbookError, Result};
use crate::storage::Storage;
use crate::types::{Match, MatchStatus, Outcome};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

pub struct MatchStore<'a> {
    storage: &'a Storage,
}

impl<'a> MatchStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn save(&self, m: &Match) -> Result<()> {
        let conn = self.storage.get_connection().await;
        Self::insert_row(&conn, m)
    }

    pub async fn load(&self, match_id: Uuid) -> Result<Match> {
        let conn = self.storage.get_connection().await;
        Self::get(&conn, match_id)
    }

    pub async fn list(&self) -> Result<Vec<Match>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT id, outcome_a, outcome_b, status, winner, pool_a, pool_b, created_at
             FROM matches ORDER BY created_at DESC",
        )?;

        let match_iter = stmt.query_map([], Self::row_to_match)?;

        let mut matches = Vec::new();
        for m in match_iter {
            matches.push(m?);
        }

        Ok(matches)
    }

    // Connection-level helpers below compose into engine transactions;
    // a rusqlite::Transaction derefs to Connection.

    pub fn insert_row(conn: &Connection, m: &Match) -> Result<()> {
        conn.execute(
            "INSERT INTO matches (id, outcome_a, outcome_b, status, winner, pool_a, pool_b, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                m.id.to_string(),
                m.outcome_a,
                m.outcome_b,
                m.status.as_str(),
                m.winner.map(|w| w.as_str()),
                m.pool_a as i64,
                m.pool_b as i64,
                m.created_at.timestamp(),
            ],
        )?;

        Ok(())
    }

    pub fn get(conn: &Connection, match_id: Uuid) -> Result<Match> {
        let mut stmt = conn.prepare(
            "SELECT id, outcome_a, outcome_b, status, winner, pool_a, pool_b, created_at
             FROM matches WHERE id = ?1",
        )?;

        stmt.query_row(params![match_id.to_string()], Self::row_to_match)
            .optional()?
            .ok_or(MatchbookError::UnknownMatch { id: match_id })
    }

    pub fn update_status(
        conn: &Connection,
        match_id: Uuid,
        status: MatchStatus,
        winner: Option<Outcome>,
    ) -> Result<()> {
        let updated = conn.execute(
            "UPDATE matches SET status = ?2, winner = ?3 WHERE id = ?1",
            params![
                match_id.to_string(),
                status.as_str(),
                winner.map(|w| w.as_str()),
            ],
        )?;

        if updated == 0 {
            return Err(MatchbookError::UnknownMatch { id: match_id });
        }

        Ok(())
    }

    pub fn add_to_pool(
        conn: &Connection,
        match_id: Uuid,
        outcome: Outcome,
        amount: u64,
    ) -> Result<()> {
        let sql = match outcome {
            Outcome::A => "UPDATE matches SET pool_a = pool_a + ?2 WHERE id = ?1",
            Outcome::B => "UPDATE matches SET pool_b = pool_b + ?2 WHERE id = ?1",
        };

        let updated = conn.execute(sql, params![match_id.to_string(), amount as i64])?;

        if updated == 0 {
            return Err(MatchbookError::UnknownMatch { id: match_id });
        }

        Ok(())
    }

    fn row_to_match(row: &rusqlite::Row) -> rusqlite::Result<Match> {
        let id_str: String = row.get(0)?;
        let status_str: String = row.get(3)?;
        let winner_str: Option<String> = row.get(4)?;
        let pool_a: i64 = row.get(5)?;
        let pool_b: i64 = row.get(6)?;
        let created_ts: i64 = row.get(7)?;

        let id = Uuid::parse_str(&id_str).map_err(|_| {
            rusqlite::Error::InvalidColumnType(0, "id".to_string(), rusqlite::types::Type::Text)
        })?;

        let status = MatchStatus::parse(&status_str).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(3, "status".to_string(), rusqlite::types::Type::Text)
        })?;

        let winner = match winner_str {
            Some(s) => Some(Outcome::parse(&s).ok_or_else(|| {
                rusqlite::Error::InvalidColumnType(
                    4,
                    "winner".to_string(),
                    rusqlite::types::Type::Text,
                )
            })?),
            None => None,
        };

        Ok(Match {
            id,
            outcome_a: row.get(1)?,
            outcome_b: row.get(2)?,
            status,
            winner,
            pool_a: pool_a as u64,
            pool_b: pool_b as u64,
            created_at: chrono::DateTime::from_timestamp(created_ts, 0).unwrap_or_else(Utc::now),
        })
    }
}

use crate::error::Result;
use crate::storage::Storage;
use crate::types::{Bet, BetStatus, Outcome};
use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

const BET_COLUMNS: &str =
    "id, match_id, user_id, outcome, amount, odds_at_placement, status, payout, created_at";

pub struct BetStore<'a> {
    storage: &'a Storage,
}

impl<'a> BetStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn bets_for_match(&self, match_id: Uuid) -> Result<Vec<Bet>> {
        let conn = self.storage.get_connection().await;
        Self::for_match(&conn, match_id)
    }

    pub async fn bets_for_user(&self, user_id: Uuid) -> Result<Vec<Bet>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM bets WHERE user_id = ?1 ORDER BY created_at DESC",
            BET_COLUMNS
        ))?;

        let bet_iter = stmt.query_map(params![user_id.to_string()], Self::row_to_bet)?;

        let mut bets = Vec::new();
        for bet in bet_iter {
            bets.push(bet?);
        }

        Ok(bets)
    }

    // Connection-level helpers, usable inside engine transactions.

    pub fn insert_row(conn: &Connection, bet: &Bet) -> Result<()> {
        conn.execute(
            &format!(
                "INSERT INTO bets ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                BET_COLUMNS
            ),
            params![
                bet.id.to_string(),
                bet.match_id.to_string(),
                bet.user_id.to_string(),
                bet.outcome.as_str(),
                bet.amount as i64,
                bet.odds_at_placement,
                bet.status.as_str(),
                bet.payout.map(|p| p as i64),
                bet.created_at.timestamp(),
            ],
        )?;

        Ok(())
    }

    pub fn for_match(conn: &Connection, match_id: Uuid) -> Result<Vec<Bet>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM bets WHERE match_id = ?1 ORDER BY created_at ASC, id ASC",
            BET_COLUMNS
        ))?;

        let bet_iter = stmt.query_map(params![match_id.to_string()], Self::row_to_bet)?;

        let mut bets = Vec::new();
        for bet in bet_iter {
            bets.push(bet?);
        }

        Ok(bets)
    }

    pub fn active_for_match(conn: &Connection, match_id: Uuid) -> Result<Vec<Bet>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM bets WHERE match_id = ?1 AND status = 'Active'
             ORDER BY created_at ASC, id ASC",
            BET_COLUMNS
        ))?;

        let bet_iter = stmt.query_map(params![match_id.to_string()], Self::row_to_bet)?;

        let mut bets = Vec::new();
        for bet in bet_iter {
            bets.push(bet?);
        }

        Ok(bets)
    }

    pub fn mark_settled(
        conn: &Connection,
        bet_id: Uuid,
        status: BetStatus,
        payout: u64,
    ) -> Result<()> {
        conn.execute(
            "UPDATE bets SET status = ?2, payout = ?3 WHERE id = ?1",
            params![bet_id.to_string(), status.as_str(), payout as i64],
        )?;

        Ok(())
    }

    /// Sum of active stakes per outcome, recomputed from bet rows. While a
    /// match is live this is the authoritative figure the cached pools must
    /// agree with.
    pub fn active_totals(conn: &Connection, match_id: Uuid) -> Result<(u64, u64)> {
        Self::sum_by_outcome(
            conn,
            match_id,
            "SELECT outcome, COALESCE(SUM(amount), 0) FROM bets
             WHERE match_id = ?1 AND status = 'Active' GROUP BY outcome",
        )
    }

    /// Sum of every stake ever placed per outcome, regardless of status.
    /// Pools only ever accumulate, so this is what the cached totals must
    /// equal once settlement or refunds have moved bets out of Active.
    pub fn staked_totals(conn: &Connection, match_id: Uuid) -> Result<(u64, u64)> {
        Self::sum_by_outcome(
            conn,
            match_id,
            "SELECT outcome, COALESCE(SUM(amount), 0) FROM bets
             WHERE match_id = ?1 GROUP BY outcome",
        )
    }

    fn sum_by_outcome(conn: &Connection, match_id: Uuid, sql: &str) -> Result<(u64, u64)> {
        let mut stmt = conn.prepare(sql)?;

        let mut total_a: u64 = 0;
        let mut total_b: u64 = 0;

        let rows = stmt.query_map(params![match_id.to_string()], |row| {
            let outcome: String = row.get(0)?;
            let total: i64 = row.get(1)?;
            Ok((outcome, total))
        })?;

        for row in rows {
            let (outcome, total) = row?;
            match Outcome::parse(&outcome) {
                Some(Outcome::A) => total_a = total as u64,
                Some(Outcome::B) => total_b = total as u64,
                None => {}
            }
        }

        Ok((total_a, total_b))
    }

    fn row_to_bet(row: &rusqlite::Row) -> rusqlite::Result<Bet> {
        let id_str: String = row.get(0)?;
        let match_id_str: String = row.get(1)?;
        let user_id_str: String = row.get(2)?;
        let outcome_str: String = row.get(3)?;
        let amount: i64 = row.get(4)?;
        let status_str: String = row.get(6)?;
        let payout: Option<i64> = row.get(7)?;
        let created_ts: i64 = row.get(8)?;

        let parse_uuid = |idx: usize, name: &str, s: &str| {
            Uuid::parse_str(s).map_err(|_| {
                rusqlite::Error::InvalidColumnType(
                    idx,
                    name.to_string(),
                    rusqlite::types::Type::Text,
                )
            })
        };

        let outcome = Outcome::parse(&outcome_str).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(
                3,
                "outcome".to_string(),
                rusqlite::types::Type::Text,
            )
        })?;

        let status = BetStatus::parse(&status_str).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(6, "status".to_string(), rusqlite::types::Type::Text)
        })?;

        Ok(Bet {
            id: parse_uuid(0, "id", &id_str)?,
            match_id: parse_uuid(1, "match_id", &match_id_str)?,
            user_id: parse_uuid(2, "user_id", &user_id_str)?,
            outcome,
            amount: amount as u64,
            odds_at_placement: row.get(5)?,
            status,
            payout: payout.map(|p| p as u64),
            created_at: chrono::DateTime::from_timestamp(created_ts, 0).unwrap_or_else(Utc::now),
        })
    }
}

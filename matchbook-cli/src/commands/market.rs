use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::Confirm;
use matchbook_core::{MatchbookEngine, Outcome, Result};
use uuid::Uuid;

#[derive(Subcommand)]
pub enum MarketCommands {
    /// Create a new match (starts Scheduled)
    Create {
        /// Label for outcome A
        outcome_a: String,
        /// Label for outcome B
        outcome_b: String,
    },
    /// Open a match for betting
    Open {
        /// Match ID
        match_id: Uuid,
    },
    /// Freeze a match (close betting)
    Freeze {
        /// Match ID
        match_id: Uuid,
    },
    /// Declare the winner and settle payouts
    Resolve {
        /// Match ID
        match_id: Uuid,
        /// Winning outcome (A or B)
        winner: Outcome,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Void a match and refund all stakes
    Void {
        /// Match ID
        match_id: Uuid,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// List all matches
    List,
    /// Show one match with live odds and pools
    Show {
        /// Match ID
        match_id: Uuid,
    },
    /// Verify that cached pools match the active bet totals
    Audit {
        /// Match ID
        match_id: Uuid,
    },
}

pub async fn handle_market_command(cmd: MarketCommands, engine: &MatchbookEngine) -> Result<()> {
    match cmd {
        MarketCommands::Create {
            outcome_a,
            outcome_b,
        } => {
            let m = engine.create_match(&outcome_a, &outcome_b).await?;
            println!("Created match: '{}' vs '{}'", m.outcome_a, m.outcome_b);
            println!("Match ID: {}", m.id);
            println!("Status: {}", m.status);
        }

        MarketCommands::Open { match_id } => {
            let m = engine.open_match(match_id).await?;
            println!("Match {} is now open for betting", m.id);
        }

        MarketCommands::Freeze { match_id } => {
            let m = engine.freeze_match(match_id).await?;
            println!("Match {} is frozen; no further bets accepted", m.id);
        }

        MarketCommands::Resolve {
            match_id,
            winner,
            yes,
        } => {
            let m = engine.get_match(match_id).await?;

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!(
                        "Resolve '{}' vs '{}' with winner '{}'? This settles all bets",
                        m.outcome_a,
                        m.outcome_b,
                        m.label_for(winner)
                    ))
                    .default(false)
                    .interact()
                    .map_err(|e| matchbook_core::MatchbookError::internal(e.to_string()))?;

                if !confirmed {
                    println!("Aborted");
                    return Ok(());
                }
            }

            let summary = engine.resolve_match(match_id, winner).await?;
            println!("Match resolved. Winner: {}", m.label_for(winner));
            println!("  Total pool: {}", summary.total_pool);
            println!(
                "  Paid out: {} across {} winning bets",
                summary.credited, summary.winning_bets
            );
            println!("  Losing bets: {}", summary.losing_bets);
            if summary.refunded_bets > 0 {
                println!("  Refunded bets: {}", summary.refunded_bets);
            }
            if summary.take > 0 {
                println!("  Operator take: {}", summary.take);
            }
        }

        MarketCommands::Void { match_id, yes } => {
            let m = engine.get_match(match_id).await?;

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!(
                        "Void '{}' vs '{}'? All stakes will be refunded",
                        m.outcome_a, m.outcome_b
                    ))
                    .default(false)
                    .interact()
                    .map_err(|e| matchbook_core::MatchbookError::internal(e.to_string()))?;

                if !confirmed {
                    println!("Aborted");
                    return Ok(());
                }
            }

            let summary = engine.void_match(match_id).await?;
            println!(
                "Match voided. Refunded {} bets totalling {}",
                summary.refunded_bets, summary.credited
            );
        }

        MarketCommands::List => {
            let matches = engine.list_matches().await?;

            if matches.is_empty() {
                println!("No matches");
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["ID", "Match", "Status", "Pool A", "Pool B", "Winner"]);

            for m in matches {
                table.add_row(vec![
                    m.id.to_string(),
                    format!("{} vs {}", m.outcome_a, m.outcome_b),
                    m.status.to_string(),
                    m.pool_a.to_string(),
                    m.pool_b.to_string(),
                    m.winner
                        .map(|w| m.label_for(w).to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ]);
            }

            println!("{}", table);
        }

        MarketCommands::Show { match_id } => {
            let m = engine.get_match(match_id).await?;
            let odds = engine.odds(match_id).await?;

            println!("Match: '{}' vs '{}'", m.outcome_a, m.outcome_b);
            println!("ID: {}", m.id);
            println!("Status: {}", m.status);
            if let Some(winner) = m.winner {
                println!("Winner: {}", m.label_for(winner));
            }
            println!();
            println!("Pools (total {}):", m.total_pool());
            println!("  {} (A): {}  odds {:.2}", m.outcome_a, m.pool_a, odds.a);
            println!("  {} (B): {}  odds {:.2}", m.outcome_b, m.pool_b, odds.b);
        }

        MarketCommands::Audit { match_id } => {
            let audit = engine.audit_match(match_id).await?;

            if audit.consistent() {
                println!(
                    "OK: pools ({}, {}) match the active bet totals",
                    audit.recorded.pool_a, audit.recorded.pool_b
                );
            } else {
                println!("MISMATCH on match {}", match_id);
                println!(
                    "  Recorded pools: A={}, B={}",
                    audit.recorded.pool_a, audit.recorded.pool_b
                );
                println!(
                    "  Derived from bets: A={}, B={}",
                    audit.derived.pool_a, audit.derived.pool_b
                );
            }
        }
    }

    Ok(())
}

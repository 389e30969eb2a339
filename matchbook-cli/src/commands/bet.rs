use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use matchbook_core::{Bet, MatchbookEngine, Outcome, Result};
use uuid::Uuid;

#[derive(Subcommand)]
pub enum BetCommands {
    /// Place a bet on one outcome of an open match
    Place {
        /// Account name
        account: String,
        /// Match ID
        match_id: Uuid,
        /// Outcome to back (A or B)
        outcome: Outcome,
        /// Stake in minor units
        amount: u64,
    },
    /// List bets on a match
    Match {
        /// Match ID
        match_id: Uuid,
    },
    /// List an account's bets
    Account {
        /// Account name
        account: String,
    },
}

pub async fn handle_bet_command(cmd: BetCommands, engine: &MatchbookEngine) -> Result<()> {
    match cmd {
        BetCommands::Place {
            account,
            match_id,
            outcome,
            amount,
        } => {
            let user = engine.account_by_name(&account).await?;
            let bet = engine.place_bet(user.id, match_id, outcome, amount).await?;

            let m = engine.get_match(match_id).await?;
            println!(
                "Placed {} on '{}' ({})",
                bet.amount,
                m.label_for(outcome),
                outcome
            );
            println!("Bet ID: {}", bet.id);
            println!("Odds at placement: {:.2} (informational; payout is pari-mutuel)",
                bet.odds_at_placement);

            let remaining = engine.balance(user.id).await?;
            println!("Remaining balance: {}", remaining.balance);
        }

        BetCommands::Match { match_id } => {
            let bets = engine.bets_for_match(match_id).await?;
            print_bets(&bets);
        }

        BetCommands::Account { account } => {
            let user = engine.account_by_name(&account).await?;
            let bets = engine.bets_for_user(user.id).await?;
            print_bets(&bets);
        }
    }

    Ok(())
}

fn print_bets(bets: &[Bet]) {
    if bets.is_empty() {
        println!("No bets");
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["ID", "Match", "Outcome", "Amount", "Status", "Payout"]);

    for bet in bets {
        table.add_row(vec![
            bet.id.to_string(),
            bet.match_id.to_string(),
            bet.outcome.to_string(),
            bet.amount.to_string(),
            bet.status.to_string(),
            bet.payout
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }

    println!("{}", table);
}

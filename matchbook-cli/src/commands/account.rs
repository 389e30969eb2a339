use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use matchbook_core::{MatchbookEngine, Result};

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account with zero balance
    Create {
        /// Account name
        name: String,
    },
    /// Credit an account (operator action)
    Deposit {
        /// Account name
        name: String,
        /// Amount in minor units
        amount: u64,
    },
    /// Show an account's balance
    Balance {
        /// Account name
        name: String,
    },
    /// List all accounts
    List,
}

pub async fn handle_account_command(cmd: AccountCommands, engine: &MatchbookEngine) -> Result<()> {
    match cmd {
        AccountCommands::Create { name } => {
            let account = engine.create_account(&name).await?;
            println!("Created account '{}'", account.name);
            println!("Account ID: {}", account.id);
        }

        AccountCommands::Deposit { name, amount } => {
            let account = engine.account_by_name(&name).await?;
            let updated = engine.deposit(account.id, amount).await?;
            println!(
                "Deposited {} to '{}'; new balance: {}",
                amount, updated.name, updated.balance
            );
        }

        AccountCommands::Balance { name } => {
            let account = engine.account_by_name(&name).await?;
            println!("Balance for '{}': {}", account.name, account.balance);
        }

        AccountCommands::List => {
            let accounts = engine.list_accounts().await?;

            if accounts.is_empty() {
                println!("No accounts");
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Name", "ID", "Balance"]);

            for account in accounts {
                table.add_row(vec![
                    account.name.clone(),
                    account.id.to_string(),
                    account.balance.to_string(),
                ]);
            }

            println!("{}", table);
        }
    }

    Ok(())
}

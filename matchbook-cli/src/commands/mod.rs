pub mod account;
pub mod bet;
pub mod market;

pub use account::{handle_account_command, AccountCommands};
pub use bet::{handle_bet_command, BetCommands};
pub use market::{handle_market_command, MarketCommands};

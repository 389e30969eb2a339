use matchbook_core::{EngineConfig, MatchbookEngine, Outcome};
use tempfile::tempdir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Create temp dir
    let temp_dir = tempdir()?;
    println!("Using temporary directory: {:?}", temp_dir.path());

    // Initialize the engine
    let engine = MatchbookEngine::new(temp_dir.path(), EngineConfig::default()).await?;

    println!("Creating accounts...");
    let alice = engine.create_account("alice").await?;
    let bob = engine.create_account("bob").await?;
    engine.deposit(alice.id, 1_000).await?;
    engine.deposit(bob.id, 1_000).await?;

    println!("Creating match...");
    let m = engine.create_match("Red Dragons", "Blue Sharks").await?;
    engine.open_match(m.id).await?;
    println!("Match ID: {}", m.id);

    // Place opposing bets
    engine.place_bet(alice.id, m.id, Outcome::A, 70).await?;
    engine.place_bet(bob.id, m.id, Outcome::B, 30).await?;

    let odds = engine.odds(m.id).await?;
    println!("\nLive odds:");
    println!("{}: {:.2}", m.outcome_a, odds.a);
    println!("{}: {:.2}", m.outcome_b, odds.b);

    // Close betting and declare the winner
    engine.freeze_match(m.id).await?;
    let summary = engine.resolve_match(m.id, Outcome::A).await?;

    println!("\nSettlement:");
    println!("Total pool: {}", summary.total_pool);
    println!("Paid out: {} across {} winners", summary.credited, summary.winning_bets);

    let alice = engine.balance(alice.id).await?;
    let bob = engine.balance(bob.id).await?;
    println!("\nFinal balances:");
    println!("alice: {}", alice.balance);
    println!("bob: {}", bob.balance);

    println!("\nExample completed successfully!");

    Ok(())
}

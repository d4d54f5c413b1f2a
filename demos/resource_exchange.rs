//! Resource exchange between participants of a shared training round
//!
//! Each participant starts with 100 tokens, earns tokens for every gradient it
//! contributes and spends tokens for every aggregate it consumes.

use token_ledger::logging::{init_logging, LogFormat};
use token_ledger::{ClientConfig, LedgerError, MemoryLedger, TokenClient};

const PARTICIPANTS: usize = 5;
const ROUNDS: usize = 3;
const INITIAL_TOKENS: u64 = 100;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LogFormat::Human, "warn,token_ledger=info")?;

    println!("Resource exchange example\n");

    let ledger = MemoryLedger::new();
    let config = ClientConfig::default();
    let client = TokenClient::new(&config, ledger.connect(&config)?)?;

    let names: Vec<String> = (1..=PARTICIPANTS)
        .map(|i| format!("Hospital {}", i))
        .collect();

    for name in &names {
        client.add_client(name, INITIAL_TOKENS).await?;
        println!("  Registered {} with {} tokens", name, INITIAL_TOKENS);
    }
    println!();

    for round in 1..=ROUNDS {
        println!("Round {}", round);
        for (i, name) in names.iter().enumerate() {
            // Stand-in for a serialized gradient whose size varies per participant
            let gradient = "g".repeat(15 * (i + 1) + 7 * round);
            let balance = client.contribute_resource(name, &gradient).await?;
            println!(
                "  ContributeResource :: {} earned for {} chars, balance {}",
                name,
                gradient.len(),
                balance
            );
        }
        for name in &names {
            let required = 40 + 10 * round as u64;
            match client.consume_resource(name, required).await {
                Ok(balance) => println!(
                    "  ConsumeResource    :: {} spent for {} units, balance {}",
                    name, required, balance
                ),
                Err(LedgerError::InsufficientBalance { balance, cost, .. }) => println!(
                    "  ConsumeResource    :: {} cannot afford {} tokens (has {})",
                    name, cost, balance
                ),
                Err(e) => return Err(e.into()),
            }
        }
        println!();
    }

    println!("Final balances:");
    for account in client.get_all_tokens().await? {
        println!("  {:<12} {:>5}", account.id, account.balance);
    }

    let stats = ledger.stats()?;
    println!(
        "\nSubmitted {} transactions, committed {} ({} MVCC conflicts)",
        stats.submitted, stats.committed, stats.mvcc_conflicts
    );

    client.close().await?;
    Ok(())
}

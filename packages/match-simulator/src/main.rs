//! Match simulator CLI - two automated peers playing wagered matches in memory.
//!
//! Each peer holds its own store connection, escrow service, match client and
//! presence monitor, exactly as two real clients would. Balances carry over
//! from match to match.

mod output;
mod simulator;

use std::time::Instant;

use clap::Parser;
use domino_engine::domain::BetMenu;
use domino_engine::telemetry::init_tracing_with;
use domino_engine::EngineConfig;
use output::{MatchLine, Tally};
use simulator::Simulator;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "match-simulator")]
#[command(about = "Peer-to-peer domino matches on an in-memory store")]
struct Args {
    /// Number of matches to play
    #[arg(short, long, default_value = "1")]
    games: u32,

    /// Wager both peers propose each match
    #[arg(long, default_value = "100")]
    bet: u64,

    /// Seed for deals and abandon decisions (deterministic runs)
    #[arg(long)]
    seed: Option<u64>,

    /// Starting balance for both players (defaults to DOMINO_STARTING_BALANCE)
    #[arg(long)]
    balance: Option<u64>,

    /// Probability that a match ends with one peer abandoning
    #[arg(long, default_value = "0.0")]
    abandon_rate: f64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Silent by default; only warnings and errors.
    init_tracing_with(args.json, if args.verbose { "debug" } else { "warn" });

    let mut config = EngineConfig::from_env()?;
    if let Some(balance) = args.balance {
        config.starting_balance = balance;
    }
    if !config.bet_menu.contains(args.bet) {
        let menu = BetMenu::default();
        return Err(format!(
            "bet {} is not on the menu {:?} (default {:?})",
            args.bet,
            config.bet_menu.amounts(),
            menu.amounts()
        )
        .into());
    }

    info!(games = args.games, bet = args.bet, seed = ?args.seed, "starting simulation");

    let mut sim = Simulator::new(config, args.seed).await?;
    let players = sim.players().clone().map(|p| p.as_str().to_string());
    let mut tally = Tally::default();
    let start = Instant::now();

    for game in 1..=args.games {
        let balances = sim.balances().await?;
        if balances.iter().any(|&b| b < args.bet) {
            warn!(game, ?balances, "a player can no longer cover the bet; stopping");
            break;
        }
        match sim.run_match(game, args.bet, args.abandon_rate).await {
            Ok(report) => {
                println!("{}", serde_json::to_string(&MatchLine::new(game, &report))?);
                tally.record(&report, &players);
            }
            Err(e) => {
                tally.errors += 1;
                warn!(game, error = %e, "match failed");
            }
        }
    }

    tally.print(&players, start.elapsed());
    Ok(())
}

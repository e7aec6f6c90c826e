use std::sync::Arc;

use battleship_server::{api, init_logging, GameConfig, GamePool, RandomAi};
use clap::Parser;
use log::info;
use tokio::net::TcpListener;
use tokio::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: String,
    /// Seconds a host waits for a guest before a bot joins.
    #[arg(long, default_value_t = 30)]
    matching_timeout: u64,
    /// Seconds both players get to place their fleets.
    #[arg(long, default_value_t = 60)]
    fleet_timeout: u64,
    /// Seconds a player gets for each move.
    #[arg(long, default_value_t = 30)]
    battle_timeout: u64,
    #[arg(long, help = "Fix the bot's RNG seed for reproducible games (e.g., --seed 12345)")]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = GameConfig {
        matching_timeout: Duration::from_secs(cli.matching_timeout),
        fleet_creation_timeout: Duration::from_secs(cli.fleet_timeout),
        battle_timeout: Duration::from_secs(cli.battle_timeout),
    };
    let ai = match cli.seed {
        Some(seed) => {
            info!("using fixed bot seed {}", seed);
            RandomAi::seeded(seed)
        }
        None => RandomAi::new(),
    };
    let pool = GamePool::new(Arc::new(ai), config);
    let app = api::router(api::AppState::new(pool));

    let listener = TcpListener::bind(&cli.bind).await?;
    info!("listening on {}", cli.bind);
    axum::serve(listener, app).await?;
    Ok(())
}

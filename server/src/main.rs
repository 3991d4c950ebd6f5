use clap::Parser;
use log::{error, info};
use server::config::GameConfig;
use server::network::Server;
use shared::{DEFAULT_PORT, MAX_NUMBER, MIN_NUMBER};

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "0.0.0.0")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Maximum number of simultaneous players
    #[clap(short, long, default_value = "30")]
    max_clients: usize,
    /// Lowest number that can be drawn
    #[clap(long, default_value_t = MIN_NUMBER, allow_hyphen_values = true)]
    min_number: i64,
    /// Highest number that can be drawn
    #[clap(long, default_value_t = MAX_NUMBER, allow_hyphen_values = true)]
    max_number: i64,
    /// Number of entries kept on the leaderboard
    #[clap(short, long, default_value = "10")]
    leaderboard_size: usize,
    /// Invalid names tolerated before disconnecting a client
    #[clap(long, default_value = "5")]
    max_name_attempts: u32,
    /// Starting score before penalties
    #[clap(long, default_value = "10000")]
    initial_score: u32,
    /// Points lost per counted guess
    #[clap(long, default_value = "100")]
    attempt_penalty: u32,
}

impl Args {
    fn game_config(&self) -> GameConfig {
        GameConfig {
            max_clients: self.max_clients,
            min_number: self.min_number,
            max_number: self.max_number,
            leaderboard_capacity: self.leaderboard_size,
            max_name_attempts: self.max_name_attempts,
            initial_score: self.initial_score,
            attempt_penalty: self.attempt_penalty,
            ..GameConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.game_config();
    let address = format!("{}:{}", args.host, args.port);

    info!("Starting guessing server...");
    info!("Max clients       : {}", config.max_clients);
    info!(
        "Number range      : {} - {}",
        config.min_number, config.max_number
    );
    info!("Leaderboard size  : {}", config.leaderboard_capacity);
    info!(
        "Scoring           : {} - attempts x {} - seconds",
        config.initial_score, config.attempt_penalty
    );

    let server = Server::new(&address, config).await?;

    server
        .run_until(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C, shutting down gracefully..."),
                Err(e) => {
                    error!("Unable to listen for Ctrl+C: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        })
        .await?;

    Ok(())
}

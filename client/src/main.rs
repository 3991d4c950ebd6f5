use clap::Parser;
use client::network::{Client, GameOutcome};
use log::info;
use tokio::io::BufReader;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Connecting to: {}", args.server);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut client = Client::new(&args.server, stdin, std::io::stdout());

    match client.run().await? {
        GameOutcome::Won { score } => println!("Final score: {} points. Goodbye!", score),
        GameOutcome::Quit => {}
        GameOutcome::Closed => println!("Disconnected from server"),
    }

    Ok(())
}

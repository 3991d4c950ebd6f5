//! Scripted player for exercising a running server.
//!
//! Connects, submits a name and plays by bisection until it wins, optionally
//! several times in parallel.

use clap::Parser;
use shared::{decode, encode_line, HintDirection, ServerMessage};
use std::error::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server address to connect to
    #[clap(short, long, default_value = "127.0.0.1:8080")]
    server: String,
    /// Player name to submit
    #[clap(short, long, default_value = "Robot")]
    name: String,
    /// Number of bots playing at the same time
    #[clap(short, long, default_value = "1")]
    bots: usize,
}

async fn play(server: String, name: String) -> Result<Option<u32>, Box<dyn Error + Send + Sync>> {
    let stream = TcpStream::connect(&server).await?;
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let (mut low, mut high) = (i64::MIN, i64::MAX);
    let mut last_guess = 0;

    while let Some(line) = lines.next_line().await? {
        match decode(&line)? {
            ServerMessage::Prompt { .. } => {
                write_half.write_all(encode_line(&name).as_bytes()).await?;
            }
            ServerMessage::GameStart { min, max, .. } => {
                low = min;
                high = max;
                last_guess = low + (high - low) / 2;
                write_half
                    .write_all(encode_line(&last_guess.to_string()).as_bytes())
                    .await?;
            }
            ServerMessage::Hint { direction, .. } => {
                match direction {
                    HintDirection::Grand => high = last_guess - 1,
                    HintDirection::Petit => low = last_guess + 1,
                }
                last_guess = low + (high - low) / 2;
                write_half
                    .write_all(encode_line(&last_guess.to_string()).as_bytes())
                    .await?;
            }
            ServerMessage::Victory {
                number,
                attempts,
                score,
                ..
            } => {
                println!(
                    "{} found {} in {} attempts, score {}",
                    name, number, attempts, score
                );
                return Ok(Some(score));
            }
            ServerMessage::Error { message } => println!("{}: server error: {}", name, message),
            _ => {}
        }
    }

    Ok(None)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let mut handles = Vec::new();

    for _ in 0..args.bots {
        handles.push(tokio::spawn(play(args.server.clone(), args.name.clone())));
    }

    for handle in handles {
        match handle.await? {
            Ok(Some(_)) => {}
            Ok(None) => println!("Connection closed before winning"),
            Err(e) => println!("Bot failed: {}", e),
        }
    }

    Ok(())
}

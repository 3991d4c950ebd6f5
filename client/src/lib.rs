//! # Guessing Client Library
//!
//! Terminal front end for the number-guessing server. The client connects
//! over TCP, renders the JSON messages the server sends and forwards what
//! the player types, one line at a time.
//!
//! ## Session Flow
//!
//! 1. On connect the server sends its statistics, the leaderboard and a name
//!    prompt. The player's answer is sent as-is; the server decides whether
//!    the name is acceptable and re-prompts otherwise.
//! 2. Once the game starts every line is a guess, or one of the commands
//!    `stats` and `quit`. Empty lines are never sent.
//! 3. After a win the client offers another game. Accepting reconnects and
//!    answers the name prompt with the name accepted before.
//!
//! ## Module Organization
//!
//! - `network`: connection handling and the prompt/reply loop
//! - `display`: plain-text rendering of server messages
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//! use tokio::io::BufReader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let stdin = BufReader::new(tokio::io::stdin());
//!     let mut client = Client::new("127.0.0.1:8080", stdin, std::io::stdout());
//!
//!     client.run().await?;
//!     Ok(())
//! }
//! ```

use shared::ProtocolError;
use thiserror::Error;

pub mod display;
pub mod network;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

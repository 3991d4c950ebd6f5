//! # Guessing Server Library
//!
//! This library implements the server side of a competitive number-guessing
//! game played over TCP. Every client gets a private game against a hidden
//! number, while finished games feed a leaderboard and statistics shared by
//! the whole server.
//!
//! ## Core Responsibilities
//!
//! ### Session Engine
//! Each connection is driven by its own [`session::Session`]: the client sees
//! the current stats and leaderboard, picks a name, then guesses until it
//! finds the number, quits or goes away. Invalid input is answered and
//! ignored; it never costs an attempt.
//!
//! ### Shared State
//! Three resources are shared between sessions, each behind its own lock:
//! - the [`leaderboard::Leaderboard`] of the best scores
//! - the [`stats::StatsAggregator`] with running game totals
//! - the [`client_manager::ClientManager`] roster enforcing the session cap
//!
//! No code path holds two of these locks at once. They are bundled in a
//! [`context::ServerContext`] that every session worker receives.
//!
//! ### Admission Control
//! The accept loop reserves a slot for a new connection in a single locked
//! step, so the number of live sessions never exceeds the configured cap. A
//! connection arriving on a full server gets an `error` message and is
//! closed without starting a session.
//!
//! ## Scoring
//!
//! `score = max(0, initial_score - attempts * attempt_penalty - seconds)`,
//! with the defaults `initial_score = 10000` and `attempt_penalty = 100`.
//! See [`game::calculate_score`].
//!
//! ## Module Organization
//!
//! - `config`: tunable limits and scoring constants
//! - `game`: name validation, target draw, guess evaluation and scoring
//! - `leaderboard`: bounded, sorted score table
//! - `stats`: running totals and uptime
//! - `client_manager`: session ids, slot reservation, active/total counts
//! - `context`: the shared resources handed to sessions
//! - `session`: the per-connection protocol state machine
//! - `network`: the TCP accept loop and worker tracking
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::GameConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::new("0.0.0.0:8080", GameConfig::default()).await?;
//!
//!     // Runs until Ctrl+C, then closes every open session
//!     server
//!         .run_until(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod context;
pub mod error;
pub mod game;
pub mod leaderboard;
pub mod network;
pub mod session;
pub mod stats;

pub use error::ServerError;

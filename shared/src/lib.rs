//! Wire protocol shared by the guessing server and the terminal client.
//!
//! Clients send one line of text per round. The server answers with
//! newline-terminated JSON objects, each tagged with a `type` field.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const MIN_NUMBER: i64 = 0;
pub const MAX_NUMBER: i64 = 100;

/// Longest line the server will buffer for a single client command
pub const MAX_LINE_BYTES: usize = 4096;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Which side of the target the last guess landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintDirection {
    /// The guess was above the target
    Grand,
    /// The guess was below the target
    Petit,
}

/// One row of a leaderboard message, rank starting at 1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub rank: u32,
    pub name: String,
    pub score: u32,
    pub attempts: u32,
    pub duration: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Stats {
        uptime: u64,
        active_clients: usize,
        total_served: u64,
        total_games: u64,
        best_attempts: u32,
        avg_attempts: f64,
    },
    Leaderboard {
        count: usize,
        scores: Vec<ScoreEntry>,
    },
    Prompt {
        message: String,
    },
    NameAccepted {
        name: String,
    },
    GameStart {
        player: String,
        min: i64,
        max: i64,
    },
    Hint {
        direction: HintDirection,
        attempts: u32,
    },
    Victory {
        player: String,
        number: i64,
        attempts: u32,
        duration: u64,
        score: u32,
    },
    Error {
        message: String,
    },
    Bye {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    pub fn prompt(message: impl Into<String>) -> Self {
        ServerMessage::Prompt {
            message: message.into(),
        }
    }
}

/// Serializes a message into a single newline-terminated JSON line.
pub fn encode(message: &ServerMessage) -> Result<String, ProtocolError> {
    let mut line = serde_json::to_string(message).map_err(ProtocolError::Encode)?;
    line.push('\n');
    Ok(line)
}

/// Parses one JSON line received from the server.
pub fn decode(line: &str) -> Result<ServerMessage, ProtocolError> {
    serde_json::from_str(line.trim()).map_err(ProtocolError::Decode)
}

/// Frames a client command or name as one line
pub fn encode_line(text: &str) -> String {
    format!("{}\n", strip_line_ending(text))
}

/// Removes the trailing line terminator (`\n`, `\r\n` or a stray `\r`).
pub fn strip_line_ending(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

/// A line typed by a player once the game has started
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Quit,
    Stats,
    Guess(i64),
    /// Anything that is neither a command nor a base-10 integer
    Unrecognized(String),
}

impl ClientCommand {
    pub fn parse(line: &str) -> Self {
        let input = line.trim();

        if input.eq_ignore_ascii_case("quit") {
            ClientCommand::Quit
        } else if input.eq_ignore_ascii_case("stats") {
            ClientCommand::Stats
        } else {
            match input.parse::<i64>() {
                Ok(value) => ClientCommand::Guess(value),
                Err(_) => ClientCommand::Unrecognized(input.to_string()),
            }
        }
    }
}

//! Per-connection protocol state machine
//!
//! A session walks one client through the lobby, the name check and a single
//! game:
//!
//! ```text
//! AwaitName ──valid name──▶ Playing ──correct guess──▶ Won
//!     │                        ├────── quit ─────────▶ Quit
//!     └── too many names ──┐   │
//!                          ▼   ▼
//!                      Disconnected  (also on EOF / transport errors)
//! ```
//!
//! The machine itself only turns lines into replies (`handle_line`); `run`
//! feeds it from a connection and writes the replies back. Bad input never
//! ends a session: it is answered with an `error` message and the session
//! stays where it was.

use crate::context::ServerContext;
use crate::error::ServerError;
use crate::game::{calculate_score, draw_target, in_range, validate_name, Game, GuessOutcome};
use crate::leaderboard::ScoreRecord;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{
    encode, strip_line_ending, ClientCommand, HintDirection, ServerMessage, MAX_LINE_BYTES,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Why a session ended without finishing its game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The peer closed the connection or a read/write failed
    Transport,
    /// Too many invalid names were submitted
    NameAttemptsExhausted,
}

#[derive(Debug)]
pub enum SessionState {
    AwaitName {
        submissions: u32,
    },
    Playing {
        player: String,
        game: Game,
    },
    Won {
        player: String,
        attempts: u32,
        score: u32,
    },
    Quit,
    Disconnected(DisconnectReason),
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Won { .. } | SessionState::Quit | SessionState::Disconnected(_)
        )
    }
}

pub struct Session<R = StdRng> {
    id: u64,
    addr: SocketAddr,
    context: Arc<ServerContext>,
    rng: R,
    state: SessionState,
}

impl Session<StdRng> {
    pub fn new(id: u64, addr: SocketAddr, context: Arc<ServerContext>) -> Self {
        Self::with_rng(id, addr, context, StdRng::from_entropy())
    }
}

impl<R: Rng> Session<R> {
    /// Creates a session drawing its target from `rng`
    pub fn with_rng(id: u64, addr: SocketAddr, context: Arc<ServerContext>, rng: R) -> Self {
        Self {
            id,
            addr,
            context,
            rng,
            state: SessionState::AwaitName { submissions: 0 },
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// Messages sent right after connecting: the lobby view and the name prompt
    pub async fn greeting(&self) -> Vec<ServerMessage> {
        vec![
            self.context.stats_message().await,
            self.context.leaderboard_message().await,
            self.name_prompt(),
        ]
    }

    /// Feeds one received line (without its terminator) to the machine.
    ///
    /// Returns the replies to send, in order. Terminal sessions ignore input.
    pub async fn handle_line(&mut self, line: &str) -> Vec<ServerMessage> {
        let state = std::mem::replace(
            &mut self.state,
            SessionState::Disconnected(DisconnectReason::Transport),
        );

        let (next, replies) = match state {
            SessionState::AwaitName { submissions } => self.on_name(submissions + 1, line),
            SessionState::Playing { player, game } => self.on_command(player, game, line).await,
            terminal => (terminal, Vec::new()),
        };

        self.state = next;
        replies
    }

    /// Answers a line that exceeded the length limit.
    ///
    /// It counts as one invalid name while waiting for a name and is a
    /// plain error during the game; it never consumes an attempt.
    pub fn handle_oversized_line(&mut self) -> Vec<ServerMessage> {
        debug!("Client #{}: line longer than {} bytes", self.id, MAX_LINE_BYTES);

        let state = std::mem::replace(
            &mut self.state,
            SessionState::Disconnected(DisconnectReason::Transport),
        );

        let (next, replies) = match state {
            SessionState::AwaitName { submissions } => self.reject_name(submissions + 1),
            playing @ SessionState::Playing { .. } => (
                playing,
                vec![ServerMessage::error(format!(
                    "Line too long (limit {} bytes)",
                    MAX_LINE_BYTES
                ))],
            ),
            terminal => (terminal, Vec::new()),
        };

        self.state = next;
        replies
    }

    /// Marks the connection as gone. Sessions that already ended keep their state.
    pub fn disconnect(&mut self) {
        if !self.is_finished() {
            debug!("Client #{}: connection lost", self.id);
            self.state = SessionState::Disconnected(DisconnectReason::Transport);
        }
    }

    /// Drives the session over a connection until it reaches a terminal state.
    pub async fn run<Rd, W>(mut self, mut reader: Rd, mut writer: W) -> SessionState
    where
        Rd: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let greeting = self.greeting().await;
        if let Err(e) = send_all(&mut writer, &greeting).await {
            debug!("Client #{}: failed to send greeting: {}", self.id, e);
            self.disconnect();
        }

        let mut buffer = Vec::with_capacity(256);

        while !self.is_finished() {
            match read_line(&mut reader, &mut buffer).await {
                Ok(Some(line)) => {
                    let replies = match line {
                        Line::Text(text) => self.handle_line(&text).await,
                        Line::Oversized => self.handle_oversized_line(),
                    };
                    if let Err(e) = send_all(&mut writer, &replies).await {
                        debug!("Client #{}: failed to send reply: {}", self.id, e);
                        self.disconnect();
                    }
                }
                Ok(None) => self.disconnect(),
                Err(e) => {
                    debug!("Client #{}: read error: {}", self.id, e);
                    self.disconnect();
                }
            }
        }

        let _ = writer.shutdown().await;
        self.state
    }

    fn name_prompt(&self) -> ServerMessage {
        let config = &self.context.config;
        ServerMessage::prompt(format!(
            "Enter your name ({}-{} letters):",
            config.min_name_length, config.max_name_length
        ))
    }

    fn on_name(&mut self, submissions: u32, line: &str) -> (SessionState, Vec<ServerMessage>) {
        let config = &self.context.config;

        if validate_name(line, config) {
            let player = line.to_string();
            info!("Client #{}: name accepted '{}'", self.id, player);
            self.context.clients().set_player_name(self.id, &player);

            let target = draw_target(&mut self.rng, config);
            info!(
                "Client #{} - {}: game started (target: {})",
                self.id, player, target
            );

            let replies = vec![
                ServerMessage::NameAccepted {
                    name: player.clone(),
                },
                ServerMessage::GameStart {
                    player: player.clone(),
                    min: config.min_number,
                    max: config.max_number,
                },
            ];
            return (
                SessionState::Playing {
                    player,
                    game: Game::new(target),
                },
                replies,
            );
        }

        self.reject_name(submissions)
    }

    fn reject_name(&self, submissions: u32) -> (SessionState, Vec<ServerMessage>) {
        let config = &self.context.config;
        let invalid = ServerMessage::error(format!(
            "Invalid name: use {}-{} letters (a-z, A-Z), no digits, spaces or symbols",
            config.min_name_length, config.max_name_length
        ));

        if submissions >= config.max_name_attempts {
            warn!(
                "Client #{} ({}): {} invalid names, disconnecting",
                self.id, self.addr, submissions
            );
            return (
                SessionState::Disconnected(DisconnectReason::NameAttemptsExhausted),
                vec![
                    invalid,
                    ServerMessage::error("Too many invalid names. Disconnecting."),
                ],
            );
        }

        (
            SessionState::AwaitName { submissions },
            vec![invalid, ServerMessage::prompt("Try again:")],
        )
    }

    async fn on_command(
        &mut self,
        player: String,
        mut game: Game,
        line: &str,
    ) -> (SessionState, Vec<ServerMessage>) {
        let config = &self.context.config;

        let value = match ClientCommand::parse(line) {
            ClientCommand::Quit => {
                info!("Client #{} - {}: quit", self.id, player);
                let bye = ServerMessage::Bye {
                    message: "Goodbye! Thanks for playing".to_string(),
                };
                return (SessionState::Quit, vec![bye]);
            }
            ClientCommand::Stats => {
                let replies = vec![
                    self.context.stats_message().await,
                    self.context.leaderboard_message().await,
                ];
                return (SessionState::Playing { player, game }, replies);
            }
            ClientCommand::Unrecognized(input) => {
                debug!("Client #{} - {}: not a number {:?}", self.id, player, input);
                let reply = ServerMessage::error("Enter a valid integer");
                return (SessionState::Playing { player, game }, vec![reply]);
            }
            ClientCommand::Guess(value) if !in_range(value, config) => {
                let reply = ServerMessage::error(format!(
                    "The number must be between {} and {}",
                    config.min_number, config.max_number
                ));
                return (SessionState::Playing { player, game }, vec![reply]);
            }
            ClientCommand::Guess(value) => value,
        };

        let outcome = game.guess(value);
        debug!(
            "Client #{} - {}: attempt {} -> {} (target: {})",
            self.id,
            player,
            game.attempts(),
            value,
            game.target()
        );

        match outcome {
            GuessOutcome::TooHigh { attempts } => {
                let hint = ServerMessage::Hint {
                    direction: HintDirection::Grand,
                    attempts,
                };
                (SessionState::Playing { player, game }, vec![hint])
            }
            GuessOutcome::TooLow { attempts } => {
                let hint = ServerMessage::Hint {
                    direction: HintDirection::Petit,
                    attempts,
                };
                (SessionState::Playing { player, game }, vec![hint])
            }
            GuessOutcome::Correct { attempts, duration } => {
                let score = calculate_score(attempts, duration, config);
                let victory = ServerMessage::Victory {
                    player: player.clone(),
                    number: game.target(),
                    attempts,
                    duration,
                    score,
                };

                self.context.stats.record_game(attempts).await;
                let position = self
                    .context
                    .leaderboard
                    .insert(ScoreRecord::new(player.clone(), attempts, duration, score))
                    .await;

                match position {
                    Some(index) => info!(
                        "Client #{} - {}: won in {} attempts ({}s), score {}, rank #{}",
                        self.id,
                        player,
                        attempts,
                        duration,
                        score,
                        index + 1
                    ),
                    None => info!(
                        "Client #{} - {}: won in {} attempts ({}s), score {}, not ranked",
                        self.id, player, attempts, duration, score
                    ),
                }

                let leaderboard = self.context.leaderboard_message().await;
                (
                    SessionState::Won {
                        player,
                        attempts,
                        score,
                    },
                    vec![victory, leaderboard],
                )
            }
        }
    }
}

/// One framed unit of client input
#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Text(String),
    /// A line longer than `MAX_LINE_BYTES`; its content was discarded
    Oversized,
}

/// Reads one line without its terminator. Returns `None` on end of stream.
///
/// A line that does not fit in `MAX_LINE_BYTES` is drained up to its
/// newline and reported as a single `Line::Oversized`.
async fn read_line<Rd>(reader: &mut Rd, buffer: &mut Vec<u8>) -> std::io::Result<Option<Line>>
where
    Rd: AsyncBufRead + Unpin,
{
    buffer.clear();
    let read = (&mut *reader)
        .take(MAX_LINE_BYTES as u64)
        .read_until(b'\n', buffer)
        .await?;

    if read == 0 {
        return Ok(None);
    }

    if read == MAX_LINE_BYTES && buffer.last() != Some(&b'\n') {
        discard_until_newline(reader).await?;
        return Ok(Some(Line::Oversized));
    }

    let text = String::from_utf8_lossy(&buffer[..]);
    Ok(Some(Line::Text(strip_line_ending(&text).to_string())))
}

async fn discard_until_newline<Rd>(reader: &mut Rd) -> std::io::Result<()>
where
    Rd: AsyncBufRead + Unpin,
{
    loop {
        let (used, done) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(());
            }
            match available.iter().position(|&byte| byte == b'\n') {
                Some(index) => (index + 1, true),
                None => (available.len(), false),
            }
        };

        reader.consume(used);
        if done {
            return Ok(());
        }
    }
}

async fn send_all<W>(writer: &mut W, messages: &[ServerMessage]) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    if messages.is_empty() {
        return Ok(());
    }

    let mut payload = String::new();
    for message in messages {
        payload.push_str(&encode(message)?);
    }

    writer.write_all(payload.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

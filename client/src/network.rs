use crate::display::render;
use crate::ClientError;
use log::{debug, info, warn};
use shared::{decode, encode_line, ServerMessage};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// How one connection to the server ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Won { score: u32 },
    Quit,
    /// The server closed the connection, or the player closed stdin
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Lobby,
    Playing,
    Won { score: u32 },
}

/// Terminal client for the guessing server
///
/// Reads player input from `input`, writes rendered server messages to
/// `output`. After a win it offers to play again and reconnects, reusing
/// the accepted name.
pub struct Client<I, O> {
    server_addr: String,
    input: Lines<I>,
    output: O,
    player_name: Option<String>,
}

struct Connection {
    messages: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Connection {
    async fn open(addr: &str) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, writer) = stream.into_split();
        Ok(Connection {
            messages: BufReader::new(read_half).lines(),
            writer,
        })
    }

    async fn next_message(&mut self) -> Result<Option<ServerMessage>, ClientError> {
        match self.messages.next_line().await? {
            Some(line) => Ok(Some(decode(&line)?)),
            None => Ok(None),
        }
    }

    async fn send(&mut self, text: &str) -> Result<(), ClientError> {
        self.writer.write_all(encode_line(text).as_bytes()).await?;
        Ok(())
    }
}

impl<I, O> Client<I, O>
where
    I: AsyncBufRead + Unpin,
    O: Write,
{
    pub fn new(server_addr: &str, input: I, output: O) -> Self {
        Client {
            server_addr: server_addr.to_string(),
            input: input.lines(),
            output,
            player_name: None,
        }
    }

    pub fn player_name(&self) -> Option<&str> {
        self.player_name.as_deref()
    }

    /// Plays games until the player stops or the server goes away
    pub async fn run(&mut self) -> Result<GameOutcome, ClientError> {
        let mut outcome = self.play_game(false).await?;

        while let GameOutcome::Won { .. } = outcome {
            if !self.ask_retry().await? {
                break;
            }
            info!("Reconnecting to {}", self.server_addr);
            outcome = self.play_game(true).await?;
        }

        Ok(outcome)
    }

    /// Runs a single connection from greeting to its end.
    ///
    /// With `reuse_name`, the first name prompt is answered with the name
    /// accepted in a previous game instead of asking the player.
    pub async fn play_game(&mut self, reuse_name: bool) -> Result<GameOutcome, ClientError> {
        let mut connection = Connection::open(&self.server_addr).await?;
        info!("Connected to {}", self.server_addr);

        let mut phase = Phase::Lobby;
        let mut auto_name = if reuse_name {
            self.player_name.clone()
        } else {
            None
        };

        while let Some(message) = connection.next_message().await? {
            debug!("Received {:?}", message);

            match &message {
                ServerMessage::Prompt { .. } => {
                    let name = match auto_name.take() {
                        Some(name) => name,
                        None => {
                            self.show(&message)?;
                            match self.read_input().await? {
                                Some(name) => name,
                                None => return Ok(GameOutcome::Closed),
                            }
                        }
                    };
                    connection.send(&name).await?;
                }
                ServerMessage::NameAccepted { name } => {
                    self.player_name = Some(name.clone());
                    self.show(&message)?;
                }
                ServerMessage::GameStart { .. } => {
                    phase = Phase::Playing;
                    self.show(&message)?;
                    if !self.send_guess(&mut connection).await? {
                        return Ok(GameOutcome::Closed);
                    }
                }
                ServerMessage::Hint { .. } | ServerMessage::Error { .. } => {
                    self.show(&message)?;
                    if phase == Phase::Playing && !self.send_guess(&mut connection).await? {
                        return Ok(GameOutcome::Closed);
                    }
                }
                ServerMessage::Stats { .. } => {
                    if phase != Phase::Lobby || auto_name.is_none() {
                        self.show(&message)?;
                    }
                }
                ServerMessage::Leaderboard { .. } => {
                    if phase != Phase::Lobby || auto_name.is_none() {
                        self.show(&message)?;
                    }
                    match phase {
                        Phase::Playing => {
                            if !self.send_guess(&mut connection).await? {
                                return Ok(GameOutcome::Closed);
                            }
                        }
                        Phase::Won { score } => return Ok(GameOutcome::Won { score }),
                        Phase::Lobby => {}
                    }
                }
                ServerMessage::Victory { score, .. } => {
                    phase = Phase::Won { score: *score };
                    self.show(&message)?;
                }
                ServerMessage::Bye { .. } => {
                    self.show(&message)?;
                    return Ok(GameOutcome::Quit);
                }
            }
        }

        match phase {
            Phase::Won { score } => Ok(GameOutcome::Won { score }),
            _ => {
                warn!("Connection closed by server");
                Ok(GameOutcome::Closed)
            }
        }
    }

    /// Reads the next non-empty guess or command and sends it.
    ///
    /// Returns false once the player's input is exhausted.
    async fn send_guess(&mut self, connection: &mut Connection) -> Result<bool, ClientError> {
        write!(self.output, "Your guess: ")?;
        self.output.flush()?;

        loop {
            match self.read_input().await? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => {
                    connection.send(&line).await?;
                    return Ok(true);
                }
                None => return Ok(false),
            }
        }
    }

    async fn ask_retry(&mut self) -> Result<bool, ClientError> {
        writeln!(self.output, "Play again with the same name? (y/n)")?;
        self.output.flush()?;

        let answer = self.read_input().await?.unwrap_or_default();
        Ok(matches!(
            answer.trim().to_lowercase().as_str(),
            "y" | "yes" | "o" | "oui"
        ))
    }

    async fn read_input(&mut self) -> Result<Option<String>, ClientError> {
        Ok(self.input.next_line().await?)
    }

    fn show(&mut self, message: &ServerMessage) -> Result<(), ClientError> {
        writeln!(self.output, "{}", render(message))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{encode, HintDirection};
    use std::net::SocketAddr;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// One scripted server connection: messages sent up front, then one
    /// reply batch per line received from the client.
    type Script = (Vec<ServerMessage>, Vec<Vec<ServerMessage>>);

    fn lobby() -> Vec<ServerMessage> {
        vec![
            ServerMessage::Stats {
                uptime: 0,
                active_clients: 1,
                total_served: 1,
                total_games: 0,
                best_attempts: 0,
                avg_attempts: 0.0,
            },
            ServerMessage::Leaderboard {
                count: 0,
                scores: vec![],
            },
            ServerMessage::prompt("Enter your name (3-10 letters):"),
        ]
    }

    fn name_accepted(name: &str) -> Vec<ServerMessage> {
        vec![
            ServerMessage::NameAccepted {
                name: name.to_string(),
            },
            ServerMessage::GameStart {
                player: name.to_string(),
                min: 0,
                max: 100,
            },
        ]
    }

    fn victory(name: &str, score: u32) -> Vec<ServerMessage> {
        vec![
            ServerMessage::Victory {
                player: name.to_string(),
                number: 50,
                attempts: 1,
                duration: 0,
                score,
            },
            ServerMessage::Leaderboard {
                count: 0,
                scores: vec![],
            },
        ]
    }

    /// Serves each script on its own connection and returns the lines
    /// received on every connection.
    async fn fake_server(scripts: Vec<Script>) -> (SocketAddr, JoinHandle<Vec<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let mut received = Vec::new();
            for (greeting, replies) in scripts {
                let (stream, _) = listener.accept().await.unwrap();
                let (read_half, mut write_half) = stream.into_split();
                let mut lines = BufReader::new(read_half).lines();
                let mut got = Vec::new();

                for message in &greeting {
                    write_half
                        .write_all(encode(message).unwrap().as_bytes())
                        .await
                        .unwrap();
                }
                for batch in replies {
                    let line = match lines.next_line().await.unwrap() {
                        Some(line) => line,
                        None => break,
                    };
                    got.push(line);
                    for message in &batch {
                        write_half
                            .write_all(encode(message).unwrap().as_bytes())
                            .await
                            .unwrap();
                    }
                }
                received.push(got);
            }
            received
        });

        (addr, handle)
    }

    #[tokio::test]
    async fn test_plays_until_victory() {
        let hint = vec![ServerMessage::Hint {
            direction: HintDirection::Petit,
            attempts: 1,
        }];
        let (addr, server) = fake_server(vec![(
            lobby(),
            vec![name_accepted("Bob"), hint, victory("Bob", 9800)],
        )])
        .await;

        let input: &[u8] = b"Bob\n10\n\n50\nn\n";
        let mut output = Vec::new();
        let mut client = Client::new(&addr.to_string(), input, &mut output);

        let outcome = client.run().await.unwrap();
        assert_eq!(outcome, GameOutcome::Won { score: 9800 });
        assert_eq!(client.player_name(), Some("Bob"));

        let received = server.await.unwrap();
        assert_eq!(received, vec![vec!["Bob", "10", "50"]]);

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Welcome Bob!"));
        assert!(text.contains("Too low! (attempt #1)"));
        assert!(text.contains("Score    : 9800 points"));
    }

    #[tokio::test]
    async fn test_quit_command() {
        let bye = vec![ServerMessage::Bye {
            message: "Goodbye! Thanks for playing".to_string(),
        }];
        let (addr, server) =
            fake_server(vec![(lobby(), vec![name_accepted("Bob"), bye])]).await;

        let input: &[u8] = b"Bob\nquit\n";
        let mut output = Vec::new();
        let mut client = Client::new(&addr.to_string(), input, &mut output);

        assert_eq!(client.run().await.unwrap(), GameOutcome::Quit);
        assert_eq!(server.await.unwrap(), vec![vec!["Bob", "quit"]]);
    }

    #[tokio::test]
    async fn test_replay_reuses_name() {
        let (addr, server) = fake_server(vec![
            (lobby(), vec![name_accepted("Bob"), victory("Bob", 9900)]),
            (lobby(), vec![name_accepted("Bob"), victory("Bob", 9700)]),
        ])
        .await;

        let input: &[u8] = b"Bob\n50\nyes\n50\nno\n";
        let mut output = Vec::new();
        let mut client = Client::new(&addr.to_string(), input, &mut output);

        assert_eq!(
            client.run().await.unwrap(),
            GameOutcome::Won { score: 9700 }
        );
        assert_eq!(
            server.await.unwrap(),
            vec![vec!["Bob", "50"], vec!["Bob", "50"]]
        );
    }

    #[tokio::test]
    async fn test_input_exhausted_closes() {
        let (addr, _server) = fake_server(vec![(lobby(), vec![name_accepted("Bob")])]).await;

        let input: &[u8] = b"Bob\n";
        let mut output = Vec::new();
        let mut client = Client::new(&addr.to_string(), input, &mut output);

        assert_eq!(client.run().await.unwrap(), GameOutcome::Closed);
    }
}

//! Server network layer: accepting TCP connections and running session workers

use crate::config::GameConfig;
use crate::context::ServerContext;
use crate::error::ServerError;
use crate::session::{Session, SessionState};
use log::{debug, error, info};
use shared::{encode, ServerMessage};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinError, JoinSet};

const SERVER_FULL_MESSAGE: &str =
    "Server full! Maximum number of players reached. Please try again in a few moments.";

/// Accept loop owning the listener and the shared game state
pub struct Server {
    listener: TcpListener,
    context: Arc<ServerContext>,
}

impl Server {
    /// Validates `config` and binds the listener
    pub async fn new(addr: &str, config: GameConfig) -> Result<Self, ServerError> {
        config.validate()?;

        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let context = Arc::new(ServerContext::new(config));
        info!(
            "Leaderboard keeps the top {} scores",
            context.leaderboard.capacity()
        );

        Ok(Server { listener, context })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn context(&self) -> Arc<ServerContext> {
        Arc::clone(&self.context)
    }

    /// Accepts connections forever
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(std::future::pending()).await
    }

    /// Accepts connections until `shutdown` completes, then aborts every
    /// running session.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let mut workers: JoinSet<(u64, SessionState)> = JoinSet::new();
        tokio::pin!(shutdown);

        info!("Server started successfully");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Server shutting down");
                    break;
                }

                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => self.handle_connection(stream, addr, &mut workers),
                        Err(e) => {
                            error!("Error accepting connection: {}", e);
                            tokio::time::sleep(Duration::from_millis(10)).await;
                        }
                    }
                }

                Some(finished) = workers.join_next(), if !workers.is_empty() => {
                    Self::reap_worker(finished);
                }
            }
        }

        if !workers.is_empty() {
            info!("Closing {} active sessions", workers.len());
        }
        workers.shutdown().await;

        Ok(())
    }

    /// Admits the connection and spawns its worker, or turns it away when
    /// every slot is taken.
    fn handle_connection(
        &self,
        mut stream: TcpStream,
        addr: SocketAddr,
        workers: &mut JoinSet<(u64, SessionState)>,
    ) {
        match self.context.admit(addr) {
            Ok(slot) => {
                let context = Arc::clone(&self.context);

                workers.spawn(async move {
                    let id = slot.id();
                    let (read_half, write_half) = stream.into_split();

                    let session = Session::new(id, addr, context);
                    let end = session.run(BufReader::new(read_half), write_half).await;

                    drop(slot);
                    (id, end)
                });
            }
            Err(session_id) => {
                tokio::spawn(async move {
                    if let Err(e) = Self::reject(&mut stream).await {
                        error!(
                            "Failed to notify rejected client #{} at {}: {}",
                            session_id, addr, e
                        );
                    }
                });
            }
        }
    }

    async fn reject(stream: &mut TcpStream) -> Result<(), ServerError> {
        let line = encode(&ServerMessage::error(SERVER_FULL_MESSAGE))?;
        stream.write_all(line.as_bytes()).await?;
        stream.shutdown().await?;
        Ok(())
    }

    fn reap_worker(finished: Result<(u64, SessionState), JoinError>) {
        match finished {
            Ok((id, SessionState::Won { player, score, .. })) => {
                debug!("Client #{} - {}: session finished with score {}", id, player, score);
            }
            Ok((id, end)) => {
                debug!("Client #{}: session finished ({:?})", id, end);
            }
            Err(e) if e.is_panic() => {
                error!("Session worker panicked: {}", e);
            }
            Err(_) => {}
        }
    }
}

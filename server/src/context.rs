//! Process-wide state handed to every session worker

use crate::client_manager::{Admission, ClientCounts, ClientManager};
use crate::config::GameConfig;
use crate::leaderboard::Leaderboard;
use crate::stats::StatsAggregator;
use log::warn;
use shared::ServerMessage;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared resources of one server instance.
///
/// Each resource sits behind its own lock and no method here holds one lock
/// while taking another. The session roster uses a blocking mutex: it is only
/// held for counter updates and must be releasable from `Drop`.
pub struct ServerContext {
    pub config: GameConfig,
    clients: Mutex<ClientManager>,
    pub leaderboard: Leaderboard,
    pub stats: StatsAggregator,
}

impl ServerContext {
    pub fn new(config: GameConfig) -> Self {
        Self {
            clients: Mutex::new(ClientManager::new(config.max_clients)),
            leaderboard: Leaderboard::new(config.leaderboard_capacity),
            stats: StatsAggregator::new(),
            config,
        }
    }

    pub fn clients(&self) -> MutexGuard<'_, ClientManager> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn client_counts(&self) -> ClientCounts {
        self.clients().counts()
    }

    /// Assigns a session id and reserves a slot in one locked step.
    ///
    /// On success the returned slot releases itself when dropped. When the
    /// server is full the consumed session id is returned as the error.
    pub fn admit(self: &Arc<Self>, addr: SocketAddr) -> Result<SessionSlot, u64> {
        let (admission, max_clients) = {
            let mut clients = self.clients();
            (clients.add_client(addr), clients.max_clients())
        };

        match admission {
            Admission::Accepted(id) => Ok(SessionSlot {
                context: Arc::clone(self),
                id,
            }),
            Admission::Rejected(id) => {
                warn!(
                    "Client #{} from {} rejected: maximum of {} clients reached",
                    id, addr, max_clients
                );
                Err(id)
            }
        }
    }

    /// Builds the `stats` message from the session counters and game totals
    pub async fn stats_message(&self) -> ServerMessage {
        let counts = self.client_counts();
        let stats = self.stats.snapshot().await;

        ServerMessage::Stats {
            uptime: stats.uptime.as_secs(),
            active_clients: counts.active,
            total_served: counts.total_served,
            total_games: stats.total_games,
            best_attempts: stats.best_attempts.unwrap_or(0),
            avg_attempts: stats.average_attempts,
        }
    }

    /// Builds the `leaderboard` message with 1-based ranks
    pub async fn leaderboard_message(&self) -> ServerMessage {
        let scores: Vec<_> = self
            .leaderboard
            .snapshot()
            .await
            .iter()
            .zip(1u32..)
            .map(|(record, rank)| record.to_entry(rank))
            .collect();

        ServerMessage::Leaderboard {
            count: scores.len(),
            scores,
        }
    }
}

/// One reserved concurrent-session slot
///
/// Dropping it removes the session from the roster, whether the worker
/// finished normally, panicked or was aborted.
pub struct SessionSlot {
    context: Arc<ServerContext>,
    id: u64,
}

impl SessionSlot {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for SessionSlot {
    fn drop(&mut self) {
        self.context.clients().remove_client(&self.id);
    }
}

//! Session admission and the live-session roster
//!
//! This module tracks which sessions currently hold one of the server's
//! concurrent slots:
//! - Session id assignment for every accepted socket, admitted or not
//! - Slot reservation against the configured cap, as one step
//! - Release of the slot when a session worker finishes
//! - Active and lifetime session counts for the stats message
//!
//! The manager itself is a plain value; the server shares it behind a single
//! dedicated lock so that checking the cap and taking a slot can never
//! interleave with another accept.

use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A session currently holding a slot
#[derive(Debug)]
pub struct Client {
    /// Unique session identifier assigned on accept
    pub id: u64,
    /// Remote address of the connection
    pub addr: SocketAddr,
    /// When the slot was reserved
    pub connected_at: Instant,
    /// Player name, once the session has accepted one
    pub player_name: Option<String>,
}

impl Client {
    pub fn new(id: u64, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            connected_at: Instant::now(),
            player_name: None,
        }
    }

    pub fn connected_for(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

/// Result of trying to admit a freshly accepted connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A slot was reserved for this session id
    Accepted(u64),
    /// The server was at capacity; the id was consumed but no slot taken
    Rejected(u64),
}

/// Active and lifetime session counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientCounts {
    pub active: usize,
    pub total_served: u64,
}

pub struct ClientManager {
    /// Sessions holding a slot, indexed by session id
    clients: HashMap<u64, Client>,
    /// Next id handed out by `add_client`
    next_client_id: u64,
    /// Maximum number of concurrent sessions
    max_clients: usize,
    /// Sessions ever admitted
    total_served: u64,
}

impl ClientManager {
    /// Session ids start at 1 and increase on every accept.
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
            total_served: 0,
        }
    }

    /// Assigns the next session id and reserves a slot if one is free.
    ///
    /// The capacity check and the reservation happen in the same call, so
    /// with the manager behind one lock the active count can never exceed
    /// `max_clients`.
    pub fn add_client(&mut self, addr: SocketAddr) -> Admission {
        let client_id = self.next_client_id;
        self.next_client_id += 1;

        if self.clients.len() >= self.max_clients {
            return Admission::Rejected(client_id);
        }

        self.clients.insert(client_id, Client::new(client_id, addr));
        self.total_served += 1;
        info!(
            "Client #{} connected from {} ({}/{} active)",
            client_id,
            addr,
            self.clients.len(),
            self.max_clients
        );

        Admission::Accepted(client_id)
    }

    /// Releases the slot held by `client_id`.
    ///
    /// Returns false if the session had already been removed.
    pub fn remove_client(&mut self, client_id: &u64) -> bool {
        match self.clients.remove(client_id) {
            Some(client) => {
                info!(
                    "Client #{} - {}: disconnected after {}s",
                    client.id,
                    client.player_name.as_deref().unwrap_or("Anonymous"),
                    client.connected_for().as_secs()
                );
                true
            }
            None => false,
        }
    }

    /// Attaches the validated player name to a live session
    pub fn set_player_name(&mut self, client_id: u64, name: &str) -> bool {
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.player_name = Some(name.to_string());
            true
        } else {
            false
        }
    }

    pub fn counts(&self) -> ClientCounts {
        ClientCounts {
            active: self.clients.len(),
            total_served: self.total_served,
        }
    }

    pub fn max_clients(&self) -> usize {
        self.max_clients
    }

    /// Returns the number of sessions currently holding a slot
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

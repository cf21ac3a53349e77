//! Participant tracking for the relay
//!
//! This module keeps the relay's view of who is connected:
//! - Join registration and player identity per address
//! - Peer lookup so events can be forwarded to "the other" participant
//! - Connection health monitoring and automatic cleanup
//!
//! The relay never pairs more than two participants, so the manager is
//! usually created with a capacity of two.

use log::info;
use shared::PlayerId;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A participant that has sent `join-game`
#[derive(Debug)]
pub struct Client {
    /// Relay-local identifier, assigned in join order
    pub id: u32,
    /// Network address for sending events
    pub addr: SocketAddr,
    /// Identity the client announced when joining
    pub player_id: PlayerId,
    /// Last time we received any packet from this client
    pub last_seen: Instant,
}

impl Client {
    pub fn new(id: u32, addr: SocketAddr, player_id: PlayerId) -> Self {
        Self {
            id,
            addr,
            player_id,
            last_seen: Instant::now(),
        }
    }

    /// Returns true if nothing was heard from this client within `timeout`
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Manages joined participants and their liveness
pub struct ClientManager {
    /// Joined clients indexed by their relay-local ID
    clients: HashMap<u32, Client>,
    /// Next available client ID
    next_client_id: u32,
    /// Maximum number of concurrent participants
    max_clients: usize,
    /// Silence after which a participant is dropped
    timeout: Duration,
}

impl ClientManager {
    pub fn new(max_clients: usize, timeout: Duration) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
            timeout,
        }
    }

    /// Registers a participant
    ///
    /// Returns None when the relay is already at capacity.
    pub fn add_client(&mut self, addr: SocketAddr, player_id: PlayerId) -> Option<u32> {
        if self.is_full() {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Player {} joined from {} as client {}", player_id, addr, client_id);
        self.clients
            .insert(client_id, Client::new(client_id, addr, player_id));

        Some(client_id)
    }

    /// Removes a participant, returning true if it was present
    pub fn remove_client(&mut self, client_id: &u32) -> bool {
        if let Some(client) = self.clients.remove(client_id) {
            info!("Client {} ({}) left", client.id, client.player_id);
            true
        } else {
            false
        }
    }

    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<u32> {
        self.clients
            .iter()
            .find(|(_, client)| client.addr == addr)
            .map(|(id, _)| *id)
    }

    pub fn get(&self, client_id: &u32) -> Option<&Client> {
        self.clients.get(client_id)
    }

    /// Refreshes the liveness timestamp of the client at `addr`
    ///
    /// Returns the client's ID, or None for an unknown address.
    pub fn touch(&mut self, addr: SocketAddr) -> Option<u32> {
        let client_id = self.find_client_by_addr(addr)?;
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.last_seen = Instant::now();
        }
        Some(client_id)
    }

    /// Returns the other participant, if one is joined
    pub fn peer_of(&self, client_id: u32) -> Option<&Client> {
        self.clients
            .values()
            .find(|client| client.id != client_id)
    }

    /// Removes and returns participants that went silent
    pub fn check_timeouts(&mut self) -> Vec<u32> {
        let timeout = self.timeout;
        let timed_out: Vec<u32> = self
            .clients
            .iter()
            .filter(|(_, client)| client.is_timed_out(timeout))
            .map(|(id, _)| *id)
            .collect();

        for client_id in &timed_out {
            self.remove_client(client_id);
        }

        timed_out
    }

    /// All client IDs and their addresses, for broadcasting
    pub fn get_client_addrs(&self) -> Vec<(u32, SocketAddr)> {
        self.clients
            .iter()
            .map(|(id, client)| (*id, client.addr))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.clients.len() >= self.max_clients
    }
}

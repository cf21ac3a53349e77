//! Pairing and forwarding rules of the relay
//!
//! `RelaySession` decides what to send in response to each packet; it does no
//! I/O itself, the network layer delivers the returned messages.

use crate::client_manager::ClientManager;
use crate::network::OutboundMessage;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{place_food, Packet, PROTOCOL_VERSION};
use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Fewer than two participants have joined
    Waiting,
    /// Two participants are paired and playing
    Playing,
    /// `game-over` was broadcast; waiting for everyone to leave
    Over,
}

pub struct RelaySession {
    phase: SessionPhase,
    grid_size: i32,
    rng: StdRng,
}

impl RelaySession {
    pub fn new(grid_size: i32) -> Self {
        Self::with_rng(grid_size, StdRng::from_entropy())
    }

    pub fn with_rng(grid_size: i32, rng: StdRng) -> Self {
        Self {
            phase: SessionPhase::Waiting,
            grid_size,
            rng,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Applies one packet received from `addr`
    pub fn handle_packet(
        &mut self,
        clients: &mut ClientManager,
        packet: Packet,
        addr: SocketAddr,
    ) -> Vec<OutboundMessage> {
        match packet {
            Packet::JoinGame {
                player_id,
                client_version,
            } => {
                if client_version != PROTOCOL_VERSION {
                    warn!(
                        "Rejecting {} with protocol version {} (expected {})",
                        addr, client_version, PROTOCOL_VERSION
                    );
                    return vec![refuse(addr, "Protocol version mismatch")];
                }

                let mut outgoing = Vec::new();
                if let Some(existing_id) = clients.find_client_by_addr(addr) {
                    info!("Replacing existing client {} from {}", existing_id, addr);
                    clients.remove_client(&existing_id);
                    outgoing.extend(self.handle_departure(clients));
                }

                if self.phase == SessionPhase::Over && clients.is_empty() {
                    self.phase = SessionPhase::Waiting;
                }

                if self.phase != SessionPhase::Waiting || clients.is_full() {
                    outgoing.push(refuse(addr, "Relay session full"));
                    return outgoing;
                }

                if clients.add_client(addr, player_id).is_none() {
                    outgoing.push(refuse(addr, "Relay session full"));
                    return outgoing;
                }

                if clients.is_full() {
                    let food = place_food(&mut self.rng, self.grid_size);
                    info!("Pairing complete, starting game with food at {:?}", food);
                    self.phase = SessionPhase::Playing;
                    outgoing.push(OutboundMessage::BroadcastPacket {
                        packet: Packet::StartGame { food },
                        exclude: None,
                    });
                }

                outgoing
            }

            Packet::GameStatus { player_id, update } => {
                let Some(client_id) = clients.touch(addr) else {
                    warn!("Dropping game-status from unknown address {}", addr);
                    return Vec::new();
                };
                if self.phase != SessionPhase::Playing {
                    debug!("Dropping {:?} update outside of a game", update.kind());
                    return Vec::new();
                }

                match clients.peer_of(client_id) {
                    Some(peer) => vec![OutboundMessage::SendPacket {
                        packet: Packet::GameStatus { player_id, update },
                        addr: peer.addr,
                    }],
                    None => Vec::new(),
                }
            }

            Packet::PlayerDead { player_id } => {
                if clients.touch(addr).is_none() {
                    warn!("Dropping player-dead from unknown address {}", addr);
                    return Vec::new();
                }
                if self.phase != SessionPhase::Playing {
                    return Vec::new();
                }

                info!("Player {} died, game over", player_id);
                self.phase = SessionPhase::Over;
                vec![OutboundMessage::BroadcastPacket {
                    packet: Packet::GameOver,
                    exclude: None,
                }]
            }

            Packet::Heartbeat => {
                clients.touch(addr);
                Vec::new()
            }

            Packet::Disconnect => match clients.find_client_by_addr(addr) {
                Some(client_id) => {
                    clients.remove_client(&client_id);
                    self.handle_departure(clients)
                }
                None => Vec::new(),
            },

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
                Vec::new()
            }
        }
    }

    /// Updates the phase after a participant was removed from `clients`
    ///
    /// A departure mid-game ends the game for the remaining peer.
    pub fn handle_departure(&mut self, clients: &ClientManager) -> Vec<OutboundMessage> {
        let mut outgoing = Vec::new();

        if self.phase == SessionPhase::Playing {
            info!("Participant left mid-game, ending the game");
            self.phase = SessionPhase::Over;
            outgoing.push(OutboundMessage::BroadcastPacket {
                packet: Packet::GameOver,
                exclude: None,
            });
        }

        if clients.is_empty() {
            self.phase = SessionPhase::Waiting;
        }

        outgoing
    }
}

fn refuse(addr: SocketAddr, reason: &str) -> OutboundMessage {
    OutboundMessage::SendPacket {
        packet: Packet::Disconnected {
            reason: reason.to_string(),
        },
        addr,
    }
}

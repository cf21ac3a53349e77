//! Relay network layer handling UDP communications

use crate::client_manager::ClientManager;
use crate::relay::RelaySession;
use log::{error, info, warn};
use shared::{GameConfig, Packet, MAX_DATAGRAM_SIZE};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};

/// Maximum number of participants paired by the relay
pub const MAX_PARTICIPANTS: usize = 2;

/// Messages sent from network tasks to the main relay loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    ClientTimeout {
        client_id: u32,
    },
    /// Ends the main loop, sent by the binary on Ctrl+C
    Shutdown,
}

/// Messages sent from the relay loop to the sender task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    BroadcastPacket {
        packet: Packet,
        exclude: Option<u32>,
    },
}

/// Relay server pairing two snake clients
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    session: RelaySession,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    outbound_tx: mpsc::UnboundedSender<OutboundMessage>,
    outbound_rx: mpsc::UnboundedReceiver<OutboundMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        grid_size: i32,
        client_timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        // Food is drawn over the grid on pairing, so reject what clients would
        GameConfig {
            grid_size,
            ..GameConfig::default()
        }
        .validate()?;

        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Relay listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(
                MAX_PARTICIPANTS,
                client_timeout,
            ))),
            session: RelaySession::new(grid_size),
            server_tx,
            server_rx,
            outbound_tx,
            outbound_rx,
        })
    }

    /// Handle for stopping `run` from outside the relay
    pub fn shutdown_sender(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Address the relay socket is bound to
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; MAX_DATAGRAM_SIZE];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => match Packet::decode(&buffer[0..len]) {
                        Ok(packet) => {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        }
                        Err(_) => warn!("Failed to deserialize packet from {}", addr),
                    },
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes the outgoing packet queue
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let mut outbound_rx =
            std::mem::replace(&mut self.outbound_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                match message {
                    OutboundMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    OutboundMessage::BroadcastPacket { packet, exclude } => {
                        let client_addrs = {
                            let clients_guard = clients.read().await;
                            clients_guard.get_client_addrs()
                        };

                        for (client_id, addr) in client_addrs {
                            if Some(client_id) == exclude {
                                continue;
                            }

                            if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send to client {}: {}", client_id, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that drops participants that went silent
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts()
                };

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        break;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = packet.encode()?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn dispatch(&self, outgoing: Vec<OutboundMessage>) {
        for message in outgoing {
            if let Err(e) = self.outbound_tx.send(message) {
                error!("Failed to queue outbound packet: {}", e);
            }
        }
    }

    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        let outgoing = {
            let mut clients = self.clients.write().await;
            self.session.handle_packet(&mut clients, packet, addr)
        };
        self.dispatch(outgoing);
    }

    async fn handle_timeout(&mut self, client_id: u32) {
        info!("Client {} timed out", client_id);
        let outgoing = {
            let clients = self.clients.read().await;
            self.session.handle_departure(&clients)
        };
        self.dispatch(outgoing);
    }

    /// Main relay loop
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        info!("Relay started successfully");

        loop {
            match self.server_rx.recv().await {
                Some(ServerMessage::PacketReceived { packet, addr }) => {
                    self.handle_packet(packet, addr).await;
                }
                Some(ServerMessage::ClientTimeout { client_id }) => {
                    self.handle_timeout(client_id).await;
                }
                Some(ServerMessage::Shutdown) | None => {
                    info!("Relay shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

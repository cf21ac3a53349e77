use crate::game::Game;
use crate::input::{InputManager, Intent};
use crate::rendering::Renderer;
use crate::scheduler::Scheduler;
use crate::sync::{Connector, RelayLink};
use crate::ClientEvent;
use log::{debug, error, info, warn};
use macroquad::prelude::{is_quit_requested, next_frame, prevent_quit};
use shared::{Packet, MAX_DATAGRAM_SIZE};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::interval;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

/// Opens UDP links to the relay on the background runtime
pub struct UdpConnector {
    runtime: Handle,
    relay_addr: SocketAddr,
    events: mpsc::UnboundedSender<ClientEvent>,
}

impl UdpConnector {
    pub fn new(
        runtime: Handle,
        relay_addr: SocketAddr,
        events: mpsc::UnboundedSender<ClientEvent>,
    ) -> Self {
        Self {
            runtime,
            relay_addr,
            events,
        }
    }
}

impl Connector for UdpConnector {
    fn connect(&mut self) -> Result<RelayLink, Box<dyn std::error::Error>> {
        // Bound here so that socket errors reach the caller
        let socket = std::net::UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(self.relay_addr)?;
        socket.set_nonblocking(true)?;
        info!(
            "Opened relay link {} -> {}",
            socket.local_addr()?,
            self.relay_addr
        );

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let events = self.events.clone();
        self.runtime.spawn(async move {
            match UdpSocket::from_std(socket) {
                Ok(socket) => run_link(socket, outbound_rx, events).await,
                Err(e) => error!("Failed to register relay socket: {}", e),
            }
        });

        Ok(RelayLink::new(outbound_tx))
    }
}

async fn send_packet(
    socket: &UdpSocket,
    packet: &Packet,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let data = packet.encode()?;
    socket.send(&data).await?;
    Ok(())
}

/// Moves packets between a relay link and its socket until the link closes
///
/// Queued packets are flushed before the task exits, so a final `Disconnect`
/// still reaches the relay after the link has been dropped.
async fn run_link(
    socket: UdpSocket,
    mut outbound: mpsc::UnboundedReceiver<Packet>,
    events: mpsc::UnboundedSender<ClientEvent>,
) {
    let mut buffer = [0u8; MAX_DATAGRAM_SIZE];
    let mut heartbeat = interval(HEARTBEAT_INTERVAL);

    loop {
        tokio::select! {
            packet = outbound.recv() => {
                let Some(packet) = packet else {
                    break;
                };
                if let Err(e) = send_packet(&socket, &packet).await {
                    error!("Error sending {:?} to relay: {}", packet, e);
                }
            },

            result = socket.recv(&mut buffer) => match result {
                Ok(len) => match Packet::decode(&buffer[0..len]) {
                    Ok(packet) => {
                        if events.send(ClientEvent::Relay(packet)).is_err() {
                            break;
                        }
                    }
                    Err(_) => warn!("Failed to deserialize packet from relay"),
                },
                // Connected UDP sockets surface ICMP errors here
                Err(e) => {
                    warn!("Error receiving from relay: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            },

            _ = heartbeat.tick() => {
                if let Err(e) = send_packet(&socket, &Packet::Heartbeat).await {
                    debug!("Heartbeat failed: {}", e);
                }
            },
        }
    }

    info!("Relay link closed");
}

/// The windowed client: input, event handling and drawing once per frame
pub struct Client<S: Scheduler> {
    game: Game<S>,
    events: mpsc::UnboundedReceiver<ClientEvent>,
    input: InputManager,
    renderer: Renderer,
}

impl<S: Scheduler> Client<S> {
    pub fn new(
        game: Game<S>,
        events: mpsc::UnboundedReceiver<ClientEvent>,
        renderer: Renderer,
    ) -> Self {
        Self {
            game,
            events,
            input: InputManager::new(),
            renderer,
        }
    }

    /// Applies everything that happened since the last frame
    ///
    /// Returns false once the player asked to quit.
    fn update(&mut self) -> bool {
        for intent in self.input.update(self.game.state().direction) {
            if intent == Intent::Quit {
                return false;
            }
            self.game.handle_intent(intent);
        }

        while let Ok(event) = self.events.try_recv() {
            self.game.handle_event(event);
        }

        !is_quit_requested()
    }

    pub async fn run(&mut self) {
        prevent_quit();
        info!(
            "Player {} ready in {} mode",
            self.game.player_id(),
            self.game.mode()
        );

        while self.update() {
            self.renderer.render(&self.game);
            next_frame().await;
        }

        info!("Shutting down client");
        self.game.shutdown();
    }
}

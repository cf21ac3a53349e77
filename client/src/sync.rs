//! Multiplayer synchronization between the local game and the relay
//!
//! The synchronizer owns the single relay connection of a session. It turns
//! local simulation results into outbound packets and relay packets into
//! opponent-side updates, and it tracks the food authority hand-off: the peer
//! that just ate draws the next food, broadcasts it, and only asserts it
//! locally on its following tick.

use log::{debug, info, warn};
use shared::{Coordinate, Packet, PlayerId, Snake, StatusUpdate, PROTOCOL_VERSION};
use std::fmt;
use tokio::sync::mpsc;

/// Outbound half of a relay connection
///
/// Dropping the link closes the channel, which lets the transport task flush
/// what was queued and exit.
#[derive(Debug)]
pub struct RelayLink {
    outbound: mpsc::UnboundedSender<Packet>,
}

impl RelayLink {
    pub fn new(outbound: mpsc::UnboundedSender<Packet>) -> Self {
        Self { outbound }
    }

    pub fn send(&self, packet: Packet) {
        if self.outbound.send(packet).is_err() {
            warn!("Relay transport is gone, dropping packet");
        }
    }
}

/// Opens relay connections on demand
pub trait Connector {
    fn connect(&mut self) -> Result<RelayLink, Box<dyn std::error::Error>>;
}

#[derive(Debug)]
pub enum SyncError {
    AlreadyConnected,
    Connect(String),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::AlreadyConnected => write!(f, "a relay connection is already open"),
            SyncError::Connect(reason) => write!(f, "failed to connect to relay: {}", reason),
        }
    }
}

impl std::error::Error for SyncError {}

/// A relay packet translated into something the game acts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Start { food: Coordinate },
    OpponentPosition(Vec<Coordinate>),
    OpponentScore(u32),
    Food(Coordinate),
    GameOver,
    Refused(String),
}

pub struct Synchronizer {
    player_id: PlayerId,
    connector: Box<dyn Connector>,
    link: Option<RelayLink>,
    pending_food: Option<Coordinate>,
}

impl Synchronizer {
    pub fn new(player_id: PlayerId, connector: Box<dyn Connector>) -> Self {
        Self {
            player_id,
            connector,
            link: None,
            pending_food: None,
        }
    }

    pub fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Opens the session's relay connection and announces this player
    pub fn join(&mut self) -> Result<(), SyncError> {
        if self.link.is_some() {
            return Err(SyncError::AlreadyConnected);
        }

        let link = self
            .connector
            .connect()
            .map_err(|e| SyncError::Connect(e.to_string()))?;

        info!("Joining relay as {}", self.player_id);
        link.send(Packet::JoinGame {
            player_id: self.player_id.clone(),
            client_version: PROTOCOL_VERSION,
        });
        self.link = Some(link);
        self.pending_food = None;
        Ok(())
    }

    fn send_status(&self, update: StatusUpdate) {
        if let Some(link) = &self.link {
            link.send(Packet::GameStatus {
                player_id: self.player_id.clone(),
                update,
            });
        }
    }

    pub fn publish_position(&self, snake: &Snake) {
        self.send_status(StatusUpdate::Position(snake.segments().to_vec()));
    }

    /// Broadcasts the food drawn after eating, together with the new score
    ///
    /// The food is held back locally until `take_pending_food`.
    pub fn announce_food(&mut self, food: Coordinate, score: u32) {
        debug!("Announcing food at {:?}, score {}", food, score);
        self.send_status(StatusUpdate::Food(Some(food)));
        self.send_status(StatusUpdate::Score(score));
        self.pending_food = Some(food);
    }

    pub fn take_pending_food(&mut self) -> Option<Coordinate> {
        self.pending_food.take()
    }

    pub fn report_death(&self) {
        if let Some(link) = &self.link {
            info!("Reporting death of {}", self.player_id);
            link.send(Packet::PlayerDead {
                player_id: self.player_id.clone(),
            });
        }
    }

    /// Tells the relay we are leaving and closes the connection
    pub fn disconnect(&mut self) {
        if let Some(link) = self.link.take() {
            info!("Disconnecting from relay");
            link.send(Packet::Disconnect);
        }
        self.pending_food = None;
    }

    /// Closes the connection without notifying the relay
    pub fn drop_link(&mut self) {
        self.link = None;
        self.pending_food = None;
    }

    /// Translates a relay packet, ignoring our own echoed updates
    pub fn interpret(&mut self, packet: Packet) -> Option<Inbound> {
        if self.link.is_none() {
            debug!("Ignoring relay packet without an open connection");
            return None;
        }

        match packet {
            Packet::StartGame { food } => Some(Inbound::Start { food }),
            Packet::GameOver => Some(Inbound::GameOver),
            Packet::Disconnected { reason } => Some(Inbound::Refused(reason)),

            Packet::GameStatus { player_id, update } => {
                if player_id == self.player_id {
                    debug!("Ignoring own {:?} update", update.kind());
                    return None;
                }

                match update {
                    StatusUpdate::Position(body) => Some(Inbound::OpponentPosition(body)),
                    StatusUpdate::Score(score) => Some(Inbound::OpponentScore(score)),
                    StatusUpdate::Food(Some(food)) => {
                        // The opponent ate last, so its food wins over ours
                        self.pending_food = None;
                        Some(Inbound::Food(food))
                    }
                    StatusUpdate::Food(None) => None,
                }
            }

            other => {
                warn!("Unexpected packet from relay: {:?}", other);
                None
            }
        }
    }
}

/// Connector handing out links backed by one shared channel
#[cfg(test)]
pub(crate) struct ChannelConnector {
    pub(crate) outbound: mpsc::UnboundedSender<Packet>,
}

#[cfg(test)]
impl Connector for ChannelConnector {
    fn connect(&mut self) -> Result<RelayLink, Box<dyn std::error::Error>> {
        Ok(RelayLink::new(self.outbound.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    struct FailingConnector;

    impl Connector for FailingConnector {
        fn connect(&mut self) -> Result<RelayLink, Box<dyn std::error::Error>> {
            Err("relay unreachable".into())
        }
    }

    fn connected() -> (Synchronizer, mpsc::UnboundedReceiver<Packet>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sync = Synchronizer::new(
            PlayerId::from("me"),
            Box::new(ChannelConnector { outbound: tx }),
        );
        assert_ok!(sync.join());
        (sync, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Packet>) -> Vec<Packet> {
        let mut packets = Vec::new();
        while let Ok(packet) = rx.try_recv() {
            packets.push(packet);
        }
        packets
    }

    #[test]
    fn test_join_announces_identity() {
        let (sync, mut rx) = connected();
        assert!(sync.is_connected());
        assert_eq!(
            drain(&mut rx),
            vec![Packet::JoinGame {
                player_id: PlayerId::from("me"),
                client_version: PROTOCOL_VERSION,
            }]
        );
    }

    #[test]
    fn test_second_join_is_rejected() {
        let (mut sync, _rx) = connected();
        let result = sync.join();
        assert_err!(&result);
        assert!(matches!(result, Err(SyncError::AlreadyConnected)));
    }

    #[test]
    fn test_failed_connect_leaves_sync_disconnected() {
        let mut sync = Synchronizer::new(PlayerId::from("me"), Box::new(FailingConnector));
        assert!(matches!(sync.join(), Err(SyncError::Connect(_))));
        assert!(!sync.is_connected());
    }

    #[test]
    fn test_announce_food_emits_food_and_score() {
        let (mut sync, mut rx) = connected();
        drain(&mut rx);

        sync.announce_food(Coordinate::new(4, 4), 3);

        assert_eq!(
            drain(&mut rx),
            vec![
                Packet::GameStatus {
                    player_id: PlayerId::from("me"),
                    update: StatusUpdate::Food(Some(Coordinate::new(4, 4))),
                },
                Packet::GameStatus {
                    player_id: PlayerId::from("me"),
                    update: StatusUpdate::Score(3),
                },
            ]
        );
        assert_eq!(sync.take_pending_food(), Some(Coordinate::new(4, 4)));
        assert_eq!(sync.take_pending_food(), None);
    }

    #[test]
    fn test_own_updates_are_ignored() {
        let (mut sync, _rx) = connected();
        let echo = Packet::GameStatus {
            player_id: PlayerId::from("me"),
            update: StatusUpdate::Position(vec![Coordinate::new(1, 1)]),
        };
        assert_eq!(sync.interpret(echo), None);
    }

    #[test]
    fn test_opponent_updates_are_translated() {
        let (mut sync, _rx) = connected();
        let opponent = PlayerId::from("them");

        let position = sync.interpret(Packet::GameStatus {
            player_id: opponent.clone(),
            update: StatusUpdate::Position(vec![Coordinate::new(1, 1)]),
        });
        assert_eq!(
            position,
            Some(Inbound::OpponentPosition(vec![Coordinate::new(1, 1)]))
        );

        let score = sync.interpret(Packet::GameStatus {
            player_id: opponent,
            update: StatusUpdate::Score(2),
        });
        assert_eq!(score, Some(Inbound::OpponentScore(2)));
    }

    #[test]
    fn test_opponent_food_overrides_pending_food() {
        let (mut sync, _rx) = connected();
        sync.announce_food(Coordinate::new(4, 4), 1);

        let food = sync.interpret(Packet::GameStatus {
            player_id: PlayerId::from("them"),
            update: StatusUpdate::Food(Some(Coordinate::new(7, 7))),
        });

        assert_eq!(food, Some(Inbound::Food(Coordinate::new(7, 7))));
        assert_eq!(sync.take_pending_food(), None);
    }

    #[test]
    fn test_disconnect_sends_once_and_ignores_late_packets() {
        let (mut sync, mut rx) = connected();
        drain(&mut rx);

        sync.disconnect();
        sync.disconnect();

        assert_eq!(drain(&mut rx), vec![Packet::Disconnect]);
        assert!(!sync.is_connected());
        assert_eq!(sync.interpret(Packet::GameOver), None);
    }

    #[test]
    fn test_report_death() {
        let (sync, mut rx) = connected();
        drain(&mut rx);

        sync.report_death();
        assert_eq!(
            drain(&mut rx),
            vec![Packet::PlayerDead {
                player_id: PlayerId::from("me"),
            }]
        );
    }
}

//! Types and rules shared by the snake client and the relay server
//!
//! The grid model and the movement engine live here so that both peers of a
//! multiplayer game simulate with the same rules, and the relay protocol lives
//! here so that client and relay agree on the wire format.

pub mod config;
pub mod engine;
pub mod grid;

pub use config::{ConfigError, GameConfig};
pub use engine::{has_collision, place_food, tick, TickOutcome};
pub use grid::{Coordinate, Direction, Snake};

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const DEFAULT_GRID_SIZE: i32 = 20;
pub const DEFAULT_REFRESH_RATE_MS: u64 = 300;
/// Smallest grid that still fits the starting snake
pub const MIN_GRID_SIZE: i32 = 6;
pub const PROTOCOL_VERSION: u32 = 1;
/// Pause between the relay pairing two peers and their first tick
pub const START_DELAY_MS: u64 = 500;
pub const MAX_DATAGRAM_SIZE: usize = 4096;

/// Opaque per-session token telling the local player apart from the opponent
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn generate() -> Self {
        let uuid = Uuid::new_v4().simple().to_string();
        Self(uuid[..12].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GameMode {
    Single,
    Multi,
}

impl GameMode {
    pub fn toggled(self) -> Self {
        match self {
            GameMode::Single => GameMode::Multi,
            GameMode::Multi => GameMode::Single,
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameMode::Single => f.write_str("SINGLE"),
            GameMode::Multi => f.write_str("MULTI"),
        }
    }
}

/// Payload of a `game-status` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusUpdate {
    Food(Option<Coordinate>),
    Position(Vec<Coordinate>),
    Score(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    Food,
    Position,
    Score,
}

impl StatusUpdate {
    pub fn kind(&self) -> UpdateKind {
        match self {
            StatusUpdate::Food(_) => UpdateKind::Food,
            StatusUpdate::Position(_) => UpdateKind::Position,
            StatusUpdate::Score(_) => UpdateKind::Score,
        }
    }
}

/// Every message exchanged between a client and the relay
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Packet {
    JoinGame {
        player_id: PlayerId,
        client_version: u32,
    },
    GameStatus {
        player_id: PlayerId,
        update: StatusUpdate,
    },
    PlayerDead {
        player_id: PlayerId,
    },
    Heartbeat,
    Disconnect,

    StartGame {
        food: Coordinate,
    },
    GameOver,
    Disconnected {
        reason: String,
    },
}

impl Packet {
    pub fn encode(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

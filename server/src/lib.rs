//! # Snake Relay Library
//!
//! This library implements the relay that lets two snake clients play against
//! each other. The relay does not simulate anything: each client runs its own
//! game and the relay pairs the clients and forwards their events.
//!
//! ## Core Responsibilities
//!
//! ### Pairing
//! The first two clients that send `JoinGame` are paired. Once the second one
//! arrives both receive `StartGame`, carrying the initial food cell so the two
//! boards start identical. Further joiners are refused until the session is
//! over and everyone has left.
//!
//! ### Forwarding
//! `GameStatus` events (position, food and score updates) are forwarded to
//! the other participant only. The relay performs no validation of reported
//! positions.
//!
//! ### Game Over
//! The first `PlayerDead` of a game is turned into a `GameOver` broadcast to
//! both participants. A participant leaving mid-game, explicitly or by going
//! silent for longer than the client timeout, ends the game the same way.
//!
//! ## Module Organization
//!
//! ### Client Manager Module (`client_manager`)
//! Tracks joined participants, their identity and liveness.
//!
//! ### Relay Module (`relay`)
//! The pairing and forwarding rules as a pure state machine that returns the
//! packets to deliver.
//!
//! ### Network Module (`network`)
//! UDP socket handling: a receiver task, a sender task, a timeout checker and
//! the main loop feeding packets into the relay session.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new("127.0.0.1:3001", 20, Duration::from_secs(5)).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod network;
pub mod relay;

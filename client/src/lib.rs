//! # Snake Client Library
//!
//! Client-side implementation of the grid snake game. It covers both the
//! offline single-player game and the two-player game synchronized through the
//! relay server.
//!
//! ## Architecture Overview
//!
//! The macroquad frame loop is the only thread that touches game state. All
//! asynchronous work runs on a tokio runtime owned by the binary: tick timers,
//! the relay socket, and result persistence. Those tasks never call into the
//! game. They post [`ClientEvent`]s to an unbounded channel that the frame loop
//! drains once per frame, so events are handled strictly one at a time.
//!
//! ### Ticks
//! Each tick advances the local snake by one cell using the rules in
//! `shared::engine`. A restarted timer gets a new generation number, and ticks
//! carrying an old generation are dropped, so at most one timer ever drives
//! the snake.
//!
//! ### Multiplayer
//! Each peer simulates its own snake and publishes the result to the relay.
//! The opponent is only ever drawn, never simulated. Food is handed over by
//! whichever peer ate last.
//!
//! ## Module Organization
//!
//! - `game`: status machine and per-tick simulation
//! - `input`: keyboard to intent mapping
//! - `network`: UDP relay transport and the frame loop
//! - `persistence`: append-only result log
//! - `rendering`: macroquad drawing of the board and header
//! - `scheduler`: tick and start-delay timers
//! - `sync`: relay protocol on the client side

pub mod game;
pub mod input;
pub mod network;
pub mod persistence;
pub mod rendering;
pub mod scheduler;
pub mod sync;

use shared::Packet;

/// Work posted to the frame loop by background tasks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Tick { generation: u64 },
    /// The start delay after pairing has elapsed
    Kickoff,
    Relay(Packet),
}

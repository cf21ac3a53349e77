//! Tick scheduling on a tokio runtime
//!
//! Timers do not call into the game directly. They post `ClientEvent`s to the
//! client's event channel, which the frame loop drains between frames, so a
//! tick never overlaps input handling or another tick.

use crate::ClientEvent;
use log::debug;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Periodic tick source driving the simulation
pub trait Scheduler {
    /// Starts ticking every `interval`, replacing any running timer
    fn start(&mut self, interval: Duration);

    /// Stops ticking; a no-op when nothing is running
    fn cancel(&mut self);

    fn is_running(&self) -> bool;

    /// Identifies the live timer; ticks tagged with any other value are stale
    fn generation(&self) -> u64;

    /// Fires a single `ClientEvent::Kickoff` after `delay`
    fn defer(&mut self, delay: Duration);
}

/// Aborts the wrapped task when dropped
struct TaskGuard(JoinHandle<()>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

pub struct IntervalScheduler {
    runtime: Handle,
    events: mpsc::UnboundedSender<ClientEvent>,
    ticker: Option<TaskGuard>,
    kickoff: Option<TaskGuard>,
    generation: u64,
}

impl IntervalScheduler {
    pub fn new(runtime: Handle, events: mpsc::UnboundedSender<ClientEvent>) -> Self {
        Self {
            runtime,
            events,
            ticker: None,
            kickoff: None,
            generation: 0,
        }
    }
}

impl Scheduler for IntervalScheduler {
    fn start(&mut self, interval: Duration) {
        // Release the previous timer before arming a new one
        self.ticker = None;
        self.generation += 1;

        let generation = self.generation;
        let events = self.events.clone();
        let handle = self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if events.send(ClientEvent::Tick { generation }).is_err() {
                    break;
                }
            }
        });

        debug!("Tick timer {} started at {:?}", generation, interval);
        self.ticker = Some(TaskGuard(handle));
    }

    fn cancel(&mut self) {
        if self.ticker.take().is_some() {
            debug!("Tick timer {} cancelled", self.generation);
            self.generation += 1;
        }
        self.kickoff = None;
    }

    fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    fn generation(&self) -> u64 {
        self.generation
    }

    fn defer(&mut self, delay: Duration) {
        let events = self.events.clone();
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(ClientEvent::Kickoff);
        });
        self.kickoff = Some(TaskGuard(handle));
    }
}

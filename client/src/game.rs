//! Game lifecycle and the per-tick simulation of the local snake

use crate::input::Intent;
use crate::persistence::{GameResult, ResultStore};
use crate::scheduler::Scheduler;
use crate::sync::{Inbound, Synchronizer};
use crate::ClientEvent;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{
    place_food, tick, Coordinate, Direction, GameConfig, GameMode, Packet, PlayerId, Snake,
    START_DELAY_MS,
};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    NotStarted,
    InProgress,
    Paused,
    Finished,
    /// Local snake died in a multiplayer game; waiting for `game-over`
    Pending,
}

impl GameStatus {
    pub fn label(&self) -> &'static str {
        match self {
            GameStatus::NotStarted => "not-started",
            GameStatus::InProgress => "in-progress",
            GameStatus::Paused => "paused",
            GameStatus::Finished => "finished",
            GameStatus::Pending => "pending",
        }
    }

    fn is_running(&self) -> bool {
        matches!(self, GameStatus::InProgress | GameStatus::Paused)
    }
}

/// Everything that is reset when a game starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub snake: Snake,
    pub direction: Direction,
    pub food: Option<Coordinate>,
    pub score: u32,
}

impl GameState {
    pub fn fresh(food: Option<Coordinate>) -> Self {
        Self {
            snake: Snake::starting(),
            direction: Direction::Right,
            food,
            score: 0,
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::fresh(None)
    }
}

/// Last known state of the other player, as reported through the relay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpponentState {
    pub snake: Vec<Coordinate>,
    pub score: u32,
}

pub struct Game<S: Scheduler> {
    config: GameConfig,
    mode: GameMode,
    status: GameStatus,
    state: GameState,
    opponent: OpponentState,
    message: String,
    scheduler: S,
    sync: Synchronizer,
    results: Box<dyn ResultStore>,
    rng: StdRng,
    /// Food handed out by the relay, held until the start delay elapses
    awaiting_kickoff: Option<Coordinate>,
}

impl<S: Scheduler> Game<S> {
    pub fn new(
        config: GameConfig,
        mode: GameMode,
        scheduler: S,
        sync: Synchronizer,
        results: Box<dyn ResultStore>,
    ) -> Self {
        Self {
            config,
            mode,
            status: GameStatus::NotStarted,
            state: GameState::default(),
            opponent: OpponentState::default(),
            message: "Press space to start".to_string(),
            scheduler,
            sync,
            results,
            rng: StdRng::from_entropy(),
            awaiting_kickoff: None,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn opponent(&self) -> &OpponentState {
        &self.opponent
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn player_id(&self) -> &PlayerId {
        self.sync.player_id()
    }

    pub fn is_connected(&self) -> bool {
        self.sync.is_connected()
    }

    pub fn handle_intent(&mut self, intent: Intent) {
        match intent {
            Intent::Turn(direction) => self.turn(direction),
            Intent::TogglePlay => {
                if self.mode == GameMode::Single {
                    self.toggle();
                }
            }
            Intent::PlayButton => self.toggle(),
            Intent::ToggleMode => self.toggle_mode(),
            Intent::Quit => self.shutdown(),
        }
    }

    pub fn handle_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Tick { generation } => {
                if generation != self.scheduler.generation() {
                    debug!("Dropping stale tick from timer {}", generation);
                    return;
                }
                self.tick();
            }
            ClientEvent::Kickoff => self.kickoff(),
            ClientEvent::Relay(packet) => self.handle_relay(packet),
        }
    }

    /// Sets the pending direction unless it reverses the current one
    pub fn turn(&mut self, direction: Direction) {
        if !self.state.direction.is_opposite(direction) {
            self.state.direction = direction;
        }
    }

    /// The play/pause control
    pub fn toggle(&mut self) {
        match self.status {
            GameStatus::InProgress => self.set_status(GameStatus::Paused),
            GameStatus::Paused => self.set_status(GameStatus::InProgress),
            GameStatus::Pending => {}
            GameStatus::NotStarted | GameStatus::Finished => match self.mode {
                GameMode::Single => self.start_game(None),
                GameMode::Multi => self.join(),
            },
        }
    }

    /// Switches between single and multiplayer while no game is running
    pub fn toggle_mode(&mut self) {
        if self.status.is_running()
            || self.status == GameStatus::Pending
            || self.sync.is_connected()
        {
            return;
        }

        self.mode = self.mode.toggled();
        self.opponent = OpponentState::default();
        info!("Game mode set to {}", self.mode);
    }

    fn join(&mut self) {
        if self.sync.is_connected() {
            return;
        }

        match self.sync.join() {
            Ok(()) => {
                self.opponent = OpponentState::default();
                self.message = "Waiting for an opponent...".to_string();
            }
            Err(e) => {
                warn!("Could not join relay: {}", e);
                self.message = format!("Could not reach the relay: {}", e);
            }
        }
    }

    /// Resets the aggregate and starts ticking
    ///
    /// Single-player draws its own food; multiplayer uses the relay's.
    pub fn start_game(&mut self, food: Option<Coordinate>) {
        let food = match self.mode {
            GameMode::Single => Some(place_food(&mut self.rng, self.config.grid_size)),
            GameMode::Multi => food,
        };

        self.state = GameState::fresh(food);
        info!("Starting {} game", self.mode);
        self.set_status(GameStatus::InProgress);
    }

    fn kickoff(&mut self) {
        if let Some(food) = self.awaiting_kickoff.take() {
            self.start_game(Some(food));
        }
    }

    /// Applies a status transition and its side effects
    ///
    /// Re-entering the current status does nothing.
    pub fn set_status(&mut self, status: GameStatus) {
        if status == self.status {
            return;
        }

        debug!("Status {} -> {}", self.status.label(), status.label());
        self.status = status;

        match status {
            GameStatus::InProgress => {
                self.scheduler.start(self.config.refresh_interval());
                self.message = "Game in progress".to_string();
            }
            GameStatus::Paused => {
                self.scheduler.cancel();
                self.message = "Paused".to_string();
            }
            GameStatus::Pending => {
                self.scheduler.cancel();
                self.message = "Waiting for the relay to confirm...".to_string();
            }
            GameStatus::Finished => {
                self.scheduler.cancel();
                self.message = "Game over".to_string();
                if self.mode == GameMode::Single {
                    self.results.record(GameResult {
                        player_id: self.sync.player_id().clone(),
                        score: self.state.score,
                        mode: self.mode,
                    });
                }
            }
            GameStatus::NotStarted => {
                self.scheduler.cancel();
                self.message = "Press space to start".to_string();
            }
        }
    }

    /// Advances the local snake by one cell
    pub fn tick(&mut self) {
        if self.status != GameStatus::InProgress {
            return;
        }

        if self.state.food.is_none() {
            self.state.food = self.sync.take_pending_food();
        }

        let outcome = tick(
            &self.state.snake,
            self.state.direction,
            self.state.food,
            self.config.grid_size,
        );

        if outcome.collided {
            info!("Collision at score {}", self.state.score);
            match self.mode {
                GameMode::Single => self.set_status(GameStatus::Finished),
                GameMode::Multi => {
                    self.sync.report_death();
                    self.set_status(GameStatus::Pending);
                }
            }
            return;
        }

        self.state.snake = outcome.snake;

        if outcome.food_eaten {
            self.state.score += 1;
            let next_food = place_food(&mut self.rng, self.config.grid_size);
            match self.mode {
                GameMode::Single => self.state.food = Some(next_food),
                GameMode::Multi => {
                    self.state.food = None;
                    self.sync.announce_food(next_food, self.state.score);
                }
            }
        }

        if self.mode == GameMode::Multi {
            self.sync.publish_position(&self.state.snake);
        }
    }

    pub fn handle_relay(&mut self, packet: Packet) {
        let Some(inbound) = self.sync.interpret(packet) else {
            return;
        };

        match inbound {
            Inbound::Start { food } => {
                info!("Opponent found, starting in {}ms", START_DELAY_MS);
                self.message = "Opponent found, get ready!".to_string();
                self.awaiting_kickoff = Some(food);
                self.scheduler.defer(Duration::from_millis(START_DELAY_MS));
            }
            Inbound::OpponentPosition(body) => self.opponent.snake = body,
            Inbound::OpponentScore(score) => self.opponent.score = score,
            Inbound::Food(food) => self.state.food = Some(food),
            Inbound::GameOver => {
                info!("Relay reported game over");
                self.awaiting_kickoff = None;
                self.set_status(GameStatus::Finished);
                self.sync.disconnect();
            }
            Inbound::Refused(reason) => {
                warn!("Relay refused to pair: {}", reason);
                self.message = reason;
                self.sync.drop_link();
            }
        }
    }

    /// Stops ticking and leaves the relay; safe to call more than once
    pub fn shutdown(&mut self) {
        self.scheduler.cancel();
        self.awaiting_kickoff = None;
        if self.mode == GameMode::Multi && self.sync.is_connected() {
            self.sync.disconnect();
        }
    }
}

impl<S: Scheduler> Drop for Game<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::ChannelConnector;
    use shared::StatusUpdate;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tokio::sync::mpsc;

    /// Records scheduler calls instead of spawning timers
    #[derive(Default)]
    struct ManualScheduler {
        running: bool,
        generation: u64,
        starts: usize,
        cancels: usize,
        deferred: Vec<Duration>,
    }

    impl Scheduler for ManualScheduler {
        fn start(&mut self, _interval: Duration) {
            self.running = true;
            self.generation += 1;
            self.starts += 1;
        }

        fn cancel(&mut self) {
            if self.running {
                self.running = false;
                self.generation += 1;
                self.cancels += 1;
            }
        }

        fn is_running(&self) -> bool {
            self.running
        }

        fn generation(&self) -> u64 {
            self.generation
        }

        fn defer(&mut self, delay: Duration) {
            self.deferred.push(delay);
        }
    }

    #[derive(Clone, Default)]
    struct RecordingStore {
        results: Rc<RefCell<Vec<GameResult>>>,
    }

    impl ResultStore for RecordingStore {
        fn record(&self, result: GameResult) {
            self.results.borrow_mut().push(result);
        }
    }

    struct Harness {
        game: Game<ManualScheduler>,
        relay: mpsc::UnboundedReceiver<Packet>,
        store: RecordingStore,
    }

    impl Harness {
        fn new(mode: GameMode) -> Self {
            let (tx, relay) = mpsc::unbounded_channel();
            let sync = Synchronizer::new(
                PlayerId::from("me"),
                Box::new(ChannelConnector { outbound: tx }),
            );
            let store = RecordingStore::default();
            let mut game = Game::new(
                GameConfig::new(200, 20),
                mode,
                ManualScheduler::default(),
                sync,
                Box::new(store.clone()),
            );
            game.rng = StdRng::seed_from_u64(3);
            Self { game, relay, store }
        }

        fn sent(&mut self) -> Vec<Packet> {
            let mut packets = Vec::new();
            while let Ok(packet) = self.relay.try_recv() {
                packets.push(packet);
            }
            packets
        }

        /// Joins and receives a start signal, as if paired with "them"
        fn start_multi(&mut self, food: Coordinate) {
            self.game.toggle();
            self.game.handle_relay(Packet::StartGame { food });
            self.game.handle_event(ClientEvent::Kickoff);
            self.sent();
        }
    }

    fn them(update: StatusUpdate) -> Packet {
        Packet::GameStatus {
            player_id: PlayerId::from("them"),
            update,
        }
    }

    #[test]
    fn test_start_resets_everything_and_ticks() {
        let mut h = Harness::new(GameMode::Single);
        h.game.toggle();

        assert_eq!(h.game.status(), GameStatus::InProgress);
        assert!(h.game.scheduler().is_running());
        assert_eq!(h.game.state().snake, Snake::starting());
        assert_eq!(h.game.state().direction, Direction::Right);
        assert_eq!(h.game.state().score, 0);
        assert!(h.game.state().food.is_some());
        assert_eq!(h.game.message(), "Game in progress");
    }

    #[test]
    fn test_eating_scores_and_grows() {
        let mut h = Harness::new(GameMode::Single);
        h.game.toggle();
        h.game.state.food = Some(Coordinate::new(2, 6));

        h.game.tick();

        assert_eq!(
            h.game.state().snake.segments(),
            &[
                Coordinate::new(2, 6),
                Coordinate::new(2, 5),
                Coordinate::new(2, 4)
            ]
        );
        assert_eq!(h.game.state().score, 1);
        assert!(h.game.state().food.is_some());
    }

    #[test]
    fn test_score_resets_on_restart() {
        let mut h = Harness::new(GameMode::Single);
        h.game.toggle();
        h.game.state.food = Some(Coordinate::new(2, 6));
        h.game.tick();
        assert_eq!(h.game.state().score, 1);

        h.game.set_status(GameStatus::Finished);
        h.game.toggle();
        assert_eq!(h.game.state().score, 0);
        assert_eq!(h.game.state().snake.len(), 2);
    }

    #[test]
    fn test_wall_collision_finishes_and_records_result() {
        let mut h = Harness::new(GameMode::Single);
        h.game.toggle();
        h.game.state.snake = Snake::new(vec![Coordinate::new(0, 0), Coordinate::new(0, 1)]);
        h.game.state.direction = Direction::Up;
        h.game.state.score = 4;

        h.game.tick();

        assert_eq!(h.game.status(), GameStatus::Finished);
        assert!(!h.game.scheduler().is_running());
        assert_eq!(
            *h.store.results.borrow(),
            vec![GameResult {
                player_id: PlayerId::from("me"),
                score: 4,
                mode: GameMode::Single,
            }]
        );
    }

    #[test]
    fn test_finished_side_effects_fire_once() {
        let mut h = Harness::new(GameMode::Single);
        h.game.toggle();
        h.game.set_status(GameStatus::Finished);
        h.game.set_status(GameStatus::Finished);

        assert_eq!(h.store.results.borrow().len(), 1);
        assert_eq!(h.game.scheduler().cancels, 1);
    }

    #[test]
    fn test_pause_and_resume_keep_progress() {
        let mut h = Harness::new(GameMode::Single);
        h.game.toggle();
        h.game.state.food = Some(Coordinate::new(2, 6));
        h.game.tick();

        h.game.toggle();
        assert_eq!(h.game.status(), GameStatus::Paused);
        assert!(!h.game.scheduler().is_running());

        let before = h.game.state().clone();
        h.game.tick();
        assert_eq!(*h.game.state(), before);

        h.game.toggle();
        assert_eq!(h.game.status(), GameStatus::InProgress);
        assert!(h.game.scheduler().is_running());
        assert_eq!(h.game.state().score, 1);
        assert_eq!(h.game.state().snake, before.snake);
        assert_eq!(h.game.scheduler().starts, 2);
    }

    #[test]
    fn test_reversal_is_ignored() {
        let mut h = Harness::new(GameMode::Single);
        h.game.toggle();
        h.game.turn(Direction::Left);
        assert_eq!(h.game.state().direction, Direction::Right);

        h.game.turn(Direction::Down);
        assert_eq!(h.game.state().direction, Direction::Down);
    }

    #[test]
    fn test_stale_ticks_are_dropped() {
        let mut h = Harness::new(GameMode::Single);
        h.game.toggle();
        let stale = h.game.scheduler().generation();
        h.game.toggle();
        h.game.toggle();

        let before = h.game.state().clone();
        h.game.handle_event(ClientEvent::Tick { generation: stale });
        assert_eq!(*h.game.state(), before);

        let live = h.game.scheduler().generation();
        h.game.handle_event(ClientEvent::Tick { generation: live });
        assert_ne!(h.game.state().snake, before.snake);
    }

    #[test]
    fn test_space_is_ignored_in_multiplayer() {
        let mut h = Harness::new(GameMode::Multi);
        h.game.handle_intent(Intent::TogglePlay);
        assert!(!h.game.is_connected());

        h.game.handle_intent(Intent::PlayButton);
        assert!(h.game.is_connected());
        assert_eq!(h.game.message(), "Waiting for an opponent...");
    }

    #[test]
    fn test_mode_switch_only_when_idle() {
        let mut h = Harness::new(GameMode::Single);
        h.game.toggle_mode();
        assert_eq!(h.game.mode(), GameMode::Multi);
        h.game.toggle_mode();

        h.game.toggle();
        h.game.toggle_mode();
        assert_eq!(h.game.mode(), GameMode::Single);

        h.game.toggle();
        h.game.toggle_mode();
        assert_eq!(h.game.mode(), GameMode::Single);
    }

    #[test]
    fn test_join_handshake_then_delayed_start() {
        let mut h = Harness::new(GameMode::Multi);
        h.game.toggle();

        assert_eq!(
            h.sent(),
            vec![Packet::JoinGame {
                player_id: PlayerId::from("me"),
                client_version: shared::PROTOCOL_VERSION,
            }]
        );
        assert_eq!(h.game.status(), GameStatus::NotStarted);

        h.game.handle_relay(Packet::StartGame {
            food: Coordinate::new(9, 9),
        });
        assert_eq!(h.game.status(), GameStatus::NotStarted);
        assert_eq!(
            h.game.scheduler().deferred,
            vec![Duration::from_millis(START_DELAY_MS)]
        );

        h.game.handle_event(ClientEvent::Kickoff);
        assert_eq!(h.game.status(), GameStatus::InProgress);
        assert_eq!(h.game.state().food, Some(Coordinate::new(9, 9)));

        h.game.handle_event(ClientEvent::Kickoff);
        assert_eq!(h.game.scheduler().starts, 1);
    }

    #[test]
    fn test_multiplayer_tick_publishes_position() {
        let mut h = Harness::new(GameMode::Multi);
        h.start_multi(Coordinate::new(9, 9));

        h.game.tick();

        assert_eq!(
            h.sent(),
            vec![Packet::GameStatus {
                player_id: PlayerId::from("me"),
                update: StatusUpdate::Position(vec![
                    Coordinate::new(2, 6),
                    Coordinate::new(2, 5)
                ]),
            }]
        );
    }

    #[test]
    fn test_multiplayer_eating_hands_over_food_authority() {
        let mut h = Harness::new(GameMode::Multi);
        h.start_multi(Coordinate::new(2, 6));

        h.game.tick();

        assert_eq!(h.game.state().score, 1);
        assert_eq!(h.game.state().food, None);

        let sent = h.sent();
        let kinds: Vec<_> = sent
            .iter()
            .filter_map(|packet| match packet {
                Packet::GameStatus { player_id, update } => {
                    assert_eq!(player_id, &PlayerId::from("me"));
                    Some(update.kind())
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                shared::UpdateKind::Food,
                shared::UpdateKind::Score,
                shared::UpdateKind::Position
            ]
        );

        let announced = match &sent[0] {
            Packet::GameStatus {
                update: StatusUpdate::Food(Some(food)),
                ..
            } => *food,
            other => panic!("Expected a food update, got {:?}", other),
        };

        h.game.tick();
        if announced == Coordinate::new(2, 7) {
            // Drawn straight into the path, so it was eaten on arrival
            assert_eq!(h.game.state().score, 2);
        } else {
            assert_eq!(h.game.state().food, Some(announced));
        }
    }

    #[test]
    fn test_opponent_updates_touch_only_opponent_state() {
        let mut h = Harness::new(GameMode::Multi);
        h.start_multi(Coordinate::new(9, 9));
        let local = h.game.state().clone();

        h.game
            .handle_relay(them(StatusUpdate::Position(vec![Coordinate::new(10, 10)])));
        h.game.handle_relay(them(StatusUpdate::Score(5)));

        assert_eq!(h.game.opponent().snake, vec![Coordinate::new(10, 10)]);
        assert_eq!(h.game.opponent().score, 5);
        assert_eq!(*h.game.state(), local);
    }

    #[test]
    fn test_own_echo_is_ignored() {
        let mut h = Harness::new(GameMode::Multi);
        h.start_multi(Coordinate::new(9, 9));

        h.game.handle_relay(Packet::GameStatus {
            player_id: PlayerId::from("me"),
            update: StatusUpdate::Position(vec![Coordinate::new(10, 10)]),
        });

        assert!(h.game.opponent().snake.is_empty());
    }

    #[test]
    fn test_opponent_food_replaces_local_food() {
        let mut h = Harness::new(GameMode::Multi);
        h.start_multi(Coordinate::new(9, 9));

        h.game
            .handle_relay(them(StatusUpdate::Food(Some(Coordinate::new(1, 1)))));
        assert_eq!(h.game.state().food, Some(Coordinate::new(1, 1)));
    }

    #[test]
    fn test_multiplayer_death_reports_once_and_waits() {
        let mut h = Harness::new(GameMode::Multi);
        h.start_multi(Coordinate::new(9, 9));
        h.game.state.direction = Direction::Up;
        h.game.state.snake = Snake::new(vec![Coordinate::new(0, 5), Coordinate::new(1, 5)]);

        h.game.tick();
        h.game.tick();

        assert_eq!(h.game.status(), GameStatus::Pending);
        assert!(!h.game.scheduler().is_running());
        assert_eq!(
            h.sent(),
            vec![Packet::PlayerDead {
                player_id: PlayerId::from("me"),
            }]
        );
        assert!(h.store.results.borrow().is_empty());
    }

    #[test]
    fn test_game_over_finishes_and_disconnects() {
        let mut h = Harness::new(GameMode::Multi);
        h.start_multi(Coordinate::new(9, 9));

        h.game.handle_relay(Packet::GameOver);

        assert_eq!(h.game.status(), GameStatus::Finished);
        assert!(!h.game.scheduler().is_running());
        assert!(!h.game.is_connected());
        assert_eq!(h.sent(), vec![Packet::Disconnect]);
        assert!(h.store.results.borrow().is_empty());
    }

    #[test]
    fn test_refusal_drops_link_without_disconnect() {
        let mut h = Harness::new(GameMode::Multi);
        h.game.toggle();
        h.sent();

        h.game.handle_relay(Packet::Disconnected {
            reason: "Relay session full".to_string(),
        });

        assert!(!h.game.is_connected());
        assert_eq!(h.game.message(), "Relay session full");
        assert!(h.sent().is_empty());
    }

    #[test]
    fn test_shutdown_disconnects_in_multiplayer() {
        let mut h = Harness::new(GameMode::Multi);
        h.start_multi(Coordinate::new(9, 9));

        h.game.shutdown();
        h.game.shutdown();

        assert!(!h.game.scheduler().is_running());
        assert_eq!(h.sent(), vec![Packet::Disconnect]);
    }

    #[test]
    fn test_drop_disconnects() {
        let mut h = Harness::new(GameMode::Multi);
        h.start_multi(Coordinate::new(9, 9));

        let Harness { game, mut relay, .. } = h;
        drop(game);

        assert_eq!(relay.try_recv().unwrap(), Packet::Disconnect);
    }
}

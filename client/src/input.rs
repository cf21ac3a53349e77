//! Keyboard input mapping

use log::debug;
use macroquad::input::{get_keys_pressed, KeyCode};
use shared::Direction;

/// What a key press asks the game to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Turn(Direction),
    /// Space bar; only honoured in single-player
    TogglePlay,
    /// The on-screen play control, available in both modes
    PlayButton,
    ToggleMode,
    Quit,
}

/// Maps a key to an intent, dropping turns that would reverse the snake
pub fn map_key(key: KeyCode, current: Direction) -> Option<Intent> {
    let wanted = match key {
        KeyCode::Left => Direction::Left,
        KeyCode::Up => Direction::Up,
        KeyCode::Right => Direction::Right,
        KeyCode::Down => Direction::Down,
        KeyCode::Space => return Some(Intent::TogglePlay),
        KeyCode::Enter => return Some(Intent::PlayButton),
        KeyCode::M => return Some(Intent::ToggleMode),
        KeyCode::Escape => return Some(Intent::Quit),
        _ => return None,
    };

    if current.is_opposite(wanted) {
        None
    } else {
        Some(Intent::Turn(wanted))
    }
}

/// Maps several keys pressed in one frame
///
/// Each accepted turn becomes the reference for the next key, the same way the
/// pending direction is updated between ticks.
pub fn map_keys(keys: impl IntoIterator<Item = KeyCode>, mut current: Direction) -> Vec<Intent> {
    let mut intents = Vec::new();
    for key in keys {
        if let Some(intent) = map_key(key, current) {
            if let Intent::Turn(direction) = intent {
                current = direction;
            }
            intents.push(intent);
        }
    }
    intents
}

/// Samples macroquad's keyboard state once per frame
#[derive(Debug, Default)]
pub struct InputManager {
    presses: u64,
}

impl InputManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, current: Direction) -> Vec<Intent> {
        let keys = get_keys_pressed();
        if keys.is_empty() {
            return Vec::new();
        }

        self.presses += keys.len() as u64;
        let intents = map_keys(keys, current);
        debug!("Frame input {:?} (total presses {})", intents, self.presses);
        intents
    }
}

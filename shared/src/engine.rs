//! Movement engine, collision detector and food generator
//!
//! These are pure functions shared by every client so that both peers of a
//! multiplayer game advance their snakes with identical rules.

use crate::grid::{Coordinate, Direction, Snake};
use rand::Rng;

/// Result of advancing a snake by one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    /// The advanced snake, or the untouched input snake when `collided` is set
    pub snake: Snake,
    pub food_eaten: bool,
    pub collided: bool,
}

/// Checks a candidate head against the walls and the snake body
///
/// `body_excluding_head` is the pre-move body from index 1 onward, old tail
/// included.
pub fn has_collision(head: Coordinate, body_excluding_head: &[Coordinate], bound_size: i32) -> bool {
    if !head.in_bounds(bound_size) {
        return true;
    }

    body_excluding_head.contains(&head)
}

/// Draws a food cell uniformly over the grid
///
/// There is no occupancy check against the snake: food may land on a body
/// segment.
pub fn place_food<R: Rng + ?Sized>(rng: &mut R, bound_size: i32) -> Coordinate {
    let row = rng.gen_range(0..bound_size);
    let col = rng.gen_range(0..bound_size);
    Coordinate::new(row, col)
}

/// Advances `snake` one cell in `direction`
///
/// Collision is evaluated against the body before the tail is popped, so
/// moving into the cell the tail is about to vacate counts as a collision.
pub fn tick(
    snake: &Snake,
    direction: Direction,
    food: Option<Coordinate>,
    bound_size: i32,
) -> TickOutcome {
    let candidate = snake.head().step(direction);

    if has_collision(candidate, snake.body_excluding_head(), bound_size) {
        return TickOutcome {
            snake: snake.clone(),
            food_eaten: false,
            collided: true,
        };
    }

    let food_eaten = food == Some(candidate);
    let mut next = snake.clone();
    next.advance(candidate, food_eaten);

    TickOutcome {
        snake: next,
        food_eaten,
        collided: false,
    }
}

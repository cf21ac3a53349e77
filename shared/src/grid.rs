//! Grid model: coordinates, directions and the snake body

use serde::{Deserialize, Serialize};

/// A cell on the square grid, addressed by row and column
///
/// Values outside `[0, grid_size)` are representable on purpose: the movement
/// engine produces them as candidate heads and the collision detector rejects
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub row: i32,
    pub col: i32,
}

impl Coordinate {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Returns the neighbouring cell one step in `direction`
    pub fn step(&self, direction: Direction) -> Self {
        let (d_row, d_col) = direction.delta();
        Self {
            row: self.row + d_row,
            col: self.col + d_col,
        }
    }

    /// Returns true if the cell lies inside a `bound_size` x `bound_size` grid
    pub fn in_bounds(&self, bound_size: i32) -> bool {
        self.row >= 0 && self.row < bound_size && self.col >= 0 && self.col < bound_size
    }
}

/// Heading of a snake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Returns true if turning from `self` to `other` would reverse the snake
    pub fn is_opposite(&self, other: Direction) -> bool {
        matches!(
            (self, other),
            (Direction::Up, Direction::Down)
                | (Direction::Down, Direction::Up)
                | (Direction::Left, Direction::Right)
                | (Direction::Right, Direction::Left)
        )
    }

    /// Row and column offsets for one step
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

/// Ordered snake body, head first and tail last
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snake {
    body: Vec<Coordinate>,
}

impl Snake {
    /// Creates a snake from explicit segments, head first
    ///
    /// An empty body is not a valid snake; callers always pass at least a head.
    pub fn new(body: Vec<Coordinate>) -> Self {
        debug_assert!(!body.is_empty(), "a snake needs at least a head");
        Self { body }
    }

    /// The two-segment snake every game starts with, heading right
    pub fn starting() -> Self {
        Self::new(vec![Coordinate::new(2, 5), Coordinate::new(2, 4)])
    }

    pub fn head(&self) -> Coordinate {
        self.body[0]
    }

    /// Segments from index 1 onward, i.e. everything except the head
    pub fn body_excluding_head(&self) -> &[Coordinate] {
        &self.body[1..]
    }

    pub fn segments(&self) -> &[Coordinate] {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn contains(&self, cell: Coordinate) -> bool {
        self.body.contains(&cell)
    }

    /// Prepends `head` and drops the tail unless the snake is growing
    pub(crate) fn advance(&mut self, head: Coordinate, grow: bool) {
        if !grow {
            self.body.pop();
        }
        self.body.insert(0, head);
    }

    pub fn into_segments(self) -> Vec<Coordinate> {
        self.body
    }
}

impl From<Vec<Coordinate>> for Snake {
    fn from(body: Vec<Coordinate>) -> Self {
        Self::new(body)
    }
}

use serde::{Deserialize, Serialize};

use super::action::Direction;

/// A cell on the game grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Move position by delta
    pub fn moved_by(&self, d_row: i32, d_col: i32) -> Self {
        Self {
            row: self.row + d_row,
            col: self.col + d_col,
        }
    }

    /// Move position in a direction
    pub fn moved_in_direction(&self, direction: Direction) -> Self {
        let (d_row, d_col) = direction.delta();
        self.moved_by(d_row, d_col)
    }

    /// Manhattan distance to another position
    pub fn manhattan(&self, other: Position) -> u32 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

/// The snake in the game
#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    /// Body segments, with head at index 0. Never empty.
    body: Vec<Position>,
}

impl Snake {
    /// Create a single-segment snake
    pub fn new(head: Position) -> Self {
        Self { body: vec![head] }
    }

    /// Create a snake from explicit segments, head first
    ///
    /// Returns `None` for an empty body.
    pub fn from_segments(body: Vec<Position>) -> Option<Self> {
        if body.is_empty() {
            None
        } else {
            Some(Self { body })
        }
    }

    /// Get the head position
    pub fn head(&self) -> Position {
        self.body[0]
    }

    /// Segment directly behind the head, if any
    pub fn neck(&self) -> Option<Position> {
        self.body.get(1).copied()
    }

    /// All segments, head first
    pub fn segments(&self) -> &[Position] {
        &self.body
    }

    /// Get body segments (excluding head)
    pub fn body_segments(&self) -> &[Position] {
        &self.body[1..]
    }

    /// Check if position collides with snake body (excluding head)
    pub fn collides_with_body(&self, pos: Position) -> bool {
        self.body_segments().contains(&pos)
    }

    /// Check if any segment, head included, occupies the position
    pub fn occupies(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }

    /// Put a new head in front of the current one
    pub(crate) fn push_head(&mut self, head: Position) {
        self.body.insert(0, head);
    }

    /// Drop the last segment, keeping at least the head
    pub(crate) fn pop_tail(&mut self) {
        if self.body.len() > 1 {
            self.body.pop();
        }
    }

    /// Get the length of the snake
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Mutable state of one episode of the grid world
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub snake: Snake,
    pub apple: Position,
    /// Apples eaten this episode
    pub apples: u32,
    /// Moves applied this episode
    pub steps: u32,
    /// Manhattan distance to the apple after the last plain move
    pub previous_distance: Option<u32>,
}

impl GameState {
    /// Create a new game state
    pub fn new(snake: Snake, apple: Position) -> Self {
        Self {
            snake,
            apple,
            apples: 0,
            steps: 0,
            previous_distance: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_movement() {
        let pos = Position::new(5, 5);
        assert_eq!(pos.moved_in_direction(Direction::Up), Position::new(4, 5));
        assert_eq!(pos.moved_in_direction(Direction::Down), Position::new(6, 5));
        assert_eq!(pos.moved_in_direction(Direction::Left), Position::new(5, 4));
        assert_eq!(pos.moved_in_direction(Direction::Right), Position::new(5, 6));
    }

    #[test]
    fn test_manhattan() {
        let a = Position::new(4, 4);
        assert_eq!(a.manhattan(Position::new(7, 7)), 6);
        assert_eq!(a.manhattan(Position::new(4, 4)), 0);
        assert_eq!(a.manhattan(Position::new(-1, 4)), 5);
    }

    #[test]
    fn test_snake_segments() {
        let snake = Snake::from_segments(vec![
            Position::new(5, 5),
            Position::new(5, 4),
            Position::new(5, 3),
        ])
        .unwrap();

        assert_eq!(snake.len(), 3);
        assert_eq!(snake.head(), Position::new(5, 5));
        assert_eq!(snake.neck(), Some(Position::new(5, 4)));
        assert!(!snake.collides_with_body(Position::new(5, 5))); // head
        assert!(snake.collides_with_body(Position::new(5, 3))); // body
        assert!(snake.occupies(Position::new(5, 5)));
    }

    #[test]
    fn test_empty_snake_rejected() {
        assert!(Snake::from_segments(Vec::new()).is_none());
    }

    #[test]
    fn test_pop_tail_keeps_head() {
        let mut snake = Snake::new(Position::new(1, 1));
        snake.pop_tail();
        assert_eq!(snake.len(), 1);

        snake.push_head(Position::new(1, 2));
        snake.pop_tail();
        assert_eq!(snake.segments(), &[Position::new(1, 2)]);
    }
}

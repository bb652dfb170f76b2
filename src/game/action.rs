/// Direction the snake can move
///
/// The discriminant order is the action index used by the Q-network output:
/// 0 = Up, 1 = Down, 2 = Left, 3 = Right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Number of discrete actions
pub const NUM_ACTIONS: usize = 4;

impl Direction {
    /// All directions in action-index order
    pub const ALL: [Direction; NUM_ACTIONS] =
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Returns the delta (d_row, d_col) for moving in this direction
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    /// Action index of this direction
    pub fn index(&self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

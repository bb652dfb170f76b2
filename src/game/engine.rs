use super::{
    action::Direction,
    config::GameConfig,
    state::{GameState, Position, Snake},
};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// What happened during a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEvent {
    /// Plain move, tail followed the head
    Moved,
    /// Head landed on the apple and the snake grew
    AteApple,
    /// Move rejected because it would reverse into the neck
    Reversed,
    /// Head left the grid
    HitWall,
    /// Head ran into its own body
    HitSelf,
}

/// Result of a game step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepResult {
    /// Reward for this step
    pub reward: i32,
    /// Whether the reward ends the episode
    pub terminated: bool,
    pub event: StepEvent,
}

/// Snake-on-a-grid simulation
///
/// Owns the snake, the apple and the RNG used to respawn apples. A fatal step
/// leaves the state exactly as the failed move produced it; callers decide
/// when to [`reset`](GridWorld::reset).
pub struct GridWorld {
    config: GameConfig,
    state: GameState,
    rng: StdRng,
}

impl GridWorld {
    /// Create a new grid world in its reset state
    ///
    /// `seed` fixes apple placement; `None` draws entropy from the OS.
    pub fn new(config: GameConfig, seed: Option<u64>) -> Self {
        let state = Self::initial_state(&config);
        Self::with_state(config, state, seed)
    }

    /// Create a grid world from an explicit state
    pub fn with_state(config: GameConfig, state: GameState, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self { config, state, rng }
    }

    fn initial_state(config: &GameConfig) -> GameState {
        GameState::new(Snake::new(config.start_head), config.start_apple)
    }

    /// Reset the game to its fixed start position
    pub fn reset(&mut self) {
        self.state = Self::initial_state(&self.config);
    }

    /// Apply one move and return the shaped reward
    pub fn apply(&mut self, direction: Direction) -> StepResult {
        let rewards = self.config.rewards;
        let candidate = self.state.snake.head().moved_in_direction(direction);

        if self.config.reverse_guard && self.state.snake.neck() == Some(candidate) {
            return self.finish(rewards.reverse, StepEvent::Reversed);
        }

        self.state.steps += 1;
        self.state.snake.push_head(candidate);

        if !self.is_in_bounds(candidate) {
            return self.finish(rewards.wall, StepEvent::HitWall);
        }

        if self.state.snake.collides_with_body(candidate) {
            return self.finish(rewards.self_collision, StepEvent::HitSelf);
        }

        if candidate == self.state.apple {
            self.state.apples += 1;
            self.respawn_apple();
            return self.finish(rewards.food, StepEvent::AteApple);
        }

        self.state.snake.pop_tail();

        let distance = candidate.manhattan(self.state.apple);
        let reward = match self.state.previous_distance {
            Some(previous) if self.state.snake.len() == 1 => {
                if distance > previous {
                    rewards.farther
                } else {
                    rewards.closer
                }
            }
            _ => rewards.idle,
        };
        self.state.previous_distance = Some(distance);

        self.finish(reward, StepEvent::Moved)
    }

    fn finish(&self, reward: i32, event: StepEvent) -> StepResult {
        StepResult {
            reward,
            terminated: self.config.rewards.is_fatal(reward),
            event,
        }
    }

    /// Move the apple to a uniformly random free cell
    ///
    /// Leaves the apple in place when the snake covers the whole grid.
    fn respawn_apple(&mut self) {
        let n = self.config.grid_size;
        let in_grid = self
            .state
            .snake
            .segments()
            .iter()
            .filter(|pos| self.is_in_bounds(**pos))
            .count();
        if in_grid >= n * n {
            return;
        }

        loop {
            let row = self.rng.gen_range(0..n) as i32;
            let col = self.rng.gen_range(0..n) as i32;
            let pos = Position::new(row, col);

            if !self.state.snake.occupies(pos) {
                self.state.apple = pos;
                return;
            }
        }
    }

    /// Check if a position is within the grid bounds
    pub fn is_in_bounds(&self, pos: Position) -> bool {
        let n = self.config.grid_size as i32;
        pos.row >= 0 && pos.row < n && pos.col >= 0 && pos.col < n
    }

    /// True if stepping onto `pos` would end the episode
    pub fn is_danger(&self, pos: Position) -> bool {
        !self.is_in_bounds(pos) || self.state.snake.collides_with_body(pos)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn snake(&self) -> &Snake {
        &self.state.snake
    }

    pub fn apple(&self) -> Position {
        self.state.apple
    }

    pub fn apples(&self) -> u32 {
        self.state.apples
    }
}

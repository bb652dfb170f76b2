use serde::{Deserialize, Serialize};

use super::state::Position;

/// Reward values returned by the grid world
///
/// Every value strictly below [`RewardTable::fatal_threshold`] ends the episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardTable {
    /// Rejected move straight back into the neck
    pub reverse: i32,
    /// Head left the grid
    pub wall: i32,
    /// Head ran into its own body
    pub self_collision: i32,
    /// Apple eaten
    pub food: i32,
    /// Length-1 snake moved closer to the apple (or kept its distance)
    pub closer: i32,
    /// Length-1 snake moved away from the apple
    pub farther: i32,
    /// Any other move
    pub idle: i32,
    /// Rewards strictly below this value are terminal
    pub fatal_threshold: i32,
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            reverse: -50,
            wall: -10,
            self_collision: -5,
            food: 15,
            closer: 1,
            farther: -1,
            idle: 0,
            fatal_threshold: -1,
        }
    }
}

impl RewardTable {
    /// Older reward table that folds wall and self collision into one value
    pub fn unified() -> Self {
        Self {
            wall: -25,
            self_collision: -25,
            food: 25,
            ..Self::default()
        }
    }

    pub fn is_fatal(&self, reward: i32) -> bool {
        reward < self.fatal_threshold
    }
}

/// Configuration for the game
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Side length of the square grid
    pub grid_size: usize,
    /// Head position after every reset
    pub start_head: Position,
    /// Apple position after every reset
    pub start_apple: Position,
    /// Reject moves that would put the head onto the second segment
    pub reverse_guard: bool,
    /// Reward values
    pub rewards: RewardTable,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: 10,
            start_head: Position::new(4, 4),
            start_apple: Position::new(7, 7),
            reverse_guard: true,
            rewards: RewardTable::default(),
        }
    }
}

impl GameConfig {
    /// Create a new configuration with a custom grid size
    ///
    /// Start positions keep their default coordinates and must fit the grid.
    pub fn new(grid_size: usize) -> Self {
        Self {
            grid_size,
            ..Default::default()
        }
    }

    /// The single-reward variant without the reverse guard
    pub fn unified() -> Self {
        Self {
            reverse_guard: false,
            rewards: RewardTable::unified(),
            ..Default::default()
        }
    }

    fn contains(&self, pos: Position) -> bool {
        let n = self.grid_size as i32;
        (0..n).contains(&pos.row) && (0..n).contains(&pos.col)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.grid_size < 2 {
            return Err(format!("grid_size must be at least 2, got {}", self.grid_size));
        }

        if !self.contains(self.start_head) {
            return Err(format!(
                "start_head {:?} is outside a {}x{} grid",
                self.start_head, self.grid_size, self.grid_size
            ));
        }

        if !self.contains(self.start_apple) {
            return Err(format!(
                "start_apple {:?} is outside a {}x{} grid",
                self.start_apple, self.grid_size, self.grid_size
            ));
        }

        if self.start_head == self.start_apple {
            return Err("start_head and start_apple must differ".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.grid_size, 10);
        assert_eq!(config.start_head, Position::new(4, 4));
        assert_eq!(config.start_apple, Position::new(7, 7));
        assert!(config.reverse_guard);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fatal_threshold() {
        let rewards = RewardTable::default();
        assert!(rewards.is_fatal(rewards.reverse));
        assert!(rewards.is_fatal(rewards.wall));
        assert!(rewards.is_fatal(rewards.self_collision));
        assert!(!rewards.is_fatal(rewards.farther));
        assert!(!rewards.is_fatal(rewards.idle));
        assert!(!rewards.is_fatal(rewards.food));
    }

    #[test]
    fn test_unified_preset() {
        let config = GameConfig::unified();
        assert!(!config.reverse_guard);
        assert_eq!(config.rewards.wall, -25);
        assert_eq!(config.rewards.self_collision, -25);
        assert_eq!(config.rewards.food, 25);
        assert!(config.rewards.is_fatal(-25));
    }

    #[test]
    fn test_validation_rejects_small_grid() {
        let config = GameConfig::new(4);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_overlapping_start() {
        let mut config = GameConfig::default();
        config.start_apple = config.start_head;
        assert!(config.validate().is_err());
    }
}

//! Q-learning hyperparameter configuration

use serde::{Deserialize, Serialize};

use super::encoder::FeatureLayout;

/// Configuration for the online Q-learning loop
///
/// Defaults reproduce the reference training setup: a 9-wide feature vector,
/// two hidden layers of 512 units, five fit epochs per tick and no replay.
///
/// # Example
///
/// ```rust
/// use snake_dqn::rl::DqnConfig;
///
/// let config = DqnConfig {
///     learning_rate: 1e-3,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DqnConfig {
    /// Learning rate for the Adam optimizer
    ///
    /// Default: 1e-4
    pub learning_rate: f64,

    /// Discount factor applied to the best next-state Q-value
    ///
    /// Default: 0.9
    pub gamma: f32,

    /// Optimizer epochs spent on each observed transition
    ///
    /// Default: 5
    pub fit_epochs: usize,

    /// Exploration rate of episode 0
    ///
    /// Default: 0.3
    pub exploration_start: f64,

    /// Linear decrease of the exploration rate per episode
    ///
    /// The rate is never clamped: once it drops below zero the random branch
    /// simply stops firing.
    ///
    /// Default: 0.0001
    pub exploration_decay: f64,

    /// Every N-th episode plays greedily, is paced and ends with a checkpoint
    ///
    /// Default: 100
    pub evaluation_interval: usize,

    /// Width of each hidden layer
    ///
    /// Default: 512
    pub hidden_dim: usize,

    /// Feature vector layout shared by encoder and network
    pub feature_layout: FeatureLayout,

    /// Capacity of the replay memory
    ///
    /// Default: 10_000
    pub replay_capacity: usize,

    /// Transitions replayed after each online fit; 0 disables replay
    ///
    /// Default: 0
    pub replay_batch_size: usize,

    /// End an episode without a fatal reward after this many ticks; 0 never does
    ///
    /// A greedy policy can circle forever without eating or dying, which
    /// would stall the run inside one evaluation episode.
    ///
    /// Default: 0
    pub max_episode_ticks: u32,
}

impl DqnConfig {
    /// Whether transitions are stored and replayed
    pub fn replay_enabled(&self) -> bool {
        self.replay_batch_size > 0
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.learning_rate <= 0.0 {
            return Err(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            ));
        }

        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(format!("gamma must be in [0, 1], got {}", self.gamma));
        }

        if self.fit_epochs == 0 {
            return Err("fit_epochs must be at least 1".to_string());
        }

        if self.exploration_decay < 0.0 {
            return Err(format!(
                "exploration_decay must be non-negative, got {}",
                self.exploration_decay
            ));
        }

        if self.evaluation_interval == 0 {
            return Err("evaluation_interval must be at least 1".to_string());
        }

        if self.hidden_dim == 0 {
            return Err("hidden_dim must be at least 1".to_string());
        }

        if self.replay_enabled() && self.replay_batch_size > self.replay_capacity {
            return Err(format!(
                "replay_batch_size ({}) cannot exceed replay_capacity ({})",
                self.replay_batch_size, self.replay_capacity
            ));
        }

        Ok(())
    }
}

impl Default for DqnConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-4,
            gamma: 0.9,
            fit_epochs: 5,
            exploration_start: 0.3,
            exploration_decay: 0.0001,
            evaluation_interval: 100,
            hidden_dim: 512,
            feature_layout: FeatureLayout::WithMotion,
            replay_capacity: 10_000,
            replay_batch_size: 0,
            max_episode_ticks: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DqnConfig::default();
        assert_eq!(config.learning_rate, 1e-4);
        assert_eq!(config.gamma, 0.9);
        assert_eq!(config.fit_epochs, 5);
        assert_eq!(config.exploration_start, 0.3);
        assert_eq!(config.exploration_decay, 0.0001);
        assert_eq!(config.evaluation_interval, 100);
        assert_eq!(config.hidden_dim, 512);
        assert_eq!(config.feature_layout, FeatureLayout::WithMotion);
        assert!(!config.replay_enabled());
        assert_eq!(config.max_episode_ticks, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_negative_learning_rate() {
        let mut config = DqnConfig::default();
        config.learning_rate = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_gamma_out_of_range() {
        let mut config = DqnConfig::default();
        config.gamma = 1.5;
        assert!(config.validate().is_err());

        config.gamma = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_epochs() {
        let mut config = DqnConfig::default();
        config.fit_epochs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_interval() {
        let mut config = DqnConfig::default();
        config.evaluation_interval = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_replay_batch_exceeds_capacity() {
        let mut config = DqnConfig::default();
        config.replay_capacity = 8;
        config.replay_batch_size = 16;
        assert!(config.validate().is_err());

        config.replay_batch_size = 8;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DqnConfig =
            serde_json::from_str(r#"{ "gamma": 0.8, "feature_layout": "Compact" }"#).unwrap();
        assert_eq!(config.gamma, 0.8);
        assert_eq!(config.feature_layout, FeatureLayout::Compact);
        assert_eq!(config.fit_epochs, 5);
    }
}

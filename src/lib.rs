//! Snake DQN - online deep Q-learning on a snake grid
//!
//! This library provides:
//! - The grid world: movement, collisions, apples and shaped rewards (game module)
//! - Feature encoding, epsilon-greedy exploration, the Q-network and the
//!   per-tick trainer (rl module)
//! - Tick telemetry and rolling training statistics (metrics module)
//! - A plain-text board and a ratatui view (render module)
//! - Train and watch execution modes (modes module)

pub mod config;
pub mod game;
pub mod metrics;
pub mod modes;
pub mod render;
pub mod rl;

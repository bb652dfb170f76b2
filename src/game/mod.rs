//! Core game logic module for Snake
//!
//! This module contains all the game logic without any I/O or rendering dependencies.
//! Game over is reported through reward values, never through errors.

pub mod action;
pub mod config;
pub mod engine;
pub mod state;

// Re-export commonly used types
pub use action::{Direction, NUM_ACTIONS};
pub use config::{GameConfig, RewardTable};
pub use engine::{GridWorld, StepEvent, StepResult};
pub use state::{GameState, Position, Snake};

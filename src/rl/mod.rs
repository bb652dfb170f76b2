//! Online deep Q-learning for the grid world
//!
//! Provides:
//! - Feature encoding of game states (compact and motion layouts)
//! - Epsilon-greedy exploration with periodic greedy evaluation episodes
//! - An MLP Q-network and a burn-backed approximator
//! - The per-tick trainer and model persistence

pub mod approximator;
pub mod backend;
pub mod config;
pub mod encoder;
pub mod exploration;
pub mod network;
pub mod persistence;
pub mod replay;
pub mod trainer;

pub use approximator::{BurnQFunction, FitStats, QFunction, QValues};
pub use backend::{InferenceBackend, TrainingBackend, default_device};
pub use config::DqnConfig;
pub use encoder::{FeatureLayout, FeatureVector, StateEncoder};
pub use exploration::{EpsilonGreedy, Selection, argmax};
pub use network::{QNetwork, QNetworkConfig};
pub use persistence::{ModelMetadata, load_model, metadata_path, save_model};
pub use replay::{ReplayMemory, Transition};
pub use trainer::{TickOutcome, Trainer, td_target};

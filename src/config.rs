//! Optional JSON run configuration
//!
//! Every field may be omitted; missing values take their defaults. Command
//! line flags are applied on top of the loaded file.
//!
//! ```json
//! {
//!   "game": { "grid_size": 12 },
//!   "dqn": { "learning_rate": 0.0005, "replay_batch_size": 32 }
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::game::GameConfig;
use crate::rl::DqnConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub game: GameConfig,
    pub dqn: DqnConfig,
}

impl RunConfig {
    /// Read a run configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config file {:?}", path))
    }
}

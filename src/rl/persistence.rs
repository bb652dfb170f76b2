//! Model persistence for saving and loading Q-networks
//!
//! Weights go through Burn's record system; the configuration needed to
//! rebuild the network is written next to them as JSON.

use super::{BurnQFunction, DqnConfig, QNetwork, QNetworkConfig};
use anyhow::{Context, Result};
use burn::{
    module::Module,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
    tensor::backend::AutodiffBackend,
    tensor::backend::Backend,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Metadata saved with the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Shape of the saved network
    pub network_config: QNetworkConfig,

    /// Training configuration in effect when the model was saved
    pub dqn_config: DqnConfig,

    /// Completed episodes
    pub episodes_trained: usize,

    /// Fit calls performed by this process
    pub fits: usize,

    /// Best apple count reached so far
    pub best_apples: u32,

    /// Version identifier for compatibility checking
    pub version: String,
}

impl ModelMetadata {
    pub fn new(
        network_config: QNetworkConfig,
        dqn_config: DqnConfig,
        episodes_trained: usize,
        fits: usize,
        best_apples: u32,
    ) -> Self {
        Self {
            network_config,
            dqn_config,
            episodes_trained,
            fits,
            best_apples,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Path of the metadata file belonging to a model path
pub fn metadata_path(path: &Path) -> PathBuf {
    path.with_extension("meta.json")
}

/// Save a Q-function and its metadata
///
/// Writes `<path>.mpk` (Burn record) and `<path>.meta.json`, creating parent
/// directories as needed.
pub fn save_model<B: AutodiffBackend>(
    q_function: &BurnQFunction<B>,
    metadata: &ModelMetadata,
    path: &Path,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    let record = q_function.network().clone().into_record();
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    recorder
        .record(record, path.to_path_buf())
        .context("Failed to save network weights")?;

    let meta_path = metadata_path(path);
    let meta_json =
        serde_json::to_string_pretty(metadata).context("Failed to serialize metadata")?;
    std::fs::write(&meta_path, meta_json)
        .with_context(|| format!("Failed to write metadata to {:?}", meta_path))?;

    Ok(())
}

/// Load a network saved by [`save_model`]
///
/// Returns `Ok(None)` when no model has been saved at `path` yet.
pub fn load_model<B: Backend>(
    path: &Path,
    device: &B::Device,
) -> Result<Option<(QNetwork<B>, ModelMetadata)>> {
    let meta_path = metadata_path(path);
    if !meta_path.exists() {
        return Ok(None);
    }

    let meta_json = std::fs::read_to_string(&meta_path)
        .with_context(|| format!("Failed to read metadata from {:?}", meta_path))?;
    let metadata: ModelMetadata =
        serde_json::from_str(&meta_json).context("Failed to deserialize metadata")?;

    let network = metadata.network_config.init::<B>(device);
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    let record = recorder
        .load(path.to_path_buf(), device)
        .with_context(|| format!("Failed to load network weights from {:?}", path))?;

    Ok(Some((network.load_record(record), metadata)))
}

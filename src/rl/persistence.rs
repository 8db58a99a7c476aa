//! Model persistence for saving and loading trained agents
//!
//! Checkpoints use Burn's Record system. Each checkpoint is two files:
//! - `<path>` - network weights (named MessagePack record format)
//! - `<path>.meta.json` - training metadata as JSON

use anyhow::{Context, Result};
use burn::{
    module::Module,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
    tensor::backend::Backend,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Metadata saved next to the network weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Algorithm that produced the checkpoint ("dqn", "ppo", "a3c")
    pub algorithm: String,

    /// Number of episodes trained
    pub episodes_trained: usize,

    /// Crate version that wrote the checkpoint, for compatibility checking
    pub version: String,
}

impl ModelMetadata {
    pub fn new(algorithm: &str, episodes_trained: usize) -> Self {
        Self {
            algorithm: algorithm.to_string(),
            episodes_trained,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Save a network and its metadata to `path`
///
/// Creates parent directories if they don't exist.
pub fn save_module<B: Backend, M: Module<B>>(
    module: M,
    metadata: &ModelMetadata,
    path: &Path,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
    }

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    recorder
        .record(module.into_record(), path.to_path_buf())
        .context("Failed to save network weights")?;

    let meta_path = path.with_extension("meta.json");
    let meta_json =
        serde_json::to_string_pretty(metadata).context("Failed to serialize metadata")?;
    std::fs::write(&meta_path, meta_json)
        .with_context(|| format!("Failed to write metadata to {:?}", meta_path))?;

    Ok(())
}

/// Load weights from `path` into a freshly initialized module
pub fn load_module<B: Backend, M: Module<B>>(
    module: M,
    path: &Path,
    device: &B::Device,
) -> Result<(M, ModelMetadata)> {
    let meta_path = path.with_extension("meta.json");
    let meta_json = std::fs::read_to_string(&meta_path)
        .with_context(|| format!("Failed to read metadata from {:?}", meta_path))?;
    let metadata: ModelMetadata =
        serde_json::from_str(&meta_json).context("Failed to deserialize metadata")?;

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    let record = recorder
        .load(path.to_path_buf(), device)
        .with_context(|| format!("Failed to load network weights from {:?}", path))?;

    Ok((module.load_record(record), metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rl::{default_device, QNetworkConfig, TrainingBackend};
    use burn::tensor::Tensor;
    use tempfile::TempDir;

    #[test]
    fn test_metadata_round_trip() {
        let metadata = ModelMetadata::new("dqn", 250);
        let json = serde_json::to_string(&metadata).unwrap();
        let parsed: ModelMetadata = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.algorithm, "dqn");
        assert_eq!(parsed.episodes_trained, 250);
        assert_eq!(parsed.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_save_load_preserves_weights() {
        let device = default_device();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.mpk");

        let network = QNetworkConfig::new().init::<TrainingBackend>(&device);
        let input = Tensor::ones([1, 11], &device);
        let expected = network.forward(input.clone()).into_data();

        let metadata = ModelMetadata::new("dqn", 42);
        save_module(network, &metadata, &path).unwrap();

        let fresh = QNetworkConfig::new().init::<TrainingBackend>(&device);
        let (loaded, meta) = load_module(fresh, &path, &device).unwrap();

        assert_eq!(meta.episodes_trained, 42);
        let actual = loaded.forward(input).into_data();
        let expected = expected.as_slice::<f32>().unwrap();
        let actual = actual.as_slice::<f32>().unwrap();
        for (e, a) in expected.iter().zip(actual) {
            assert!((e - a).abs() < 1e-6, "weights diverged: {} vs {}", e, a);
        }
    }

    #[test]
    fn test_load_missing_file_fails() {
        let device = default_device();
        let network = QNetworkConfig::new().init::<TrainingBackend>(&device);
        let result = load_module(network, Path::new("/nonexistent/model.mpk"), &device);
        assert!(result.is_err());
    }
}

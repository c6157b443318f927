//! Engine configuration
//!
//! Construction-time configuration plus generic YAML load/save helpers so
//! hosts can persist their settings alongside ours.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::{DEFAULT_SAMPLE_RATE, MAX_BLOCK_SAMPLES, MAX_DELAY_MS, NUM_VOICES};

/// Construction-time engine configuration
///
/// Everything here is fixed for the lifetime of the engine; all buffers are
/// sized from these values once, at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Host sample rate in Hz
    pub sample_rate: u32,
    /// Number of pitch-shifted voices
    pub num_voices: usize,
    /// Largest block the host will ever pass in one call
    pub max_block_samples: usize,
    /// Largest per-voice delay the delay rings are sized for
    pub max_delay_ms: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            num_voices: NUM_VOICES,
            max_block_samples: MAX_BLOCK_SAMPLES,
            max_delay_ms: MAX_DELAY_MS,
        }
    }
}

impl EngineConfig {
    /// Default configuration at the given sample rate
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    /// Maximum delay expressed in samples at the configured rate
    pub fn max_delay_samples(&self) -> usize {
        (self.max_delay_ms as f64 * self.sample_rate as f64 / 1000.0).round() as usize
    }
}

/// Load configuration from a YAML file
///
/// If the file doesn't exist, returns default config.
/// If the file exists but is invalid, logs a warning and returns default config.
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        log::info!("load_config: {:?} doesn't exist, using defaults", path);
        return T::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<T>(&contents) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("load_config: failed to parse config: {}, using defaults", e);
                T::default()
            }
        },
        Err(e) => {
            log::warn!("load_config: failed to read config file: {}, using defaults", e);
            T::default()
        }
    }
}

/// Save configuration to a YAML file
///
/// Creates parent directories if they don't exist.
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    Ok(())
}

//! Game configuration loaded from JSON.
//!
//! Every field has a default, so a config file only needs to name what it
//! overrides. [`GameConfig::load`] reads a JSON file; failures surface as
//! [`ConfigError`] instead of a panic.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::jitter::DEFAULT_JITTER_LIMIT;
use crate::stage::StageConfig;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file was not valid JSON for [`GameConfig`].
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// WindowConfig
// ---------------------------------------------------------------------------

/// Window parameters for the app runner.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// OS window title.
    pub title: String,
    /// Initial width in physical pixels.
    pub width: u32,
    /// Initial height in physical pixels.
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "skitter".to_owned(),
            width: 800,
            height: 600,
        }
    }
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Top-level game configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Fixed time step in seconds per frame.
    pub fixed_dt: f32,
    /// Gravity vector in m/s².
    pub gravity: [f32; 2],
    /// Window parameters.
    pub window: WindowConfig,
    /// Background clear color, straight RGBA.
    pub background: [f32; 4],
    /// Per-axis bound of the hostile jitter impulse.
    pub jitter_limit: f32,
    /// Base RNG seed for reproducible runs. Entropy-seeded when unset.
    pub seed: Option<u64>,
    /// Draw the physics wireframe overlay.
    pub debug_physics: bool,
}

impl Default for GameConfig {
    /// 60 Hz, zero gravity, 800x600 window, near-black background, default
    /// jitter, entropy seeding.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            gravity: [0.0, 0.0],
            window: WindowConfig::default(),
            background: [0.05, 0.05, 0.1, 1.0],
            jitter_limit: DEFAULT_JITTER_LIMIT,
            seed: None,
            debug_physics: false,
        }
    }
}

impl GameConfig {
    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// The stage-loop slice of this configuration.
    pub fn stage_config(&self) -> StageConfig {
        StageConfig {
            fixed_dt: self.fixed_dt,
            gravity: self.gravity,
            jitter_limit: self.jitter_limit,
            seed: self.seed,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

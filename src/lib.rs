//! Asciiscape - ASCII-art particle animation engine
//!
//! Turns a compiled-in piece of ASCII art into a field of animated glyph
//! particles and drives them with one of twelve themed effects:
//! - A single shared scheduler runs every per-frame task
//! - Effects are pluggable strategies over a shared per-frame context
//! - A Vim-style modal keyboard layer switches modes and themes
//! - The active theme survives restarts

pub mod device;
pub mod effects;
pub mod listeners;
pub mod particles;
pub mod scheduler;
pub mod surface;
pub mod system;
pub mod theme;
pub mod timing;
pub mod tui;
pub mod vim;

pub use effects::{EffectKind, EffectSystem};
pub use particles::{Particle, ParticleSystem};
pub use scheduler::AnimationScheduler;
pub use system::AsciiAnimationSystem;
pub use vim::{Mode, VimSystem};

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Configuration for the animation engine
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed for per-particle phases. `None` draws one from the OS.
    pub seed: Option<u64>,

    /// Fixed frame rate, overriding the device-tier choice
    pub fps: Option<u32>,

    /// How long the first key of a two-key sequence stays pending
    pub sequence_timeout_ms: u64,

    /// Minimum gap between handled pointer moves
    pub pointer_throttle_ms: u64,

    /// Quiet period before a resize is applied
    pub resize_debounce_ms: u64,

    /// Length of the theme transition marker
    pub transition_ms: u64,

    /// Where the active theme is persisted
    pub state_file: Option<PathBuf>,

    /// Whether to draw the mode/theme status line
    pub show_status: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: None,
            fps: None,
            sequence_timeout_ms: 500,
            pointer_throttle_ms: 16,
            resize_debounce_ms: 150,
            transition_ms: 300,
            state_file: None,
            show_status: true,
        }
    }
}

impl Config {
    /// Load from a TOML file. A missing file yields the defaults; a file that
    /// exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// `<config dir>/asciiscape/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("asciiscape").join("config.toml"))
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = Some(fps);
        self
    }

    pub fn with_state_file(mut self, path: PathBuf) -> Self {
        self.state_file = Some(path);
        self
    }

    pub fn with_show_status(mut self, show: bool) -> Self {
        self.show_status = show;
        self
    }

    pub fn sequence_timeout(&self) -> Duration {
        Duration::from_millis(self.sequence_timeout_ms)
    }

    pub fn pointer_throttle(&self) -> Duration {
        Duration::from_millis(self.pointer_throttle_ms)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }
}

/// Result type for Asciiscape operations
pub type Result<T> = std::result::Result<T, AsciiscapeError>;

/// Errors that can occur in Asciiscape
#[derive(Debug, thiserror::Error)]
pub enum AsciiscapeError {
    #[error("Canvas unavailable: {0}")]
    CanvasUnavailable(String),

    #[error("Failed to register listener: {0}")]
    Listener(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}

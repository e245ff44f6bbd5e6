//! Sky Glider - gameplay core of an endless side-scroller
//!
//! Core modules:
//! - `sim`: Deterministic simulation (actions, contacts, spawning, game state)
//! - `config`: Data-driven screen geometry and tuning
//! - `persistence`: Best-score key-value store
//! - `audio`: Fire-and-forget sound cues

pub mod audio;
pub mod config;
pub mod error;
pub mod persistence;
pub mod sim;

pub use config::{GameConfig, ItemConfig, TileConfig};
pub use error::{AudioError, ConfigError, StoreError};

/// Simulation constants
pub mod consts {
    /// Fixed simulation timestep used by the native runner (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Slack when comparing accumulated f32 clocks against durations
    pub const TIME_EPSILON: f32 = 1e-4;
    /// Distance within which a resting body still counts as touching
    pub const CONTACT_SLOP: f32 = 0.5;
}

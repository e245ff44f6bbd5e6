//! Error types
//!
//! Nothing here is fatal to a running scene: configuration errors are
//! reported before a scene exists, everything else is logged and absorbed.

use thiserror::Error;

/// Rejected game configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("screen size must be positive, got {width}x{height}")]
    InvalidScreen { width: f32, height: f32 },

    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },

    #[error("slit ratio {ratio} leaves no room for walls (must be in (0, 1))")]
    InvalidSlit { ratio: f32 },

    #[error("cannot read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Best-score store failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store contents are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Audio backend failure
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio backend unavailable: {0}")]
    Unavailable(String),
}

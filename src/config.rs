//! Game configuration
//!
//! Screen geometry and tuning values. The two shipped variants differ in
//! slit height and whether collectibles spawn, so both are data here.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Scrolling background tile (ground or cloud strip)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileConfig {
    /// Texture size in pixels
    pub size: Vec2,
    /// Seconds to scroll one tile width
    pub scroll_time: f32,
}

/// Collectible spawning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemConfig {
    /// Seconds between item spawns
    pub period: f32,
    /// Delay before the first item, so items never line up with the first wall pair
    pub initial_delay: f32,
    /// Item body size
    pub size: Vec2,
    /// Seconds to cross the screen
    pub travel_time: f32,
    /// Trigger body position relative to the visible body
    #[serde(default)]
    pub trigger_offset: Vec2,
}

impl Default for ItemConfig {
    fn default() -> Self {
        Self {
            period: 2.0,
            initial_delay: 1.0,
            size: Vec2::new(40.0, 40.0),
            travel_time: 4.0,
            trigger_offset: Vec2::ZERO,
        }
    }
}

/// Full scene configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Screen width and height
    pub screen: Vec2,

    // === Player ===
    /// Vertical acceleration (px/s², negative is down)
    pub gravity: f32,
    /// Upward velocity set by a tap
    pub flap_impulse: f32,
    pub player_radius: f32,
    /// Spawn point as fractions of the screen size
    pub player_start: Vec2,
    /// Seconds per flap frame
    pub flap_frame_interval: f32,
    /// Seconds the death roll lasts before the player freezes
    pub death_roll_duration: f32,
    /// Roll angle = PI * y * factor
    pub death_roll_factor: f32,

    // === Obstacles ===
    pub wall_size: Vec2,
    /// Gap between walls as a fraction of screen height
    pub slit_ratio: f32,
    /// Seconds between wall pairs
    pub obstacle_period: f32,
    /// Seconds for a wall pair to cross the screen
    pub obstacle_travel_time: f32,
    /// Horizontal distance from the wall pair to its score zone
    pub score_zone_offset: f32,

    // === Items ===
    #[serde(default)]
    pub items: Option<ItemConfig>,

    // === Background ===
    pub ground_tile: TileConfig,
    pub cloud_tile: TileConfig,

    /// Store key for the persisted best score
    pub best_score_key: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::baseline(400.0, 800.0)
    }
}

impl GameConfig {
    /// Wall pairs only, narrow slit
    pub fn baseline(width: f32, height: f32) -> Self {
        let wall_size = Vec2::new(60.0, 400.0);
        let player_radius = 15.0;
        Self {
            screen: Vec2::new(width, height),
            gravity: -600.0,
            flap_impulse: 400.0,
            player_radius,
            player_start: Vec2::new(0.2, 0.7),
            flap_frame_interval: 0.2,
            death_roll_duration: 1.0,
            death_roll_factor: 0.01,
            wall_size,
            slit_ratio: 1.0 / 6.0,
            obstacle_period: 2.0,
            obstacle_travel_time: 4.0,
            score_zone_offset: wall_size.x + player_radius,
            items: None,
            ground_tile: TileConfig {
                size: Vec2::new(336.0, 112.0),
                scroll_time: 5.0,
            },
            cloud_tile: TileConfig {
                size: Vec2::new(336.0, 100.0),
                scroll_time: 20.0,
            },
            best_score_key: "BEST".to_string(),
        }
    }

    /// Collectibles enabled, wider slit
    pub fn with_items(width: f32, height: f32) -> Self {
        Self {
            slit_ratio: 1.0 / 3.0,
            items: Some(ItemConfig::default()),
            ..Self::baseline(width, height)
        }
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> String {
        // Plain data with string keys, serialization cannot fail
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Reject geometry and timings the simulation cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.screen.x > 0.0 && self.screen.y > 0.0) {
            return Err(ConfigError::InvalidScreen {
                width: self.screen.x,
                height: self.screen.y,
            });
        }
        if !(self.slit_ratio > 0.0 && self.slit_ratio < 1.0) {
            return Err(ConfigError::InvalidSlit {
                ratio: self.slit_ratio,
            });
        }

        let mut positive = vec![
            ("player_radius", self.player_radius),
            ("flap_frame_interval", self.flap_frame_interval),
            ("death_roll_duration", self.death_roll_duration),
            ("wall_size.x", self.wall_size.x),
            ("wall_size.y", self.wall_size.y),
            ("obstacle_period", self.obstacle_period),
            ("obstacle_travel_time", self.obstacle_travel_time),
            ("ground_tile.size.x", self.ground_tile.size.x),
            ("ground_tile.scroll_time", self.ground_tile.scroll_time),
            ("cloud_tile.size.x", self.cloud_tile.size.x),
            ("cloud_tile.scroll_time", self.cloud_tile.scroll_time),
        ];
        if let Some(items) = &self.items {
            positive.extend([
                ("items.period", items.period),
                ("items.size.x", items.size.x),
                ("items.size.y", items.size.y),
                ("items.travel_time", items.travel_time),
            ]);
            if items.initial_delay < 0.0 {
                return Err(ConfigError::NonPositive {
                    name: "items.initial_delay",
                    value: items.initial_delay,
                });
            }
        }
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        Ok(())
    }

    pub fn slit_height(&self) -> f32 {
        self.screen.y * self.slit_ratio
    }

    /// Vertical randomization band for the lower wall
    pub fn wall_jitter_range(&self) -> f32 {
        self.screen.y / 4.0
    }

    pub fn player_spawn(&self) -> Vec2 {
        self.screen * self.player_start
    }

    pub fn items_enabled(&self) -> bool {
        self.items.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants_differ_in_slit() {
        let base = GameConfig::baseline(400.0, 800.0);
        let items = GameConfig::with_items(400.0, 800.0);
        assert!((base.slit_height() - 800.0 / 6.0).abs() < 1e-3);
        assert!((items.slit_height() - 800.0 / 3.0).abs() < 1e-3);
        assert!(!base.items_enabled());
        assert!(items.items_enabled());
    }

    #[test]
    fn test_json_round_trip() {
        let config = GameConfig::with_items(320.0, 640.0);
        let parsed = GameConfig::from_json(&config.to_json()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validate_rejects_bad_screen() {
        let config = GameConfig::baseline(0.0, 800.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidScreen { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_period() {
        let mut config = GameConfig::default();
        config.obstacle_period = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive {
                name: "obstacle_period",
                ..
            })
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            GameConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("sky_glider_no_such_config.json");
        assert!(matches!(
            GameConfig::from_file(&path),
            Err(ConfigError::Read(_))
        ));
    }

    #[test]
    fn test_player_spawn() {
        let config = GameConfig::baseline(400.0, 800.0);
        let spawn = config.player_spawn();
        assert!((spawn.x - 80.0).abs() < 1e-3);
        assert!((spawn.y - 560.0).abs() < 1e-3);
    }
}

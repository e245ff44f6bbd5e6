//! Sound cues
//!
//! Playback itself belongs to the host. The game only fires cues and must
//! keep running when no backend could be created.

use crate::error::AudioError;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// Collectible picked up
    ItemPickup,
}

/// Host-side playback
pub trait AudioBackend {
    /// Fire-and-forget
    fn play_once(&mut self, effect: SoundEffect);
}

/// Audio manager for the game
pub struct AudioManager {
    backend: Option<Box<dyn AudioBackend>>,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::silent()
    }
}

impl std::fmt::Debug for AudioManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioManager")
            .field("enabled", &self.backend.is_some())
            .field("muted", &self.muted)
            .finish()
    }
}

impl AudioManager {
    /// Wrap the result of backend initialisation. Failure disables audio.
    pub fn new(backend: Result<Box<dyn AudioBackend>, AudioError>) -> Self {
        let backend = match backend {
            Ok(backend) => Some(backend),
            Err(e) => {
                log::warn!("{} - audio disabled", e);
                None
            }
        };
        Self {
            backend,
            muted: false,
        }
    }

    /// No backend at all
    pub fn silent() -> Self {
        Self {
            backend: None,
            muted: false,
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn play(&mut self, effect: SoundEffect) {
        if self.muted {
            return;
        }
        if let Some(backend) = self.backend.as_mut() {
            backend.play_once(effect);
        }
    }
}

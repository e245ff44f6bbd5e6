//! Game state and scene setup
//!
//! The scene graph:
//!
//! ```text
//! root
//! ├── scroll        (speed = world running flag)
//! │   ├── clouds, ground tiles
//! │   ├── obstacle layer  (runs the wall generator)
//! │   │   └── wall pairs
//! │   └── item layer      (runs the item generator, item variant only)
//! │       └── item groups
//! └── player        (own speed flag, keeps falling while the world is frozen)
//! ```

use std::collections::VecDeque;
use std::rc::Rc;

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;

use super::contact::{ContactEvent, ContactTracker};
use super::player;
use super::score::ScoreLedger;
use super::spawn;
use super::world::{Entity, EntityId, EntityKind, World};
use crate::audio::AudioManager;
use crate::config::GameConfig;
use crate::error::ConfigError;
use crate::persistence::ScoreStore;

/// Derived from the two speed flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// World scrolling, player alive
    Running,
    /// World frozen, death roll still playing
    Dying,
    /// Everything frozen, a tap restarts
    GameOver,
}

/// Things that happened, in order, for the host to react to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    ObstacleSpawned { id: EntityId, time: f64 },
    ItemSpawned { id: EntityId, time: f64 },
    Flap { time: f64 },
    Scored { score: u32 },
    NewBest { best: u32 },
    ItemCollected { item_score: u32 },
    GameOver { time: f64, score: u32 },
    PlayerFrozen { time: f64 },
    Restarted { time: f64 },
    Marker { tag: u32, time: f64 },
}

/// Complete scene state
pub struct GameState {
    pub config: GameConfig,
    pub world: World,
    pub ledger: ScoreLedger,
    /// Simulated seconds since scene start, accumulated in f64 so long
    /// sessions do not drift
    pub time: f64,
    pub root: EntityId,
    /// Top-level scroll container
    pub scroll: EntityId,
    pub obstacle_layer: EntityId,
    pub item_layer: Option<EntityId>,
    pub player: EntityId,
    pub(crate) events: Vec<GameEvent>,
    pub(crate) pending_contacts: VecDeque<ContactEvent>,
    pub(crate) contacts: ContactTracker,
    pub(crate) rng: Box<dyn RngCore>,
    pub(crate) audio: AudioManager,
}

impl std::fmt::Debug for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameState")
            .field("time", &self.time)
            .field("phase", &self.phase())
            .field("ledger", &self.ledger)
            .field("entities", &self.world.len())
            .finish()
    }
}

impl GameState {
    /// New scene seeded with a PCG generator
    pub fn new(
        config: GameConfig,
        seed: u64,
        store: Box<dyn ScoreStore>,
    ) -> Result<Self, ConfigError> {
        log::info!("Scene seed: {}", seed);
        Self::with_rng(config, store, Box::new(Pcg32::seed_from_u64(seed)))
    }

    /// New scene drawing randomness from `rng`
    pub fn with_rng(
        config: GameConfig,
        store: Box<dyn ScoreStore>,
        rng: Box<dyn RngCore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut world = World::new();
        let root = world.spawn(Entity::new(EntityKind::Root), None);
        let scroll = world.spawn(Entity::new(EntityKind::ScrollLayer), Some(root));
        spawn::setup_clouds(&mut world, scroll, &config);
        spawn::setup_ground(&mut world, scroll, &config);

        let obstacle_layer = world.spawn(Entity::new(EntityKind::ObstacleLayer), Some(scroll));
        world.schedule(obstacle_layer, Rc::new(spawn::obstacle_generator(&config)));

        let item_layer = config.items.as_ref().map(|items| {
            let layer = world.spawn(Entity::new(EntityKind::ItemLayer), Some(scroll));
            world.schedule(layer, Rc::new(spawn::item_generator(items)));
            layer
        });

        let player = world.spawn(player::player_entity(&config), Some(root));
        world.schedule(player, Rc::new(player::flap_animation(&config)));

        let ledger = ScoreLedger::new(store, config.best_score_key.clone());
        log::info!(
            "Scene {}x{} ready ({}), best score {}",
            config.screen.x,
            config.screen.y,
            if item_layer.is_some() { "items" } else { "baseline" },
            ledger.best_score()
        );

        let mut state = Self {
            config,
            world,
            ledger,
            time: 0.0,
            root,
            scroll,
            obstacle_layer,
            item_layer,
            player,
            events: Vec::new(),
            pending_contacts: VecDeque::new(),
            contacts: ContactTracker::new(),
            rng,
            audio: AudioManager::silent(),
        };

        // Fire instantaneous leading actions at t = 0
        state.run_actions(0.0);
        Ok(state)
    }

    pub fn with_audio(mut self, audio: AudioManager) -> Self {
        self.audio = audio;
        self
    }

    pub fn phase(&self) -> GamePhase {
        let world_running = self.world_speed() != 0.0;
        let player_alive = self.player_speed() != 0.0;
        match (world_running, player_alive) {
            (false, true) => GamePhase::Dying,
            (false, false) => GamePhase::GameOver,
            (true, _) => GamePhase::Running,
        }
    }

    pub fn world_speed(&self) -> f32 {
        self.world.get(self.scroll).map_or(0.0, |e| e.speed)
    }

    pub fn player_speed(&self) -> f32 {
        self.world.get(self.player).map_or(0.0, |e| e.speed)
    }

    pub fn player_entity(&self) -> Option<&Entity> {
        self.world.get(self.player)
    }

    /// Live wall pairs
    pub fn obstacle_count(&self) -> usize {
        self.world.children(self.obstacle_layer).len()
    }

    /// Live item groups
    pub fn item_count(&self) -> usize {
        self.item_layer
            .map_or(0, |layer| self.world.children(layer).len())
    }

    /// Events since the last drain
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Queue a contact reported by an external physics step. It is
    /// classified during the next tick.
    pub fn push_contact(&mut self, contact: ContactEvent) {
        self.pending_contacts.push_back(contact);
    }
}

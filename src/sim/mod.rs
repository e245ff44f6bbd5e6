//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod action;
pub mod category;
pub mod contact;
pub mod player;
pub mod score;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod world;

pub use action::{Action, Command, ScheduledAction};
pub use category::{Category, Outcome, classify};
pub use contact::{ContactEvent, ContactTracker};
pub use score::ScoreLedger;
pub use state::{GameEvent, GamePhase, GameState};
pub use tick::{TickInput, tick};
pub use world::{Body, Entity, EntityId, EntityKind, Shape, Sprite, World};

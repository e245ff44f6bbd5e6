//! Simulation tick
//!
//! One tick, in order:
//! 1. Apply tap input
//! 2. Advance the clock and every running action program
//! 3. Integrate player gravity
//! 4. Detect new contacts and classify every queued contact
//! 5. Push the player out of whatever blocks it

use std::rc::Rc;

use super::action::Command;
use super::category::{self, GROUND, ITEM, Outcome};
use super::contact::{self, ContactEvent};
use super::player;
use super::spawn;
use super::state::{GameEvent, GamePhase, GameState};
use super::world::{EntityId, EntityKind};
use crate::audio::SoundEffect;

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Primary action (tap, click or key)
    pub tap: bool,
}

/// Advance the scene by `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.tap {
        state.tap();
    }

    state.time += f64::from(dt);
    state.run_actions(dt);
    state.step_player(dt);

    let began = state.contacts.detect(&state.world, state.player);
    state.pending_contacts.extend(began);
    state.process_contacts();

    if state.world.effective_speed(state.player) != 0.0 {
        contact::resolve_blocking(&mut state.world, state.player);
    }
}

impl GameState {
    /// Primary action: flap while running, restart once fully game over
    pub fn tap(&mut self) {
        match self.phase() {
            GamePhase::Running => {
                let impulse = self.config.flap_impulse;
                if let Some(body) = self.world.get_mut(self.player).and_then(|e| e.body.as_mut()) {
                    player::flap(body, impulse);
                    self.events.push(GameEvent::Flap { time: self.time });
                }
            }
            GamePhase::GameOver => {
                self.restart();
            }
            // Restart waits for the death roll to finish
            GamePhase::Dying => {}
        }
    }

    /// Reset scores, player and obstacles, then resume. Ignored unless the
    /// scene is fully game over.
    pub fn restart(&mut self) -> bool {
        if self.phase() != GamePhase::GameOver {
            return false;
        }

        self.ledger.reset();

        if let Some(entity) = self.world.get_mut(self.player) {
            player::reset(entity, &self.config);
        }
        let mut cleared = self.world.clear_children(self.obstacle_layer);
        if let Some(layer) = self.item_layer {
            cleared += self.world.clear_children(layer);
        }

        self.pending_contacts.clear();
        self.contacts.clear();
        self.world.set_speed(self.player, 1.0);
        self.world.set_speed(self.scroll, 1.0);

        log::info!("Restart at {:.2}s, cleared {} entities", self.time, cleared);
        self.events.push(GameEvent::Restarted { time: self.time });
        true
    }

    /// Advance action programs and execute the commands they emit
    pub(crate) fn run_actions(&mut self, dt: f32) {
        for (owner, command) in self.world.advance_actions(dt) {
            self.run_command(owner, command);
        }
    }

    fn run_command(&mut self, owner: EntityId, command: Command) {
        match command {
            Command::SpawnObstacle => {
                if !self.world.contains(owner) {
                    return;
                }
                let id = spawn::spawn_obstacle_pair(
                    &mut self.world,
                    owner,
                    &self.config,
                    self.rng.as_mut(),
                );
                self.events.push(GameEvent::ObstacleSpawned { id, time: self.time });
            }
            Command::SpawnItem => {
                let Some(items) = self.config.items else {
                    return;
                };
                if !self.world.contains(owner) {
                    return;
                }
                let id = spawn::spawn_item(
                    &mut self.world,
                    owner,
                    &self.config,
                    &items,
                    self.rng.as_mut(),
                );
                self.events.push(GameEvent::ItemSpawned { id, time: self.time });
            }
            Command::FreezeSelf => {
                self.world.set_speed(owner, 0.0);
                if owner == self.player {
                    log::debug!("Player frozen at {:.2}s", self.time);
                    self.events.push(GameEvent::PlayerFrozen { time: self.time });
                }
            }
            Command::Marker(tag) => {
                self.events.push(GameEvent::Marker { tag, time: self.time });
            }
        }
    }

    fn step_player(&mut self, dt: f32) {
        let speed = self.world.effective_speed(self.player);
        if speed == 0.0 {
            return;
        }
        let gravity = self.config.gravity;
        if let Some(entity) = self.world.get_mut(self.player) {
            player::integrate(entity, gravity, dt * speed);
        }
    }

    /// Classify this tick's contacts until the batch drains or the run ends.
    ///
    /// The batch is ordered score, item, fatal. A tick that scores never
    /// kills, so entering a score zone while touching the ground survives.
    fn process_contacts(&mut self) {
        let mut batch: Vec<ContactEvent> = self.pending_contacts.drain(..).collect();
        batch.sort_by_key(|c| category::classify(c.category_a, c.category_b));

        let mut scored = false;
        for contact in batch {
            if self.phase() != GamePhase::Running {
                return;
            }
            if self.handle_contact(contact, scored) == Some(Outcome::Score) {
                scored = true;
            }
        }
    }

    /// Apply one contact. Returns its outcome, `None` when it was dropped.
    fn handle_contact(&mut self, contact: ContactEvent, spare_player: bool) -> Option<Outcome> {
        if !self.world.contains(contact.body_a) || !self.world.contains(contact.body_b) {
            // A body was removed earlier this tick
            return None;
        }
        if (contact.category_a | contact.category_b) & category::KNOWN == 0 {
            log::debug!("Ignoring contact with no known category: {:?}", contact);
            return None;
        }

        let outcome = category::classify(contact.category_a, contact.category_b);
        match outcome {
            Outcome::Score => {
                let new_best = self.ledger.record_pass();
                let score = self.ledger.pass_score();
                self.events.push(GameEvent::Scored { score });
                if let Some(best) = new_best {
                    log::info!("New best score: {}", best);
                    self.events.push(GameEvent::NewBest { best });
                }
            }
            Outcome::Item => {
                let item = if contact.category_a & ITEM != 0 {
                    contact.body_a
                } else {
                    contact.body_b
                };
                self.collect_item(item);
            }
            Outcome::Fatal if spare_player => {
                log::debug!("Fatal contact in a scoring tick ignored: {:?}", contact);
            }
            Outcome::Fatal => self.game_over(),
        }
        Some(outcome)
    }

    /// Remove the touched collectible with its whole group
    fn collect_item(&mut self, body: EntityId) {
        let group = self
            .world
            .get(body)
            .and_then(|e| e.parent)
            .filter(|&p| {
                self.world
                    .get(p)
                    .is_some_and(|e| e.kind == EntityKind::ItemGroup)
            });
        self.world.destroy(group.unwrap_or(body));

        self.audio.play(SoundEffect::ItemPickup);
        let item_score = self.ledger.record_item();
        self.events.push(GameEvent::ItemCollected { item_score });
    }

    /// Freeze the world, let the player drop and roll, then freeze it too
    fn game_over(&mut self) {
        self.world.set_speed(self.scroll, 0.0);

        let y = self.world.world_position(self.player).map_or(0.0, |p| p.y);
        if let Some(body) = self.world.get_mut(self.player).and_then(|e| e.body.as_mut()) {
            body.collision_mask = GROUND;
        }
        self.world
            .schedule(self.player, Rc::new(player::death_roll(y, &self.config)));

        let score = self.ledger.pass_score();
        log::info!("Game over at {:.2}s, score {}", self.time, score);
        self.events.push(GameEvent::GameOver {
            time: self.time,
            score,
        });
    }
}

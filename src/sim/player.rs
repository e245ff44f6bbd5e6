//! Player entity: gravity, flap impulse, flap animation and death roll

use std::f32::consts::PI;

use glam::Vec2;

use super::action::{Action, Command};
use super::category::{GROUND, ITEM, OBSTACLE, PLAYER};
use super::world::{Body, Entity, EntityKind, Shape, Sprite};
use crate::config::GameConfig;

/// Categories that block the living player
pub fn full_collision_mask(config: &GameConfig) -> u32 {
    if config.items_enabled() {
        GROUND | OBSTACLE | ITEM
    } else {
        GROUND | OBSTACLE
    }
}

pub fn player_body(config: &GameConfig) -> Body {
    let mask = full_collision_mask(config);
    Body {
        shape: Shape::Circle {
            radius: config.player_radius,
        },
        category: PLAYER,
        collision_mask: mask,
        contact_mask: mask,
        dynamic: true,
        velocity: Vec2::ZERO,
    }
}

/// Player node at its spawn point
pub fn player_entity(config: &GameConfig) -> Entity {
    Entity::new(EntityKind::Player)
        .at(config.player_spawn())
        .with_sprite(Sprite::PlayerFlapA)
        .with_body(player_body(config))
}

/// Two-frame wing cycle, attached once and never removed
pub fn flap_animation(config: &GameConfig) -> Action {
    Action::repeat_forever(Action::animate_frames(
        [Sprite::PlayerFlapA, Sprite::PlayerFlapB],
        config.flap_frame_interval,
    ))
}

/// Roll proportional to the height of death, then freeze the player
pub fn death_roll(y: f32, config: &GameConfig) -> Action {
    Action::sequence([
        Action::rotate_by(PI * y * config.death_roll_factor, config.death_roll_duration),
        Action::run(Command::FreezeSelf),
    ])
}

/// Discard current motion, then kick upward
pub fn flap(body: &mut Body, impulse: f32) {
    body.velocity = Vec2::ZERO;
    body.velocity.y += impulse;
}

/// Semi-implicit Euler step under vertical gravity
pub fn integrate(entity: &mut Entity, gravity: f32, dt: f32) {
    let Some(body) = entity.body.as_mut() else {
        return;
    };
    if !body.dynamic {
        return;
    }
    body.velocity.y += gravity * dt;
    entity.pos += body.velocity * dt;
}

/// Back to the spawn point, at rest and fully collidable
pub fn reset(entity: &mut Entity, config: &GameConfig) {
    entity.pos = config.player_spawn();
    entity.rotation = 0.0;
    if let Some(body) = entity.body.as_mut() {
        body.velocity = Vec2::ZERO;
        body.collision_mask = full_collision_mask(config);
    }
}

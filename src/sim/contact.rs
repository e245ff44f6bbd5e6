//! Contact detection and blocking for the player circle
//!
//! Only the player is dynamic, so every interesting pair is the player
//! against one fixed rectangle. Detection reports begin-contacts only: an
//! overlap that did not exist on the previous tick.

use std::collections::BTreeSet;

use glam::Vec2;

use super::category::tests_contact;
use super::world::{Body, EntityId, Shape, World};
use crate::consts::CONTACT_SLOP;

/// A new contact between two bodies, as delivered by the physics step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactEvent {
    pub body_a: EntityId,
    pub category_a: u32,
    pub body_b: EntityId,
    pub category_b: u32,
}

/// Vector that moves the circle out of the rectangle, if they overlap
pub fn circle_rect_push(center: Vec2, radius: f32, rect_center: Vec2, rect_size: Vec2) -> Option<Vec2> {
    let half = rect_size * 0.5;
    let min = rect_center - half;
    let max = rect_center + half;
    let closest = center.clamp(min, max);
    let offset = center - closest;
    let dist_sq = offset.length_squared();

    if dist_sq > 0.0 {
        let dist = dist_sq.sqrt();
        if dist >= radius {
            return None;
        }
        return Some(offset / dist * (radius - dist));
    }

    // Center inside the rectangle: leave through the nearest face
    let to_min = center - min;
    let to_max = max - center;
    let exits = [
        (to_min.x, Vec2::NEG_X),
        (to_max.x, Vec2::X),
        (to_min.y, Vec2::NEG_Y),
        (to_max.y, Vec2::Y),
    ];
    exits
        .into_iter()
        .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(depth, normal)| normal * (depth + radius))
}

/// Overlap test with a little slack so resting contact stays "touching"
pub fn circle_rect_touching(center: Vec2, radius: f32, rect_center: Vec2, rect_size: Vec2) -> bool {
    circle_rect_push(center, radius + CONTACT_SLOP, rect_center, rect_size).is_some()
}

/// Fixed rectangles in screen space, with their bodies
fn fixed_rects(world: &World, skip: EntityId) -> Vec<(EntityId, Vec2, Vec2, Body)> {
    world
        .iter()
        .filter(|e| e.id != skip)
        .filter_map(|e| {
            let body = e.body?;
            let Shape::Rect { size } = body.shape else {
                return None;
            };
            let pos = world.world_position(e.id)?;
            Some((e.id, pos, size, body))
        })
        .collect()
}

/// Remembers which bodies touched the player last tick
#[derive(Debug, Clone, Default)]
pub struct ContactTracker {
    touching: BTreeSet<EntityId>,
}

impl ContactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.touching.clear();
    }

    pub fn is_touching(&self, id: EntityId) -> bool {
        self.touching.contains(&id)
    }

    /// Contacts between `player` and any body that began this tick
    pub fn detect(&mut self, world: &World, player: EntityId) -> Vec<ContactEvent> {
        let (Some(entity), Some(center)) = (world.get(player), world.world_position(player)) else {
            self.touching.clear();
            return Vec::new();
        };
        let Some(body) = entity.body else {
            self.touching.clear();
            return Vec::new();
        };
        let Shape::Circle { radius } = body.shape else {
            return Vec::new();
        };

        let mut now = BTreeSet::new();
        let mut began = Vec::new();
        for (id, rect_center, size, other) in fixed_rects(world, player) {
            if !tests_contact(body.category, body.contact_mask, other.category, other.contact_mask) {
                continue;
            }
            if !circle_rect_touching(center, radius, rect_center, size) {
                continue;
            }
            now.insert(id);
            if !self.touching.contains(&id) {
                began.push(ContactEvent {
                    body_a: player,
                    category_a: body.category,
                    body_b: id,
                    category_b: other.category,
                });
            }
        }
        self.touching = now;
        began
    }
}

/// Push the player out of every body in its collision mask and cancel the
/// velocity component heading into each surface.
pub fn resolve_blocking(world: &mut World, player: EntityId) {
    let Some(body) = world.get(player).and_then(|e| e.body) else {
        return;
    };
    let Shape::Circle { radius } = body.shape else {
        return;
    };
    let Some(mut center) = world.world_position(player) else {
        return;
    };

    let mut velocity = body.velocity;
    let mut total_push = Vec2::ZERO;
    for (_, rect_center, size, other) in fixed_rects(world, player) {
        if body.collision_mask & other.category == 0 {
            continue;
        }
        if let Some(push) = circle_rect_push(center, radius, rect_center, size) {
            center += push;
            total_push += push;
            let normal = push.normalize_or_zero();
            let into = velocity.dot(normal);
            if into < 0.0 {
                velocity -= normal * into;
            }
        }
    }

    if let Some(entity) = world.get_mut(player) {
        entity.pos += total_push;
        if let Some(body) = entity.body.as_mut() {
            body.velocity = velocity;
        }
    }
}

//! Procedural spawning: wall pairs, collectibles and scrolling background
//!
//! All randomness comes from the caller's generator so runs are reproducible.

use std::rc::Rc;

use glam::Vec2;
use rand::Rng;

use super::action::{Action, Command};
use super::category::{GROUND, ITEM, OBSTACLE, PLAYER, SCORE_ZONE};
use super::world::{Body, Entity, EntityId, EntityKind, Sprite, World};
use crate::config::{GameConfig, ItemConfig, TileConfig};

/// Spawn a wall pair now, then every period
pub fn obstacle_generator(config: &GameConfig) -> Action {
    Action::repeat_forever(Action::sequence([
        Action::run(Command::SpawnObstacle),
        Action::wait(config.obstacle_period),
    ]))
}

/// First item after the initial delay, then every period
pub fn item_generator(items: &ItemConfig) -> Action {
    Action::sequence([
        Action::wait(items.initial_delay),
        Action::repeat_forever(Action::sequence([
            Action::run(Command::SpawnItem),
            Action::wait(items.period),
        ])),
    ])
}

/// Slide left by `distance` over `duration`, then disappear
pub fn cross_and_remove(distance: f32, duration: f32) -> Action {
    Action::sequence([
        Action::move_by(Vec2::new(-distance, 0.0), duration),
        Action::remove_self(),
    ])
}

/// Scroll one tile width left, snap back, forever
pub fn scroll_loop(tile: &TileConfig) -> Action {
    Action::repeat_forever(Action::sequence([
        Action::move_by(Vec2::new(-tile.size.x, 0.0), tile.scroll_time),
        Action::move_by(Vec2::new(tile.size.x, 0.0), 0.0),
    ]))
}

/// Vertical placement of one wall pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallLayout {
    pub lower_y: f32,
    pub upper_y: f32,
}

/// Range of the lower wall's center, `[min, max)`
pub fn lower_wall_range(config: &GameConfig) -> (f32, f32) {
    let center_y = config.screen.y / 2.0;
    let jitter = config.wall_jitter_range();
    let lowest = center_y - config.wall_size.y / 2.0 - jitter / 2.0;
    (lowest, lowest + jitter)
}

pub fn wall_layout<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> WallLayout {
    let (lowest, highest) = lower_wall_range(config);
    let jitter = config.wall_jitter_range();
    // The f32 sum can round a draw just under `jitter` up to `highest`
    let lower_y = (lowest + rng.random_range(0.0..jitter)).min(highest.next_down());
    WallLayout {
        lower_y,
        upper_y: lower_y + config.wall_size.y + config.slit_height(),
    }
}

/// Build a wall pair with its score zone inside `layer`
pub fn spawn_obstacle_pair<R: Rng + ?Sized>(
    world: &mut World,
    layer: EntityId,
    config: &GameConfig,
    rng: &mut R,
) -> EntityId {
    let wall = config.wall_size;
    let layout = wall_layout(config, rng);

    let pair = world.spawn(
        Entity::new(EntityKind::ObstaclePair).at(Vec2::new(config.screen.x + wall.x / 2.0, 0.0)),
        Some(layer),
    );
    for y in [layout.lower_y, layout.upper_y] {
        world.spawn(
            Entity::new(EntityKind::Wall)
                .at(Vec2::new(0.0, y))
                .with_sprite(Sprite::Wall)
                .with_body(Body::fixed_rect(wall, OBSTACLE)),
            Some(pair),
        );
    }
    world.spawn(
        Entity::new(EntityKind::ScoreZone)
            .at(Vec2::new(config.score_zone_offset, config.screen.y / 2.0))
            .with_body(
                Body::fixed_rect(Vec2::new(wall.x, config.screen.y), SCORE_ZONE)
                    .with_contact_mask(PLAYER),
            ),
        Some(pair),
    );

    world.schedule(
        pair,
        Rc::new(cross_and_remove(
            config.screen.x + wall.x,
            config.obstacle_travel_time,
        )),
    );
    pair
}

/// Range of an item's center, `[min, max)`
pub fn item_range(config: &GameConfig) -> (f32, f32) {
    let quarter = config.screen.y / 4.0;
    (quarter, quarter + config.screen.y / 2.0)
}

/// Build a collectible and its trigger inside `layer`
pub fn spawn_item<R: Rng + ?Sized>(
    world: &mut World,
    layer: EntityId,
    config: &GameConfig,
    items: &ItemConfig,
    rng: &mut R,
) -> EntityId {
    let (low, high) = item_range(config);
    let y = rng.random_range(low..high);

    let group = world.spawn(
        Entity::new(EntityKind::ItemGroup).at(Vec2::new(config.screen.x + items.size.x / 2.0, 0.0)),
        Some(layer),
    );
    world.spawn(
        Entity::new(EntityKind::Item)
            .at(Vec2::new(0.0, y))
            .with_sprite(Sprite::Item)
            .with_body(Body::fixed_rect(items.size, ITEM).with_contact_mask(PLAYER)),
        Some(group),
    );
    world.spawn(
        Entity::new(EntityKind::ItemTrigger)
            .at(Vec2::new(0.0, y) + items.trigger_offset)
            .with_body(Body::fixed_rect(items.size, ITEM).with_contact_mask(PLAYER)),
        Some(group),
    );

    world.schedule(
        group,
        Rc::new(cross_and_remove(
            config.screen.x + items.size.x,
            items.travel_time,
        )),
    );
    group
}

/// Enough tiles to cover the screen while one scrolls off
fn tile_count(screen_width: f32, tile: &TileConfig) -> usize {
    (screen_width / tile.size.x) as usize + 2
}

pub fn setup_ground(world: &mut World, parent: EntityId, config: &GameConfig) -> Vec<EntityId> {
    let tile = config.ground_tile;
    let program = Rc::new(scroll_loop(&tile));
    (0..tile_count(config.screen.x, &tile))
        .map(|i| {
            let id = world.spawn(
                Entity::new(EntityKind::Ground)
                    .at(Vec2::new(tile.size.x * (i as f32 + 0.5), tile.size.y * 0.5))
                    .with_sprite(Sprite::Ground)
                    .with_body(Body::fixed_rect(tile.size, GROUND)),
                Some(parent),
            );
            world.schedule(id, program.clone());
            id
        })
        .collect()
}

pub fn setup_clouds(world: &mut World, parent: EntityId, config: &GameConfig) -> Vec<EntityId> {
    let tile = config.cloud_tile;
    let program = Rc::new(scroll_loop(&tile));
    (0..tile_count(config.screen.x, &tile))
        .map(|i| {
            let id = world.spawn(
                Entity::new(EntityKind::Cloud)
                    .at(Vec2::new(
                        tile.size.x * (i as f32 + 0.5),
                        config.screen.y - tile.size.y * 0.5,
                    ))
                    .with_sprite(Sprite::Cloud),
                Some(parent),
            );
            world.schedule(id, program.clone());
            id
        })
        .collect()
}

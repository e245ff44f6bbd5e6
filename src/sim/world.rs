//! Entity arena
//!
//! Scene-graph nodes live in a map keyed by id, each pointing at its parent.
//! Positions are local to the parent. A node's actions and physics only run
//! while every node up its parent chain has nonzero speed.

use std::collections::BTreeMap;
use std::rc::Rc;

use glam::Vec2;

use super::action::{Action, ActionTarget, Command, Effect, ScheduledAction};

/// Stable entity handle. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u32);

/// What a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Root,
    /// Top-level scroll container, its speed is the world running flag
    ScrollLayer,
    ObstacleLayer,
    ItemLayer,
    Ground,
    Cloud,
    Player,
    /// Container holding two walls and a score zone
    ObstaclePair,
    Wall,
    ScoreZone,
    /// Container holding an item and its trigger
    ItemGroup,
    Item,
    ItemTrigger,
}

/// Texture handles, resolved by the host renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sprite {
    PlayerFlapA,
    PlayerFlapB,
    Ground,
    Cloud,
    Wall,
    Item,
}

/// Collision shape, centered on the entity position
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Rect { size: Vec2 },
    Circle { radius: f32 },
}

/// Physics body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub shape: Shape,
    /// Exactly one category bit
    pub category: u32,
    /// Categories that physically block this body
    pub collision_mask: u32,
    /// Categories that raise contact events with this body
    pub contact_mask: u32,
    /// Moved by gravity and impulses
    pub dynamic: bool,
    pub velocity: Vec2,
}

impl Body {
    /// Immovable rectangle
    pub fn fixed_rect(size: Vec2, category: u32) -> Self {
        Self {
            shape: Shape::Rect { size },
            category,
            collision_mask: 0,
            contact_mask: 0,
            dynamic: false,
            velocity: Vec2::ZERO,
        }
    }

    pub fn with_contact_mask(mut self, mask: u32) -> Self {
        self.contact_mask = mask;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub parent: Option<EntityId>,
    /// Position relative to the parent
    pub pos: Vec2,
    pub rotation: f32,
    /// Time scale for this node and its subtree, 0 freezes it
    pub speed: f32,
    pub sprite: Option<Sprite>,
    pub body: Option<Body>,
    actions: Vec<ScheduledAction>,
}

impl Entity {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            id: EntityId(0),
            kind,
            parent: None,
            pos: Vec2::ZERO,
            rotation: 0.0,
            speed: 1.0,
            sprite: None,
            body: None,
            actions: Vec::new(),
        }
    }

    pub fn at(mut self, pos: Vec2) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_sprite(mut self, sprite: Sprite) -> Self {
        self.sprite = Some(sprite);
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Running (unfinished) programs
    pub fn actions(&self) -> &[ScheduledAction] {
        &self.actions
    }
}

#[derive(Debug, Clone, Default)]
pub struct World {
    entities: BTreeMap<EntityId, Entity>,
    next_id: u32,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node under `parent` and return its id
    pub fn spawn(&mut self, mut entity: Entity, parent: Option<EntityId>) -> EntityId {
        self.next_id += 1;
        let id = EntityId(self.next_id);
        entity.id = id;
        entity.parent = parent.filter(|p| self.entities.contains_key(p));
        if parent.is_some() && entity.parent.is_none() {
            log::debug!("Parent {:?} of new {:?} is gone, attaching to nothing", parent, entity.kind);
        }
        self.entities.insert(id, entity);
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All entities in id order
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn children(&self, id: EntityId) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| e.parent == Some(id))
            .map(|e| e.id)
            .collect()
    }

    pub fn count_kind(&self, kind: EntityKind) -> usize {
        self.entities.values().filter(|e| e.kind == kind).count()
    }

    /// Position in screen space
    pub fn world_position(&self, id: EntityId) -> Option<Vec2> {
        let mut entity = self.entities.get(&id)?;
        let mut pos = entity.pos;
        while let Some(parent) = entity.parent.and_then(|p| self.entities.get(&p)) {
            pos += parent.pos;
            entity = parent;
        }
        Some(pos)
    }

    /// Product of speeds up the parent chain, 0 when the entity is gone
    pub fn effective_speed(&self, id: EntityId) -> f32 {
        let Some(mut entity) = self.entities.get(&id) else {
            return 0.0;
        };
        let mut speed = entity.speed;
        while let Some(parent) = entity.parent.and_then(|p| self.entities.get(&p)) {
            speed *= parent.speed;
            entity = parent;
        }
        speed
    }

    pub fn set_speed(&mut self, id: EntityId, speed: f32) {
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.speed = speed;
        }
    }

    /// Remove an entity with its whole subtree. Cancels their actions.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        if !self.entities.contains_key(&id) {
            return false;
        }
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            pending.extend(self.children(next));
            self.entities.remove(&next);
        }
        true
    }

    /// Destroy every child of `id`, keeping `id` itself
    pub fn clear_children(&mut self, id: EntityId) -> usize {
        let children = self.children(id);
        for &child in &children {
            self.destroy(child);
        }
        children.len()
    }

    /// Attach a program. Scheduling on a destroyed entity is a silent no-op.
    pub fn schedule(&mut self, id: EntityId, program: Rc<Action>) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.actions.push(ScheduledAction::new(program));
                true
            }
            None => false,
        }
    }

    /// Advance every running program by `dt` scaled by its owner's effective
    /// speed. Removals are applied after the pass; commands are returned for
    /// the caller to execute in order.
    pub fn advance_actions(&mut self, dt: f32) -> Vec<(EntityId, Command)> {
        let active: Vec<(EntityId, f32)> = self
            .entities
            .values()
            .filter(|e| !e.actions.is_empty())
            .map(|e| (e.id, self.effective_speed(e.id)))
            .filter(|&(_, speed)| speed != 0.0)
            .collect();

        let mut commands = Vec::new();
        let mut removals = Vec::new();
        let mut effects = Vec::new();

        for (id, speed) in active {
            let Some(entity) = self.entities.get_mut(&id) else {
                continue;
            };
            let Entity {
                pos,
                rotation,
                sprite,
                actions,
                ..
            } = entity;
            let mut target = ActionTarget {
                pos,
                rotation,
                sprite,
            };
            for action in actions.iter_mut() {
                action.advance(dt * speed, &mut target, &mut effects);
            }
            actions.retain(|a| !a.is_finished());

            for effect in effects.drain(..) {
                match effect {
                    Effect::Command(command) => commands.push((id, command)),
                    Effect::RemoveSelf => removals.push(id),
                }
            }
        }

        for id in removals {
            self.destroy(id);
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_world_position_sums_parents() {
        let mut world = World::new();
        let layer = world.spawn(Entity::new(EntityKind::ObstacleLayer).at(Vec2::new(10.0, 0.0)), None);
        let pair = world.spawn(Entity::new(EntityKind::ObstaclePair).at(Vec2::new(100.0, 0.0)), Some(layer));
        let wall = world.spawn(Entity::new(EntityKind::Wall).at(Vec2::new(0.0, 50.0)), Some(pair));
        assert_eq!(world.world_position(wall), Some(Vec2::new(110.0, 50.0)));
    }

    #[test]
    fn test_destroy_removes_subtree() {
        let mut world = World::new();
        let pair = world.spawn(Entity::new(EntityKind::ObstaclePair), None);
        let upper = world.spawn(Entity::new(EntityKind::Wall), Some(pair));
        let lower = world.spawn(Entity::new(EntityKind::Wall), Some(pair));
        let other = world.spawn(Entity::new(EntityKind::Ground), None);

        assert!(world.destroy(pair));
        assert!(!world.contains(upper));
        assert!(!world.contains(lower));
        assert!(world.contains(other));
        assert!(!world.destroy(pair));
    }

    #[test]
    fn test_schedule_on_destroyed_is_noop() {
        let mut world = World::new();
        let id = world.spawn(Entity::new(EntityKind::Item), None);
        world.destroy(id);
        assert!(!world.schedule(id, Rc::new(Action::wait(1.0))));
        assert!(world.advance_actions(DT).is_empty());
    }

    #[test]
    fn test_zero_speed_ancestor_freezes_actions() {
        let mut world = World::new();
        let scroll = world.spawn(Entity::new(EntityKind::ScrollLayer), None);
        let layer = world.spawn(Entity::new(EntityKind::ObstacleLayer), Some(scroll));
        let pair = world.spawn(Entity::new(EntityKind::ObstaclePair), Some(layer));
        world.schedule(pair, Rc::new(Action::move_by(Vec2::new(-60.0, 0.0), 1.0)));

        world.advance_actions(0.5);
        let x = world.get(pair).unwrap().pos.x;
        assert!((x + 30.0).abs() < 1e-3);

        world.set_speed(scroll, 0.0);
        for _ in 0..60 {
            world.advance_actions(DT);
        }
        assert_eq!(world.get(pair).unwrap().pos.x, x);

        world.set_speed(scroll, 1.0);
        world.advance_actions(0.5);
        assert!((world.get(pair).unwrap().pos.x + 60.0).abs() < 1e-3);
    }

    #[test]
    fn test_remove_self_destroys_owner() {
        let mut world = World::new();
        let pair = world.spawn(Entity::new(EntityKind::ObstaclePair), None);
        let wall = world.spawn(Entity::new(EntityKind::Wall), Some(pair));
        world.schedule(
            pair,
            Rc::new(Action::sequence([Action::wait(0.1), Action::remove_self()])),
        );
        world.advance_actions(0.05);
        assert!(world.contains(pair));
        world.advance_actions(0.05);
        assert!(!world.contains(pair));
        assert!(!world.contains(wall));
    }

    #[test]
    fn test_multiple_programs_run_concurrently() {
        let mut world = World::new();
        let id = world.spawn(Entity::new(EntityKind::Player), None);
        world.schedule(id, Rc::new(Action::move_by(Vec2::new(10.0, 0.0), 1.0)));
        world.schedule(id, Rc::new(Action::move_by(Vec2::new(0.0, 10.0), 1.0)));
        world.advance_actions(1.0);
        assert_eq!(world.get(id).unwrap().pos, Vec2::new(10.0, 10.0));
        assert!(world.get(id).unwrap().actions().is_empty());
    }

    #[test]
    fn test_programs_share_definition() {
        let mut world = World::new();
        let program = Rc::new(Action::wait(1.0));
        let a = world.spawn(Entity::new(EntityKind::Ground), None);
        let b = world.spawn(Entity::new(EntityKind::Ground), None);
        world.schedule(a, program.clone());
        world.schedule(b, program.clone());
        assert_eq!(Rc::strong_count(&program), 3);
        assert_eq!(world.count_kind(EntityKind::Ground), 2);

        world.advance_actions(0.5);
        for id in [a, b] {
            let actions = world.get(id).unwrap().actions();
            assert_eq!(actions.len(), 1);
            assert_eq!(actions[0].program(), &Action::wait(1.0));
        }
    }

    #[test]
    fn test_commands_report_owner() {
        let mut world = World::new();
        let layer = world.spawn(Entity::new(EntityKind::ObstacleLayer), None);
        world.schedule(layer, Rc::new(Action::run(Command::SpawnObstacle)));
        assert_eq!(
            world.advance_actions(DT),
            vec![(layer, Command::SpawnObstacle)]
        );
    }
}

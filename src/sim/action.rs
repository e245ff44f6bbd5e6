//! Timed action programs
//!
//! An `Action` is an immutable instruction tree. Each entity that runs one
//! keeps a `ScheduledAction` holding the private progress through it. A single
//! `step` function interprets every primitive.
//!
//! Timing rules:
//! - Every primitive starts its own clock at zero. Surplus time on completion
//!   is dropped, so a primitive activated mid-tick receives no time until the
//!   next tick. Instantaneous primitives still run in the same tick.
//! - A timed primitive completes once its clock reaches `duration - TIME_EPSILON`.

use std::rc::Rc;

use glam::Vec2;

use super::world::Sprite;
use crate::consts::TIME_EPSILON;

/// One-shot command emitted by `Action::Run`
///
/// The owning entity is the subject: spawners insert into it, `FreezeSelf`
/// stops it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    SpawnObstacle,
    SpawnItem,
    /// Set the owner's speed to zero
    FreezeSelf,
    /// Host-defined marker, surfaced as a `GameEvent::Marker`
    Marker(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Linear translation over `duration` (0 = instant jump)
    MoveBy { delta: Vec2, duration: f32 },
    /// Linear rotation over `duration`
    RotateBy { angle: f32, duration: f32 },
    Wait { duration: f32 },
    Sequence(Vec<Action>),
    RepeatForever(Box<Action>),
    Run(Command),
    RemoveSelf,
    /// Show each frame for `interval` seconds
    AnimateFrames { frames: Vec<Sprite>, interval: f32 },
}

impl Action {
    pub fn move_by(delta: Vec2, duration: f32) -> Self {
        Action::MoveBy { delta, duration }
    }

    pub fn rotate_by(angle: f32, duration: f32) -> Self {
        Action::RotateBy { angle, duration }
    }

    pub fn wait(duration: f32) -> Self {
        Action::Wait { duration }
    }

    pub fn sequence(actions: impl IntoIterator<Item = Action>) -> Self {
        Action::Sequence(actions.into_iter().collect())
    }

    pub fn repeat_forever(action: Action) -> Self {
        Action::RepeatForever(Box::new(action))
    }

    pub fn run(command: Command) -> Self {
        Action::Run(command)
    }

    pub fn remove_self() -> Self {
        Action::RemoveSelf
    }

    pub fn animate_frames(frames: impl IntoIterator<Item = Sprite>, interval: f32) -> Self {
        Action::AnimateFrames {
            frames: frames.into_iter().collect(),
            interval,
        }
    }

    /// Total running time, `None` if it never finishes
    pub fn duration(&self) -> Option<f32> {
        match self {
            Action::MoveBy { duration, .. }
            | Action::RotateBy { duration, .. }
            | Action::Wait { duration } => Some(duration.max(0.0)),
            Action::AnimateFrames { frames, interval } => {
                Some(interval.max(0.0) * frames.len() as f32)
            }
            Action::Run(_) | Action::RemoveSelf => Some(0.0),
            Action::Sequence(actions) => actions
                .iter()
                .try_fold(0.0, |total, a| a.duration().map(|d| total + d)),
            Action::RepeatForever(_) => None,
        }
    }
}

/// Side effects an action cannot apply to its own entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Command(Command),
    RemoveSelf,
}

/// The entity fields an action may animate
pub struct ActionTarget<'a> {
    pub pos: &'a mut Vec2,
    pub rotation: &'a mut f32,
    pub sprite: &'a mut Option<Sprite>,
}

#[derive(Debug, Clone, PartialEq)]
enum Progress {
    /// Local clock plus the fraction of a move/rotate already applied
    Clock { elapsed: f32, applied: f32 },
    Sequence { index: usize, current: Box<Progress> },
    Repeat { current: Box<Progress>, cycles: u64 },
}

impl Progress {
    fn start(action: &Action) -> Self {
        match action {
            Action::Sequence(actions) => Progress::Sequence {
                index: 0,
                current: Box::new(
                    actions
                        .first()
                        .map(Progress::start)
                        .unwrap_or(Progress::Clock {
                            elapsed: 0.0,
                            applied: 0.0,
                        }),
                ),
            },
            Action::RepeatForever(action) => Progress::Repeat {
                current: Box::new(Progress::start(action)),
                cycles: 0,
            },
            _ => Progress::Clock {
                elapsed: 0.0,
                applied: 0.0,
            },
        }
    }
}

/// Completed fraction of a timed primitive
fn fraction(elapsed: f32, duration: f32) -> f32 {
    if duration <= 0.0 || elapsed >= duration - TIME_EPSILON {
        1.0
    } else {
        (elapsed / duration).clamp(0.0, 1.0)
    }
}

/// Advance `progress` through `action` by `dt`. Returns true on completion.
fn step(
    action: &Action,
    progress: &mut Progress,
    dt: f32,
    target: &mut ActionTarget<'_>,
    effects: &mut Vec<Effect>,
) -> bool {
    let outcome = match (action, &mut *progress) {
        (Action::MoveBy { delta, duration }, Progress::Clock { elapsed, applied }) => {
            *elapsed += dt;
            let done = fraction(*elapsed, *duration);
            *target.pos += *delta * (done - *applied);
            *applied = done;
            Some(done >= 1.0)
        }
        (Action::RotateBy { angle, duration }, Progress::Clock { elapsed, applied }) => {
            *elapsed += dt;
            let done = fraction(*elapsed, *duration);
            *target.rotation += *angle * (done - *applied);
            *applied = done;
            Some(done >= 1.0)
        }
        (Action::Wait { duration }, Progress::Clock { elapsed, .. }) => {
            *elapsed += dt;
            Some(fraction(*elapsed, *duration) >= 1.0)
        }
        (Action::AnimateFrames { frames, interval }, Progress::Clock { elapsed, .. }) => {
            if frames.is_empty() {
                return true;
            }
            *elapsed += dt;
            let total = interval * frames.len() as f32;
            let index = if *interval > 0.0 {
                (((*elapsed + TIME_EPSILON) / interval) as usize).min(frames.len() - 1)
            } else {
                frames.len() - 1
            };
            *target.sprite = Some(frames[index]);
            Some(fraction(*elapsed, total) >= 1.0)
        }
        (Action::Run(command), Progress::Clock { .. }) => {
            effects.push(Effect::Command(*command));
            Some(true)
        }
        (Action::RemoveSelf, Progress::Clock { .. }) => {
            effects.push(Effect::RemoveSelf);
            Some(true)
        }
        (Action::Sequence(actions), Progress::Sequence { index, current }) => {
            let mut dt = dt;
            loop {
                let Some(child) = actions.get(*index) else {
                    return true;
                };
                if !step(child, current, dt, target, effects) {
                    return false;
                }
                *index += 1;
                match actions.get(*index) {
                    Some(next) => **current = Progress::start(next),
                    None => return true,
                }
                dt = 0.0;
            }
        }
        (Action::RepeatForever(child), Progress::Repeat { current, cycles }) => {
            // Zero-length bodies restart on the next tick instead of spinning here
            let rerun_now = child.duration().is_none_or(|d| d > TIME_EPSILON);
            let mut dt = dt;
            loop {
                if !step(child, current, dt, target, effects) {
                    return false;
                }
                *cycles += 1;
                **current = Progress::start(child);
                if !rerun_now {
                    return false;
                }
                dt = 0.0;
            }
        }
        _ => None,
    };
    match outcome {
        Some(done) => done,
        None => {
            // Progress shape no longer matches the action, start over
            *progress = Progress::start(action);
            step(action, progress, dt, target, effects)
        }
    }
}

/// A program attached to one entity
#[derive(Debug, Clone)]
pub struct ScheduledAction {
    program: Rc<Action>,
    progress: Progress,
    finished: bool,
}

impl ScheduledAction {
    pub fn new(program: Rc<Action>) -> Self {
        let progress = Progress::start(&program);
        Self {
            program,
            progress,
            finished: false,
        }
    }

    pub fn program(&self) -> &Action {
        &self.program
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Completed cycles when the program is a top-level `RepeatForever`
    pub fn cycles(&self) -> u64 {
        match &self.progress {
            Progress::Repeat { cycles, .. } => *cycles,
            _ => 0,
        }
    }

    /// Advance by `dt`, pushing side effects. Returns true once finished.
    pub fn advance(
        &mut self,
        dt: f32,
        target: &mut ActionTarget<'_>,
        effects: &mut Vec<Effect>,
    ) -> bool {
        if !self.finished {
            self.finished = step(&self.program, &mut self.progress, dt, target, effects);
        }
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bare entity fields for driving a program outside a world
    struct Dummy {
        pos: Vec2,
        rotation: f32,
        sprite: Option<Sprite>,
    }

    impl Dummy {
        fn new() -> Self {
            Self {
                pos: Vec2::ZERO,
                rotation: 0.0,
                sprite: None,
            }
        }

        fn advance(&mut self, action: &mut ScheduledAction, dt: f32) -> (bool, Vec<Effect>) {
            let mut effects = Vec::new();
            let mut target = ActionTarget {
                pos: &mut self.pos,
                rotation: &mut self.rotation,
                sprite: &mut self.sprite,
            };
            let done = action.advance(dt, &mut target, &mut effects);
            (done, effects)
        }
    }

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_move_interpolates_linearly() {
        let mut dummy = Dummy::new();
        let mut action = ScheduledAction::new(Rc::new(Action::move_by(Vec2::new(-100.0, 0.0), 1.0)));

        dummy.advance(&mut action, 0.25);
        assert!((dummy.pos.x + 25.0).abs() < 1e-3);
        dummy.advance(&mut action, 0.25);
        assert!((dummy.pos.x + 50.0).abs() < 1e-3);

        // Overshoot clamps to the full delta
        let (done, _) = dummy.advance(&mut action, 2.0);
        assert!(done);
        assert!((dummy.pos.x + 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_zero_duration_move_jumps() {
        let mut dummy = Dummy::new();
        let mut action = ScheduledAction::new(Rc::new(Action::move_by(Vec2::new(50.0, 10.0), 0.0)));
        let (done, _) = dummy.advance(&mut action, 0.0);
        assert!(done);
        assert_eq!(dummy.pos, Vec2::new(50.0, 10.0));
    }

    #[test]
    fn test_run_once_fires_exactly_once() {
        let mut dummy = Dummy::new();
        let mut action = ScheduledAction::new(Rc::new(Action::run(Command::Marker(3))));
        let (done, effects) = dummy.advance(&mut action, DT);
        assert!(done);
        assert_eq!(effects, vec![Effect::Command(Command::Marker(3))]);
        let (_, effects) = dummy.advance(&mut action, DT);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_sequence_remove_self_not_before_duration() {
        let program = Action::sequence([
            Action::move_by(Vec2::new(-460.0, 0.0), 4.0),
            Action::remove_self(),
        ]);
        let mut dummy = Dummy::new();
        let mut action = ScheduledAction::new(Rc::new(program));

        let mut time = 0.0;
        let mut removed_at = None;
        for _ in 0..300 {
            time += DT;
            let (_, effects) = dummy.advance(&mut action, DT);
            if effects.contains(&Effect::RemoveSelf) {
                removed_at = Some(time);
                break;
            }
        }
        let removed_at = removed_at.expect("program should remove its owner");
        assert!(removed_at >= 4.0 - 1e-3);
        assert!(removed_at < 4.0 + DT);
        assert!((dummy.pos.x + 460.0).abs() < 0.05);
    }

    #[test]
    fn test_surplus_time_is_not_carried() {
        // wait(1) then wait(1): a huge tick only finishes the first
        let program = Action::sequence([
            Action::wait(1.0),
            Action::wait(1.0),
            Action::run(Command::Marker(1)),
        ]);
        let mut dummy = Dummy::new();
        let mut action = ScheduledAction::new(Rc::new(program));
        let (done, effects) = dummy.advance(&mut action, 1.9);
        assert!(!done);
        assert!(effects.is_empty());
        let (done, effects) = dummy.advance(&mut action, 1.0);
        assert!(done);
        assert_eq!(effects, vec![Effect::Command(Command::Marker(1))]);
    }

    #[test]
    fn test_scroll_loop_returns_to_origin() {
        let program = Action::repeat_forever(Action::sequence([
            Action::move_by(Vec2::new(-336.0, 0.0), 5.0),
            Action::move_by(Vec2::new(336.0, 0.0), 0.0),
        ]));
        let mut dummy = Dummy::new();
        let mut action = ScheduledAction::new(Rc::new(program));
        for _ in 0..300 {
            dummy.advance(&mut action, DT);
        }
        assert_eq!(action.cycles(), 1);
        assert!(dummy.pos.x.abs() < 0.05);

        for _ in 0..150 {
            dummy.advance(&mut action, DT);
        }
        assert!((dummy.pos.x + 168.0).abs() < 0.5);
    }

    #[test]
    fn test_repeat_spawner_fires_at_each_period() {
        let program = Action::repeat_forever(Action::sequence([
            Action::run(Command::SpawnObstacle),
            Action::wait(2.0),
        ]));
        let mut dummy = Dummy::new();
        let mut action = ScheduledAction::new(Rc::new(program));

        let (_, effects) = dummy.advance(&mut action, 0.0);
        assert_eq!(effects.len(), 1);

        let mut fired_on = Vec::new();
        for tick in 1..=600 {
            let (_, effects) = dummy.advance(&mut action, DT);
            if !effects.is_empty() {
                fired_on.push(tick);
            }
        }
        assert_eq!(fired_on, vec![120, 240, 360, 480, 600]);
    }

    #[test]
    fn test_zero_length_repeat_runs_once_per_tick() {
        let program = Action::repeat_forever(Action::run(Command::Marker(9)));
        let mut dummy = Dummy::new();
        let mut action = ScheduledAction::new(Rc::new(program));
        for _ in 0..5 {
            let (done, effects) = dummy.advance(&mut action, DT);
            assert!(!done);
            assert_eq!(effects.len(), 1);
        }
        assert_eq!(action.cycles(), 5);
    }

    #[test]
    fn test_animate_frames_cycles_sprites() {
        let program = Action::repeat_forever(Action::animate_frames(
            [Sprite::PlayerFlapA, Sprite::PlayerFlapB],
            0.2,
        ));
        let mut dummy = Dummy::new();
        let mut action = ScheduledAction::new(Rc::new(program));

        dummy.advance(&mut action, 0.0);
        assert_eq!(dummy.sprite, Some(Sprite::PlayerFlapA));
        dummy.advance(&mut action, 0.25);
        assert_eq!(dummy.sprite, Some(Sprite::PlayerFlapB));
        dummy.advance(&mut action, 0.2);
        assert_eq!(dummy.sprite, Some(Sprite::PlayerFlapA));
        assert_eq!(action.cycles(), 1);
    }

    #[test]
    fn test_rotate_by() {
        let mut dummy = Dummy::new();
        let mut action = ScheduledAction::new(Rc::new(Action::rotate_by(2.0, 1.0)));
        dummy.advance(&mut action, 0.5);
        assert!((dummy.rotation - 1.0).abs() < 1e-4);
        let (done, _) = dummy.advance(&mut action, 0.5);
        assert!(done);
        assert!((dummy.rotation - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_durations() {
        let seq = Action::sequence([Action::wait(1.5), Action::move_by(Vec2::X, 2.0)]);
        assert_eq!(seq.duration(), Some(3.5));
        assert_eq!(Action::repeat_forever(Action::wait(1.0)).duration(), None);
        assert_eq!(
            Action::animate_frames([Sprite::PlayerFlapA, Sprite::PlayerFlapB], 0.2).duration(),
            Some(0.4)
        );
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn repeat_counts_every_cycle(
                period in 0.1f32..2.0,
                ticks in 1usize..2000,
            ) {
                let program = Action::repeat_forever(Action::sequence([
                    Action::run(Command::Marker(0)),
                    Action::wait(period),
                ]));
                let mut dummy = Dummy::new();
                let mut action = ScheduledAction::new(Rc::new(program));
                let mut fired = 0u64;
                for _ in 0..ticks {
                    let (done, effects) = dummy.advance(&mut action, DT);
                    prop_assert!(!done);
                    fired += effects.len() as u64;
                }
                // First marker fires on the first tick, then once per completed cycle
                prop_assert_eq!(fired, action.cycles() + 1);
            }
        }
    }
}

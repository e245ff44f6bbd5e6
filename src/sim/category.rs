//! Collision categories and contact classification

/// Entity kinds for collision filtering. Each is a single bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Player,
    Ground,
    Obstacle,
    ScoreZone,
    Item,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Player,
        Category::Ground,
        Category::Obstacle,
        Category::ScoreZone,
        Category::Item,
    ];

    pub const fn bit(self) -> u32 {
        match self {
            Category::Player => 1 << 0,
            Category::Ground => 1 << 1,
            Category::Obstacle => 1 << 2,
            Category::ScoreZone => 1 << 3,
            Category::Item => 1 << 4,
        }
    }

    /// Whether `mask` has this category's bit
    pub const fn in_mask(self, mask: u32) -> bool {
        mask & self.bit() != 0
    }
}

pub const PLAYER: u32 = Category::Player.bit();
pub const GROUND: u32 = Category::Ground.bit();
pub const OBSTACLE: u32 = Category::Obstacle.bit();
pub const SCORE_ZONE: u32 = Category::ScoreZone.bit();
pub const ITEM: u32 = Category::Item.bit();

/// Every known category bit
pub const KNOWN: u32 = PLAYER | GROUND | OBSTACLE | SCORE_ZONE | ITEM;

/// What a contact means for the game, declared in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
    /// Player passed an obstacle
    Score,
    /// Player touched a collectible
    Item,
    /// Player hit ground or a wall
    Fatal,
}

/// Classify a contact by its two category masks.
///
/// Priority is score zone, then item, then fatal. A simultaneous
/// score-zone/ground pair therefore scores instead of ending the run.
pub fn classify(mask_a: u32, mask_b: u32) -> Outcome {
    let either = mask_a | mask_b;
    if Category::ScoreZone.in_mask(either) {
        Outcome::Score
    } else if Category::Item.in_mask(either) {
        Outcome::Item
    } else {
        Outcome::Fatal
    }
}

/// Whether two bodies raise contact events with each other
pub fn tests_contact(category_a: u32, contact_a: u32, category_b: u32, contact_b: u32) -> bool {
    category_a & contact_b != 0 || category_b & contact_a != 0
}

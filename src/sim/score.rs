//! Score ledger
//!
//! Pass and item counters live in memory. The best score is read from the
//! injected store at construction and written back whenever a pass score
//! beats it.

use crate::persistence::ScoreStore;

pub struct ScoreLedger {
    pass_score: u32,
    item_score: u32,
    best_score: u32,
    key: String,
    store: Box<dyn ScoreStore>,
}

impl std::fmt::Debug for ScoreLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreLedger")
            .field("pass_score", &self.pass_score)
            .field("item_score", &self.item_score)
            .field("best_score", &self.best_score)
            .field("key", &self.key)
            .finish()
    }
}

fn stored_value(store: &dyn ScoreStore, key: &str) -> u32 {
    u32::try_from(store.get_int(key).max(0)).unwrap_or(u32::MAX)
}

impl ScoreLedger {
    pub fn new(store: Box<dyn ScoreStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let best_score = stored_value(store.as_ref(), &key);
        Self {
            pass_score: 0,
            item_score: 0,
            best_score,
            key,
            store,
        }
    }

    pub fn pass_score(&self) -> u32 {
        self.pass_score
    }

    pub fn item_score(&self) -> u32 {
        self.item_score
    }

    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    /// Count a cleared obstacle. Returns the new best when it was beaten.
    pub fn record_pass(&mut self) -> Option<u32> {
        self.pass_score += 1;
        let best = self.best_score.max(stored_value(self.store.as_ref(), &self.key));
        if self.pass_score > best {
            self.best_score = self.pass_score;
            self.store.set_int(&self.key, i64::from(self.pass_score));
            Some(self.pass_score)
        } else {
            self.best_score = best;
            None
        }
    }

    pub fn record_item(&mut self) -> u32 {
        self.item_score += 1;
        self.item_score
    }

    /// Zero both counters. The best score survives.
    pub fn reset(&mut self) {
        self.pass_score = 0;
        self.item_score = 0;
    }

    pub fn score_label(&self) -> String {
        format!("Score:{}", self.pass_score)
    }

    pub fn item_label(&self) -> String {
        format!("Item Score:{}", self.item_score)
    }

    pub fn best_label(&self) -> String {
        format!("Best Score:{}", self.best_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_reads_best_at_start() {
        let mut store = MemoryStore::new();
        store.set_int("BEST", 4);
        let ledger = ScoreLedger::new(Box::new(store), "BEST");
        assert_eq!(ledger.best_score(), 4);
        assert_eq!(ledger.best_label(), "Best Score:4");
    }

    #[test]
    fn test_new_best_only_when_strictly_greater() {
        let mut store = MemoryStore::new();
        store.set_int("BEST", 2);
        let mut ledger = ScoreLedger::new(Box::new(store.clone()), "BEST");

        assert_eq!(ledger.record_pass(), None);
        assert_eq!(ledger.record_pass(), None);
        assert_eq!(store.get_int("BEST"), 2);
        assert_eq!(ledger.record_pass(), Some(3));
        assert_eq!(store.get_int("BEST"), 3);
        assert_eq!(ledger.score_label(), "Score:3");
    }

    #[test]
    fn test_reset_keeps_best() {
        let store = MemoryStore::new();
        let mut ledger = ScoreLedger::new(Box::new(store.clone()), "BEST");
        ledger.record_pass();
        ledger.record_item();
        ledger.reset();
        assert_eq!(ledger.pass_score(), 0);
        assert_eq!(ledger.item_score(), 0);
        assert_eq!(ledger.best_score(), 1);
        assert_eq!(store.get_int("BEST"), 1);
    }

    #[test]
    fn test_negative_store_value_reads_as_zero() {
        let mut store = MemoryStore::new();
        store.set_int("BEST", -5);
        let ledger = ScoreLedger::new(Box::new(store), "BEST");
        assert_eq!(ledger.best_score(), 0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn best_never_decreases(ops in proptest::collection::vec(any::<bool>(), 1..200)) {
                let store = MemoryStore::new();
                let mut ledger = ScoreLedger::new(Box::new(store.clone()), "BEST");
                let mut last_best = ledger.best_score();
                for pass in ops {
                    if pass {
                        ledger.record_pass();
                    } else {
                        ledger.reset();
                    }
                    prop_assert!(ledger.best_score() >= last_best);
                    prop_assert!(ledger.best_score() >= ledger.pass_score());
                    prop_assert_eq!(store.get_int("BEST"), i64::from(ledger.best_score()));
                    last_best = ledger.best_score();
                }
            }
        }
    }
}

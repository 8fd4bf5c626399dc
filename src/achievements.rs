//! Achievement catalog and fixed-point evaluation
//!
//! Conditions are plain data interpreted against the durable counters, so
//! they cannot have side effects. Unlock flags live in the same store as the
//! counters under `ACH_<id>`.

use crate::events::{EventBus, Notification};
use crate::persistence::{KeyValueStore, flush_or_warn};
use crate::stats::Counter;

/// Prefix for unlock flag keys
pub const FLAG_PREFIX: &str = "ACH_";

/// Unlock condition, evaluated by [`AchievementEngine::condition_met`]
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `counter >= threshold`
    AtLeast(Counter, i64),
    /// Both counters `>= threshold`
    Both(Counter, Counter, i64),
    /// Both counters `>= min` and no more than `max_gap` apart
    Balanced {
        a: Counter,
        b: Counter,
        min: i64,
        max_gap: i64,
    },
    /// At least this many catalog entries already unlocked
    UnlockedAtLeast(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AchievementRule {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub condition: Condition,
}

impl AchievementRule {
    pub const fn new(
        id: &'static str,
        title: &'static str,
        description: &'static str,
        condition: Condition,
    ) -> Self {
        Self {
            id,
            title,
            description,
            condition,
        }
    }
}

/// The shipped catalog, in evaluation order
pub fn standard_catalog() -> Vec<AchievementRule> {
    use Condition::*;
    use Counter::*;

    vec![
        // Thematic
        AchievementRule::new(
            "between_light_shadow",
            "Between Light and Shadow",
            "Crash into at least one Light wall and one Dark wall.",
            Both(DeathsWallLight, DeathsWallDark, 1),
        ),
        AchievementRule::new(
            "furia_elemental",
            "Elemental Fury",
            "Use 16 Light attacks and 16 Dark attacks.",
            Both(AttacksLight, AttacksDark, 16),
        ),
        // Combat
        AchievementRule::new(
            "first_attack",
            "First Strike",
            "Launch your first attack.",
            AtLeast(AttacksTotal, 1),
        ),
        AchievementRule::new(
            "light_specialist",
            "Light Specialist",
            "Launch 30 Light attacks.",
            AtLeast(AttacksLight, 30),
        ),
        AchievementRule::new(
            "dark_mastery",
            "Dark Mastery",
            "Launch 30 Dark attacks.",
            AtLeast(AttacksDark, 30),
        ),
        AchievementRule::new(
            "perfect_balance",
            "Perfect Balance",
            "Launch at least 20 Light and 20 Dark attacks, never more than one apart.",
            Balanced {
                a: AttacksLight,
                b: AttacksDark,
                min: 20,
                max_gap: 1,
            },
        ),
        // Deaths
        AchievementRule::new(
            "first_death",
            "Hard Hit",
            "Die for the first time.",
            AtLeast(DeathsTotal, 1),
        ),
        AchievementRule::new(
            "learning_to_fly",
            "Learning to Fly",
            "Die 5 times.",
            AtLeast(DeathsTotal, 5),
        ),
        AchievementRule::new(
            "walls_do_not_forgive",
            "Walls Don't Forgive",
            "Die 5 times to elemental walls.",
            AtLeast(DeathsWall, 5),
        ),
        AchievementRule::new(
            "fate_obstacles",
            "Obstacles of Fate",
            "Die 5 times to neutral obstacles.",
            AtLeast(DeathsObstacle, 5),
        ),
        // Best score
        AchievementRule::new(
            "long_first_flight",
            "First Long Flight",
            "Reach a best score of 1000.",
            AtLeast(BestScore, 1000),
        ),
        AchievementRule::new(
            "max_speed",
            "Top Speed",
            "Reach a best score of 3000.",
            AtLeast(BestScore, 3000),
        ),
        AchievementRule::new(
            "beyond_balance",
            "Beyond Balance",
            "Reach a best score of 5000.",
            AtLeast(BestScore, 5000),
        ),
        // Mastery
        AchievementRule::new(
            "unstoppable",
            "Unstoppable",
            "Destroy 50 walls in total.",
            AtLeast(WallsTotal, 50),
        ),
        AchievementRule::new(
            "master_of_dualbalance",
            "Master of Dual Balance",
            "Unlock 10 achievements.",
            UnlockedAtLeast(10),
        ),
    ]
}

#[derive(Debug, Clone)]
pub struct AchievementEngine {
    catalog: Vec<AchievementRule>,
}

impl Default for AchievementEngine {
    fn default() -> Self {
        Self::with_catalog(standard_catalog())
    }
}

impl AchievementEngine {
    /// Build an engine over a custom catalog. Ids must be unique.
    pub fn with_catalog(catalog: Vec<AchievementRule>) -> Self {
        debug_assert!(
            catalog
                .iter()
                .enumerate()
                .all(|(i, a)| catalog[..i].iter().all(|b| b.id != a.id)),
            "duplicate achievement id"
        );
        Self { catalog }
    }

    pub fn catalog(&self) -> &[AchievementRule] {
        &self.catalog
    }

    pub fn find(&self, id: &str) -> Option<&AchievementRule> {
        self.catalog.iter().find(|a| a.id == id)
    }

    pub fn flag_key(id: &str) -> String {
        format!("{FLAG_PREFIX}{id}")
    }

    pub fn is_unlocked(&self, store: &dyn KeyValueStore, id: &str) -> bool {
        store.get_bool(&Self::flag_key(id))
    }

    /// Unlocked entries of this catalog (stray flags are not counted)
    pub fn unlocked_count(&self, store: &dyn KeyValueStore) -> usize {
        self.catalog
            .iter()
            .filter(|a| self.is_unlocked(store, a.id))
            .count()
    }

    pub fn condition_met(&self, condition: &Condition, store: &dyn KeyValueStore) -> bool {
        match *condition {
            Condition::AtLeast(counter, threshold) => counter.read(store) >= threshold,
            Condition::Both(a, b, threshold) => {
                a.read(store) >= threshold && b.read(store) >= threshold
            }
            Condition::Balanced { a, b, min, max_gap } => {
                let (a, b) = (a.read(store), b.read(store));
                a >= min && b >= min && (a - b).abs() <= max_gap
            }
            Condition::UnlockedAtLeast(n) => self.unlocked_count(store) >= n,
        }
    }

    /// Sweep the catalog until a full pass unlocks nothing.
    ///
    /// Each unlock is persisted and published before the sweep moves on, so a
    /// meta condition later in the same pass already sees it. Returns the
    /// number of achievements unlocked by this call.
    pub fn evaluate(&self, store: &mut dyn KeyValueStore, bus: &mut EventBus) -> usize {
        let mut total = 0;
        loop {
            let mut unlocked_this_pass = 0;
            for rule in &self.catalog {
                if self.is_unlocked(store, rule.id) {
                    continue;
                }
                if !self.condition_met(&rule.condition, store) {
                    continue;
                }
                self.unlock(rule, store, bus);
                unlocked_this_pass += 1;
            }
            total += unlocked_this_pass;
            if unlocked_this_pass == 0 {
                break;
            }
        }
        total
    }

    fn unlock(&self, rule: &AchievementRule, store: &mut dyn KeyValueStore, bus: &mut EventBus) {
        store.set_bool(&Self::flag_key(rule.id), true);
        flush_or_warn(store);

        log::info!("Achievement unlocked: {} ({})", rule.title, rule.id);

        bus.publish(Notification::AchievementUnlocked {
            id: rule.id.to_string(),
            title: rule.title.to_string(),
            description: rule.description.to_string(),
        });
    }

    /// Debug: forget every unlock flag of this catalog
    pub fn clear_all(&self, store: &mut dyn KeyValueStore) {
        for rule in &self.catalog {
            store.delete_key(&Self::flag_key(rule.id));
        }
        flush_or_warn(store);
        log::info!("All achievements cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    fn set(store: &mut MemoryStore, counter: Counter, value: i64) {
        store.set_int(counter.key(), value);
    }

    fn unlocked_ids(bus: &mut EventBus, sub: crate::SubscriberId) -> Vec<String> {
        bus.drain(sub)
            .into_iter()
            .filter_map(|n| match n {
                Notification::AchievementUnlocked { id, .. } => Some(id),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_catalog_shape() {
        let engine = AchievementEngine::default();
        assert_eq!(engine.catalog().len(), 15);
        assert_eq!(engine.catalog().last().unwrap().id, "master_of_dualbalance");
        assert!(engine.find("furia_elemental").is_some());
        assert!(engine.find("nope").is_none());
    }

    #[test]
    fn test_meta_unlocks_in_same_evaluation() {
        let engine = AchievementEngine::default();
        let mut store = MemoryStore::new();
        let mut bus = EventBus::new();
        let sub = bus.subscribe();

        // 5 combat achievements
        set(&mut store, Counter::AttacksTotal, 60);
        set(&mut store, Counter::AttacksLight, 30);
        set(&mut store, Counter::AttacksDark, 30);
        // 5 death achievements
        set(&mut store, Counter::DeathsTotal, 10);
        set(&mut store, Counter::DeathsWall, 5);
        set(&mut store, Counter::DeathsWallLight, 1);
        set(&mut store, Counter::DeathsWallDark, 4);
        set(&mut store, Counter::DeathsObstacle, 5);

        let unlocked = engine.evaluate(&mut store, &mut bus);
        assert_eq!(unlocked, 11);
        assert!(engine.is_unlocked(&store, "master_of_dualbalance"));

        let ids = unlocked_ids(&mut bus, sub);
        assert_eq!(ids.len(), 11);
        assert_eq!(ids.last().map(String::as_str), Some("master_of_dualbalance"));
    }

    #[test]
    fn test_meta_waits_for_threshold() {
        let engine = AchievementEngine::default();
        let mut store = MemoryStore::new();
        let mut bus = EventBus::new();

        // 8 unlocks: five attack milestones and three death milestones
        set(&mut store, Counter::AttacksTotal, 60);
        set(&mut store, Counter::AttacksLight, 30);
        set(&mut store, Counter::AttacksDark, 30);
        set(&mut store, Counter::DeathsTotal, 5);
        set(&mut store, Counter::DeathsWall, 5);
        set(&mut store, Counter::DeathsWallLight, 5);
        set(&mut store, Counter::DeathsObstacle, 0);

        engine.evaluate(&mut store, &mut bus);
        assert_eq!(engine.unlocked_count(&store), 8);
        assert!(!engine.is_unlocked(&store, "master_of_dualbalance"));

        set(&mut store, Counter::WallsTotal, 50);
        engine.evaluate(&mut store, &mut bus);
        assert_eq!(engine.unlocked_count(&store), 9);
        assert!(!engine.is_unlocked(&store, "master_of_dualbalance"));

        set(&mut store, Counter::BestScore, 1000);
        engine.evaluate(&mut store, &mut bus);
        // 10 regular + meta
        assert_eq!(engine.unlocked_count(&store), 11);
    }

    #[test]
    fn test_evaluation_is_idempotent_at_fixed_point() {
        let engine = AchievementEngine::default();
        let mut store = MemoryStore::new();
        let mut bus = EventBus::new();
        let sub = bus.subscribe();

        set(&mut store, Counter::BestScore, 5000);
        assert_eq!(engine.evaluate(&mut store, &mut bus), 3);
        assert_eq!(engine.evaluate(&mut store, &mut bus), 0);
        assert_eq!(unlocked_ids(&mut bus, sub).len(), 3);
    }

    #[test]
    fn test_perfect_balance_gap() {
        let engine = AchievementEngine::default();
        let mut store = MemoryStore::new();
        let balanced = &engine.find("perfect_balance").unwrap().condition;

        set(&mut store, Counter::AttacksLight, 22);
        set(&mut store, Counter::AttacksDark, 20);
        assert!(!engine.condition_met(balanced, &store));

        set(&mut store, Counter::AttacksDark, 21);
        assert!(engine.condition_met(balanced, &store));

        set(&mut store, Counter::AttacksLight, 19);
        set(&mut store, Counter::AttacksDark, 19);
        assert!(!engine.condition_met(balanced, &store));
    }

    #[test]
    fn test_unlock_flags_are_monotonic_until_cleared() {
        let engine = AchievementEngine::default();
        let mut store = MemoryStore::new();
        let mut bus = EventBus::new();

        set(&mut store, Counter::AttacksTotal, 1);
        engine.evaluate(&mut store, &mut bus);
        assert!(engine.is_unlocked(&store, "first_attack"));

        // Counter going back down does not re-lock
        set(&mut store, Counter::AttacksTotal, 0);
        engine.evaluate(&mut store, &mut bus);
        assert!(engine.is_unlocked(&store, "first_attack"));

        engine.clear_all(&mut store);
        assert_eq!(engine.unlocked_count(&store), 0);
    }

    #[test]
    fn test_unlocked_count_ignores_foreign_flags() {
        let engine = AchievementEngine::default();
        let mut store = MemoryStore::new();
        store.set_bool("ACH_removed_in_update", true);
        assert_eq!(engine.unlocked_count(&store), 0);
    }
}

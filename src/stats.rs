//! Lifetime statistics
//!
//! Durable counters stored write-through: every mutation is flushed and then
//! re-evaluates the achievement catalog before returning, so later logic in
//! the same tick sees any newly unlocked state.

use crate::achievements::AchievementEngine;
use crate::events::EventBus;
use crate::persistence::{KeyValueStore, flush_or_warn};
use crate::{Element, OrbKind};

/// Every durable counter, including the best score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    Runs,
    OrbsTotal,
    OrbsLight,
    OrbsDark,
    OrbsDual,
    WallsTotal,
    WallsLight,
    WallsDark,
    AttacksTotal,
    AttacksLight,
    AttacksDark,
    DeathsTotal,
    DeathsWall,
    DeathsWallLight,
    DeathsWallDark,
    DeathsObstacle,
    BestScore,
}

impl Counter {
    pub const ALL: [Counter; 17] = [
        Counter::Runs,
        Counter::OrbsTotal,
        Counter::OrbsLight,
        Counter::OrbsDark,
        Counter::OrbsDual,
        Counter::WallsTotal,
        Counter::WallsLight,
        Counter::WallsDark,
        Counter::AttacksTotal,
        Counter::AttacksLight,
        Counter::AttacksDark,
        Counter::DeathsTotal,
        Counter::DeathsWall,
        Counter::DeathsWallLight,
        Counter::DeathsWallDark,
        Counter::DeathsObstacle,
        Counter::BestScore,
    ];

    /// Stable storage key
    pub fn key(self) -> &'static str {
        match self {
            Counter::Runs => "STATS_RUNS",
            Counter::OrbsTotal => "STATS_ORBS_TOTAL",
            Counter::OrbsLight => "STATS_ORBS_LIGHT",
            Counter::OrbsDark => "STATS_ORBS_DARK",
            Counter::OrbsDual => "STATS_ORBS_DUAL",
            Counter::WallsTotal => "STATS_WALLS_TOTAL",
            Counter::WallsLight => "STATS_WALLS_LIGHT",
            Counter::WallsDark => "STATS_WALLS_DARK",
            Counter::AttacksTotal => "STATS_ATTACKS_TOTAL",
            Counter::AttacksLight => "STATS_ATTACKS_LIGHT",
            Counter::AttacksDark => "STATS_ATTACKS_DARK",
            Counter::DeathsTotal => "STATS_DEATHS_TOTAL",
            Counter::DeathsWall => "STATS_DEATHS_WALL",
            Counter::DeathsWallLight => "STATS_DEATHS_WALL_LIGHT",
            Counter::DeathsWallDark => "STATS_DEATHS_WALL_DARK",
            Counter::DeathsObstacle => "STATS_DEATHS_OBSTACLE",
            Counter::BestScore => "BEST_SCORE",
        }
    }

    #[inline]
    pub fn read(self, store: &dyn KeyValueStore) -> i64 {
        store.get_int(self.key(), 0)
    }
}

/// Sole writer of durable counters; owns the store and the achievement engine
pub struct StatRecorder {
    store: Box<dyn KeyValueStore>,
    achievements: AchievementEngine,
}

impl std::fmt::Debug for StatRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatRecorder")
            .field("runs", &self.get(Counter::Runs))
            .field("best_score", &self.best_score())
            .field("unlocked", &self.unlocked_count())
            .finish()
    }
}

impl StatRecorder {
    /// Recorder over `store` with the standard achievement catalog
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self::with_engine(store, AchievementEngine::default())
    }

    pub fn with_engine(store: impl KeyValueStore + 'static, achievements: AchievementEngine) -> Self {
        Self {
            store: Box::new(store),
            achievements,
        }
    }

    pub fn get(&self, counter: Counter) -> i64 {
        counter.read(self.store.as_ref())
    }

    pub fn best_score(&self) -> i64 {
        self.get(Counter::BestScore)
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn achievements(&self) -> &AchievementEngine {
        &self.achievements
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.achievements.is_unlocked(self.store.as_ref(), id)
    }

    pub fn unlocked_count(&self) -> usize {
        self.achievements.unlocked_count(self.store.as_ref())
    }

    // -------------------------
    // Mutations (write-through)
    // -------------------------

    pub fn add_run(&mut self, bus: &mut EventBus) {
        self.bump(Counter::Runs, 1);
        self.commit(bus);
    }

    pub fn add_orb(&mut self, kind: OrbKind, bus: &mut EventBus) {
        self.bump(Counter::OrbsTotal, 1);
        let by_kind = match kind {
            OrbKind::Light => Counter::OrbsLight,
            OrbKind::Dark => Counter::OrbsDark,
            OrbKind::Dual => Counter::OrbsDual,
        };
        self.bump(by_kind, 1);
        self.commit(bus);
    }

    /// `wall` is the element of the destroyed walls. Zero is a no-op.
    pub fn add_walls_destroyed(&mut self, wall: Element, amount: u32, bus: &mut EventBus) {
        if amount == 0 {
            return;
        }
        let amount = i64::from(amount);
        self.bump(Counter::WallsTotal, amount);
        let by_kind = match wall {
            Element::Light => Counter::WallsLight,
            Element::Dark => Counter::WallsDark,
        };
        self.bump(by_kind, amount);
        self.commit(bus);
    }

    /// Record a committed attack
    pub fn add_attack(&mut self, kind: Element, bus: &mut EventBus) {
        self.bump(Counter::AttacksTotal, 1);
        let by_kind = match kind {
            Element::Light => Counter::AttacksLight,
            Element::Dark => Counter::AttacksDark,
        };
        self.bump(by_kind, 1);
        self.commit(bus);
    }

    pub fn add_death_wall(&mut self, wall: Element, bus: &mut EventBus) {
        self.bump(Counter::DeathsTotal, 1);
        self.bump(Counter::DeathsWall, 1);
        let by_kind = match wall {
            Element::Light => Counter::DeathsWallLight,
            Element::Dark => Counter::DeathsWallDark,
        };
        self.bump(by_kind, 1);
        self.commit(bus);
    }

    pub fn add_death_obstacle(&mut self, bus: &mut EventBus) {
        self.bump(Counter::DeathsTotal, 1);
        self.bump(Counter::DeathsObstacle, 1);
        self.commit(bus);
    }

    /// Persist `score` if it beats the best. Returns true on a new record.
    /// Achievements are evaluated after the write, so score milestones see it.
    pub fn try_set_best_score(&mut self, score: i64, bus: &mut EventBus) -> bool {
        if score <= self.best_score() {
            return false;
        }
        self.store.set_int(Counter::BestScore.key(), score);
        self.commit(bus);
        true
    }

    /// Re-check the catalog without a mutation (e.g. after loading a save)
    pub fn evaluate_achievements(&mut self, bus: &mut EventBus) -> usize {
        self.achievements.evaluate(self.store.as_mut(), bus)
    }

    // -------------------------
    // Debug clears
    // -------------------------

    /// Delete every stat counter (best score and achievements untouched)
    pub fn clear_stats(&mut self) {
        for counter in Counter::ALL {
            if counter != Counter::BestScore {
                self.store.delete_key(counter.key());
            }
        }
        flush_or_warn(self.store.as_mut());
        log::info!("All stats cleared");
    }

    pub fn clear_best_score(&mut self) {
        self.store.delete_key(Counter::BestScore.key());
        flush_or_warn(self.store.as_mut());
    }

    pub fn clear_achievements(&mut self) {
        self.achievements.clear_all(self.store.as_mut());
    }

    fn bump(&mut self, counter: Counter, amount: i64) {
        let value = counter.read(self.store.as_ref()) + amount;
        self.store.set_int(counter.key(), value);
    }

    fn commit(&mut self, bus: &mut EventBus) {
        flush_or_warn(self.store.as_mut());
        self.achievements.evaluate(self.store.as_mut(), bus);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Notification;
    use crate::persistence::MemoryStore;

    fn unlocked_ids(events: &[Notification]) -> Vec<String> {
        events
            .iter()
            .filter_map(|n| match n {
                Notification::AchievementUnlocked { id, .. } => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_keys_are_unique() {
        let mut keys: Vec<_> = Counter::ALL.iter().map(|c| c.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), Counter::ALL.len());
    }

    #[test]
    fn test_orb_counters() {
        let mut bus = EventBus::new();
        let mut stats = StatRecorder::new(MemoryStore::new());
        stats.add_orb(OrbKind::Light, &mut bus);
        stats.add_orb(OrbKind::Dual, &mut bus);
        stats.add_orb(OrbKind::Dual, &mut bus);

        assert_eq!(stats.get(Counter::OrbsTotal), 3);
        assert_eq!(stats.get(Counter::OrbsLight), 1);
        assert_eq!(stats.get(Counter::OrbsDark), 0);
        assert_eq!(stats.get(Counter::OrbsDual), 2);
    }

    #[test]
    fn test_walls_destroyed_zero_is_noop() {
        let mut bus = EventBus::new();
        let mut stats = StatRecorder::new(MemoryStore::new());
        stats.add_walls_destroyed(Element::Dark, 0, &mut bus);
        assert_eq!(stats.get(Counter::WallsTotal), 0);

        stats.add_walls_destroyed(Element::Dark, 3, &mut bus);
        assert_eq!(stats.get(Counter::WallsTotal), 3);
        assert_eq!(stats.get(Counter::WallsDark), 3);
        assert_eq!(stats.get(Counter::WallsLight), 0);
    }

    #[test]
    fn test_death_counters() {
        let mut bus = EventBus::new();
        let mut stats = StatRecorder::new(MemoryStore::new());
        stats.add_death_wall(Element::Light, &mut bus);
        stats.add_death_obstacle(&mut bus);

        assert_eq!(stats.get(Counter::DeathsTotal), 2);
        assert_eq!(stats.get(Counter::DeathsWall), 1);
        assert_eq!(stats.get(Counter::DeathsWallLight), 1);
        assert_eq!(stats.get(Counter::DeathsObstacle), 1);
    }

    #[test]
    fn test_mutation_unlocks_synchronously() {
        let mut bus = EventBus::new();
        let sub = bus.subscribe();
        let mut stats = StatRecorder::new(MemoryStore::new());

        stats.add_attack(Element::Light, &mut bus);
        // Visible before the caller does anything else
        assert!(stats.is_unlocked("first_attack"));
        assert_eq!(unlocked_ids(&bus.drain(sub)), vec!["first_attack".to_string()]);
    }

    #[test]
    fn test_best_score_only_rises() {
        let mut bus = EventBus::new();
        let mut stats = StatRecorder::new(MemoryStore::new());

        assert!(stats.try_set_best_score(2500, &mut bus));
        assert_eq!(stats.best_score(), 2500);
        assert!(!stats.try_set_best_score(1200, &mut bus));
        assert!(!stats.try_set_best_score(2500, &mut bus));
        assert_eq!(stats.best_score(), 2500);
        assert!(stats.is_unlocked("long_first_flight"));
        assert!(!stats.is_unlocked("max_speed"));
    }

    #[test]
    fn test_clear_stats_keeps_best_and_flags() {
        let mut bus = EventBus::new();
        let mut stats = StatRecorder::new(MemoryStore::new());
        stats.add_run(&mut bus);
        stats.add_death_obstacle(&mut bus);
        stats.try_set_best_score(1500, &mut bus);

        stats.clear_stats();
        assert_eq!(stats.get(Counter::Runs), 0);
        assert_eq!(stats.get(Counter::DeathsTotal), 0);
        assert_eq!(stats.best_score(), 1500);
        assert!(stats.is_unlocked("first_death"));

        stats.clear_best_score();
        assert_eq!(stats.best_score(), 0);
    }
}

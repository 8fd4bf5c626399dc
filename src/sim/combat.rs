//! Attack resolution against elemental barriers
//!
//! Barriers are registered on spawn and unregistered on removal. Handles
//! whose hazard vanished without an unregister are pruned lazily on every
//! query, so a missed notification can never produce a phantom target.

use crate::Element;

use super::world::{Handle, Hazard, HazardKind, World};

#[derive(Debug, Clone, Default)]
pub struct CombatResolver {
    registered: Vec<Handle>,
}

/// Barrier of `target` strictly inside (y_min, y_max)
fn is_target(hazard: &Hazard, target: Element, y_min: f32, y_max: f32) -> bool {
    hazard.kind == HazardKind::Barrier(target) && hazard.pos.y > y_min && hazard.pos.y < y_max
}

impl CombatResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    pub fn is_registered(&self, handle: Handle) -> bool {
        self.registered.contains(&handle)
    }

    /// Idempotent; returns false if already registered
    pub fn register(&mut self, handle: Handle) -> bool {
        if self.is_registered(handle) {
            return false;
        }
        self.registered.push(handle);
        true
    }

    /// Idempotent; returns false if not registered
    pub fn unregister(&mut self, handle: Handle) -> bool {
        let before = self.registered.len();
        self.registered.retain(|&h| h != handle);
        self.registered.len() != before
    }

    pub fn clear(&mut self) {
        self.registered.clear();
    }

    fn prune(&mut self, world: &World) {
        let before = self.registered.len();
        self.registered.retain(|&h| {
            world
                .get(h)
                .is_some_and(|hazard| matches!(hazard.kind, HazardKind::Barrier(_)))
        });
        let pruned = before - self.registered.len();
        if pruned > 0 {
            log::trace!("Pruned {} stale barrier handles", pruned);
        }
    }

    /// Whether an attack of `attack` would hit anything in (y_min, y_max)
    pub fn has_target_in_range(
        &mut self,
        world: &World,
        attack: Element,
        y_min: f32,
        y_max: f32,
    ) -> bool {
        self.prune(world);
        let target = attack.opposite();
        self.registered
            .iter()
            .filter_map(|&h| world.get(h))
            .any(|hazard| is_target(hazard, target, y_min, y_max))
    }

    /// Destroy every opposite-element barrier in (y_min, y_max).
    /// Returns how many were destroyed.
    pub fn resolve_attack(
        &mut self,
        world: &mut World,
        attack: Element,
        y_min: f32,
        y_max: f32,
    ) -> u32 {
        self.prune(world);
        let target = attack.opposite();
        let mut destroyed = 0;
        self.registered.retain(|&h| {
            let hit = world
                .get(h)
                .is_some_and(|hazard| is_target(hazard, target, y_min, y_max));
            if hit {
                world.remove(h);
                destroyed += 1;
            }
            !hit
        });
        if destroyed > 0 {
            log::debug!(
                "{} attack destroyed {} {} barrier(s)",
                attack.as_str(),
                destroyed,
                target.as_str()
            );
        }
        destroyed
    }
}

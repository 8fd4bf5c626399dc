//! Hazard world
//!
//! Generational arena of live hazards. A `Handle` goes stale the moment its
//! hazard is removed, so holders (the combat resolver) can tell a destroyed
//! barrier from a live one without any callback.

use glam::Vec2;

use crate::{Element, OrbKind};

/// Generational reference to a hazard slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardKind {
    /// Single-lane neutral block, lethal on contact
    Obstacle,
    /// Full-width elemental barrier, destroyed only by the opposite attack
    Barrier(Element),
    /// Collectible energy orb
    Orb(OrbKind),
}

impl HazardKind {
    pub fn is_pickup(&self) -> bool {
        matches!(self, HazardKind::Orb(_))
    }

    /// Barriers block every lane at once
    pub fn spans_all_lanes(&self) -> bool {
        matches!(self, HazardKind::Barrier(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hazard {
    pub kind: HazardKind,
    pub pos: Vec2,
    /// `None` for full-width barriers
    pub lane: Option<u8>,
}

impl Hazard {
    pub fn obstacle(lane: u8, pos: Vec2) -> Self {
        Self {
            kind: HazardKind::Obstacle,
            pos,
            lane: Some(lane),
        }
    }

    pub fn barrier(element: Element, pos: Vec2) -> Self {
        Self {
            kind: HazardKind::Barrier(element),
            pos,
            lane: None,
        }
    }

    pub fn orb(kind: OrbKind, lane: u8, pos: Vec2) -> Self {
        Self {
            kind: HazardKind::Orb(kind),
            pos,
            lane: Some(lane),
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    hazard: Option<Hazard>,
}

#[derive(Debug, Clone, Default)]
pub struct World {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn insert(&mut self, hazard: Hazard) -> Handle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.hazard = Some(hazard);
            return Handle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            hazard: Some(hazard),
        });
        Handle {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, handle: Handle) -> Option<&Hazard> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.hazard.as_ref())
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Remove a hazard; its handle (and any copy of it) goes stale
    pub fn remove(&mut self, handle: Handle) -> Option<Hazard> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let hazard = slot.hazard.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        Some(hazard)
    }

    /// Live hazards in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &Hazard)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.hazard.as_ref().map(|h| {
                (
                    Handle {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    h,
                )
            })
        })
    }

    /// Remove every hazard matching `pred`, returning what was removed
    pub fn remove_where(&mut self, mut pred: impl FnMut(&Hazard) -> bool) -> Vec<(Handle, Hazard)> {
        let doomed: Vec<Handle> = self
            .iter()
            .filter(|(_, h)| pred(*h))
            .map(|(handle, _)| handle)
            .collect();
        doomed
            .into_iter()
            .filter_map(|handle| self.remove(handle).map(|h| (handle, h)))
            .collect()
    }

    /// Scroll everything down by `dy`; hazards below `despawn_y` are removed
    pub fn advance(&mut self, dy: f32, despawn_y: f32) -> Vec<(Handle, Hazard)> {
        for slot in &mut self.slots {
            if let Some(h) = slot.hazard.as_mut() {
                h.pos.y -= dy;
            }
        }
        self.remove_where(|h| h.pos.y < despawn_y)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.live = 0;
    }
}

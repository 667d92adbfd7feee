//! # Entity Identifiers — Generational Slot Indices
//!
//! An [`EntityId`] names a row of component data. It owns nothing; the
//! [`ComponentStore`](super::ComponentStore) maps ids to components.
//!
//! Each id pairs a slot index with a generation counter. Destroying an entity
//! bumps its slot's generation before the slot goes back on the free list, so
//! any handle still holding the old generation is recognised as stale instead
//! of silently aliasing whichever entity recycles the slot:
//!
//! ```text
//! EntityId { index: 4, generation: 0 }  ← created
//! destroy → generations[4] = 1
//! EntityId { index: 4, generation: 1 }  ← recycled; the old id is now stale
//! ```
//!
//! Freed slots are recycled first-in-first-out, which spreads reuse across
//! slots and keeps generations low in long sessions that churn entities.

use std::collections::VecDeque;
use std::fmt;

/// A generational entity identifier.
///
/// Only meaningful for the [`Scene`](crate::scene::Scene) that issued it, and
/// only while its generation matches the slot's current generation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl EntityId {
    /// Slot index. Recycled after the entity is destroyed.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot when this id was issued.
    pub fn generation(self) -> u32 {
        self.generation
    }

    pub(crate) fn slot(self) -> usize {
        self.index as usize
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Issues and recycles [`EntityId`]s.
///
/// ```text
/// generations: [1, 0, 2, 0]   ← current generation per slot
/// alive:       [F, T, F, T]   ← whether the slot holds a live entity
/// free:        [0, 2]         ← recyclable slots, oldest first
/// ```
#[derive(Debug, Default)]
pub(crate) struct EntityAllocator {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free: VecDeque<u32>,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue an id, recycling the oldest freed slot if there is one.
    pub fn allocate(&mut self) -> EntityId {
        if let Some(index) = self.free.pop_front() {
            let slot = index as usize;
            self.alive[slot] = true;
            return EntityId {
                index,
                generation: self.generations[slot],
            };
        }

        let index = u32::try_from(self.generations.len()).unwrap_or_else(|_| {
            panic!("entity slot space exhausted ({} slots)", u32::MAX)
        });
        self.generations.push(0);
        self.alive.push(true);
        EntityId {
            index,
            generation: 0,
        }
    }

    /// Release an id. Returns `false` if it was already stale.
    pub fn deallocate(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let slot = id.slot();
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.alive[slot] = false;
        self.free.push_back(id.index);
        true
    }

    /// `true` while `id` refers to a live entity.
    pub fn is_alive(&self, id: EntityId) -> bool {
        let slot = id.slot();
        slot < self.generations.len() && self.alive[slot] && self.generations[slot] == id.generation
    }

    /// `true` if the slot exists but `id` carries an outdated generation or
    /// the slot is currently free.
    pub fn is_stale(&self, id: EntityId) -> bool {
        id.slot() < self.generations.len() && !self.is_alive(id)
    }

    pub fn alive_count(&self) -> usize {
        self.generations.len() - self.free.len()
    }

    pub fn slot_count(&self) -> usize {
        self.generations.len()
    }
}

//! # Storage — One Sparse Set per Component Type
//!
//! Each component type gets its own [`SparseSet<T>`]: a packed `Vec<T>` of
//! values, a parallel packed `Vec<EntityId>` saying who owns each value, and
//! a sparse `Vec<Option<u32>>` indexed by entity slot that points into the
//! packed arrays.
//!
//! ```text
//! sparse:  [Some(1), None, Some(0), None]   ← indexed by EntityId::index
//! ids:     [e2,      e0]                    ← packed, parallel to `dense`
//! dense:   [t2,      t0]                    ← packed component values
//! ```
//!
//! Attach, lookup and removal are O(1). Removal swap-removes from the packed
//! arrays and patches the sparse entry of whichever entity moved. Iterating
//! one type walks only the packed arrays, so it costs O(count of that type)
//! no matter how many entities exist.
//!
//! The sparse entry alone is not trusted: the packed id must also carry the
//! same generation as the caller's id, otherwise the component belongs to an
//! earlier occupant of the slot and is treated as absent.
//!
//! ## Comparison
//!
//! - **EnTT**: same layout, with paging on the sparse array.
//! - **archetype tables** (hecs, bevy): faster multi-component scans, but
//!   adding or removing a component moves the entity between tables.

use std::any::{Any, type_name};

use super::entity::EntityId;

/// Type-erased face of a [`SparseSet`], so the store can hold every
/// component type in one map and drop an entity's components without
/// knowing their types.
pub(crate) trait ComponentStorage: Any + Send + Sync {
    /// Drop the component owned by `id`, if any. Returns whether one existed.
    fn remove_entity(&mut self, id: EntityId) -> bool;

    fn contains(&self, id: EntityId) -> bool;

    fn component_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Packed storage for a single component type.
pub(crate) struct SparseSet<T> {
    dense: Vec<T>,
    ids: Vec<EntityId>,
    sparse: Vec<Option<u32>>,
}

impl<T> Default for SparseSet<T> {
    fn default() -> Self {
        Self {
            dense: Vec::new(),
            ids: Vec::new(),
            sparse: Vec::new(),
        }
    }
}

impl<T> SparseSet<T> {
    fn dense_index(&self, id: EntityId) -> Option<usize> {
        let row = (*self.sparse.get(id.slot())?)? as usize;
        (self.ids[row] == id).then_some(row)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.dense_index(id).is_some()
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.dense_index(id).map(|row| &self.dense[row])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.dense_index(id).map(|row| &mut self.dense[row])
    }

    /// Store `value` for `id`, returning the value it replaced.
    ///
    /// A leftover entry from an earlier generation of the same slot is
    /// evicted rather than returned.
    pub fn insert(&mut self, id: EntityId, value: T) -> Option<T> {
        let slot = id.slot();
        if slot >= self.sparse.len() {
            self.sparse.resize(slot + 1, None);
        }

        if let Some(row) = self.sparse[slot] {
            let row = row as usize;
            let previous = std::mem::replace(&mut self.dense[row], value);
            let owner = std::mem::replace(&mut self.ids[row], id);
            return (owner == id).then_some(previous);
        }

        let row = u32::try_from(self.dense.len())
            .unwrap_or_else(|_| panic!("too many `{}` components", type_name::<T>()));
        self.sparse[slot] = Some(row);
        self.dense.push(value);
        self.ids.push(id);
        None
    }

    /// Insert and hand back a reference to the stored value.
    pub fn insert_and_get(&mut self, id: EntityId, value: T) -> &mut T {
        self.insert(id, value);
        let row = self.sparse[id.slot()].unwrap_or_default() as usize;
        &mut self.dense[row]
    }

    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        let row = self.dense_index(id)?;
        self.sparse[id.slot()] = None;
        self.ids.swap_remove(row);
        let value = self.dense.swap_remove(row);
        if let Some(moved) = self.ids.get(row) {
            self.sparse[moved.slot()] = Some(row as u32);
        }
        Some(value)
    }

    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.ids.iter().copied().zip(self.dense.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.ids.iter().copied().zip(self.dense.iter_mut())
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }
}

impl<T: Send + Sync + 'static> ComponentStorage for SparseSet<T> {
    fn remove_entity(&mut self, id: EntityId) -> bool {
        self.remove(id).is_some()
    }

    fn contains(&self, id: EntityId) -> bool {
        SparseSet::contains(self, id)
    }

    fn component_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

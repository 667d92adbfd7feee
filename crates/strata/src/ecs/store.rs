//! # ComponentStore — Typed Access to Erased Sparse Sets
//!
//! The [`ComponentStore`] maps an [`EntityId`] to at most one value of each
//! component type. It knows nothing about which ids are alive; the owning
//! [`Scene`](crate::scene::Scene) validates handles before calling in, and
//! the sparse sets reject ids whose generation doesn't match.
//!
//! ```text
//! ComponentStore
//!   sets: HashMap<TypeId, Box<dyn ComponentStorage>>
//!     Transform    → SparseSet<Transform>
//!     Name         → SparseSet<Name>
//!     MeshRenderer → SparseSet<MeshRenderer>
//!     Spin (user)  → SparseSet<Spin>
//! ```
//!
//! Two insertion paths exist on purpose. [`attach`](ComponentStore::attach)
//! refuses to overwrite, because a second attach of the same type is almost
//! always a bug. [`insert_or_replace`](ComponentStore::insert_or_replace) is
//! the explicit way to swap a value out.

use std::any::{TypeId, type_name};
use std::collections::HashMap;

use super::entity::EntityId;
use super::storage::{ComponentStorage, SparseSet};
use crate::error::{Result, SceneError};

/// Marker for types that can be stored as components.
///
/// Blanket-implemented for every `'static + Send + Sync` type.
pub trait Component: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Component for T {}

/// Per-type sparse storage for every component in a scene.
#[derive(Default)]
pub struct ComponentStore {
    sets: HashMap<TypeId, Box<dyn ComponentStorage>>,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Typed set access ─────────────────────────────────────────────

    fn set<T: Component>(&self) -> Option<&SparseSet<T>> {
        self.sets
            .get(&TypeId::of::<T>())
            .and_then(|s| s.as_any().downcast_ref::<SparseSet<T>>())
    }

    fn set_mut<T: Component>(&mut self) -> Option<&mut SparseSet<T>> {
        self.sets
            .get_mut(&TypeId::of::<T>())
            .and_then(|s| s.as_any_mut().downcast_mut::<SparseSet<T>>())
    }

    fn set_or_create<T: Component>(&mut self) -> &mut SparseSet<T> {
        let storage = self
            .sets
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(SparseSet::<T>::default()));
        match storage.as_any_mut().downcast_mut::<SparseSet<T>>() {
            Some(set) => set,
            None => unreachable!("storage for `{}` keyed under a foreign TypeId", type_name::<T>()),
        }
    }

    // ── Insertion ────────────────────────────────────────────────────

    /// Attach `value` to `id`.
    ///
    /// Fails with [`SceneError::DuplicateComponent`] if the entity already has
    /// a `T`; the stored value is left untouched.
    pub fn attach<T: Component>(&mut self, id: EntityId, value: T) -> Result<&mut T> {
        if self.has::<T>(id) {
            return Err(SceneError::DuplicateComponent {
                entity: id,
                component: type_name::<T>(),
            });
        }
        Ok(self.set_or_create::<T>().insert_and_get(id, value))
    }

    /// Store `value`, replacing and returning any existing `T`.
    pub fn insert_or_replace<T: Component>(&mut self, id: EntityId, value: T) -> Option<T> {
        self.set_or_create::<T>().insert(id, value)
    }

    // ── Lookup ───────────────────────────────────────────────────────

    pub fn get<T: Component>(&self, id: EntityId) -> Result<&T> {
        self.try_get(id).ok_or_else(|| missing::<T>(id))
    }

    pub fn get_mut<T: Component>(&mut self, id: EntityId) -> Result<&mut T> {
        self.try_get_mut(id).ok_or_else(|| missing::<T>(id))
    }

    pub fn try_get<T: Component>(&self, id: EntityId) -> Option<&T> {
        self.set::<T>()?.get(id)
    }

    pub fn try_get_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        self.set_mut::<T>()?.get_mut(id)
    }

    pub fn has<T: Component>(&self, id: EntityId) -> bool {
        self.set::<T>().is_some_and(|set| set.contains(id))
    }

    // ── Removal ──────────────────────────────────────────────────────

    /// Detach and return the entity's `T`. Absent components yield `None`.
    pub fn remove<T: Component>(&mut self, id: EntityId) -> Option<T> {
        self.set_mut::<T>()?.remove(id)
    }

    /// Drop every component the entity owns. Returns how many were dropped.
    pub fn remove_all(&mut self, id: EntityId) -> usize {
        self.sets
            .values_mut()
            .map(|set| set.remove_entity(id))
            .filter(|&removed| removed)
            .count()
    }

    /// Drop every component of every entity.
    pub fn clear(&mut self) {
        self.sets.clear();
    }

    // ── Iteration ────────────────────────────────────────────────────

    pub fn iter<T: Component>(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.set::<T>().into_iter().flat_map(|set| set.iter())
    }

    pub fn iter_mut<T: Component>(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.set_mut::<T>().into_iter().flat_map(|set| set.iter_mut())
    }

    /// Ids owning a `T`, in packed storage order.
    pub fn entities_with<T: Component>(&self) -> &[EntityId] {
        self.set::<T>().map(SparseSet::ids).unwrap_or_default()
    }

    pub fn count<T: Component>(&self) -> usize {
        self.set::<T>().map_or(0, SparseSet::len)
    }

    /// Names of the component types the entity currently holds.
    pub fn component_names(&self, id: EntityId) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .sets
            .values()
            .filter(|set| set.contains(id))
            .map(|set| set.component_name())
            .collect();
        names.sort_unstable();
        names
    }
}

fn missing<T>(id: EntityId) -> SceneError {
    SceneError::MissingComponent {
        entity: id,
        component: type_name::<T>(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::entity::EntityAllocator;

    #[derive(Debug, PartialEq)]
    struct Health(i32);

    #[derive(Debug, PartialEq)]
    struct Tag;

    fn two_ids() -> (EntityAllocator, EntityId, EntityId) {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        (alloc, a, b)
    }

    #[test]
    fn attach_then_get() {
        let (_, a, _) = two_ids();
        let mut store = ComponentStore::new();
        store.attach(a, Health(10)).unwrap().0 += 5;
        assert_eq!(store.get::<Health>(a).unwrap(), &Health(15));
        assert!(store.has::<Health>(a));
    }

    #[test]
    fn duplicate_attach_is_rejected_and_value_kept() {
        let (_, a, _) = two_ids();
        let mut store = ComponentStore::new();
        store.attach(a, Health(1)).unwrap();
        let err = store.attach(a, Health(2)).unwrap_err();
        assert!(matches!(err, SceneError::DuplicateComponent { entity, .. } if entity == a));
        assert_eq!(store.get::<Health>(a).unwrap(), &Health(1));
    }

    #[test]
    fn insert_or_replace_returns_previous() {
        let (_, a, _) = two_ids();
        let mut store = ComponentStore::new();
        assert_eq!(store.insert_or_replace(a, Health(1)), None);
        assert_eq!(store.insert_or_replace(a, Health(2)), Some(Health(1)));
        assert_eq!(store.get::<Health>(a).unwrap(), &Health(2));
    }

    #[test]
    fn missing_component_error_names_type() {
        let (_, a, _) = two_ids();
        let store = ComponentStore::new();
        match store.get::<Health>(a) {
            Err(SceneError::MissingComponent { component, .. }) => {
                assert!(component.ends_with("Health"));
            }
            other => panic!("expected MissingComponent, got {other:?}"),
        }
        assert!(store.try_get::<Health>(a).is_none());
    }

    #[test]
    fn remove_is_idempotent() {
        let (_, a, _) = two_ids();
        let mut store = ComponentStore::new();
        store.attach(a, Tag).unwrap();
        assert_eq!(store.remove::<Tag>(a), Some(Tag));
        assert_eq!(store.remove::<Tag>(a), None);
        assert_eq!(store.remove::<Health>(a), None);
        assert!(!store.has::<Tag>(a));
    }

    #[test]
    fn remove_all_only_touches_one_entity() {
        let (_, a, b) = two_ids();
        let mut store = ComponentStore::new();
        store.attach(a, Health(1)).unwrap();
        store.attach(a, Tag).unwrap();
        store.attach(b, Health(2)).unwrap();

        assert_eq!(store.remove_all(a), 2);
        assert!(!store.has::<Health>(a));
        assert!(!store.has::<Tag>(a));
        assert_eq!(store.get::<Health>(b).unwrap(), &Health(2));
        assert_eq!(store.remove_all(a), 0);
    }

    #[test]
    fn recycled_id_does_not_see_old_components() {
        let (mut alloc, a, _) = two_ids();
        let mut store = ComponentStore::new();
        store.attach(a, Health(7)).unwrap();
        alloc.deallocate(a);
        let recycled = alloc.allocate();
        assert_eq!(recycled.index(), a.index());
        assert!(!store.has::<Health>(recycled));
        store.attach(recycled, Health(8)).unwrap();
        assert_eq!(store.count::<Health>(), 1);
    }

    #[test]
    fn iteration_and_counts() {
        let (_, a, b) = two_ids();
        let mut store = ComponentStore::new();
        store.attach(a, Health(1)).unwrap();
        store.attach(b, Health(2)).unwrap();
        store.attach(b, Tag).unwrap();

        for (_, h) in store.iter_mut::<Health>() {
            h.0 *= 10;
        }
        let total: i32 = store.iter::<Health>().map(|(_, h)| h.0).sum();
        assert_eq!(total, 30);
        assert_eq!(store.count::<Tag>(), 1);
        assert_eq!(store.entities_with::<Tag>(), &[b]);
        assert!(store.entities_with::<String>().is_empty());
        assert_eq!(store.iter::<String>().count(), 0);
    }

    #[test]
    fn component_names_lists_held_types() {
        let (_, a, _) = two_ids();
        let mut store = ComponentStore::new();
        store.attach(a, Tag).unwrap();
        store.attach(a, Health(0)).unwrap();
        let names = store.component_names(a);
        assert_eq!(names.len(), 2);
        assert!(names.iter().any(|n| n.ends_with("Health")));
    }
}

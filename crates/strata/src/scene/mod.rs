//! # Scene — Entities, Components and Draw Order
//!
//! A [`Scene`] owns a [`ComponentStore`], the allocator that issues its
//! entity ids, and the root sequence: every live entity in creation order.
//! There is no parenting; the root sequence is the whole graph, and it is
//! also the order in which entities are drawn.
//!
//! ```text
//! Scene "level-1" (SceneId 3)
//!   allocator: slots 0..n with generations
//!   store:     Transform, Name, MeshRenderer, user types...
//!   roots:     [e0, e2, e5]          ← live entities, creation order
//!   serials:   slot → spawn serial   ← sorts draws back into root order
//! ```
//!
//! ## Rendering
//!
//! [`Scene::render`] walks only the packed `MeshRenderer` set, never the full
//! root list, so scenes with many non-drawable entities stay cheap. Packed
//! storage order changes with swap-removes, so the drawables are sorted by
//! spawn serial in a scratch queue that is taken out of the scene for the
//! duration of the pass and put back afterwards, keeping its allocation.
//!
//! ## Deferred destruction
//!
//! Destroying while iterating [`roots`](Scene::roots) can't borrow-check.
//! [`queue_destroy`](Scene::queue_destroy) records the handle instead and
//! [`flush_destroy_queue`](Scene::flush_destroy_queue) (run automatically at
//! the start of every render) applies them.

mod components;
mod entity;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::backend::RenderTarget;
use crate::ecs::{Component, ComponentStore, EntityAllocator, EntityId};
use crate::error::{Result, SceneError};
use crate::logging::ENGINE_TARGET;
use crate::math::Transform;

pub use components::{MeshRenderer, Name};
pub use entity::{Entity, EntityMut};

static NEXT_SCENE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique scene identifier. Ties entity handles to their scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(u64);

impl SceneId {
    fn next() -> Self {
        Self(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene#{}", self.0)
    }
}

pub struct Scene {
    id: SceneId,
    name: String,
    allocator: EntityAllocator,
    store: ComponentStore,
    roots: Vec<Entity>,
    /// Spawn serial per slot; only meaningful while the slot is alive.
    serials: Vec<u64>,
    next_serial: u64,
    destroy_queue: Vec<Entity>,
    render_queue: Vec<(u64, EntityId)>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SceneId::next(),
            name: name.into(),
            allocator: EntityAllocator::new(),
            store: ComponentStore::new(),
            roots: Vec::new(),
            serials: Vec::new(),
            next_serial: 0,
            destroy_queue: Vec::new(),
            render_queue: Vec::new(),
        }
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ── Handle validation ────────────────────────────────────────────

    fn resolve(&self, entity: Entity) -> Result<EntityId> {
        match entity.scene {
            None => Err(SceneError::InvalidEntity),
            Some(scene) if scene != self.id => Err(SceneError::ForeignEntity { entity: entity.id }),
            Some(_) if self.allocator.is_stale(entity.id) => {
                Err(SceneError::StaleEntity { entity: entity.id })
            }
            Some(_) if !self.allocator.is_alive(entity.id) => Err(SceneError::InvalidEntity),
            Some(_) => Ok(entity.id),
        }
    }

    /// `true` if `entity` was issued by this scene and not yet destroyed.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.resolve(entity).is_ok()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Create an entity with a default [`Transform`] and the given [`Name`],
    /// appended to the end of the root sequence.
    pub fn create_entity(&mut self, name: impl Into<String>) -> Entity {
        let id = self.allocator.allocate();
        let entity = Entity::new(id, self.id);
        let name = Name::new(name);

        log::trace!(target: ENGINE_TARGET, "{}: create {} '{}'", self.name, id, name);

        let slots = self.allocator.slot_count();
        if self.serials.len() < slots {
            self.serials.resize(slots, 0);
        }
        self.serials[id.slot()] = self.next_serial;
        self.next_serial += 1;

        // Fresh ids carry no components, so neither insert can collide.
        self.store.insert_or_replace(id, Transform::default());
        self.store.insert_or_replace(id, name);
        self.roots.push(entity);
        entity
    }

    /// Create an entity and return a builder for attaching more components.
    pub fn spawn(&mut self, name: impl Into<String>) -> EntityMut<'_> {
        let entity = self.create_entity(name);
        EntityMut::new(self, entity)
    }

    /// Borrow a validated entity for several operations in a row.
    pub fn entity_mut(&mut self, entity: Entity) -> Result<EntityMut<'_>> {
        self.resolve(entity)?;
        Ok(EntityMut::new(self, entity))
    }

    /// Drop every component of `entity` and remove it from the roots. Its
    /// handle, and every copy of it, is stale afterwards.
    pub fn destroy_entity(&mut self, entity: Entity) -> Result<()> {
        let id = self.resolve(entity)?;
        let dropped = self.store.remove_all(id);
        if let Some(pos) = self.roots.iter().position(|e| *e == entity) {
            self.roots.remove(pos);
        }
        self.allocator.deallocate(id);
        log::trace!(target: ENGINE_TARGET, "{}: destroy {id} ({dropped} components)", self.name);
        Ok(())
    }

    /// Destroy `entity` at the next [`flush_destroy_queue`](Self::flush_destroy_queue).
    pub fn queue_destroy(&mut self, entity: Entity) -> Result<()> {
        self.resolve(entity)?;
        self.destroy_queue.push(entity);
        Ok(())
    }

    /// Apply queued destroys. Handles that died in the meantime (or were
    /// queued twice) are skipped. Returns how many entities were destroyed.
    pub fn flush_destroy_queue(&mut self) -> usize {
        let mut queue = std::mem::take(&mut self.destroy_queue);
        let destroyed = queue
            .drain(..)
            .filter(|&entity| self.destroy_entity(entity).is_ok())
            .count();
        self.destroy_queue = queue;
        destroyed
    }

    /// Destroy every entity.
    pub fn clear(&mut self) {
        for entity in std::mem::take(&mut self.roots) {
            self.allocator.deallocate(entity.id);
        }
        self.store.clear();
        self.destroy_queue.clear();
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Live entities in creation order.
    pub fn roots(&self) -> &[Entity] {
        &self.roots
    }

    pub fn entity_count(&self) -> usize {
        debug_assert_eq!(self.roots.len(), self.allocator.alive_count());
        self.roots.len()
    }

    /// First entity in root order whose [`Name`] equals `name`.
    pub fn find_by_name(&self, name: &str) -> Option<Entity> {
        self.roots.iter().copied().find(|e| {
            self.store
                .try_get::<Name>(e.id)
                .is_some_and(|n| n.as_str() == name)
        })
    }

    // ── Components ───────────────────────────────────────────────────

    /// Attach a component. A second component of the same type is rejected
    /// with [`SceneError::DuplicateComponent`].
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> Result<&mut T> {
        let id = self.resolve(entity)?;
        self.store.attach(id, component)
    }

    /// Attach or overwrite a component, returning the old value.
    pub fn insert_component<T: Component>(&mut self, entity: Entity, component: T) -> Result<Option<T>> {
        let id = self.resolve(entity)?;
        Ok(self.store.insert_or_replace(id, component))
    }

    pub fn get_component<T: Component>(&self, entity: Entity) -> Result<&T> {
        let id = self.resolve(entity)?;
        self.store.get(id)
    }

    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T> {
        let id = self.resolve(entity)?;
        self.store.get_mut(id)
    }

    /// Never fails: invalid handles simply have no components.
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.resolve(entity).is_ok_and(|id| self.store.has::<T>(id))
    }

    /// Detach a component. Removing an absent component is `Ok(None)`.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<Option<T>> {
        let id = self.resolve(entity)?;
        Ok(self.store.remove(id))
    }

    pub fn transform_mut(&mut self, entity: Entity) -> Result<&mut Transform> {
        self.get_component_mut(entity)
    }

    /// Every `T` with its entity, in storage order.
    pub fn iter<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> {
        let scene = self.id;
        self.store.iter::<T>().map(move |(id, c)| (Entity::new(id, scene), c))
    }

    pub fn iter_mut<T: Component>(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        let scene = self.id;
        self.store.iter_mut::<T>().map(move |(id, c)| (Entity::new(id, scene), c))
    }

    pub fn count<T: Component>(&self) -> usize {
        self.store.count::<T>()
    }

    /// Read-only view of the raw component store.
    pub fn store(&self) -> &ComponentStore {
        &self.store
    }

    // ── Rendering ────────────────────────────────────────────────────

    /// Issue one draw per visible [`MeshRenderer`] that has a [`Transform`],
    /// in root order. Flushes the destroy queue first. Returns the number of
    /// draws.
    pub fn render(&mut self, target: &mut dyn RenderTarget) -> usize {
        self.flush_destroy_queue();

        let mut queue = std::mem::take(&mut self.render_queue);
        queue.clear();
        queue.extend(
            self.store
                .entities_with::<MeshRenderer>()
                .iter()
                .map(|&id| (self.serials[id.slot()], id)),
        );
        queue.sort_unstable_by_key(|&(serial, _)| serial);

        let mut draws = 0;
        for &(_, id) in &queue {
            let Some(&renderer) = self.store.try_get::<MeshRenderer>(id) else {
                continue;
            };
            if !renderer.visible {
                continue;
            }
            let Some(transform) = self.store.try_get_mut::<Transform>(id) else {
                continue;
            };
            target.draw(renderer.mesh, renderer.material, &transform.matrix());
            draws += 1;
        }

        self.render_queue = queue;
        draws
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("entities", &self.roots.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessWindow;
    use crate::mesh::{MaterialHandle, MeshHandle};

    #[derive(Debug, PartialEq)]
    struct Health(u32);

    fn renderer(mesh: usize) -> MeshRenderer {
        MeshRenderer::new(MeshHandle(mesh), MaterialHandle(0))
    }

    #[test]
    fn create_attaches_transform_and_name() {
        let mut scene = Scene::new("test");
        let e = scene.create_entity("player");
        assert!(scene.has_component::<Transform>(e));
        assert_eq!(scene.get_component::<Name>(e).unwrap().as_str(), "player");
        assert_eq!(scene.roots(), &[e]);
        assert_eq!(scene.entity_count(), 1);
    }

    #[test]
    fn null_handle_is_rejected() {
        let mut scene = Scene::new("test");
        let null = Entity::default();
        assert!(null.is_null());
        assert_eq!(scene.add_component(null, Health(1)).unwrap_err(), SceneError::InvalidEntity);
        assert_eq!(scene.get_component::<Name>(null).unwrap_err(), SceneError::InvalidEntity);
        assert_eq!(scene.destroy_entity(null), Err(SceneError::InvalidEntity));
        assert!(!scene.has_component::<Transform>(null));
        assert!(scene.entity_mut(null).is_err());
    }

    #[test]
    fn foreign_handle_is_rejected() {
        let mut a = Scene::new("a");
        let mut b = Scene::new("b");
        let in_a = a.create_entity("x");
        b.create_entity("y");
        assert_ne!(a.id(), b.id());
        assert!(matches!(
            b.get_component::<Name>(in_a),
            Err(SceneError::ForeignEntity { .. })
        ));
        assert!(!b.has_component::<Name>(in_a));
        assert!(b.destroy_entity(in_a).is_err());
        assert!(a.is_alive(in_a));
    }

    #[test]
    fn destroyed_handle_is_stale() {
        let mut scene = Scene::new("test");
        let e = scene.create_entity("doomed");
        scene.destroy_entity(e).unwrap();
        assert_eq!(
            scene.get_component::<Name>(e).unwrap_err(),
            SceneError::StaleEntity { entity: e.id() }
        );
        assert!(!scene.has_component::<Name>(e));
        assert!(scene.roots().is_empty());

        // The slot is recycled with a new generation; the old handle stays dead.
        let fresh = scene.create_entity("fresh");
        assert_eq!(fresh.id().index(), e.id().index());
        assert!(!scene.is_alive(e));
        assert!(scene.is_alive(fresh));
    }

    #[test]
    fn entity_count_agrees_with_allocator_through_churn() {
        let mut scene = Scene::new("test");
        let a = scene.create_entity("a");
        scene.create_entity("b");
        scene.destroy_entity(a).unwrap();
        assert_eq!(scene.entity_count(), 1);
        assert_eq!(scene.allocator.alive_count(), 1);

        scene.clear();
        assert_eq!(scene.entity_count(), 0);
        scene.create_entity("c");
        assert_eq!(scene.entity_count(), 1);
        assert_eq!(scene.allocator.slot_count(), 2, "freed slots are reused");
        assert_eq!(scene.serials.len(), 2);
    }

    #[test]
    fn duplicate_add_keeps_first_value() {
        let mut scene = Scene::new("test");
        let e = scene.create_entity("e");
        scene.add_component(e, Health(5)).unwrap();
        assert!(matches!(
            scene.add_component(e, Health(9)),
            Err(SceneError::DuplicateComponent { .. })
        ));
        assert_eq!(scene.get_component::<Health>(e).unwrap(), &Health(5));
        assert_eq!(scene.insert_component(e, Health(9)).unwrap(), Some(Health(5)));
    }

    #[test]
    fn remove_component_is_idempotent() {
        let mut scene = Scene::new("test");
        let e = scene.create_entity("e");
        assert_eq!(scene.remove_component::<Health>(e), Ok(None));
        scene.add_component(e, Health(1)).unwrap();
        assert_eq!(scene.remove_component::<Health>(e), Ok(Some(Health(1))));
        assert_eq!(scene.remove_component::<Health>(e), Ok(None));
    }

    #[test]
    fn entity_handle_forwards_to_scene() {
        let mut scene = Scene::new("test");
        let e = scene.create_entity("e");
        e.add_component(&mut scene, Health(3)).unwrap();
        e.get_component_mut::<Health>(&mut scene).unwrap().0 += 1;
        assert_eq!(e.get_component::<Health>(&scene).unwrap(), &Health(4));
        assert!(e.has_component::<Health>(&scene));
        assert_eq!(e.remove_component::<Health>(&mut scene).unwrap(), Some(Health(4)));
    }

    #[test]
    fn spawn_builder_chains_inserts() {
        let mut scene = Scene::new("test");
        let e = scene
            .spawn("ship")
            .insert(Health(10))
            .and_then(|b| b.insert(renderer(0)))
            .unwrap()
            .entity();
        assert!(scene.has_component::<Health>(e));
        assert!(scene.has_component::<MeshRenderer>(e));

        let mut view = scene.entity_mut(e).unwrap();
        view.transform_mut().unwrap().set_position(glam::Vec3::X);
        assert!(view.insert(Health(1)).is_err());
    }

    #[test]
    fn find_by_name_returns_first_in_root_order() {
        let mut scene = Scene::new("test");
        let first = scene.create_entity("twin");
        let second = scene.create_entity("twin");
        assert_eq!(scene.find_by_name("twin"), Some(first));
        scene.destroy_entity(first).unwrap();
        assert_eq!(scene.find_by_name("twin"), Some(second));
        assert_eq!(scene.find_by_name("nobody"), None);
    }

    #[test]
    fn queued_destroys_apply_on_flush() {
        let mut scene = Scene::new("test");
        let doomed: Vec<_> = (0..3).map(|i| scene.create_entity(format!("e{i}"))).collect();
        let keeper = scene.create_entity("keeper");
        for &e in scene.roots().to_vec().iter().filter(|e| **e != keeper) {
            scene.queue_destroy(e).unwrap();
        }
        scene.queue_destroy(doomed[0]).unwrap();
        assert_eq!(scene.entity_count(), 4);
        assert_eq!(scene.flush_destroy_queue(), 3);
        assert_eq!(scene.roots(), &[keeper]);
        assert_eq!(scene.flush_destroy_queue(), 0);
    }

    #[test]
    fn clear_destroys_everything() {
        let mut scene = Scene::new("test");
        let a = scene.create_entity("a");
        scene.add_component(a, Health(1)).unwrap();
        scene.clear();
        assert_eq!(scene.entity_count(), 0);
        assert!(!scene.is_alive(a));
        assert_eq!(scene.count::<Health>(), 0);
        let b = scene.create_entity("b");
        assert!(!scene.has_component::<Health>(b));
    }

    #[test]
    fn render_follows_root_order_after_churn() {
        let mut scene = Scene::new("test");
        let a = scene.create_entity("a");
        let b = scene.create_entity("b");
        let c = scene.create_entity("c");
        for (i, e) in [a, b, c].into_iter().enumerate() {
            scene.add_component(e, renderer(i)).unwrap();
        }
        // Removing `a` swap-moves `c` to the front of the packed set.
        scene.destroy_entity(a).unwrap();
        let d = scene.create_entity("d");
        scene.add_component(d, renderer(3)).unwrap();

        let mut window = HeadlessWindow::default();
        assert_eq!(scene.render(&mut window), 3);
        let order: Vec<_> = window.draws().iter().map(|(m, _, _)| m.index()).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn render_skips_hidden_and_uses_cached_matrix() {
        let mut scene = Scene::new("test");
        let shown = scene.create_entity("shown");
        let hidden = scene.create_entity("hidden");
        let _plain = scene.create_entity("no renderer");
        scene.add_component(shown, renderer(0)).unwrap();
        scene.add_component(hidden, renderer(1).hidden()).unwrap();
        scene
            .transform_mut(shown)
            .unwrap()
            .set_position(glam::Vec3::new(0.0, 2.0, 0.0));

        let mut window = HeadlessWindow::default();
        assert_eq!(scene.render(&mut window), 1);
        let (_, _, model) = window.draws()[0];
        assert_eq!(model.w_axis.y, 2.0);
        assert!(!scene.get_component::<Transform>(shown).unwrap().is_dirty());
    }

    #[test]
    fn render_flushes_destroy_queue() {
        let mut scene = Scene::new("test");
        let e = scene.create_entity("e");
        scene.add_component(e, renderer(0)).unwrap();
        scene.queue_destroy(e).unwrap();
        let mut window = HeadlessWindow::default();
        assert_eq!(scene.render(&mut window), 0);
        assert!(!scene.is_alive(e));
    }

    #[test]
    fn iter_yields_scene_handles() {
        let mut scene = Scene::new("test");
        let a = scene.create_entity("a");
        scene.add_component(a, Health(2)).unwrap();
        for (_, h) in scene.iter_mut::<Health>() {
            h.0 *= 2;
        }
        let collected: Vec<_> = scene.iter::<Health>().map(|(e, h)| (e, h.0)).collect();
        assert_eq!(collected, vec![(a, 4)]);
    }
}

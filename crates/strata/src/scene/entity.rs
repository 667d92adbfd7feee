//! Entity handles.
//!
//! An [`Entity`] is an [`EntityId`] tagged with the [`SceneId`] that issued
//! it. It is `Copy` and owns nothing: component operations take the owning
//! scene explicitly and are validated against it, so a handle that outlived
//! its entity, or wandered into another scene, fails loudly instead of
//! touching the wrong data.
//!
//! [`EntityMut`] is the borrowed, builder-style alternative: validation
//! happens once when it is created, and it can chain component inserts the
//! way [`Scene::spawn`] does.

use std::fmt;

use super::{Scene, SceneId};
use crate::ecs::{Component, EntityId};
use crate::error::Result;
use crate::math::Transform;

/// A handle to an entity within one [`Scene`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    pub(crate) id: EntityId,
    pub(crate) scene: Option<SceneId>,
}

impl Entity {
    /// The null handle. Every scene operation rejects it.
    pub const NULL: Self = Self {
        id: EntityId {
            index: u32::MAX,
            generation: 0,
        },
        scene: None,
    };

    pub(crate) fn new(id: EntityId, scene: SceneId) -> Self {
        Self {
            id,
            scene: Some(scene),
        }
    }

    /// `true` for the default-constructed handle.
    pub fn is_null(self) -> bool {
        self.scene.is_none()
    }

    pub fn id(self) -> EntityId {
        self.id
    }

    pub fn scene_id(self) -> Option<SceneId> {
        self.scene
    }

    // ── Forwarding to the owning scene ───────────────────────────────

    pub fn add_component<T: Component>(self, scene: &mut Scene, component: T) -> Result<&mut T> {
        scene.add_component(self, component)
    }

    pub fn get_component<T: Component>(self, scene: &Scene) -> Result<&T> {
        scene.get_component(self)
    }

    pub fn get_component_mut<T: Component>(self, scene: &mut Scene) -> Result<&mut T> {
        scene.get_component_mut(self)
    }

    /// `false` for absent components and for any invalid handle.
    pub fn has_component<T: Component>(self, scene: &Scene) -> bool {
        scene.has_component::<T>(self)
    }

    pub fn remove_component<T: Component>(self, scene: &mut Scene) -> Result<Option<T>> {
        scene.remove_component(self)
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scene {
            Some(scene) => write!(f, "Entity({}@{})", self.id, scene),
            None => f.write_str("Entity(null)"),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scene {
            Some(_) => write!(f, "{}", self.id),
            None => f.write_str("null"),
        }
    }
}

/// A validated, mutably borrowed entity.
///
/// ```ignore
/// let ship = scene
///     .spawn("ship")
///     .insert(MeshRenderer::new(cube, red))?
///     .insert(Velocity::default())?
///     .entity();
/// ```
pub struct EntityMut<'s> {
    scene: &'s mut Scene,
    entity: Entity,
}

impl<'s> EntityMut<'s> {
    pub(crate) fn new(scene: &'s mut Scene, entity: Entity) -> Self {
        Self { scene, entity }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Attach a component and keep building.
    pub fn insert<T: Component>(self, component: T) -> Result<Self> {
        self.scene.add_component(self.entity, component)?;
        Ok(self)
    }

    pub fn add_component<T: Component>(&mut self, component: T) -> Result<&mut T> {
        self.scene.add_component(self.entity, component)
    }

    pub fn get_component<T: Component>(&self) -> Result<&T> {
        self.scene.get_component(self.entity)
    }

    pub fn get_component_mut<T: Component>(&mut self) -> Result<&mut T> {
        self.scene.get_component_mut(self.entity)
    }

    pub fn has_component<T: Component>(&self) -> bool {
        self.scene.has_component::<T>(self.entity)
    }

    pub fn remove_component<T: Component>(&mut self) -> Result<Option<T>> {
        self.scene.remove_component(self.entity)
    }

    pub fn transform_mut(&mut self) -> Result<&mut Transform> {
        self.scene.get_component_mut(self.entity)
    }

    /// Destroy the entity, ending the borrow.
    pub fn destroy(self) -> Result<()> {
        self.scene.destroy_entity(self.entity)
    }
}

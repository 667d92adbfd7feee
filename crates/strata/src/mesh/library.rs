//! Mesh and material registries with change tracking.
//!
//! Both libraries are append-only: handles stay valid for the life of the
//! library. Every add or edit marks the entry pending, and the application
//! drains the pending list once per frame to push new data to the backend.

use super::{Material, MaterialHandle, MeshData, MeshHandle, MeshSource, PrimitiveShape, shapes};
use crate::error::{Result, SceneError};

struct MeshEntry {
    data: MeshData,
    source: MeshSource,
}

/// All meshes known to the application.
#[derive(Default)]
pub struct MeshLibrary {
    entries: Vec<MeshEntry>,
    pending: Vec<MeshHandle>,
}

impl MeshLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, data: MeshData, source: MeshSource) -> MeshHandle {
        let handle = MeshHandle(self.entries.len());
        log::debug!(
            target: crate::logging::ENGINE_TARGET,
            "mesh {} registered ({source:?}, {} triangles)",
            handle.0,
            data.triangle_count()
        );
        self.entries.push(MeshEntry { data, source });
        self.pending.push(handle);
        handle
    }

    /// Generate and register a primitive.
    pub fn add_primitive(&mut self, shape: PrimitiveShape) -> MeshHandle {
        self.push(shapes::generate(&shape), MeshSource::Primitive(shape))
    }

    /// Register caller-supplied geometry. It is never regenerated.
    pub fn add_custom(&mut self, data: MeshData) -> MeshHandle {
        self.push(data, MeshSource::Custom)
    }

    pub fn get(&self, handle: MeshHandle) -> Option<&MeshData> {
        self.entries.get(handle.0).map(|e| &e.data)
    }

    pub fn source(&self, handle: MeshHandle) -> Option<MeshSource> {
        self.entries.get(handle.0).map(|e| e.source)
    }

    /// Regenerate a primitive mesh with new parameters.
    ///
    /// Fails for unknown handles and for custom meshes, whose data the
    /// library cannot reproduce.
    pub fn set_primitive(&mut self, handle: MeshHandle, shape: PrimitiveShape) -> Result<()> {
        let entry = self.entries.get_mut(handle.0).ok_or(SceneError::UnknownHandle {
            kind: "mesh",
            index: handle.0,
        })?;
        if entry.source == MeshSource::Custom {
            return Err(SceneError::CustomMeshRegeneration { index: handle.0 });
        }
        entry.data = shapes::generate(&shape);
        entry.source = MeshSource::Primitive(shape);
        if !self.pending.contains(&handle) {
            self.pending.push(handle);
        }
        Ok(())
    }

    /// Handles whose data changed since the last call, oldest first.
    pub fn take_pending(&mut self) -> Vec<MeshHandle> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All materials known to the application.
#[derive(Default)]
pub struct MaterialLibrary {
    materials: Vec<Material>,
    pending: Vec<MaterialHandle>,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, material: Material) -> MaterialHandle {
        let handle = MaterialHandle(self.materials.len());
        self.materials.push(material);
        self.pending.push(handle);
        handle
    }

    pub fn get(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(handle.0)
    }

    pub fn set(&mut self, handle: MaterialHandle, material: Material) -> Result<()> {
        let slot = self.materials.get_mut(handle.0).ok_or(SceneError::UnknownHandle {
            kind: "material",
            index: handle.0,
        })?;
        *slot = material;
        if !self.pending.contains(&handle) {
            self.pending.push(handle);
        }
        Ok(())
    }

    pub fn take_pending(&mut self) -> Vec<MaterialHandle> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

/// The application's asset registries, handed to layers every frame.
#[derive(Default)]
pub struct Assets {
    pub meshes: MeshLibrary,
    pub materials: MaterialLibrary,
}

impl Assets {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Color;

    #[test]
    fn primitive_is_generated_and_pending() {
        let mut lib = MeshLibrary::new();
        let cube = lib.add_primitive(PrimitiveShape::UNIT_CUBE);
        assert_eq!(lib.get(cube).unwrap().vertices.len(), 24);
        assert_eq!(lib.source(cube), Some(MeshSource::Primitive(PrimitiveShape::UNIT_CUBE)));
        assert_eq!(lib.take_pending(), vec![cube]);
        assert!(lib.take_pending().is_empty());
    }

    #[test]
    fn set_primitive_regenerates_once_per_drain() {
        let mut lib = MeshLibrary::new();
        let mesh = lib.add_primitive(PrimitiveShape::UNIT_PLANE);
        lib.take_pending();

        let bigger = PrimitiveShape::Plane { width: 10.0, length: 10.0 };
        lib.set_primitive(mesh, bigger).unwrap();
        lib.set_primitive(mesh, bigger).unwrap();
        assert_eq!(lib.take_pending(), vec![mesh]);
        assert_eq!(lib.get(mesh).unwrap().vertices[1].position[0], 5.0);
    }

    #[test]
    fn custom_mesh_is_never_regenerated() {
        let mut lib = MeshLibrary::new();
        let custom = lib.add_custom(MeshData::default());
        let err = lib.set_primitive(custom, PrimitiveShape::UNIT_CUBE).unwrap_err();
        assert_eq!(err, SceneError::CustomMeshRegeneration { index: custom.index() });
        assert_eq!(lib.get(custom), Some(&MeshData::default()));
    }

    #[test]
    fn unknown_handles_are_reported() {
        let mut lib = MeshLibrary::new();
        assert!(matches!(
            lib.set_primitive(MeshHandle(3), PrimitiveShape::UNIT_CUBE),
            Err(SceneError::UnknownHandle { kind: "mesh", index: 3 })
        ));
        let mut mats = MaterialLibrary::new();
        assert!(mats.set(MaterialHandle(0), Material::default()).is_err());
    }

    #[test]
    fn material_edits_are_tracked() {
        let mut mats = MaterialLibrary::new();
        let red = mats.add(Material::new(Color::RED));
        assert_eq!(mats.take_pending(), vec![red]);
        mats.set(red, Material::new(Color::BLUE)).unwrap();
        assert_eq!(mats.get(red).unwrap().base_color, Color::BLUE);
        assert_eq!(mats.take_pending(), vec![red]);
        assert_eq!(mats.len(), 1);
    }
}

//! Error types.
//!
//! Errors fall into three classes, and each class has its own home:
//!
//! - **Usage errors** ([`SceneError`], [`TransformError`]): null, stale or
//!   foreign entity handles, duplicate or missing components, degenerate
//!   transforms. These are programming bugs and are returned to the caller
//!   immediately.
//! - **Layer failures**: anything a layer callback returns as
//!   `anyhow::Error`. The frame loop logs these and moves on to the next
//!   layer; they never reach this module.
//! - **Lifecycle failures** ([`AppError`], [`BackendError`]): backend
//!   initialization, layer attach, configuration and logging setup. These
//!   stop the application.

use thiserror::Error;

use crate::ecs::EntityId;

/// Result alias for scene and component operations.
pub type Result<T, E = SceneError> = std::result::Result<T, E>;

/// Misuse of entity handles or component storage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// The handle is the null entity (default-constructed).
    #[error("invalid entity: the null handle cannot be used for component operations")]
    InvalidEntity,

    /// The handle was issued by a different scene.
    #[error("entity {entity} belongs to a different scene")]
    ForeignEntity { entity: EntityId },

    /// The handle refers to an entity that has been destroyed.
    #[error("entity {entity} has been destroyed")]
    StaleEntity { entity: EntityId },

    /// A component of this type is already attached to the entity.
    #[error("entity {entity} already has a `{component}` component")]
    DuplicateComponent {
        entity: EntityId,
        component: &'static str,
    },

    /// The entity has no component of this type.
    #[error("entity {entity} has no `{component}` component")]
    MissingComponent {
        entity: EntityId,
        component: &'static str,
    },

    /// No mesh or material is registered under the handle.
    #[error("unknown {kind} handle {index}")]
    UnknownHandle { kind: &'static str, index: usize },

    /// Custom meshes are never regenerated from shape parameters.
    #[error("mesh {index} is a custom mesh and cannot be regenerated")]
    CustomMeshRegeneration { index: usize },
}

/// Degenerate transform math.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum TransformError {
    /// The composite matrix has no inverse (zero scale on some axis).
    #[error("transform matrix is singular (determinant {determinant})")]
    Singular { determinant: f32 },
}

/// Failures reported by a render/window/UI backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The presentation surface was lost or outdated and has been
    /// reconfigured. The current frame is skipped.
    #[error("presentation surface lost; frame skipped")]
    SurfaceLost,

    /// The GPU ran out of memory.
    #[error("out of GPU memory")]
    OutOfMemory,

    /// Any other surface acquisition failure.
    #[error("surface error: {0}")]
    Surface(String),

    /// The backend could not be created.
    #[error("backend initialization failed: {0}")]
    Init(String),

    /// UI pass brackets were unbalanced.
    #[error("UI pass misuse: {0}")]
    UiPass(&'static str),
}

/// Fatal application-level failures.
#[derive(Error, Debug)]
pub enum AppError {
    /// A backend failure that the frame loop cannot recover from.
    #[error("backend failure: {0}")]
    Backend(#[from] BackendError),

    /// A layer's attach hook failed; the layer was not pushed.
    #[error("layer `{layer}` failed to attach: {source}")]
    LayerAttach {
        layer: String,
        #[source]
        source: anyhow::Error,
    },

    /// The configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// File I/O failed (configuration or log file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The logging sink could not be installed.
    #[error("logging setup failed: {0}")]
    Logging(String),
}

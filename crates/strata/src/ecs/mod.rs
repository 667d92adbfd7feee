//! Entity identifiers and sparse per-type component storage.
//!
//! - [`entity`]: generational [`EntityId`]s and their allocator.
//! - [`storage`]: the sparse set backing one component type.
//! - [`store`]: [`ComponentStore`], the typed front over all sparse sets.

pub mod entity;
pub(crate) mod storage;
pub mod store;

pub(crate) use entity::EntityAllocator;
pub use entity::EntityId;
pub use store::{Component, ComponentStore};

//! # Layer — Ordered Units of Per-Frame Logic
//!
//! A [`Layer`] is a boxed object with an attach/detach lifecycle and two
//! per-frame hooks: [`on_update`](Layer::on_update) and
//! [`on_ui`](Layer::on_ui). Layers live in a [`LayerStack`] split in two by
//! an overlay boundary:
//!
//! ```text
//!            normal layers          │  overlays
//!   [ game ][ physics-debug ]  ◄────┼──── push_layer inserts here
//!                                   │ [ stats ][ console ]  ◄── push_overlay appends
//!                               boundary
//! ```
//!
//! Every pass iterates front to back, so normal layers always run before
//! overlays no matter the push order: `push_layer(A)`, `push_overlay(X)`,
//! `push_layer(B)` runs A, B, X.
//!
//! ## Comparison
//!
//! - **Hazel / Walnut**: the same normal/overlay split with an insert index.
//! - **Bevy `Schedule`**: systems ordered by explicit constraints; no
//!   attach/detach hooks and no overlay region.

use std::any::type_name;
use std::fmt;

use super::{AttachContext, FrameContext, UiContext};

/// `app::layers::Wrapper<game::Inner>` becomes `Wrapper`.
fn short_type_name(full: &'static str) -> &'static str {
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}

/// Per-frame application logic.
///
/// Only [`on_update`](Self::on_update) is required. Returning `Err` from a
/// per-frame hook is logged and skipped; the remaining layers and frames
/// still run.
pub trait Layer: 'static {
    /// Name used in logs. Defaults to the type name without its path.
    fn name(&self) -> &str {
        short_type_name(type_name::<Self>())
    }

    /// Called once before the layer joins the stack. An error keeps it out.
    fn on_attach(&mut self, _ctx: &mut AttachContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once when the layer leaves the stack (pop or shutdown).
    fn on_detach(&mut self) {}

    fn on_update(&mut self, ctx: &mut FrameContext<'_>) -> anyhow::Result<()>;

    /// Called inside the frame's UI pass, after every layer has updated.
    fn on_ui(&mut self, _ctx: &mut UiContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Identifies a layer in its stack. Stays valid until the layer is popped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(u64);

struct Slot {
    id: LayerId,
    layer: Box<dyn Layer>,
}

/// Layers in execution order, normal region first.
#[derive(Default)]
pub struct LayerStack {
    slots: Vec<Slot>,
    /// Index of the first overlay; equals the number of normal layers.
    boundary: usize,
    next_id: u64,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    fn issue_id(&mut self) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Insert after the last normal layer, before every overlay.
    pub fn push_layer(&mut self, layer: Box<dyn Layer>) -> LayerId {
        let id = self.issue_id();
        self.slots.insert(self.boundary, Slot { id, layer });
        self.boundary += 1;
        id
    }

    /// Append after every other layer.
    pub fn push_overlay(&mut self, layer: Box<dyn Layer>) -> LayerId {
        let id = self.issue_id();
        self.slots.push(Slot { id, layer });
        id
    }

    /// Remove a layer, calling its [`on_detach`](Layer::on_detach).
    pub fn pop(&mut self, id: LayerId) -> Option<Box<dyn Layer>> {
        let pos = self.slots.iter().position(|slot| slot.id == id)?;
        let Slot { mut layer, .. } = self.slots.remove(pos);
        if pos < self.boundary {
            self.boundary -= 1;
        }
        layer.on_detach();
        Some(layer)
    }

    /// Detach every layer, back to front.
    pub fn detach_all(&mut self) {
        while let Some(mut slot) = self.slots.pop() {
            slot.layer.on_detach();
        }
        self.boundary = 0;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of normal (non-overlay) layers.
    pub fn overlay_boundary(&self) -> usize {
        self.boundary
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.slots.iter().any(|slot| slot.id == id)
    }

    /// Front to back.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Layer> {
        self.slots.iter().map(|slot| slot.layer.as_ref())
    }

    /// Front to back.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut dyn Layer> {
        self.slots.iter_mut().map(|slot| slot.layer.as_mut())
    }

    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|layer| layer.name()).collect()
    }
}

impl fmt::Debug for LayerStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerStack")
            .field("layers", &self.names())
            .field("boundary", &self.boundary)
            .finish()
    }
}

impl Drop for LayerStack {
    fn drop(&mut self) {
        self.detach_all();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    type Journal = Arc<Mutex<Vec<String>>>;

    struct Probe {
        name: &'static str,
        journal: Journal,
    }

    impl Probe {
        fn boxed(name: &'static str, journal: &Journal) -> Box<dyn Layer> {
            Box::new(Self {
                name,
                journal: Arc::clone(journal),
            })
        }
    }

    impl Layer for Probe {
        fn name(&self) -> &str {
            self.name
        }

        fn on_detach(&mut self) {
            self.journal.lock().unwrap().push(format!("detach {}", self.name));
        }

        fn on_update(&mut self, _ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct Unnamed;

    impl Layer for Unnamed {
        fn on_update(&mut self, _ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn overlays_stay_behind_normal_layers() {
        let journal = Journal::default();
        let mut stack = LayerStack::new();
        stack.push_layer(Probe::boxed("A", &journal));
        stack.push_overlay(Probe::boxed("X", &journal));
        stack.push_layer(Probe::boxed("B", &journal));
        stack.push_overlay(Probe::boxed("Y", &journal));
        assert_eq!(stack.names(), vec!["A", "B", "X", "Y"]);
        assert_eq!(stack.overlay_boundary(), 2);
    }

    #[test]
    fn pop_detaches_and_moves_boundary() {
        let journal = Journal::default();
        let mut stack = LayerStack::new();
        let a = stack.push_layer(Probe::boxed("A", &journal));
        let x = stack.push_overlay(Probe::boxed("X", &journal));

        let popped = stack.pop(a).unwrap();
        assert_eq!(popped.name(), "A");
        assert_eq!(stack.overlay_boundary(), 0);
        assert!(stack.pop(a).is_none());

        stack.push_layer(Probe::boxed("B", &journal));
        assert_eq!(stack.names(), vec!["B", "X"]);
        assert!(stack.contains(x));
        assert_eq!(*journal.lock().unwrap(), vec!["detach A"]);
    }

    #[test]
    fn drop_detaches_back_to_front() {
        let journal = Journal::default();
        {
            let mut stack = LayerStack::new();
            stack.push_layer(Probe::boxed("A", &journal));
            stack.push_overlay(Probe::boxed("X", &journal));
            stack.push_layer(Probe::boxed("B", &journal));
        }
        assert_eq!(
            *journal.lock().unwrap(),
            vec!["detach X", "detach B", "detach A"]
        );
    }

    #[test]
    fn default_name_is_short_type_name() {
        assert_eq!(Unnamed.name(), "Unnamed");
    }

    struct Wrapped<T>(std::marker::PhantomData<T>);

    impl<T: 'static> Layer for Wrapped<T> {
        fn on_update(&mut self, _ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn default_name_drops_generic_arguments() {
        let layer = Wrapped::<Vec<std::collections::HashMap<u8, Unnamed>>>(Default::default());
        assert_eq!(layer.name(), "Wrapped");
        assert_eq!(short_type_name("a::b::Plain"), "Plain");
        assert_eq!(short_type_name("Outer<x::Inner>"), "Outer");
    }
}

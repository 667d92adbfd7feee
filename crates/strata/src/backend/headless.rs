//! A window that records instead of rendering.
//!
//! [`HeadlessWindow`] appends a [`BackendEvent`] for every call it receives,
//! its UI backend included, so tests can assert on exactly what a frame did
//! and in which order. It can be told to close
//! after a number of presented frames, and tests can fail the next clear or
//! present to exercise the frame loop's error handling.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use glam::Mat4;

use super::{BackendEvent, RenderTarget, UiBackend, Window};
use crate::error::BackendError;
use crate::math::Color;
use crate::mesh::{Material, MaterialHandle, MeshData, MeshHandle};

type Journal = Rc<RefCell<Vec<BackendEvent>>>;

/// UI backend that checks pass bracketing and records pass boundaries.
#[derive(Debug, Default)]
pub struct HeadlessUi {
    journal: Journal,
    in_pass: bool,
    passes: u64,
}

impl HeadlessUi {
    /// Completed begin/end pairs.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn in_pass(&self) -> bool {
        self.in_pass
    }
}

impl UiBackend for HeadlessUi {
    fn begin_pass(&mut self) -> Result<(), BackendError> {
        if self.in_pass {
            return Err(BackendError::UiPass("begin_pass called twice"));
        }
        self.in_pass = true;
        self.journal.borrow_mut().push(BackendEvent::BeginUi);
        Ok(())
    }

    fn end_pass(&mut self) -> Result<(), BackendError> {
        if !self.in_pass {
            return Err(BackendError::UiPass("end_pass without begin_pass"));
        }
        self.in_pass = false;
        self.passes += 1;
        self.journal.borrow_mut().push(BackendEvent::EndUi);
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Window backend for tests and headless runs.
#[derive(Debug)]
pub struct HeadlessWindow {
    size: (u32, u32),
    events: Journal,
    ui: HeadlessUi,
    presented: u64,
    close_after: Option<u64>,
    close_requested: bool,
    fail_next_clear: Option<BackendError>,
    fail_next_present: Option<BackendError>,
}

impl HeadlessWindow {
    pub fn new(width: u32, height: u32) -> Self {
        let events = Journal::default();
        Self {
            size: (width, height),
            ui: HeadlessUi {
                journal: Rc::clone(&events),
                ..HeadlessUi::default()
            },
            events,
            presented: 0,
            close_after: None,
            close_requested: false,
            fail_next_clear: None,
            fail_next_present: None,
        }
    }

    /// Request close once `frames` frames have been presented.
    pub fn close_after(mut self, frames: u64) -> Self {
        self.close_after = Some(frames);
        self
    }

    /// Simulate the user closing the window.
    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    /// Make the next [`clear`](Window::clear) fail with `error`.
    pub fn fail_next_clear(&mut self, error: BackendError) {
        self.fail_next_clear = Some(error);
    }

    /// Make the next [`present`](Window::present) fail with `error`.
    pub fn fail_next_present(&mut self, error: BackendError) {
        self.fail_next_present = Some(error);
    }

    /// Everything recorded so far.
    pub fn events(&self) -> Vec<BackendEvent> {
        self.events.borrow().clone()
    }

    pub fn take_events(&mut self) -> Vec<BackendEvent> {
        self.events.take()
    }

    /// Draw calls in the order they were issued.
    pub fn draws(&self) -> Vec<(MeshHandle, MaterialHandle, Mat4)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match *e {
                BackendEvent::Draw {
                    mesh,
                    material,
                    transform,
                } => Some((mesh, material, transform)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: BackendEvent) {
        self.events.borrow_mut().push(event);
    }

    pub fn presented_frames(&self) -> u64 {
        self.presented
    }

    pub fn headless_ui(&self) -> &HeadlessUi {
        &self.ui
    }
}

impl Default for HeadlessWindow {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl RenderTarget for HeadlessWindow {
    fn draw(&mut self, mesh: MeshHandle, material: MaterialHandle, transform: &Mat4) {
        self.record(BackendEvent::Draw {
            mesh,
            material,
            transform: *transform,
        });
    }
}

impl Window for HeadlessWindow {
    fn poll_events(&mut self) {
        if self.close_after.is_some_and(|n| self.presented >= n) {
            self.close_requested = true;
        }
    }

    fn close_requested(&self) -> bool {
        self.close_requested
    }

    fn surface_size(&self) -> (u32, u32) {
        self.size
    }

    fn clear(&mut self, color: Color) -> Result<(), BackendError> {
        if let Some(err) = self.fail_next_clear.take() {
            return Err(err);
        }
        self.record(BackendEvent::Clear(color));
        Ok(())
    }

    fn present(&mut self) -> Result<(), BackendError> {
        if let Some(err) = self.fail_next_present.take() {
            return Err(err);
        }
        self.record(BackendEvent::Present);
        self.presented += 1;
        Ok(())
    }

    fn ui(&mut self) -> &mut dyn UiBackend {
        &mut self.ui
    }

    fn upload_mesh(&mut self, handle: MeshHandle, data: &MeshData) -> Result<(), BackendError> {
        self.record(BackendEvent::UploadMesh {
            mesh: handle,
            vertices: data.vertices.len(),
            indices: data.indices.len(),
        });
        Ok(())
    }

    fn upload_material(
        &mut self,
        handle: MaterialHandle,
        material: &Material,
    ) -> Result<(), BackendError> {
        self.record(BackendEvent::UploadMaterial {
            material: handle,
            base_color: material.base_color,
        });
        Ok(())
    }
}

//! # Strata — Layered Real-Time Application Core
//!
//! A small runtime core for real-time applications: a sparse entity/component
//! scene with cached transforms, driven by a layered application shell that
//! runs a fixed per-frame pipeline (update layers → draw scenes → UI overlay →
//! present).
//!
//! Start with `use strata::prelude::*`, push a few [`Layer`](app::Layer)s onto
//! an [`Application`](app::Application), and hand it a
//! [`Window`](backend::Window) to run against.

pub mod app;
pub mod backend;
pub mod config;
pub mod ecs;
pub mod error;
pub mod logging;
pub mod math;
pub mod mesh;
pub mod prelude;
pub mod scene;
pub mod time;

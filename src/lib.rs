//! Rigid-body sandbox for vector outlines.
//!
//! Outlines (glyph silhouettes, with holes) become convex-decomposed rapier bodies
//! that fall and collide inside a fixed frame. Hosts own the [`World`], drive its
//! ticks from their own loop and hand it a [`Surface`] to paint on.
//!
//! ```no_run
//! use outline_sandbox::{Outline, RasterSurface, World};
//! use glam::Vec2;
//! use std::time::Duration;
//!
//! let mut world = World::new(320.0, 240.0);
//! world.import_shapes(&[Outline::rect(Vec2::new(100.0, 20.0), Vec2::new(40.0, 40.0))]);
//!
//! let mut surface = RasterSurface::new(320, 240);
//! world.advance(Duration::from_millis(16));
//! if world.take_frame_ready() {
//!     world.render(&mut surface);
//! }
//! ```

pub mod core;
pub mod engine;

pub use engine::config::{ConfigError, SandboxConfig};
pub use engine::geometry::{
    dedup_points, fit_rect, ConvexPolygon, DecomposeError, Decomposer, EarClipDecomposer, Outline,
    VhacdDecomposer,
};
pub use engine::physics::{BodyFactory, BodyShape, BuildError, LocalOutline};
pub use engine::renderer::{
    render, Color, DrawCommand, Path, RasterSurface, RecordingSurface, Style, StylePatch, Surface,
};
pub use engine::simulation_loop::{SimulationLoop, TickContext};
pub use engine::world::{ShapeView, World};

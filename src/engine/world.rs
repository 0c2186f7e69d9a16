// Sandbox world: boundary frame, dynamic shapes, gravity, style and tick scheduling

use glam::Vec2;
use log::{debug, info};
use std::time::Duration;

use crate::core::math::{from_vector, to_vector};
use crate::engine::config::{validate_bounds, ConfigError, SandboxConfig};
use crate::engine::geometry::{Decomposer, Outline};
use crate::engine::physics::{presets, BodyFactory, LocalOutline, PhysicsWorld, RigidBodyHandle};
use crate::engine::renderer::{self, Style, StylePatch, Surface};
use crate::engine::simulation_loop::{AfterUpdate, SimulationLoop, TickContext};

/// A registered dynamic shape
#[derive(Debug, Clone)]
struct WorldShape {
    handle: RigidBodyHandle,
    outline: LocalOutline,
}

/// Read-only view of a dynamic shape's current state
#[derive(Debug, Clone, Copy)]
pub struct ShapeView<'a> {
    handle: RigidBodyHandle,
    position: Vec2,
    angle: f32,
    outline: &'a LocalOutline,
}

impl<'a> ShapeView<'a> {
    pub fn handle(&self) -> RigidBodyHandle {
        self.handle
    }

    /// Body origin (outline centroid) in world space
    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Original outline and holes, relative to the body origin
    pub fn outline(&self) -> &'a LocalOutline {
        self.outline
    }

    /// Outline and holes placed at the body's current position and rotation
    pub fn world_outline(&self) -> Outline {
        self.outline.to_world(self.position, self.angle)
    }
}

/// The simulation world exposed to hosts
///
/// Bounds are fixed at construction. `import_shapes` is the only way to add dynamic
/// content and replaces all of it at once; the four boundary walls live as long as
/// the world. Every mutation takes `&mut self`, so no tick can observe a partially
/// replaced shape list.
pub struct World {
    width: f32,
    height: f32,
    config: SandboxConfig,
    gravity: Vec2,
    style: Style,
    physics: PhysicsWorld,
    factory: BodyFactory,
    boundary: [RigidBodyHandle; 4],
    shapes: Vec<WorldShape>,
    sim_loop: SimulationLoop,
    disposed: bool,
}

impl World {
    /// Create a world with default configuration.
    ///
    /// # Panics
    /// If `width` or `height` is not positive and finite.
    pub fn new(width: f32, height: f32) -> Self {
        Self::with_config(width, height, SandboxConfig::default())
    }

    /// Create a world with default configuration and custom gravity
    pub fn with_gravity(width: f32, height: f32, gravity: Vec2) -> Self {
        Self::with_config(width, height, SandboxConfig::new().with_gravity(gravity.x, gravity.y))
    }

    /// Create a world from a configuration.
    ///
    /// # Panics
    /// On invalid bounds or configuration; see [`World::try_new`].
    pub fn with_config(width: f32, height: f32, config: SandboxConfig) -> Self {
        Self::try_new(width, height, config)
            .unwrap_or_else(|err| panic!("invalid sandbox world: {}", err))
    }

    /// Create a world, reporting invalid bounds or configuration
    pub fn try_new(width: f32, height: f32, config: SandboxConfig) -> Result<Self, ConfigError> {
        validate_bounds(width, height)?;
        config.validate()?;

        let gravity = config.gravity;
        let mut physics = PhysicsWorld::new(
            to_vector(gravity * config.gravity_scale),
            config.timestep.as_secs_f32(),
        );
        let boundary = create_boundary(&mut physics, width, height, &config);

        let mut world = Self {
            width,
            height,
            gravity,
            style: config.style.clone(),
            physics,
            factory: BodyFactory::new(&config),
            boundary,
            shapes: Vec::new(),
            sim_loop: SimulationLoop::new(config.timestep, config.max_ticks_per_frame),
            config,
            disposed: false,
        };

        info!("Created {}x{} sandbox world", width, height);

        if world.config.autostart {
            world.run();
        }
        Ok(world)
    }

    /// Replace the convex decomposition strategy used by future imports
    pub fn set_decomposer(&mut self, decomposer: impl Decomposer + 'static) {
        self.assert_live();
        let factory = std::mem::replace(&mut self.factory, BodyFactory::new(&self.config));
        self.factory = factory.with_decomposer(decomposer);
    }

    /// Replace every dynamic shape with bodies built from `outlines`.
    ///
    /// Outlines that cannot become bodies are skipped. Shapes keep input order.
    /// Returns the number of shapes now in the world.
    pub fn import_shapes(&mut self, outlines: &[Outline]) -> usize {
        self.assert_live();

        // Build everything before touching the engine
        let built: Vec<_> = outlines
            .iter()
            .filter_map(|outline| self.factory.build_body(outline))
            .collect();

        self.remove_shapes();
        for shape in built {
            let (body, collider, outline) = shape.into_parts();
            let handle = self.physics.insert(body, collider);
            self.shapes.push(WorldShape { handle, outline });
        }

        debug!(
            "Imported {} of {} outlines",
            self.shapes.len(),
            outlines.len()
        );
        self.shapes.len()
    }

    /// Remove every dynamic shape; the boundary stays
    pub fn clear(&mut self) {
        self.assert_live();
        self.remove_shapes();
    }

    fn remove_shapes(&mut self) {
        for shape in self.shapes.drain(..) {
            self.physics.remove_rigid_body(shape.handle);
        }
    }

    /// Change gravity (host units) from the next tick on
    pub fn set_gravity(&mut self, x: f32, y: f32) {
        self.assert_live();
        self.gravity = Vec2::new(x, y);
        self.physics
            .set_gravity(to_vector(self.gravity * self.config.gravity_scale));
    }

    /// Shallow-merge into the current style; applies from the next render
    pub fn set_style(&mut self, patch: StylePatch) {
        self.assert_live();
        self.style.merge(&patch);
    }

    /// Advance exactly one engine tick, whether or not the world is running
    pub fn step(&mut self) {
        self.assert_live();
        self.tick();
    }

    /// Start continuous ticking
    pub fn run(&mut self) {
        self.assert_live();
        self.sim_loop.start();
    }

    /// Stop continuous ticking. Safe to call at any time, including after `dispose`.
    pub fn stop(&mut self) {
        self.sim_loop.stop();
    }

    pub fn is_running(&self) -> bool {
        self.sim_loop.is_running()
    }

    /// Run the ticks due since the previous call, measured on the wall clock.
    ///
    /// Hosts call this from their event or timer loop. Returns ticks executed.
    /// Like `stop`, this stays callable after `dispose` and then runs nothing, so a
    /// host loop keeps working when a subscriber disposed the world mid-frame.
    pub fn update(&mut self) -> u32 {
        if self.disposed {
            return 0;
        }
        let due = self.sim_loop.begin_frame();
        self.run_ticks(due)
    }

    /// Run the ticks due after `elapsed` more time has passed; a no-op after `dispose`
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        if self.disposed {
            return 0;
        }
        let due = self.sim_loop.accumulate(elapsed);
        self.run_ticks(due)
    }

    fn run_ticks(&mut self, due: u32) -> u32 {
        let mut executed = 0;
        // A subscriber may stop or dispose the world between ticks
        while executed < due && self.sim_loop.is_running() && !self.disposed {
            self.tick();
            executed += 1;
        }
        executed
    }

    fn tick(&mut self) {
        self.physics.step();
        if self.sim_loop.complete_tick() {
            self.dispose();
        }
    }

    /// Consume the pending "frame ready" signal raised by completed ticks
    pub fn take_frame_ready(&mut self) -> bool {
        self.sim_loop.take_frame_ready()
    }

    /// Install the single after-update subscriber, returning the previous one.
    ///
    /// It runs synchronously after every tick and may call `TickContext::stop` or
    /// `TickContext::dispose`; both take effect once it returns.
    pub fn set_after_update(
        &mut self,
        callback: impl FnMut(&mut TickContext) + 'static,
    ) -> Option<AfterUpdate> {
        self.assert_live();
        self.sim_loop.set_after_update(Box::new(callback))
    }

    /// Remove the after-update subscriber
    pub fn clear_after_update(&mut self) -> Option<AfterUpdate> {
        self.sim_loop.clear_after_update()
    }

    /// Paint the current state onto `surface`
    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S) {
        self.assert_live();
        renderer::render(self, surface);
    }

    /// Stop ticking and release every engine resource. Idempotent.
    ///
    /// Only `stop`, `dispose` and the read-only queries remain usable afterwards.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.sim_loop.stop();
        self.sim_loop.clear_after_update();
        self.shapes.clear();
        self.physics.reset();
        self.disposed = true;
        info!("Sandbox world disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Views of every dynamic shape, in insertion order
    pub fn shapes(&self) -> impl Iterator<Item = ShapeView<'_>> + '_ {
        self.shapes.iter().filter_map(move |shape| {
            let body = self.physics.get_rigid_body(shape.handle)?;
            Some(ShapeView {
                handle: shape.handle,
                position: from_vector(body.translation()),
                angle: body.rotation().angle(),
                outline: &shape.outline,
            })
        })
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Registered engine bodies, boundary walls included
    pub fn body_count(&self) -> usize {
        self.physics.body_count()
    }

    /// Top, bottom, left and right wall handles
    pub fn boundary_handles(&self) -> [RigidBodyHandle; 4] {
        self.boundary
    }

    /// Direct read access to the engine state
    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Gravity in host units
    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Total ticks completed, by `step` or continuous ticking
    pub fn tick_count(&self) -> u64 {
        self.sim_loop.tick_count()
    }

    fn assert_live(&self) {
        assert!(!self.disposed, "sandbox world used after dispose()");
    }
}

/// Four fixed walls enclosing exactly `width` x `height`; corners are closed by
/// extending the horizontal walls over the vertical ones
fn create_boundary(
    physics: &mut PhysicsWorld,
    width: f32,
    height: f32,
    config: &SandboxConfig,
) -> [RigidBodyHandle; 4] {
    let depth = config.wall_thickness;
    let half = depth / 2.0;
    let friction = config.boundary_friction;

    let walls = [
        (width / 2.0, -half, width + 2.0 * depth, depth),
        (width / 2.0, height + half, width + 2.0 * depth, depth),
        (-half, height / 2.0, depth, height),
        (width + half, height / 2.0, depth, height),
    ];

    walls.map(|(x, y, w, h)| {
        physics.insert(
            presets::wall_body(x, y),
            presets::wall_collider(w, h, friction),
        )
    })
}

// Sandbox configuration

use glam::Vec2;
use std::time::Duration;

use super::renderer::Style;

/// Default gravity in host units (matches the classic 0.1 "screen gravity")
pub const DEFAULT_GRAVITY: Vec2 = Vec2::new(0.0, 0.1);

/// Host gravity units to px/s²
pub const DEFAULT_GRAVITY_SCALE: f32 = 1000.0;

/// Thickness of each boundary wall
pub const DEFAULT_WALL_THICKNESS: f32 = 10.0;

/// Fixed engine tick (60 ticks per second)
pub const DEFAULT_TIMESTEP: Duration = Duration::from_micros(16_667);

/// Configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("world bounds must be positive and finite, got {width}x{height}")]
    InvalidBounds { width: f32, height: f32 },

    #[error("wall thickness must be positive and finite, got {0}")]
    InvalidWallThickness(f32),

    #[error("{name} must be non-negative and finite, got {value}")]
    InvalidMaterial { name: &'static str, value: f32 },

    #[error("dedup epsilon must be positive, got {0}")]
    InvalidEpsilon(f32),

    #[error("timestep must be non-zero")]
    ZeroTimestep,

    #[error("max ticks per frame must be at least 1")]
    ZeroTickCap,
}

/// Everything a world needs besides its bounds
///
/// Material constants apply to every body the world builds; they are not
/// overridable per import.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Initial gravity in host units
    pub gravity: Vec2,

    /// Multiplier turning host gravity into engine acceleration (px/s²)
    pub gravity_scale: f32,

    /// Boundary wall thickness, placed fully outside the clear area
    pub wall_thickness: f32,

    /// Friction of the boundary walls
    pub boundary_friction: f32,

    /// Friction of imported bodies
    pub friction: f32,

    /// Fraction of velocity lost per tick to air resistance
    pub air_friction: f32,

    /// Density of imported bodies (mass follows collision area)
    pub density: f32,

    /// Consecutive outline points closer than this are merged
    pub dedup_epsilon: f32,

    /// Fixed engine tick
    pub timestep: Duration,

    /// Cap on ticks caught up in a single frame
    pub max_ticks_per_frame: u32,

    /// Start continuous ticking as soon as the world is built
    pub autostart: bool,

    /// Initial render style
    pub style: Style,
}

impl SandboxConfig {
    pub fn new() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            gravity_scale: DEFAULT_GRAVITY_SCALE,
            wall_thickness: DEFAULT_WALL_THICKNESS,
            boundary_friction: 1.0,
            friction: 0.1,
            air_friction: 0.01,
            density: 1.0,
            dedup_epsilon: 1e-3,
            timestep: DEFAULT_TIMESTEP,
            max_ticks_per_frame: 5,
            autostart: true,
            style: Style::default(),
        }
    }

    pub fn with_gravity(mut self, x: f32, y: f32) -> Self {
        self.gravity = Vec2::new(x, y);
        self
    }

    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    pub fn with_wall_thickness(mut self, thickness: f32) -> Self {
        self.wall_thickness = thickness;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_air_friction(mut self, air_friction: f32) -> Self {
        self.air_friction = air_friction;
        self
    }

    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn with_dedup_epsilon(mut self, epsilon: f32) -> Self {
        self.dedup_epsilon = epsilon;
        self
    }

    pub fn with_timestep(mut self, timestep: Duration) -> Self {
        self.timestep = timestep;
        self
    }

    pub fn with_max_ticks_per_frame(mut self, max: u32) -> Self {
        self.max_ticks_per_frame = max;
        self
    }

    /// Start stopped; ticks only happen through `step()` until `run()`
    pub fn paused(mut self) -> Self {
        self.autostart = false;
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Engine ticks per simulated second
    pub fn ticks_per_second(&self) -> f32 {
        1.0 / self.timestep.as_secs_f32()
    }

    /// Check every field for values the engine cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.wall_thickness.is_finite() && self.wall_thickness > 0.0) {
            return Err(ConfigError::InvalidWallThickness(self.wall_thickness));
        }

        for (name, value) in [
            ("friction", self.friction),
            ("air friction", self.air_friction),
            ("boundary friction", self.boundary_friction),
            ("density", self.density),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidMaterial { name, value });
            }
        }

        if !(self.dedup_epsilon > 0.0) {
            return Err(ConfigError::InvalidEpsilon(self.dedup_epsilon));
        }
        if self.timestep.is_zero() {
            return Err(ConfigError::ZeroTimestep);
        }
        if self.max_ticks_per_frame == 0 {
            return Err(ConfigError::ZeroTickCap);
        }

        Ok(())
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Check world bounds together with the rest of the configuration
pub fn validate_bounds(width: f32, height: f32) -> Result<(), ConfigError> {
    if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidBounds { width, height })
    }
}

use glam::Vec2;
use log::debug;
use rapier2d::prelude::*;
use std::fmt;

use crate::core::math::{from_vector, is_convex, polygon_centroid, signed_area, to_point};
use crate::engine::config::SandboxConfig;
use crate::engine::geometry::{
    dedup_points, ConvexPolygon, DecomposeError, Decomposer, EarClipDecomposer, Outline,
    CONVEXITY_EPSILON,
};

pub use rapier2d::prelude::RigidBodyHandle;

/// Outlines enclosing less area than this are treated as degenerate
pub const MIN_AREA: f32 = 1e-3;

/// Reasons an outline cannot become a body
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    #[error("outline has {0} distinct points after dedup, at least 3 are required")]
    TooFewPoints(usize),

    #[error("outline area {0} is too small to simulate")]
    ZeroArea(f32),

    #[error("convex decomposition failed: {0}")]
    Decomposition(#[from] DecomposeError),

    #[error("no convex part produced a valid collision shape")]
    NoCollisionShape,
}

/// Builder for creating rigid bodies with common configurations
pub struct BodyBuilder {
    body_type: RigidBodyType,
    position: Isometry<Real>,
    linear_damping: Real,
    angular_damping: Real,
    can_sleep: bool,
}

impl BodyBuilder {
    /// Create a new dynamic body (affected by forces and collisions)
    pub fn new_dynamic() -> Self {
        Self {
            body_type: RigidBodyType::Dynamic,
            position: Isometry::identity(),
            linear_damping: 0.0,
            angular_damping: 0.0,
            can_sleep: true,
        }
    }

    /// Create a new fixed (static) body (completely immovable)
    pub fn new_fixed() -> Self {
        Self {
            body_type: RigidBodyType::Fixed,
            position: Isometry::identity(),
            linear_damping: 0.0,
            angular_damping: 0.0,
            can_sleep: false,
        }
    }

    /// Set the initial position of the body
    pub fn position(mut self, x: Real, y: Real) -> Self {
        self.position = Isometry::translation(x, y);
        self
    }

    /// Air resistance applied to linear velocity (per second)
    pub fn linear_damping(mut self, damping: Real) -> Self {
        self.linear_damping = damping;
        self
    }

    /// Air resistance applied to angular velocity (per second)
    pub fn angular_damping(mut self, damping: Real) -> Self {
        self.angular_damping = damping;
        self
    }

    /// Set whether the body can sleep when inactive
    pub fn can_sleep(mut self, can_sleep: bool) -> Self {
        self.can_sleep = can_sleep;
        self
    }

    /// Build the rigid body
    pub fn build(self) -> RigidBody {
        RigidBodyBuilder::new(self.body_type)
            .position(self.position)
            .linear_damping(self.linear_damping)
            .angular_damping(self.angular_damping)
            .can_sleep(self.can_sleep)
            .build()
    }
}

/// Builder for creating colliders with common configurations
pub struct ColliderBuilder2D {
    shape: SharedShape,
    friction: Real,
    restitution: Real,
    density: Real,
}

impl ColliderBuilder2D {
    /// Create a box-shaped collider
    pub fn box_shape(half_width: Real, half_height: Real) -> Self {
        Self::from_shape(SharedShape::cuboid(half_width, half_height))
    }

    /// Create a collider from convex parts given in body-local coordinates.
    ///
    /// Parts the engine rejects (collinear or sliver polygons) are skipped; `None`
    /// when nothing is left.
    pub fn convex_parts(parts: &[Vec<Vec2>]) -> Option<Self> {
        let mut shapes: Vec<(Isometry<Real>, SharedShape)> = parts
            .iter()
            .filter_map(|part| {
                let points: Vec<Point<Real>> = part.iter().map(|&p| to_point(p)).collect();
                SharedShape::convex_polyline(points)
            })
            .map(|shape| (Isometry::identity(), shape))
            .collect();

        let shape = match shapes.len() {
            0 => return None,
            1 => shapes.remove(0).1,
            _ => SharedShape::compound(shapes),
        };
        Some(Self::from_shape(shape))
    }

    fn from_shape(shape: SharedShape) -> Self {
        Self {
            shape,
            friction: 0.5,
            restitution: 0.0,
            density: 1.0,
        }
    }

    /// Set friction coefficient (0.0 = no friction, 1.0 = high friction)
    pub fn friction(mut self, friction: Real) -> Self {
        self.friction = friction;
        self
    }

    /// Set restitution/bounciness (0.0 = no bounce, 1.0 = perfect bounce)
    pub fn restitution(mut self, restitution: Real) -> Self {
        self.restitution = restitution;
        self
    }

    /// Set density (mass will be calculated from shape volume)
    pub fn density(mut self, density: Real) -> Self {
        self.density = density;
        self
    }

    /// Build the collider
    pub fn build(self) -> Collider {
        ColliderBuilder::new(self.shape)
            .friction(self.friction)
            .restitution(self.restitution)
            .density(self.density)
            .build()
    }
}

/// Outline and hole vertices relative to a body's origin
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalOutline {
    pub vertices: Vec<Vec2>,
    pub holes: Vec<Vec<Vec2>>,
}

impl LocalOutline {
    /// Transform into world space for a body at `position` rotated by `angle`
    pub fn to_world(&self, position: Vec2, angle: f32) -> Outline {
        let rotation = Vec2::from_angle(angle);
        let place = |p: &Vec2| rotation.rotate(*p) + position;
        Outline {
            points: self.vertices.iter().map(place).collect(),
            holes: self
                .holes
                .iter()
                .map(|hole| hole.iter().map(place).collect())
                .collect(),
        }
    }
}

/// An unregistered body paired with the artwork it was built from
///
/// The collision shape is the convex decomposition; `outline` keeps the original
/// vertices, relative to the body's centroid, for rendering.
#[derive(Clone)]
pub struct BodyShape {
    body: RigidBody,
    collider: Collider,
    outline: LocalOutline,
}

impl fmt::Debug for BodyShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyShape")
            .field("body", &self.body)
            .field("outline", &self.outline)
            .finish_non_exhaustive()
    }
}

impl BodyShape {
    pub fn body(&self) -> &RigidBody {
        &self.body
    }

    pub fn collider(&self) -> &Collider {
        &self.collider
    }

    pub fn outline(&self) -> &LocalOutline {
        &self.outline
    }

    /// Body origin (the outline centroid) in world space
    pub fn position(&self) -> Vec2 {
        from_vector(self.body.translation())
    }

    pub fn angle(&self) -> f32 {
        self.body.rotation().angle()
    }

    pub fn is_static(&self) -> bool {
        self.body.is_fixed()
    }

    pub fn into_parts(self) -> (RigidBody, Collider, LocalOutline) {
        (self.body, self.collider, self.outline)
    }
}

/// Turns outlines into simulatable bodies
///
/// Material constants come from the world configuration; decomposition is pluggable.
pub struct BodyFactory {
    decomposer: Box<dyn Decomposer>,
    friction: Real,
    damping: Real,
    density: Real,
    dedup_epsilon: f32,
}

impl BodyFactory {
    pub fn new(config: &SandboxConfig) -> Self {
        Self {
            decomposer: Box::new(EarClipDecomposer::new()),
            friction: config.friction,
            damping: config.air_friction * config.ticks_per_second(),
            density: config.density,
            dedup_epsilon: config.dedup_epsilon,
        }
    }

    /// Replace the decomposition strategy
    pub fn with_decomposer(mut self, decomposer: impl Decomposer + 'static) -> Self {
        self.decomposer = Box::new(decomposer);
        self
    }

    /// Build a body, or `None` when the outline is unbuildable.
    ///
    /// Unbuildable outlines are expected in normal use (very thin glyph strokes);
    /// callers skip them and keep going.
    pub fn build_body(&self, outline: &Outline) -> Option<BodyShape> {
        match self.try_build_body(outline) {
            Ok(shape) => Some(shape),
            Err(err) => {
                debug!("Skipping outline with {} points: {}", outline.points.len(), err);
                None
            }
        }
    }

    /// Build a body, reporting why an outline is unbuildable
    pub fn try_build_body(&self, outline: &Outline) -> Result<BodyShape, BuildError> {
        let points = dedup_points(&outline.points, self.dedup_epsilon);
        if points.len() < 3 {
            return Err(BuildError::TooFewPoints(points.len()));
        }

        let area = signed_area(&points).abs();
        if area < MIN_AREA {
            return Err(BuildError::ZeroArea(area));
        }

        let parts = if is_convex(&points, CONVEXITY_EPSILON) {
            ConvexPolygon::new(points.clone())
                .map(|part| vec![part])
                .ok_or(BuildError::NoCollisionShape)?
        } else {
            self.decomposer.decompose(&points)?
        };

        let centroid = polygon_centroid(&points);
        let local_parts: Vec<Vec<Vec2>> = parts
            .iter()
            .map(|part| part.points().iter().map(|&p| p - centroid).collect())
            .collect();

        let collider = ColliderBuilder2D::convex_parts(&local_parts)
            .ok_or(BuildError::NoCollisionShape)?
            .friction(self.friction)
            .density(self.density)
            .build();

        let body = BodyBuilder::new_dynamic()
            .position(centroid.x, centroid.y)
            .linear_damping(self.damping)
            .angular_damping(self.damping)
            .build();

        let holes = outline
            .holes
            .iter()
            .map(|hole| dedup_points(hole, self.dedup_epsilon))
            .filter(|hole| hole.len() >= 3)
            .map(|hole| hole.into_iter().map(|p| p - centroid).collect())
            .collect();

        Ok(BodyShape {
            body,
            collider,
            outline: LocalOutline {
                vertices: points.into_iter().map(|p| p - centroid).collect(),
                holes,
            },
        })
    }
}

/// Common rigid body configurations for the sandbox
pub mod presets {
    use super::*;

    /// Create one boundary wall body (fixed), centred at (x, y)
    pub fn wall_body(x: Real, y: Real) -> RigidBody {
        BodyBuilder::new_fixed().position(x, y).build()
    }

    /// Create a boundary wall collider (box shape)
    pub fn wall_collider(width: Real, height: Real, friction: Real) -> Collider {
        ColliderBuilder2D::box_shape(width / 2.0, height / 2.0)
            .friction(friction)
            .restitution(0.0)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::geometry::VhacdDecomposer;
    use approx::assert_relative_eq;

    fn factory() -> BodyFactory {
        BodyFactory::new(&SandboxConfig::default())
    }

    fn square() -> Outline {
        Outline::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ])
    }

    #[test]
    fn test_body_builder_dynamic() {
        let body = BodyBuilder::new_dynamic()
            .position(10.0, 20.0)
            .linear_damping(0.6)
            .build();

        assert_eq!(body.body_type(), RigidBodyType::Dynamic);
        assert_eq!(body.translation().x, 10.0);
        assert_eq!(body.translation().y, 20.0);
        assert_eq!(body.linear_damping(), 0.6);
    }

    #[test]
    fn test_wall_preset() {
        let body = presets::wall_body(50.0, -5.0);
        let collider = presets::wall_collider(100.0, 10.0, 1.0);

        assert!(body.is_fixed());
        assert_eq!(collider.friction(), 1.0);
        let cuboid = collider.shape().as_cuboid().unwrap();
        assert_eq!(cuboid.half_extents.x, 50.0);
        assert_eq!(cuboid.half_extents.y, 5.0);
    }

    #[test]
    fn test_square_reconstructs_original_points() {
        let outline = square();
        let shape = factory().build_body(&outline).unwrap();

        assert!(!shape.is_static());
        assert_relative_eq!(shape.position().x, 5.0, epsilon = 1e-5);
        assert_relative_eq!(shape.position().y, 5.0, epsilon = 1e-5);
        assert_eq!(shape.angle(), 0.0);

        let world = shape.outline().to_world(shape.position(), shape.angle());
        assert_eq!(world.points.len(), 4);
        for (rebuilt, original) in world.points.iter().zip(&outline.points) {
            assert_relative_eq!(rebuilt.x, original.x, epsilon = 1e-5);
            assert_relative_eq!(rebuilt.y, original.y, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_debug_output_names_body_and_outline() {
        let shape = factory().build_body(&square()).unwrap();
        let text = format!("{:?}", shape);
        assert!(text.starts_with("BodyShape {"));
        assert!(text.contains("outline"));
        assert!(text.ends_with(".. }"));
    }

    #[test]
    fn test_local_vertices_are_centroid_relative() {
        let outline = Outline::rect(Vec2::new(300.0, 200.0), Vec2::new(40.0, 20.0));
        let shape = factory().build_body(&outline).unwrap();

        let sum: Vec2 = shape.outline().vertices.iter().copied().sum();
        assert_relative_eq!(sum.x, 0.0, epsilon = 1e-3);
        assert_relative_eq!(sum.y, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_default_material() {
        let shape = factory().build_body(&square()).unwrap();
        assert_relative_eq!(shape.collider().friction(), 0.1);
        // 0.01 per tick at 60 ticks per second
        assert_relative_eq!(shape.body().linear_damping(), 0.6, epsilon = 1e-3);
    }

    #[test]
    fn test_material_follows_config() {
        let config = SandboxConfig::new().with_friction(0.7);
        let shape = BodyFactory::new(&config).build_body(&square()).unwrap();
        assert_relative_eq!(shape.collider().friction(), 0.7);
    }

    #[test]
    fn test_too_few_points_after_dedup() {
        let outline = Outline::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 0.0001),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 0.0002),
        ]);
        assert_eq!(
            factory().try_build_body(&outline).unwrap_err(),
            BuildError::TooFewPoints(2)
        );
        assert!(factory().build_body(&outline).is_none());
    }

    #[test]
    fn test_zero_area_outline() {
        let line = Outline::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(5.0, 5.0),
            Vec2::new(10.0, 10.0),
        ]);
        assert!(matches!(
            factory().try_build_body(&line),
            Err(BuildError::ZeroArea(_))
        ));
    }

    #[test]
    fn test_concave_outline_uses_compound_collider() {
        let l_shape = Outline::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(20.0, 0.0),
            Vec2::new(20.0, 10.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(10.0, 20.0),
            Vec2::new(0.0, 20.0),
        ]);
        let shape = factory().build_body(&l_shape).unwrap();

        let compound = shape.collider().shape().as_compound().unwrap();
        assert!(compound.shapes().len() >= 2);
        // Render geometry keeps the undecomposed outline
        assert_eq!(shape.outline().vertices.len(), 6);
    }

    #[test]
    fn test_holes_kept_for_rendering() {
        let ring = Outline::regular_polygon(Vec2::new(50.0, 50.0), 20.0, 16).with_hole(
            Outline::regular_polygon(Vec2::new(50.0, 50.0), 10.0, 16)
                .points
                .into_iter()
                .rev()
                .collect(),
        );
        let shape = factory().build_body(&ring).unwrap();

        assert_eq!(shape.outline().holes.len(), 1);
        let hole = &shape.outline().holes[0];
        assert_eq!(hole.len(), 16);
        assert_relative_eq!(hole[0].length(), 10.0, epsilon = 1e-3);
    }

    #[test]
    fn test_degenerate_hole_dropped() {
        let outline = square().with_hole(vec![Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0)]);
        let shape = factory().build_body(&outline).unwrap();
        assert!(shape.outline().holes.is_empty());
    }

    #[test]
    fn test_inputs_not_mutated() {
        let outline = square().with_hole(vec![
            Vec2::new(2.0, 2.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(4.0, 2.0),
            Vec2::new(3.0, 4.0),
        ]);
        let snapshot = outline.clone();
        let _ = factory().build_body(&outline);
        assert_eq!(outline, snapshot);
    }

    #[test]
    fn test_pluggable_decomposer() {
        let l_shape = Outline::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(40.0, 0.0),
            Vec2::new(40.0, 20.0),
            Vec2::new(20.0, 20.0),
            Vec2::new(20.0, 40.0),
            Vec2::new(0.0, 40.0),
        ]);
        let factory = factory().with_decomposer(VhacdDecomposer::new());
        assert!(factory.build_body(&l_shape).is_some());
    }
}

// Outline geometry: input silhouettes, convex parts and decomposition strategies

mod decompose;

pub use decompose::{DecomposeError, Decomposer, EarClipDecomposer, VhacdDecomposer};

use glam::Vec2;

use crate::core::math::{is_convex, signed_area};

/// Tolerance used when classifying corners as convex
pub const CONVEXITY_EPSILON: f32 = 1e-4;

/// Closed silhouette boundary with optional subtractive holes
///
/// Points are in world (pixel) coordinates, origin top-left, y pointing down.
/// The loop is implicitly closed; the last point should not repeat the first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outline {
    pub points: Vec<Vec2>,
    pub holes: Vec<Vec<Vec2>>,
}

impl Outline {
    /// Create an outline without holes
    pub fn new(points: Vec<Vec2>) -> Self {
        Self {
            points,
            holes: Vec::new(),
        }
    }

    /// Add a hole loop
    pub fn with_hole(mut self, hole: Vec<Vec2>) -> Self {
        self.holes.push(hole);
        self
    }

    /// Axis-aligned rectangle with its top-left corner at `origin`
    pub fn rect(origin: Vec2, size: Vec2) -> Self {
        Self::new(vec![
            origin,
            origin + Vec2::new(size.x, 0.0),
            origin + size,
            origin + Vec2::new(0.0, size.y),
        ])
    }

    /// Regular polygon inscribed in a circle of `radius`
    pub fn regular_polygon(center: Vec2, radius: f32, sides: usize) -> Self {
        let step = std::f32::consts::TAU / sides as f32;
        Self::new(
            (0..sides)
                .map(|i| center + Vec2::from_angle(i as f32 * step) * radius)
                .collect(),
        )
    }

    /// Bounding box as (min, max), or `None` for an empty outline
    pub fn bounds(&self) -> Option<(Vec2, Vec2)> {
        bounds_of(self.points.iter().chain(self.holes.iter().flatten()))
    }

    /// Apply `f` to every outline and hole point
    pub fn map_points(&self, f: impl Fn(Vec2) -> Vec2) -> Self {
        Self {
            points: self.points.iter().map(|&p| f(p)).collect(),
            holes: self
                .holes
                .iter()
                .map(|hole| hole.iter().map(|&p| f(p)).collect())
                .collect(),
        }
    }
}

/// Convex polygon with counter-clockwise (positive signed area) winding
///
/// Only used to describe collision parts.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexPolygon {
    points: Vec<Vec2>,
}

impl ConvexPolygon {
    /// Validate and normalise a convex polygon. Returns `None` for concave,
    /// self-overlapping or degenerate input.
    pub fn new(mut points: Vec<Vec2>) -> Option<Self> {
        if !is_convex(&points, CONVEXITY_EPSILON) {
            return None;
        }

        let area = signed_area(&points);
        if area.abs() <= f32::EPSILON {
            return None;
        }
        if area < 0.0 {
            points.reverse();
        }

        Some(Self { points })
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn area(&self) -> f32 {
        signed_area(&self.points)
    }

    pub fn into_points(self) -> Vec<Vec2> {
        self.points
    }
}

/// Collapse consecutive points closer than `epsilon`, including the closing pair.
///
/// The input is left untouched.
pub fn dedup_points(points: &[Vec2], epsilon: f32) -> Vec<Vec2> {
    let epsilon_sq = epsilon * epsilon;
    let mut result: Vec<Vec2> = Vec::with_capacity(points.len());

    for &p in points {
        match result.last() {
            Some(last) if last.distance_squared(p) < epsilon_sq => {}
            _ => result.push(p),
        }
    }

    while result.len() > 1 {
        let first = result[0];
        match result.last() {
            Some(last) if last.distance_squared(first) < epsilon_sq => {
                result.pop();
            }
            _ => break,
        }
    }

    result
}

/// Uniformly scale and centre a batch of outlines into a target rectangle.
///
/// The aspect ratio of the batch is preserved. An empty or zero-sized batch is
/// returned unchanged.
pub fn fit_rect(outlines: &[Outline], x: f32, y: f32, width: f32, height: f32) -> Vec<Outline> {
    let Some((min, max)) = bounds_of(
        outlines
            .iter()
            .flat_map(|o| o.points.iter().chain(o.holes.iter().flatten())),
    ) else {
        return outlines.to_vec();
    };

    let size = max - min;
    if size.x <= 0.0 && size.y <= 0.0 {
        return outlines.to_vec();
    }

    let scale = match (size.x > 0.0, size.y > 0.0) {
        (true, true) => (width / size.x).min(height / size.y),
        (true, false) => width / size.x,
        _ => height / size.y,
    };

    let fitted = size * scale;
    let offset = Vec2::new(x, y) + (Vec2::new(width, height) - fitted) * 0.5;

    outlines
        .iter()
        .map(|o| o.map_points(|p| (p - min) * scale + offset))
        .collect()
}

fn bounds_of<'a>(points: impl Iterator<Item = &'a Vec2>) -> Option<(Vec2, Vec2)> {
    points.fold(None, |acc, &p| match acc {
        None => Some((p, p)),
        Some((min, max)) => Some((min.min(p), max.max(p))),
    })
}

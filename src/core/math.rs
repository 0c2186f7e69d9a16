// Math utilities and helper functions

use glam::Vec2;
use rapier2d::prelude::{nalgebra, point, vector, Point, Real, Vector};

/// Check if two f32 values are approximately equal
pub fn approx_equal(a: f32, b: f32, epsilon: f32) -> bool {
    (a - b).abs() < epsilon
}

/// 2D cross product (z component of the 3D cross product)
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Signed polygon area via the shoelace formula.
///
/// Positive for counter-clockwise winding in a y-up frame. In the y-down screen
/// frame the visual orientation flips, but the sign convention stays the same
/// for every function in this module.
pub fn signed_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let twice_area: f32 = (0..n)
        .map(|i| cross(points[i], points[(i + 1) % n]))
        .sum();
    twice_area * 0.5
}

/// Area-weighted centroid of a simple polygon.
///
/// Falls back to the vertex average when the area is degenerate.
pub fn polygon_centroid(points: &[Vec2]) -> Vec2 {
    let n = points.len();
    if n == 0 {
        return Vec2::ZERO;
    }

    let area = signed_area(points);
    if area.abs() <= f32::EPSILON {
        return points.iter().copied().sum::<Vec2>() / n as f32;
    }

    // Shift to the first vertex to keep precision for outlines far from the origin
    let origin = points[0];
    let mut acc = Vec2::ZERO;
    for i in 0..n {
        let a = points[i] - origin;
        let b = points[(i + 1) % n] - origin;
        acc += (a + b) * cross(a, b);
    }
    origin + acc / (6.0 * area)
}

/// Check that a polygon is convex and simple.
///
/// Near-collinear corners are tolerated. Polygons whose turns all share a sign but
/// wind around more than once (star polygons) are rejected.
pub fn is_convex(points: &[Vec2], epsilon: f32) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }

    let mut sign = 0.0f32;
    let mut total_turn = 0.0f32;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        let ab = b - a;
        let bc = c - b;
        let turn = cross(ab, bc);

        if turn.abs() > epsilon {
            if sign == 0.0 {
                sign = turn.signum();
            } else if turn.signum() != sign {
                return false;
            }
        }

        if ab.length_squared() > 0.0 && bc.length_squared() > 0.0 {
            total_turn += turn.atan2(ab.dot(bc));
        }
    }

    sign != 0.0 && total_turn.abs() < std::f32::consts::TAU + 0.1
}

/// Rotate a vector by `angle` radians
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

/// Convert a glam vector into an engine point
pub fn to_point(v: Vec2) -> Point<Real> {
    point![v.x, v.y]
}

/// Convert a glam vector into an engine vector
pub fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

/// Convert an engine vector back into glam
pub fn from_vector(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

// Convex decomposition strategies for concave outlines

use glam::Vec2;
use parry2d::math::Point;
use parry2d::transformation::vhacd::{VHACDParameters, VHACD};

use super::{ConvexPolygon, CONVEXITY_EPSILON};
use crate::core::math::{cross, signed_area};

/// Decomposition errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecomposeError {
    #[error("polygon has {0} points, at least 3 are required")]
    TooFewPoints(usize),

    #[error("no ear found after clipping {clipped} triangles; the outline is self-intersecting or degenerate")]
    NoEar { clipped: usize },

    #[error("decomposition produced no usable convex parts")]
    Empty,
}

/// Splits a simple polygon into convex parts suitable for collision shapes
pub trait Decomposer: Send + Sync {
    fn decompose(&self, polygon: &[Vec2]) -> Result<Vec<ConvexPolygon>, DecomposeError>;
}

/// Ear-clipping triangulation followed by Hertel-Mehlhorn merging
///
/// Produces at most four times the optimal number of convex parts, which is plenty
/// for glyph-like outlines.
#[derive(Debug, Clone, Copy)]
pub struct EarClipDecomposer {
    epsilon: f32,
}

impl EarClipDecomposer {
    pub fn new() -> Self {
        Self {
            epsilon: CONVEXITY_EPSILON,
        }
    }

    /// Set the tolerance used for collinear and reflex corner tests
    pub fn epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    fn triangulate(&self, points: &[Vec2]) -> Result<Vec<[usize; 3]>, DecomposeError> {
        let mut remaining: Vec<usize> = (0..points.len()).collect();
        let mut triangles = Vec::with_capacity(points.len().saturating_sub(2));

        while remaining.len() > 3 {
            let n = remaining.len();
            let corner = |i: usize| {
                (
                    remaining[(i + n - 1) % n],
                    remaining[i],
                    remaining[(i + 1) % n],
                )
            };

            if let Some(i) = (0..n).find(|&i| self.is_ear(points, &remaining, corner(i))) {
                let (prev, cur, next) = corner(i);
                triangles.push([prev, cur, next]);
                remaining.remove(i);
                continue;
            }

            // Collinear vertices never form an ear; drop them and retry
            let collinear = (0..n).find(|&i| {
                let (prev, cur, next) = corner(i);
                cross(points[cur] - points[prev], points[next] - points[cur]).abs() <= self.epsilon
            });
            match collinear {
                Some(i) => {
                    remaining.remove(i);
                }
                None => {
                    return Err(DecomposeError::NoEar {
                        clipped: triangles.len(),
                    })
                }
            }
        }

        if let &[a, b, c] = remaining.as_slice() {
            if cross(points[b] - points[a], points[c] - points[b]) > self.epsilon {
                triangles.push([a, b, c]);
            }
        }

        Ok(triangles)
    }

    fn is_ear(&self, points: &[Vec2], remaining: &[usize], (prev, cur, next): (usize, usize, usize)) -> bool {
        let (a, b, c) = (points[prev], points[cur], points[next]);
        if cross(b - a, c - b) <= self.epsilon {
            return false;
        }

        remaining
            .iter()
            .filter(|&&j| j != prev && j != cur && j != next)
            .all(|&j| !point_in_triangle(points[j], a, b, c))
    }

    /// Greedily remove diagonals between neighbouring parts while the union stays convex
    fn merge(&self, points: &[Vec2], triangles: Vec<[usize; 3]>) -> Vec<Vec<usize>> {
        let mut parts: Vec<Vec<usize>> = triangles.into_iter().map(|t| t.to_vec()).collect();

        let mut merged = true;
        while merged {
            merged = false;
            'search: for i in 0..parts.len() {
                for j in (i + 1)..parts.len() {
                    let Some(candidate) = join_on_shared_edge(&parts[i], &parts[j]) else {
                        continue;
                    };
                    if is_convex_ccw(points, &candidate, self.epsilon) {
                        parts[i] = candidate;
                        parts.swap_remove(j);
                        merged = true;
                        break 'search;
                    }
                }
            }
        }

        parts
    }
}

impl Default for EarClipDecomposer {
    fn default() -> Self {
        Self::new()
    }
}

impl Decomposer for EarClipDecomposer {
    fn decompose(&self, polygon: &[Vec2]) -> Result<Vec<ConvexPolygon>, DecomposeError> {
        if polygon.len() < 3 {
            return Err(DecomposeError::TooFewPoints(polygon.len()));
        }

        let mut points = polygon.to_vec();
        if signed_area(&points) < 0.0 {
            points.reverse();
        }

        let triangles = self.triangulate(&points)?;
        let parts: Vec<ConvexPolygon> = self
            .merge(&points, triangles)
            .into_iter()
            .filter_map(|part| ConvexPolygon::new(part.into_iter().map(|i| points[i]).collect()))
            .collect();

        if parts.is_empty() {
            return Err(DecomposeError::Empty);
        }
        Ok(parts)
    }
}

/// Approximate decomposition using parry's V-HACD on the outline's segment loop
#[derive(Debug, Clone, Copy)]
pub struct VhacdDecomposer {
    resolution: u32,
    concavity: f32,
    max_convex_hulls: u32,
}

impl VhacdDecomposer {
    pub fn new() -> Self {
        let defaults = VHACDParameters::default();
        Self {
            resolution: defaults.resolution,
            concavity: defaults.concavity,
            max_convex_hulls: defaults.max_convex_hulls,
        }
    }

    /// Voxel grid resolution (higher is more precise and slower)
    pub fn resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    /// Maximum tolerated concavity of each part
    pub fn concavity(mut self, concavity: f32) -> Self {
        self.concavity = concavity;
        self
    }

    /// Upper bound on the number of parts
    pub fn max_convex_hulls(mut self, max: u32) -> Self {
        self.max_convex_hulls = max;
        self
    }
}

impl Default for VhacdDecomposer {
    fn default() -> Self {
        Self::new()
    }
}

impl Decomposer for VhacdDecomposer {
    fn decompose(&self, polygon: &[Vec2]) -> Result<Vec<ConvexPolygon>, DecomposeError> {
        if polygon.len() < 3 {
            return Err(DecomposeError::TooFewPoints(polygon.len()));
        }

        let params = VHACDParameters {
            resolution: self.resolution,
            concavity: self.concavity,
            max_convex_hulls: self.max_convex_hulls,
            ..VHACDParameters::default()
        };

        let points: Vec<Point<f32>> = polygon.iter().map(|p| Point::new(p.x, p.y)).collect();
        let n = points.len() as u32;
        let indices: Vec<[u32; 2]> = (0..n).map(|i| [i, (i + 1) % n]).collect();

        let decomposition = VHACD::decompose(&params, &points, &indices, true);
        let parts: Vec<ConvexPolygon> = decomposition
            .compute_exact_convex_hulls(&points, &indices)
            .into_iter()
            .filter_map(|hull| ConvexPolygon::new(hull.iter().map(|p| Vec2::new(p.x, p.y)).collect()))
            .collect();

        if parts.is_empty() {
            return Err(DecomposeError::Empty);
        }
        Ok(parts)
    }
}

/// Inclusive point-in-triangle test for a counter-clockwise triangle
fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    cross(b - a, p - a) >= 0.0 && cross(c - b, p - b) >= 0.0 && cross(a - c, p - c) >= 0.0
}

fn is_convex_ccw(points: &[Vec2], part: &[usize], epsilon: f32) -> bool {
    let n = part.len();
    (0..n).all(|i| {
        let a = points[part[i]];
        let b = points[part[(i + 1) % n]];
        let c = points[part[(i + 2) % n]];
        cross(b - a, c - b) >= -epsilon
    })
}

/// Join two counter-clockwise index loops across an edge they share in opposite
/// directions. Returns `None` when they are not neighbours.
fn join_on_shared_edge(a: &[usize], b: &[usize]) -> Option<Vec<usize>> {
    let (n, m) = (a.len(), b.len());
    for p in 0..n {
        let (u, v) = (a[p], a[(p + 1) % n]);
        if let Some(q) = (0..m).find(|&q| b[q] == v && b[(q + 1) % m] == u) {
            // a from v around to u, then b's vertices strictly between u and v
            let mut joined: Vec<usize> = (1..=n).map(|k| a[(p + k) % n]).collect();
            joined.extend((2..m).map(|k| b[(q + k) % m]));
            return Some(joined);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::is_convex;
    use approx::assert_relative_eq;

    fn l_shape() -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(20.0, 0.0),
            Vec2::new(20.0, 10.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(10.0, 20.0),
            Vec2::new(0.0, 20.0),
        ]
    }

    fn total_area(parts: &[ConvexPolygon]) -> f32 {
        parts.iter().map(ConvexPolygon::area).sum()
    }

    #[test]
    fn test_ear_clip_l_shape() {
        let parts = EarClipDecomposer::new().decompose(&l_shape()).unwrap();

        assert!(parts.len() >= 2, "concave input needs more than one part");
        assert!(parts.len() <= 4);
        for part in &parts {
            assert!(is_convex(part.points(), 1e-4));
            assert!(part.area() > 0.0);
        }
        assert_relative_eq!(total_area(&parts), 300.0, epsilon = 1e-2);
    }

    #[test]
    fn test_ear_clip_handles_clockwise_input() {
        let mut points = l_shape();
        points.reverse();
        let parts = EarClipDecomposer::new().decompose(&points).unwrap();
        assert_relative_eq!(total_area(&parts), 300.0, epsilon = 1e-2);
    }

    #[test]
    fn test_ear_clip_convex_input_merges_to_one_part() {
        let hexagon: Vec<Vec2> = (0..6)
            .map(|i| Vec2::from_angle(i as f32 * std::f32::consts::TAU / 6.0) * 10.0)
            .collect();
        let parts = EarClipDecomposer::new().decompose(&hexagon).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].points().len(), 6);
    }

    #[test]
    fn test_ear_clip_drops_collinear_vertices() {
        // U shape with an extra vertex in the middle of the bottom edge
        let points = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(15.0, 0.0),
            Vec2::new(30.0, 0.0),
            Vec2::new(30.0, 30.0),
            Vec2::new(20.0, 30.0),
            Vec2::new(20.0, 10.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(10.0, 30.0),
            Vec2::new(0.0, 30.0),
        ];
        let parts = EarClipDecomposer::new().decompose(&points).unwrap();
        assert_relative_eq!(total_area(&parts), 700.0, epsilon = 1e-2);
    }

    #[test]
    fn test_ear_clip_rejects_self_intersection() {
        // Bow tie: the two triangles overlap at the crossing
        let bow_tie = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(0.0, 10.0),
        ];
        // Either an error or parts that are individually convex; never a panic
        if let Ok(parts) = EarClipDecomposer::new().decompose(&bow_tie) {
            for part in &parts {
                assert!(is_convex(part.points(), 1e-4));
            }
        }
    }

    #[test]
    fn test_ear_clip_too_few_points() {
        let result = EarClipDecomposer::new().decompose(&[Vec2::ZERO, Vec2::ONE]);
        assert_eq!(result, Err(DecomposeError::TooFewPoints(2)));
    }

    #[test]
    fn test_join_on_shared_edge() {
        // Two triangles sharing the diagonal 0-2 of a square
        let joined = join_on_shared_edge(&[0, 1, 2], &[0, 2, 3]).unwrap();
        assert_eq!(joined, vec![0, 1, 2, 3]);
        assert!(join_on_shared_edge(&[0, 1, 2], &[3, 4, 5]).is_none());
    }

    #[test]
    fn test_vhacd_l_shape() {
        let parts = VhacdDecomposer::new().decompose(&l_shape()).unwrap();
        assert!(!parts.is_empty());
        for part in &parts {
            assert!(is_convex(part.points(), 1e-3));
        }
    }
}

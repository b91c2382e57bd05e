#![warn(missing_docs)]

//! Math types for the brainslice heatmap engine.
//!
//! Thin wrappers around nalgebra providing domain-specific types
//! for atlas-space geometry: points, vectors, directions, axis-aligned
//! bounds, and tolerance constants.

use nalgebra::{Unit, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// A point in 3D atlas space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A point in a plane's 2D `(u, v)` coordinates.
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in 2D space.
pub type Vec2 = Vector2<f64>;

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance in atlas units (µm for most atlases).
    pub linear: f64,
    /// Below this magnitude a vector is considered zero-length.
    pub vector: f64,
}

impl Tolerance {
    /// Default tolerances (1e-6 linear, 1e-9 for vector magnitudes).
    pub const DEFAULT: Self = Self {
        linear: 1e-6,
        vector: 1e-9,
    };
}

/// Axis-aligned bounding box in atlas space.
///
/// Stored as arrays so it serializes without nalgebra's serde feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox3 {
    /// Minimum corner `[x, y, z]`.
    pub min: [f64; 3],
    /// Maximum corner `[x, y, z]`.
    pub max: [f64; 3],
}

impl BoundingBox3 {
    /// Create a bounding box from two corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self {
            min: [min.x, min.y, min.z],
            max: [max.x, max.y, max.z],
        }
    }

    /// An inverted box that any point expands.
    pub fn empty() -> Self {
        Self {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }

    /// Expand the box to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(p[axis]);
            self.max[axis] = self.max[axis].max(p[axis]);
        }
    }

    /// Check if the box contains at least one point.
    pub fn is_valid(&self) -> bool {
        (0..3).all(|axis| self.min[axis] <= self.max[axis])
    }

    /// Minimum corner as a point.
    pub fn min_point(&self) -> Point3 {
        Point3::new(self.min[0], self.min[1], self.min[2])
    }

    /// Maximum corner as a point.
    pub fn max_point(&self) -> Point3 {
        Point3::new(self.max[0], self.max[1], self.max[2])
    }

    /// Midpoint along a single axis, `(min + max) / 2`.
    pub fn midpoint(&self, axis: usize) -> f64 {
        (self.min[axis] + self.max[axis]) / 2.0
    }

    /// Geometric center of the box.
    pub fn center(&self) -> Point3 {
        Point3::new(self.midpoint(0), self.midpoint(1), self.midpoint(2))
    }

    /// Edge lengths along each axis.
    pub fn extents(&self) -> Vec3 {
        self.max_point() - self.min_point()
    }

    /// Longest edge length.
    pub fn max_extent(&self) -> f64 {
        self.extents().max()
    }

    /// The 8 corners of the box.
    pub fn corners(&self) -> [Point3; 8] {
        let [x0, y0, z0] = self.min;
        let [x1, y1, z1] = self.max;
        [
            Point3::new(x0, y0, z0),
            Point3::new(x1, y0, z0),
            Point3::new(x1, y1, z0),
            Point3::new(x0, y1, z0),
            Point3::new(x0, y0, z1),
            Point3::new(x1, y0, z1),
            Point3::new(x1, y1, z1),
            Point3::new(x0, y1, z1),
        ]
    }
}

impl Default for BoundingBox3 {
    fn default() -> Self {
        Self::empty()
    }
}

/// Index of the component with the largest magnitude.
///
/// Returns `None` when two components tie for the largest magnitude,
/// i.e. there is no single dominant axis.
pub fn dominant_axis(v: &Vec3) -> Option<usize> {
    let mags = [v.x.abs(), v.y.abs(), v.z.abs()];
    let mut best = 0;
    for axis in 1..3 {
        if mags[axis] > mags[best] {
            best = axis;
        }
    }
    let ties = mags.iter().filter(|&&m| m == mags[best]).count();
    (ties == 1).then_some(best)
}

//! Projection of 3D contours into a plane's 2D `(u, v)` coordinates.

use brainslice_math::{Point2, Point3, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::contour::Contour;
use crate::plane::{Basis2D, Plane};

/// A 2D outline in plane coordinates.
///
/// Closed polygons are stored counter-clockwise and do not repeat their first point.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon2D {
    /// Vertices in order.
    pub points: Vec<Point2>,
    /// Whether the last point connects back to the first.
    pub closed: bool,
}

impl Polygon2D {
    /// Create a polygon.
    pub fn new(points: Vec<Point2>, closed: bool) -> Self {
        Self { points, closed }
    }

    /// Closed polygon from `[u, v]` pairs.
    pub fn from_coords(coords: &[[f64; 2]]) -> Self {
        Self::new(coords.iter().map(|&[x, y]| Point2::new(x, y)).collect(), true)
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the polygon has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Signed area; positive for counter-clockwise winding.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        (0..n)
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum::<f64>()
            / 2.0
    }

    /// Enclosed area.
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Is the polygon counter-clockwise?
    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Reverse the winding if needed so the polygon is counter-clockwise.
    pub fn ensure_ccw(&mut self) {
        if self.signed_area() < 0.0 {
            self.points.reverse();
        }
    }

    /// Outline length, including the closing edge for closed polygons.
    pub fn perimeter(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        let edges = if self.closed { n } else { n - 1 };
        (0..edges)
            .map(|i| (self.points[(i + 1) % n] - self.points[i]).norm())
            .sum()
    }

    /// Area-weighted centroid, or the vertex average for degenerate polygons.
    pub fn centroid(&self) -> Point2 {
        if self.points.is_empty() {
            return Point2::origin();
        }
        let n = self.points.len();
        let area = self.signed_area();
        if area.abs() > f64::EPSILON {
            let (mut cx, mut cy) = (0.0, 0.0);
            for i in 0..n {
                let a = self.points[i];
                let b = self.points[(i + 1) % n];
                let cross = a.x * b.y - b.x * a.y;
                cx += (a.x + b.x) * cross;
                cy += (a.y + b.y) * cross;
            }
            return Point2::new(cx / (6.0 * area), cy / (6.0 * area));
        }
        let sum = self
            .points
            .iter()
            .fold(Vec2::zeros(), |acc, p| acc + p.coords);
        Point2::from(sum / n as f64)
    }

    /// Minimum and maximum corners, or `None` when empty.
    pub fn bounds(&self) -> Option<(Point2, Point2)> {
        let first = self.points.first()?;
        let (mut lo, mut hi) = (*first, *first);
        for p in &self.points[1..] {
            lo = Point2::new(lo.x.min(p.x), lo.y.min(p.y));
            hi = Point2::new(hi.x.max(p.x), hi.y.max(p.y));
        }
        Some((lo, hi))
    }

    /// Point-in-polygon test by ray casting.
    pub fn contains(&self, p: &Point2) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let vi = self.points[i];
            let vj = self.points[j];
            if (vi.y > p.y) != (vj.y > p.y)
                && p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Distance from `p` to the nearest edge.
    pub fn distance_to_boundary(&self, p: &Point2) -> f64 {
        let n = self.points.len();
        if n == 0 {
            return f64::INFINITY;
        }
        if n == 1 {
            return (self.points[0] - p).norm();
        }
        let edges = if self.closed { n } else { n - 1 };
        (0..edges)
            .map(|i| segment_distance(p, &self.points[i], &self.points[(i + 1) % n]))
            .fold(f64::INFINITY, f64::min)
    }

    /// Vertices as `[u, v]` pairs.
    pub fn coords(&self) -> Vec<[f64; 2]> {
        self.points.iter().map(|p| [p.x, p.y]).collect()
    }
}

fn segment_distance(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 == 0.0 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

#[derive(Serialize, Deserialize)]
struct PolygonRepr {
    points: Vec<[f64; 2]>,
    closed: bool,
}

impl Serialize for Polygon2D {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PolygonRepr {
            points: self.coords(),
            closed: self.closed,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Polygon2D {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = PolygonRepr::deserialize(deserializer)?;
        let mut polygon = Polygon2D::from_coords(&repr.points);
        polygon.closed = repr.closed;
        Ok(polygon)
    }
}

/// Maps 3D points onto a plane's 2D coordinates and back.
///
/// Built once per request and shared across regions; every region is
/// projected with the same center and basis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    /// Origin of the 2D coordinates.
    pub center: Point3,
    /// Plane normal; the component along it is discarded.
    pub normal: Vec3,
    /// In-plane axes.
    pub basis: Basis2D,
}

impl Projector {
    /// Projector for `plane` using its canonical basis.
    pub fn new(plane: &Plane) -> Self {
        Self::with_basis(plane, plane.basis())
    }

    /// Projector for `plane` using a given basis.
    pub fn with_basis(plane: &Plane, basis: Basis2D) -> Self {
        Self {
            center: plane.center,
            normal: plane.normal.into_inner(),
            basis,
        }
    }

    /// `((p - center) · u, (p - center) · v)`.
    pub fn project(&self, p: &Point3) -> Point2 {
        let d = p - self.center;
        Point2::new(d.dot(&*self.basis.u), d.dot(&*self.basis.v))
    }

    /// The point `center + x·u + y·v` on the plane.
    pub fn unproject(&self, uv: &Point2) -> Point3 {
        self.center + self.basis.u.into_inner() * uv.x + self.basis.v.into_inner() * uv.y
    }

    /// Project a contour; closed outlines come out counter-clockwise.
    pub fn project_contour(&self, contour: &Contour) -> Polygon2D {
        let points = contour.points.iter().map(|p| self.project(p)).collect();
        let mut polygon = Polygon2D::new(points, contour.closed);
        if polygon.closed {
            polygon.ensure_ccw();
        }
        polygon
    }

    /// Project every contour, in order.
    pub fn project_contours(&self, contours: &[Contour]) -> Vec<Polygon2D> {
        contours.iter().map(|c| self.project_contour(c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn square() -> Polygon2D {
        Polygon2D::from_coords(&[[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]])
    }

    #[test]
    fn test_polygon_area_and_winding() {
        let mut sq = square();
        assert_abs_diff_eq!(sq.signed_area(), 16.0, epsilon = 1e-12);
        assert!(sq.is_ccw());
        sq.points.reverse();
        assert!(!sq.is_ccw());
        sq.ensure_ccw();
        assert!(sq.is_ccw());
        assert_abs_diff_eq!(sq.area(), 16.0, epsilon = 1e-12);
        assert_abs_diff_eq!(sq.perimeter(), 16.0, epsilon = 1e-12);
    }

    #[test]
    fn test_polygon_centroid_and_contains() {
        let sq = square();
        let c = sq.centroid();
        assert_abs_diff_eq!(c.x, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c.y, 2.0, epsilon = 1e-12);
        assert!(sq.contains(&Point2::new(1.0, 1.0)));
        assert!(!sq.contains(&Point2::new(5.0, 1.0)));
        assert_abs_diff_eq!(sq.distance_to_boundary(&c), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_projection_round_trip() {
        let plane = Plane::new(Point3::new(100.0, 50.0, -20.0), Vec3::new(0.4, 0.5, -0.3)).unwrap();
        let projector = Projector::new(&plane);
        let uv = Point2::new(-17.25, 3.5);
        let p = projector.unproject(&uv);
        let back = projector.project(&p);
        assert_abs_diff_eq!(back.x, uv.x, epsilon = 1e-9);
        assert_abs_diff_eq!(back.y, uv.y, epsilon = 1e-9);
    }

    #[test]
    fn test_projection_drops_normal_component() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 0.0), Vec3::z()).unwrap();
        let projector = Projector::new(&plane);
        let a = projector.project(&Point3::new(3.0, 4.0, 0.0));
        let b = projector.project(&Point3::new(3.0, 4.0, 25.0));
        assert_eq!(a, b);
        // Sagittal frame: u = +x, v = +y.
        assert_abs_diff_eq!(a.x, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(a.y, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_projection_preserves_distances() {
        let plane = Plane::new(Point3::new(1.0, 2.0, 3.0), Vec3::new(1.0, 2.0, 2.0)).unwrap();
        let projector = Projector::new(&plane);
        let a = plane.from_plane_coords(&Point2::new(0.0, 0.0));
        let b = plane.from_plane_coords(&Point2::new(3.0, 4.0));
        let (pa, pb) = (projector.project(&a), projector.project(&b));
        assert_abs_diff_eq!((pb - pa).norm(), (b - a).norm(), epsilon = 1e-9);
        assert_abs_diff_eq!((pb - pa).norm(), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_project_contour_is_ccw() {
        let plane = Plane::new(Point3::origin(), Vec3::z()).unwrap();
        let projector = Projector::new(&plane);
        let cw = Contour::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
            ],
            true,
        );
        let polygon = projector.project_contour(&cw);
        assert!(polygon.closed);
        assert!(polygon.is_ccw());
        assert_abs_diff_eq!(polygon.area(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_polygon_serde_shape() {
        let json = serde_json::to_string(&square()).unwrap();
        assert_eq!(
            json,
            r#"{"points":[[0.0,0.0],[4.0,0.0],[4.0,4.0],[0.0,4.0]],"closed":true}"#
        );
        let back: Polygon2D = serde_json::from_str(&json).unwrap();
        assert_eq!(back, square());
    }
}

//! Cutting planes, their in-plane 2D basis, and finite-thickness slabs.

use brainslice_math::{BoundingBox3, Dir3, Point2, Point3, Tolerance, Vec3};

use crate::error::{Result, SlicerError};

/// Primary reference direction for building a plane basis (dorsal-ventral axis).
pub const UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// Reference used instead of [`UP`] when the normal is nearly parallel to it.
pub const FALLBACK_UP: Vec3 = Vec3::new(-1.0, 0.0, 0.0);

/// `|normal · UP|` above this switches to [`FALLBACK_UP`].
pub const PARALLEL_THRESHOLD: f64 = 0.999;

/// An infinite cutting plane: a center point and a unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Point on the plane; origin of the plane's 2D coordinates.
    pub center: Point3,
    /// Unit normal.
    pub normal: Dir3,
}

impl Plane {
    /// Create a plane, normalizing `normal`.
    ///
    /// Fails with [`SlicerError::DegenerateVector`] if `normal` is (near) zero
    /// or not finite.
    pub fn new(center: Point3, normal: Vec3) -> Result<Self> {
        let normal = normalize(normal)?;
        Ok(Self { center, normal })
    }

    /// Create a plane from an already normalized direction.
    pub fn from_unit(center: Point3, normal: Dir3) -> Self {
        Self { center, normal }
    }

    /// Signed distance from `p` to the plane, positive on the normal side.
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&(p - self.center))
    }

    /// The plane's in-plane orthonormal basis.
    pub fn basis(&self) -> Basis2D {
        Basis2D::from_normal(&self.normal)
    }

    /// `(u, v)` coordinates of `p` in this plane's basis; the normal
    /// component is dropped.
    pub fn to_plane_coords(&self, p: &Point3) -> Point2 {
        let basis = self.basis();
        let d = p - self.center;
        Point2::new(d.dot(&*basis.u), d.dot(&*basis.v))
    }

    /// The 3D point at `uv` on this plane.
    pub fn from_plane_coords(&self, uv: &Point2) -> Point3 {
        let basis = self.basis();
        self.center + basis.u.into_inner() * uv.x + basis.v.into_inner() * uv.y
    }

    /// The same plane moved by `offset` along its normal.
    pub fn offset(&self, offset: f64) -> Self {
        Self {
            center: self.center + self.normal.into_inner() * offset,
            normal: self.normal,
        }
    }
}

/// Normalize a vector, rejecting zero-length and non-finite input.
pub fn normalize(v: Vec3) -> Result<Dir3> {
    let tol = Tolerance::DEFAULT;
    if !v.iter().all(|c| c.is_finite()) || v.norm() < tol.vector {
        return Err(SlicerError::DegenerateVector(v.x, v.y, v.z));
    }
    Ok(Dir3::new_normalize(v))
}

/// Orthonormal in-plane axes `u`, `v` with `u × v = normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basis2D {
    /// First in-plane axis (2D x).
    pub u: Dir3,
    /// Second in-plane axis (2D y).
    pub v: Dir3,
}

impl Basis2D {
    /// Derive the basis for a plane normal.
    ///
    /// Uses [`UP`] as reference, or [`FALLBACK_UP`] when the normal is within
    /// [`PARALLEL_THRESHOLD`] of it. The result depends on the normal alone,
    /// so separate calls with the same normal produce identical axes.
    pub fn from_normal(normal: &Dir3) -> Self {
        let n = normal.into_inner();
        let reference = if n.dot(&UP).abs() > PARALLEL_THRESHOLD {
            FALLBACK_UP
        } else {
            UP
        };
        let u = Dir3::new_normalize(reference.cross(&n));
        let v = Dir3::new_normalize(n.cross(&*u));
        Self { u, v }
    }

    /// The normal implied by this basis, `u × v`.
    pub fn normal(&self) -> Vec3 {
        self.u.cross(&*self.v)
    }
}

/// Which plane of a slab a section was taken on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlabFace {
    /// The plane at `center - thickness/2 * normal`.
    Near,
    /// The plane at `center + thickness/2 * normal`.
    Far,
    /// The center plane, for material lying wholly inside the slab.
    Center,
}

/// One of the two bounding planes of a slab, with its own outward frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedPlane {
    /// Point on the plane.
    pub center: Point3,
    /// Normal pointing into the slab.
    pub normal: Vec3,
    /// First in-plane axis.
    pub u: Vec3,
    /// Second in-plane axis.
    pub v: Vec3,
}

/// The volume between two parallel planes `thickness` apart, centered on a plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slab {
    /// Center plane.
    pub plane: Plane,
    /// Distance between the two bounding planes.
    pub thickness: f64,
}

impl Slab {
    /// Create a slab; `thickness` must be finite and strictly positive.
    pub fn new(plane: Plane, thickness: f64) -> Result<Self> {
        if !thickness.is_finite() || thickness <= 0.0 {
            return Err(SlicerError::InvalidThickness(thickness));
        }
        Ok(Self { plane, thickness })
    }

    /// Half of the thickness.
    pub fn half_thickness(&self) -> f64 {
        self.thickness / 2.0
    }

    /// The plane for `face`, sharing the center plane's normal.
    pub fn face_plane(&self, face: SlabFace) -> Plane {
        match face {
            SlabFace::Near => self.plane.offset(-self.half_thickness()),
            SlabFace::Far => self.plane.offset(self.half_thickness()),
            SlabFace::Center => self.plane,
        }
    }

    /// Whether `p` lies between the two bounding planes (inclusive).
    pub fn contains(&self, p: &Point3) -> bool {
        self.plane.signed_distance(p).abs() <= self.half_thickness()
    }

    /// Whether any part of `bounds` can lie inside the slab.
    pub fn overlaps(&self, bounds: &BoundingBox3) -> bool {
        if !bounds.is_valid() {
            return false;
        }
        let h = self.half_thickness();
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for corner in bounds.corners() {
            let d = self.plane.signed_distance(&corner);
            lo = lo.min(d);
            hi = hi.max(d);
        }
        hi >= -h && lo <= h
    }

    /// The two bounding planes with inward normals.
    ///
    /// The near plane keeps the center basis `(u, v)`; the far plane faces the
    /// other way and uses `(u, -v)` so that both frames stay right-handed.
    pub fn planes(&self) -> [OrientedPlane; 2] {
        let basis = self.plane.basis();
        let n = self.plane.normal.into_inner();
        let u = basis.u.into_inner();
        let v = basis.v.into_inner();
        [
            OrientedPlane {
                center: self.face_plane(SlabFace::Near).center,
                normal: n,
                u,
                v,
            },
            OrientedPlane {
                center: self.face_plane(SlabFace::Far).center,
                normal: -n,
                u,
                v: -v,
            },
        ]
    }
}

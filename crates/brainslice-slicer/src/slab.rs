//! Slab intersection: the part of a region surface that lies in a slab, and
//! the outline the region leaves on the slab's planes.

use brainslice_math::{Point3, Tolerance};
use brainslice_mesh::RegionMesh;
use log::debug;

use crate::contour::{chain_segments, Contour, CHAIN_TOLERANCE};
use crate::plane::{Plane, Slab, SlabFace};

/// Outline of one region inside a slab.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlabSection {
    /// One contour per connected outline. Open contours come from meshes
    /// that are not closed.
    pub contours: Vec<Contour>,
    /// The slab plane each contour lies on, parallel to `contours`.
    pub faces: Vec<SlabFace>,
}

impl SlabSection {
    /// Whether the region left no outline at all.
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Closed contours only.
    pub fn closed_contours(&self) -> impl Iterator<Item = &Contour> {
        self.contours.iter().filter(|c| c.closed)
    }

    fn push(&mut self, face: SlabFace, contours: Vec<Contour>) {
        self.faces.extend(std::iter::repeat(face).take(contours.len()));
        self.contours.extend(contours);
    }
}

/// Intersect a region surface with a slab.
///
/// Each connected piece of the surface is outlined on its own. A piece is
/// outlined on the near plane; a piece that only enters the slab through the
/// far plane is outlined there instead, and a piece lying wholly between
/// both planes is outlined on the center plane. Pieces that miss the slab
/// contribute nothing. Contours keep the order of the pieces in the mesh.
pub fn intersect_slab(mesh: &RegionMesh, slab: &Slab) -> SlabSection {
    let mut section = SlabSection::default();
    if mesh.is_empty() || slab.thickness <= Tolerance::DEFAULT.linear {
        return section;
    }
    match mesh.bounds() {
        Some(bounds) if slab.overlaps(&bounds) => {}
        Some(bounds) => {
            debug!("mesh bounds {:?}..{:?} miss the slab", bounds.min, bounds.max);
            return section;
        }
        None => return section,
    }

    for piece in mesh.components() {
        let Some(bounds) = piece.bounds() else {
            continue;
        };
        if !slab.overlaps(&bounds) {
            continue;
        }
        if let Some((face, contours)) = piece_section(&piece, slab) {
            section.push(face, contours);
        }
    }
    section
}

/// Outline of one connected piece: the first face with a closed loop, else
/// the first face with any contour.
fn piece_section(piece: &RegionMesh, slab: &Slab) -> Option<(SlabFace, Vec<Contour>)> {
    let mut open_only = None;
    for face in [SlabFace::Near, SlabFace::Far, SlabFace::Center] {
        let contours = section_on_plane(piece, &slab.face_plane(face));
        if contours.iter().any(|c| c.closed) {
            return Some((face, contours));
        }
        if open_only.is_none() && !contours.is_empty() {
            open_only = Some((face, contours));
        }
    }
    open_only
}

/// Chained outline of `mesh` on a single plane.
pub fn section_on_plane(mesh: &RegionMesh, plane: &Plane) -> Vec<Contour> {
    let segments = plane_segments(mesh, plane);
    if segments.is_empty() {
        return Vec::new();
    }
    chain_segments(&segments, CHAIN_TOLERANCE)
}

/// One segment for every triangle that crosses `plane`.
///
/// Vertices at distance `>= 0` count as above the plane, so a triangle
/// crosses exactly when its corners are split between the two sides and then
/// contributes exactly one segment. Segments that collapse to a point (a
/// corner touching the plane) are dropped, and so are triangles that
/// reference missing vertices.
pub fn plane_segments(mesh: &RegionMesh, plane: &Plane) -> Vec<(Point3, Point3)> {
    let distances: Vec<f64> = (0..mesh.num_vertices())
        .map(|i| plane.signed_distance(&mesh.vertex(i)))
        .collect();

    let mut segments = Vec::new();
    for tri in mesh.indices.chunks_exact(3) {
        let idx = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (Some(&d0), Some(&d1), Some(&d2)) =
            (distances.get(idx[0]), distances.get(idx[1]), distances.get(idx[2]))
        else {
            continue;
        };
        let d = [d0, d1, d2];
        let above = d.map(|x| x >= 0.0);
        if above[0] == above[1] && above[1] == above[2] {
            continue;
        }

        let pts = idx.map(|i| mesh.vertex(i));
        let mut crossing = [Point3::origin(); 2];
        let mut n = 0;
        for k in 0..3 {
            let j = (k + 1) % 3;
            if above[k] != above[j] {
                crossing[n] = edge_point(pts[k], d[k], pts[j], d[j]);
                n += 1;
            }
        }
        if crossing[0] != crossing[1] {
            segments.push((crossing[0], crossing[1]));
        }
    }
    segments
}

/// Where an edge crosses the plane.
///
/// Endpoints are put in lexicographic order first so that the two triangles
/// sharing an edge compute bit-identical points.
fn edge_point(a: Point3, da: f64, b: Point3, db: f64) -> Point3 {
    let ((a, da), (b, db)) = if (b.x, b.y, b.z) < (a.x, a.y, a.z) {
        ((b, db), (a, da))
    } else {
        ((a, da), (b, db))
    };
    if da == 0.0 {
        return a;
    }
    if db == 0.0 {
        return b;
    }
    let t = da / (da - db);
    a + (b - a) * t
}

/// The part of a region surface that lies inside the slab.
///
/// Each triangle is clipped against both slab planes and the remaining
/// convex polygon is fan-triangulated. Triangles outside the slab vanish.
pub fn clip_mesh_to_slab(mesh: &RegionMesh, slab: &Slab) -> RegionMesh {
    let h = slab.half_thickness();
    let plane = slab.plane;
    clip_mesh(mesh, |tri| {
        let poly = clip_polygon(tri, |p| plane.signed_distance(p) + h);
        clip_polygon(&poly, |p| h - plane.signed_distance(p))
    })
}

/// The part of a surface on the side of `plane` its normal points to.
pub fn clip_mesh_to_half_space(mesh: &RegionMesh, plane: &Plane) -> RegionMesh {
    clip_mesh(mesh, |tri| clip_polygon(tri, |p| plane.signed_distance(p)))
}

fn clip_mesh(mesh: &RegionMesh, clip: impl Fn(&[Point3]) -> Vec<Point3>) -> RegionMesh {
    let mut clipped = RegionMesh::new();
    let num_vertices = mesh.num_vertices();
    for tri in mesh.indices.chunks_exact(3) {
        if tri.iter().any(|&i| i as usize >= num_vertices) {
            continue;
        }
        let tri = [tri[0], tri[1], tri[2]].map(|i| mesh.vertex(i as usize));
        let poly = clip(&tri[..]);
        if poly.len() < 3 {
            continue;
        }
        let ids: Vec<u32> = poly.iter().map(|p| clipped.push_vertex(*p)).collect();
        for k in 1..ids.len() - 1 {
            clipped.push_triangle(ids[0], ids[k], ids[k + 1]);
        }
    }
    clipped
}

/// Keep the part of a convex polygon where `dist >= 0`.
fn clip_polygon(poly: &[Point3], dist: impl Fn(&Point3) -> f64) -> Vec<Point3> {
    let n = poly.len();
    let mut out = Vec::with_capacity(n + 1);
    for i in 0..n {
        let cur = poly[i];
        let next = poly[(i + 1) % n];
        let dc = dist(&cur);
        let dn = dist(&next);
        if dc >= 0.0 {
            out.push(cur);
        }
        if (dc >= 0.0) != (dn >= 0.0) {
            let t = dc / (dc - dn);
            out.push(cur + (next - cur) * t);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use brainslice_math::Vec3;

    fn z_slab(z: f64, thickness: f64) -> Slab {
        let plane = Plane::new(Point3::new(0.0, 0.0, z), Vec3::z()).unwrap();
        Slab::new(plane, thickness).unwrap()
    }

    fn cube() -> RegionMesh {
        RegionMesh::cuboid(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 10.0, 10.0))
    }

    #[test]
    fn test_cube_section_on_near_plane() {
        let section = intersect_slab(&cube(), &z_slab(5.0, 2.0));
        assert_eq!(section.faces, vec![SlabFace::Near]);
        assert_eq!(section.contours.len(), 1);
        let contour = &section.contours[0];
        assert!(contour.closed);
        assert!(contour.points.iter().all(|p| (p.z - 4.0).abs() < 1e-12));
        assert_abs_diff_eq!(contour.length(), 40.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mesh_outside_slab() {
        let section = intersect_slab(&cube(), &z_slab(50.0, 10.0));
        assert!(section.is_empty());
        assert!(section.faces.is_empty());
    }

    #[test]
    fn test_empty_mesh() {
        assert!(intersect_slab(&RegionMesh::new(), &z_slab(0.0, 1.0)).is_empty());
    }

    #[test]
    fn test_far_face_fallback() {
        // Near plane at z = -1 misses the cube, far plane at z = 1 cuts it.
        let section = intersect_slab(&cube(), &z_slab(0.0, 2.0));
        assert_eq!(section.faces, vec![SlabFace::Far]);
        assert_eq!(section.contours.len(), 1);
        assert!(section.contours[0].points.iter().all(|p| (p.z - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_region_inside_slab_uses_center_plane() {
        let sphere = RegionMesh::uv_sphere(Point3::new(0.0, 0.0, 0.0), 1.0, 16, 9);
        let section = intersect_slab(&sphere, &z_slab(0.0, 100.0));
        assert_eq!(section.faces, vec![SlabFace::Center]);
        assert_eq!(section.closed_contours().count(), 1);
    }

    #[test]
    fn test_disjoint_lobes_give_two_contours() {
        let mut mesh = RegionMesh::uv_sphere(Point3::new(-20.0, 0.0, 0.0), 5.0, 24, 12);
        mesh.merge(&RegionMesh::uv_sphere(Point3::new(20.0, 0.0, 0.0), 5.0, 24, 12));
        let section = intersect_slab(&mesh, &z_slab(0.3, 0.2));
        assert_eq!(section.contours.len(), 2);
        assert!(section.contours.iter().all(|c| c.closed));
    }

    #[test]
    fn test_each_lobe_picks_its_own_face() {
        // Slab spans z in [-50, 50]. The first lobe crosses the near plane,
        // the second only the far plane, the third sits wholly inside.
        let mut mesh = RegionMesh::uv_sphere(Point3::new(0.0, 0.0, -45.0), 30.0, 24, 12);
        mesh.merge(&RegionMesh::uv_sphere(Point3::new(100.0, 0.0, 40.0), 30.0, 24, 12));
        mesh.merge(&RegionMesh::uv_sphere(Point3::new(200.0, 0.0, 0.5), 10.0, 24, 12));
        let section = intersect_slab(&mesh, &z_slab(0.0, 100.0));
        assert_eq!(section.contours.len(), 3);
        assert_eq!(
            section.faces,
            vec![SlabFace::Near, SlabFace::Far, SlabFace::Center]
        );
        assert!(section.contours.iter().all(|c| c.closed));
        assert!(section.contours[0].points.iter().all(|p| (p.z + 50.0).abs() < 1e-9));
        assert!(section.contours[1].points.iter().all(|p| (p.z - 50.0).abs() < 1e-9));
        assert!(section.contours[2].points.iter().all(|p| p.z.abs() < 1e-9));
    }

    #[test]
    fn test_lobe_outside_slab_is_skipped() {
        let mut mesh = RegionMesh::uv_sphere(Point3::new(0.0, 0.0, 0.3), 5.0, 24, 12);
        mesh.merge(&RegionMesh::uv_sphere(Point3::new(0.0, 0.0, 80.0), 5.0, 24, 12));
        let section = intersect_slab(&mesh, &z_slab(0.3, 0.2));
        assert_eq!(section.contours.len(), 1);
        assert_eq!(section.faces, vec![SlabFace::Near]);
    }

    #[test]
    fn test_bad_triangles_are_skipped() {
        let mut mesh = cube();
        mesh.indices.extend_from_slice(&[0, 1, 70]);
        assert_eq!(plane_segments(&mesh, &z_slab(5.0, 2.0).plane).len(), 8);
        assert_eq!(intersect_slab(&mesh, &z_slab(5.0, 2.0)).contours.len(), 1);
        assert_eq!(
            clip_mesh_to_slab(&mesh, &z_slab(5.0, 2.0)).num_triangles(),
            clip_mesh_to_slab(&cube(), &z_slab(5.0, 2.0)).num_triangles()
        );
    }

    #[test]
    fn test_plane_through_vertices() {
        // The cuboid's own vertices sit on z = 0; only the far plane cuts.
        let section = intersect_slab(&cube(), &z_slab(1.0, 2.0));
        assert_eq!(section.faces, vec![SlabFace::Far]);
        assert_eq!(section.contours.len(), 1);
    }

    #[test]
    fn test_segments_are_deterministic() {
        let mesh = RegionMesh::uv_sphere(Point3::new(1.0, 2.0, 3.0), 4.0, 20, 10);
        let plane = Plane::new(Point3::new(1.0, 2.0, 3.5), Vec3::new(0.2, -0.1, 1.0)).unwrap();
        assert_eq!(plane_segments(&mesh, &plane), plane_segments(&mesh, &plane));
        assert_eq!(section_on_plane(&mesh, &plane), section_on_plane(&mesh, &plane));
    }

    #[test]
    fn test_clip_mesh_to_slab() {
        let clipped = clip_mesh_to_slab(&cube(), &z_slab(5.0, 2.0));
        let bb = clipped.bounds().unwrap();
        assert_abs_diff_eq!(bb.min[2], 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bb.max[2], 6.0, epsilon = 1e-12);
        assert_eq!(bb.min[0], 0.0);
        assert_eq!(bb.max[0], 10.0);

        let outside = clip_mesh_to_slab(&cube(), &z_slab(50.0, 2.0));
        assert!(outside.is_empty());
    }

    #[test]
    fn test_clip_mesh_to_half_space() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 7.0), Vec3::z()).unwrap();
        let bb = clip_mesh_to_half_space(&cube(), &plane).bounds().unwrap();
        assert_abs_diff_eq!(bb.min[2], 7.0, epsilon = 1e-12);
        assert_eq!(bb.max[2], 10.0);
    }
}

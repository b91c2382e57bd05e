//! 3D scene description handed to renderers.

use std::fmt;

use brainslice_math::{Point3, Vec3};
use brainslice_mesh::RegionMesh;
use brainslice_slicer::{OrientedPlane, Slab};
use serde::{Deserialize, Serialize};

use crate::colormap::Rgba;
use crate::error::Result;

/// Edge length of a slab plane quad relative to the largest atlas extent.
pub const PLANE_SIZE_FACTOR: f64 = 4.0 / 3.0;

/// Position and frame of one slab plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneInfo {
    /// Point on the plane.
    pub center: [f64; 3],
    /// Normal pointing into the slab.
    pub normal: [f64; 3],
    /// First in-plane axis.
    pub u: [f64; 3],
    /// Second in-plane axis.
    pub v: [f64; 3],
}

impl PlaneInfo {
    /// Near and far planes of `slab`.
    pub fn for_slab(slab: &Slab) -> [Self; 2] {
        slab.planes().map(|p| Self::from(&p))
    }

    /// Center as a point.
    pub fn center_point(&self) -> Point3 {
        Point3::from(self.center)
    }
}

impl From<&OrientedPlane> for PlaneInfo {
    fn from(plane: &OrientedPlane) -> Self {
        Self {
            center: plane.center.coords.into(),
            normal: plane.normal.into(),
            u: plane.u.into(),
            v: plane.v.into(),
        }
    }
}

impl fmt::Display for PlaneInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = |a: &[f64; 3]| format!("({:.3}, {:.3}, {:.3})", a[0], a[1], a[2]);
        write!(
            f,
            "center {} | normal {} | u {} | v {}",
            v(&self.center),
            v(&self.normal),
            v(&self.u),
            v(&self.v)
        )
    }
}

/// A colored mesh in a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneActor {
    /// Region acronym.
    pub name: String,
    /// Surface to draw.
    pub mesh: RegionMesh,
    /// Surface color.
    pub color: Rgba,
}

/// A slab plane drawn as a square quad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneActor {
    /// Plane frame.
    pub info: PlaneInfo,
    /// Quad centered on the plane center, spanned by its `u` and `v` axes.
    pub mesh: RegionMesh,
}

impl PlaneActor {
    /// Quad of edge `size` lying on `info`'s plane.
    pub fn new(info: PlaneInfo, size: f64) -> Self {
        let mesh = RegionMesh::quad(
            info.center_point(),
            Vec3::from(info.u),
            Vec3::from(info.v),
            size,
        );
        Self { info, mesh }
    }
}

/// Everything a renderer needs to draw a 3D heatmap.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scene3D {
    /// Region meshes in acronym order.
    pub actors: Vec<SceneActor>,
    /// Whole-brain outline, drawn translucent.
    pub root: Option<SceneActor>,
    /// Near and far slab planes.
    pub planes: Vec<PlaneActor>,
    /// Scene title.
    pub title: Option<String>,
}

impl Scene3D {
    /// Actor for a region.
    pub fn actor(&self, name: &str) -> Option<&SceneActor> {
        self.actors.iter().find(|a| a.name == name)
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use brainslice_slicer::Plane;

    #[test]
    fn test_plane_info_for_slab() {
        let plane = Plane::new(Point3::new(5.0, 5.0, 5.0), Vec3::x()).unwrap();
        let slab = Slab::new(plane, 4.0).unwrap();
        let [near, far] = PlaneInfo::for_slab(&slab);
        assert_eq!(near.center, [3.0, 5.0, 5.0]);
        assert_eq!(far.center, [7.0, 5.0, 5.0]);
        assert_eq!(near.normal, [1.0, 0.0, 0.0]);
        assert_eq!(far.normal, [-1.0, 0.0, 0.0]);
        assert!(near.to_string().starts_with("center (3.000, 5.000, 5.000)"));
    }

    #[test]
    fn test_plane_actor_quad_size() {
        let info = PlaneInfo {
            center: [0.0, 0.0, 0.0],
            normal: [0.0, 0.0, 1.0],
            u: [1.0, 0.0, 0.0],
            v: [0.0, 1.0, 0.0],
        };
        let actor = PlaneActor::new(info, 8.0);
        assert_eq!(actor.mesh.num_triangles(), 2);
        let bounds = actor.mesh.bounds().unwrap();
        assert_abs_diff_eq!(bounds.max_extent(), 8.0, epsilon = 1e-12);
    }
}

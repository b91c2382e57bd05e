//! Slab planning: a 3D preview of where the slicing planes fall.

use std::collections::BTreeMap;
use std::fmt;

use brainslice_slicer::{section_on_plane, Contour, SlabFace};
use log::info;

use crate::atlas::{AtlasProvider, ROOT};
use crate::colormap::Rgba;
use crate::error::Result;
use crate::heatmap::Heatmap;
use crate::scene::{PlaneInfo, Scene3D};
use crate::settings::{Format, HeatmapSettings};

/// Which plane axis an arrow shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrowKind {
    /// Plane normal.
    Normal,
    /// First in-plane axis.
    U,
    /// Second in-plane axis.
    V,
}

/// An arrow from a plane center along one of its axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrow {
    /// Axis shown.
    pub kind: ArrowKind,
    /// Tail, at the plane center.
    pub start: [f64; 3],
    /// Head.
    pub end: [f64; 3],
    /// Draw color.
    pub color: Rgba,
}

/// One slab plane with its display style and axis arrows.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPlane {
    /// Display name.
    pub name: String,
    /// Plane frame.
    pub info: PlaneInfo,
    /// Plane color.
    pub color: Rgba,
    /// Plane opacity.
    pub alpha: f64,
    /// Normal, `u` and `v` arrows.
    pub arrows: [Arrow; 3],
}

impl PlannedPlane {
    fn new(name: String, info: PlaneInfo, color: Rgba, alpha: f64, scale: f64) -> Self {
        let arrow = |kind, dir: [f64; 3], color| Arrow {
            kind,
            start: info.center,
            end: [
                info.center[0] + dir[0] * scale,
                info.center[1] + dir[1] * scale,
                info.center[2] + dir[2] * scale,
            ],
            color,
        };
        let arrows = [
            arrow(ArrowKind::Normal, info.normal, color),
            arrow(ArrowKind::U, info.u, U_COLOR),
            arrow(ArrowKind::V, info.v, V_COLOR),
        ];
        Self {
            name,
            info,
            color,
            alpha,
            arrows,
        }
    }
}

const PLANE_STYLES: [(Rgba, f64); 2] = [
    (Rgba::rgb(0.082, 0.396, 0.753), 0.8),
    (Rgba::rgb(0.761, 0.094, 0.357), 0.3),
];
const U_COLOR: Rgba = Rgba::rgb(0.827, 0.184, 0.184);
const V_COLOR: Rgba = Rgba::rgb(0.220, 0.557, 0.235);

/// A preview of a slab: the full regions in one color, the two planes
/// with their axes, and each region's outline on the near plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Uniformly colored, unclipped region meshes with the slab planes.
    pub scene: Scene3D,
    /// Near and far planes.
    pub planes: Vec<PlannedPlane>,
    /// 3D outline of every region and the root on the near plane.
    pub intersections: BTreeMap<String, Vec<Contour>>,
}

impl Plan {
    /// Plan a slab through `regions` using the geometry in `settings`.
    pub fn new<A, I, S>(atlas: &A, regions: I, settings: HeatmapSettings) -> Result<Self>
    where
        A: AtlasProvider + ?Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let values = regions
            .into_iter()
            .map(|r| (r.as_ref().to_string(), 1.0))
            .collect();
        let settings = HeatmapSettings {
            format: Format::ThreeD,
            clip_3d: false,
            show_root: true,
            ..settings
        };
        let heatmap = Heatmap::new(atlas, values, settings)?;
        let arrow_scale = heatmap.settings().arrow_scale;

        let scene = heatmap.scene_3d();
        let planes: Vec<PlannedPlane> = scene
            .planes
            .iter()
            .zip(PLANE_STYLES)
            .enumerate()
            .map(|(i, (actor, (color, alpha)))| {
                PlannedPlane::new(format!("Plane {i}"), actor.info, color, alpha, arrow_scale)
            })
            .collect();
        for plane in &planes {
            info!("{}: {}", plane.name, plane.info);
        }

        let near = heatmap.slab().face_plane(SlabFace::Near);
        let intersections = heatmap
            .values()
            .keys()
            .map(String::as_str)
            .chain(std::iter::once(ROOT))
            .filter_map(|name| {
                let mesh = heatmap.region_mesh(name)?;
                Some((name.to_string(), section_on_plane(mesh, &near)))
            })
            .collect();

        Ok(Self {
            scene,
            planes,
            intersections,
        })
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = |a: &[f64; 3]| format!("({:.2}, {:.2}, {:.2})", a[0], a[1], a[2]);
        for plane in &self.planes {
            writeln!(f, "{}", plane.name)?;
            writeln!(f, "  center point: {}", t(&plane.info.center))?;
            writeln!(f, "          norm: {}", t(&plane.info.normal))?;
            writeln!(f, "             u: {}", t(&plane.info.u))?;
            writeln!(f, "             v: {}", t(&plane.info.v))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::MeshAtlas;
    use approx::assert_abs_diff_eq;
    use brainslice_math::Point3;
    use brainslice_mesh::RegionMesh;
    use brainslice_slicer::NamedOrientation;

    fn atlas() -> MeshAtlas {
        MeshAtlas::new(
            "toy",
            RegionMesh::cuboid(Point3::origin(), Point3::new(100.0, 100.0, 100.0)),
        )
        .with_region(
            "TH",
            RegionMesh::uv_sphere(Point3::new(50.0, 50.0, 50.0), 20.0, 24, 12),
        )
        .with_region(
            "RSP",
            RegionMesh::uv_sphere(Point3::new(90.0, 50.0, 50.0), 5.0, 16, 8),
        )
    }

    fn settings() -> HeatmapSettings {
        HeatmapSettings::default()
            .with_orientation(NamedOrientation::Frontal)
            .with_position(47.3)
            .with_thickness(4.0)
    }

    #[test]
    fn test_plan_planes_and_arrows() {
        let plan = Plan::new(&atlas(), ["TH"], settings()).unwrap();
        assert_eq!(plan.planes.len(), 2);
        let near = &plan.planes[0];
        assert_abs_diff_eq!(near.info.center[0], 45.3, epsilon = 1e-9);
        assert_eq!(near.info.center[1..], [50.0, 50.0]);
        let normal = &near.arrows[0];
        assert_eq!(normal.kind, ArrowKind::Normal);
        assert_abs_diff_eq!(normal.end[0] - normal.start[0], 10.0, epsilon = 1e-12);
        assert_eq!(plan.planes[1].alpha, 0.3);
    }

    #[test]
    fn test_plan_uses_uniform_unclipped_regions() {
        let atlas = atlas();
        let plan = Plan::new(&atlas, ["TH", "RSP"], settings()).unwrap();
        let th = plan.scene.actor("TH").unwrap();
        let rsp = plan.scene.actor("RSP").unwrap();
        assert_eq!(th.color, rsp.color);
        assert_eq!(th.mesh, atlas.regions["TH"]);
    }

    #[test]
    fn test_plan_intersections() {
        let plan = Plan::new(&atlas(), ["TH", "RSP"], settings()).unwrap();
        assert_eq!(plan.intersections["TH"].len(), 1);
        assert!(plan.intersections["RSP"].is_empty());
        assert_eq!(plan.intersections[ROOT].len(), 1);
        for p in &plan.intersections["TH"][0].points {
            assert_abs_diff_eq!(p.x, 45.3, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_plan_display() {
        let text = Plan::new(&atlas(), ["TH"], settings()).unwrap().to_string();
        assert!(text.starts_with("Plane 0\n  center point: (45.30, 50.00, 50.00)"));
        assert!(text.contains("Plane 1"));
    }
}

//! Heatmap composition: slice every requested region, color it by value and
//! hand the result to a plotter or renderer.

use std::borrow::Cow;
use std::collections::BTreeMap;

use brainslice_math::Vec3;
use brainslice_mesh::RegionMesh;
use brainslice_slicer::{
    clip_mesh_to_half_space, clip_mesh_to_slab, normalize, resolve_plane, section_region,
    OrientationSpec, Plane, Polygon2D, PositionSpec, Projector, Slab, SlabFace,
};
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::annotate::{pole_of_inaccessibility, Annotation, ANNOTATION_PRECISION};
use crate::atlas::{AtlasProvider, ROOT};
use crate::colormap::{ColorScale, Rgba};
use crate::error::{HeatmapError, Result};
use crate::render::{Plotter2D, SceneRenderer};
use crate::scene::{PlaneActor, PlaneInfo, Scene3D, SceneActor, PLANE_SIZE_FACTOR};
use crate::section::{RegionCoordinates, RegionSection, Section2D};
use crate::settings::{Format, HeatmapSettings, Hemisphere};

/// Output of [`Heatmap::build`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format")]
pub enum HeatmapResult {
    /// Planar section.
    #[serde(rename = "2D")]
    TwoD(Section2D),
    /// 3D scene.
    #[serde(rename = "3D")]
    ThreeD(Scene3D),
}

/// A validated heatmap request on one atlas.
///
/// Construction resolves the slab and color scale once and checks every
/// mesh it will draw; every output is derived from them, so all regions
/// share one plane and one basis.
pub struct Heatmap<'a, A: AtlasProvider + ?Sized> {
    atlas: &'a A,
    values: BTreeMap<String, f64>,
    meshes: BTreeMap<String, Cow<'a, RegionMesh>>,
    root: &'a RegionMesh,
    settings: HeatmapSettings,
    slab: Slab,
    projector: Projector,
    scale: ColorScale,
}

impl<'a, A: AtlasProvider + ?Sized> Heatmap<'a, A> {
    /// Validate a request and resolve its slab and color scale.
    ///
    /// Fails without partial output when a setting is invalid, a region
    /// is unknown or a mesh is malformed; the error names the first unknown
    /// acronym in sorted order.
    pub fn new(
        atlas: &'a A,
        values: BTreeMap<String, f64>,
        settings: HeatmapSettings,
    ) -> Result<Self> {
        settings.validate()?;
        if let Some(region) = values.keys().find(|r| !atlas.has_region(r)) {
            return Err(HeatmapError::UnknownRegion(region.clone()));
        }
        if settings.strict_values {
            if let Some(region) = values.iter().find_map(|(r, v)| (!v.is_finite()).then_some(r)) {
                return Err(HeatmapError::InvalidValue {
                    region: region.clone(),
                });
            }
        }

        let root = checked_mesh(ROOT, atlas.root_mesh())?;
        let cut = hemisphere_plane(atlas, settings.hemisphere)?;
        let mut meshes = BTreeMap::new();
        for region in values.keys() {
            let mesh = atlas
                .region_mesh(region)
                .ok_or_else(|| HeatmapError::UnknownRegion(region.clone()))?;
            let mesh = checked_mesh(region, mesh)?;
            let mesh = match &cut {
                Some(plane) => Cow::Owned(clip_mesh_to_half_space(mesh, plane)),
                None => Cow::Borrowed(mesh),
            };
            meshes.insert(region.clone(), mesh);
        }

        let scale = ColorScale::from_values(
            values.values(),
            settings.vmin,
            settings.vmax,
            settings.colormap()?,
        );
        let (slab, projector) = resolve_slab(
            atlas,
            &settings.position,
            &settings.orientation,
            settings.thickness,
        )?;

        let c = slab.plane.center;
        let n = slab.plane.normal;
        info!(
            "heatmap on {}: {} regions ({} hemisphere), plane center ({:.1}, {:.1}, {:.1}) normal ({:.3}, {:.3}, {:.3}), thickness {}, range [{}, {}] {}",
            atlas.name(),
            values.len(),
            settings.hemisphere,
            c.x,
            c.y,
            c.z,
            n.x,
            n.y,
            n.z,
            slab.thickness,
            scale.vmin,
            scale.vmax,
            scale.cmap
        );

        Ok(Self {
            atlas,
            values,
            meshes,
            root,
            settings,
            slab,
            projector,
            scale,
        })
    }

    /// The atlas being drawn on.
    pub fn atlas(&self) -> &A {
        self.atlas
    }

    /// Region values.
    pub fn values(&self) -> &BTreeMap<String, f64> {
        &self.values
    }

    /// Request settings.
    pub fn settings(&self) -> &HeatmapSettings {
        &self.settings
    }

    /// Center plane.
    pub fn plane(&self) -> &Plane {
        &self.slab.plane
    }

    /// Slab around the center plane.
    pub fn slab(&self) -> &Slab {
        &self.slab
    }

    /// Mapping from atlas space into plane coordinates.
    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    /// Value-to-color mapping.
    pub fn scale(&self) -> &ColorScale {
        &self.scale
    }

    /// Fill color of a requested region.
    pub fn color_of(&self, region: &str) -> Option<Rgba> {
        self.values
            .get(region)
            .map(|v| self.scale.color_for(Some(*v)))
    }

    /// The mesh drawn for a requested region, after any hemisphere cut.
    /// [`ROOT`] resolves to the root mesh.
    pub fn region_mesh(&self, region: &str) -> Option<&RegionMesh> {
        if region == ROOT {
            return Some(self.root);
        }
        self.meshes.get(region).map(|mesh| &**mesh)
    }

    fn slice(&self, region: &str) -> Vec<Polygon2D> {
        self.region_mesh(region)
            .map(|mesh| section_region(mesh, &self.slab, &self.projector))
            .unwrap_or_default()
    }

    /// Colored outlines of every region on the section plane.
    ///
    /// Regions that miss the slab are present with no polygons.
    pub fn section_2d(&self) -> Section2D {
        let regions: BTreeMap<String, RegionSection> = self
            .values
            .par_iter()
            .map(|(name, &value)| {
                let section = RegionSection {
                    polygons: self.slice(name),
                    value: Some(value),
                    color: self.scale.color_for(Some(value)),
                };
                (name.clone(), section)
            })
            .collect();

        let root = self.settings.show_root.then(|| RegionSection {
            polygons: section_region(self.root, &self.slab, &self.projector),
            value: None,
            color: Rgba::ROOT,
        });
        let annotations = self.annotations(&regions);

        info!(
            "2D section: {} of {} regions intersect the slab, {} labels",
            regions.values().filter(|s| !s.polygons.is_empty()).count(),
            regions.len(),
            annotations.len()
        );

        Section2D {
            regions,
            root,
            annotations,
            vmin: self.scale.vmin,
            vmax: self.scale.vmax,
            cmap: self.scale.cmap.to_string(),
            title: self.settings.title.clone(),
            axis_aligned: self.settings.orientation.is_axis_aligned(),
            label_regions: self.settings.label_regions,
        }
    }

    /// One label per polygon of every annotated region.
    fn annotations(&self, regions: &BTreeMap<String, RegionSection>) -> Vec<Annotation> {
        if self.settings.annotate.is_none() {
            return Vec::new();
        }
        let mut labels = Vec::new();
        for (name, section) in regions {
            let Some(text) = self.settings.annotate.text_for(name) else {
                continue;
            };
            for polygon in &section.polygons {
                let Some(p) = pole_of_inaccessibility(polygon, ANNOTATION_PRECISION) else {
                    debug!("no label position inside an outline of {name}");
                    continue;
                };
                labels.push(Annotation {
                    region: name.clone(),
                    text: text.clone(),
                    position: [p.x, p.y],
                });
            }
        }
        labels
    }

    /// Colored region meshes with the two slab planes.
    ///
    /// Regions are drawn whole unless `clip_3d` is set; then each region is
    /// cut down to the slab and the root keeps only the part beyond the near
    /// plane.
    pub fn scene_3d(&self) -> Scene3D {
        let clip = self.settings.clip_3d;
        let actors: Vec<SceneActor> = self
            .values
            .par_iter()
            .filter_map(|(name, &value)| {
                let mesh = self.region_mesh(name)?;
                let mesh = if clip {
                    clip_mesh_to_slab(mesh, &self.slab)
                } else {
                    mesh.clone()
                };
                debug!("3D actor {name}: {} triangles", mesh.num_triangles());
                Some(SceneActor {
                    name: name.clone(),
                    mesh,
                    color: self.scale.color_for(Some(value)),
                })
            })
            .collect();

        let root = self.settings.show_root.then(|| {
            let mesh = self.root;
            let mesh = if clip {
                clip_mesh_to_half_space(mesh, &self.slab.face_plane(SlabFace::Near))
            } else {
                mesh.clone()
            };
            SceneActor {
                name: ROOT.to_string(),
                mesh,
                color: Rgba::ROOT,
            }
        });

        let size = self.atlas.bounds().max_extent() * PLANE_SIZE_FACTOR;
        let planes = PlaneInfo::for_slab(&self.slab)
            .into_iter()
            .map(|info| PlaneActor::new(info, size))
            .collect();

        info!("3D scene: {} region actors", actors.len());

        Scene3D {
            actors,
            root,
            planes,
            title: self.settings.title.clone(),
        }
    }

    /// The output selected by `settings.format`.
    pub fn build(&self) -> HeatmapResult {
        match self.settings.format {
            Format::TwoD => HeatmapResult::TwoD(self.section_2d()),
            Format::ThreeD => HeatmapResult::ThreeD(self.scene_3d()),
        }
    }

    /// Build the 2D section and draw it.
    pub fn plot(&self, plotter: &mut dyn Plotter2D) -> Result<()> {
        plotter.plot(&self.section_2d())
    }

    /// Build the 3D scene and draw it.
    pub fn render(&self, renderer: &mut dyn SceneRenderer) -> Result<()> {
        renderer.render(&self.scene_3d())
    }
}

fn checked_mesh<'m>(region: &str, mesh: &'m RegionMesh) -> Result<&'m RegionMesh> {
    mesh.validate().map_err(|source| HeatmapError::Mesh {
        region: region.to_string(),
        source,
    })?;
    Ok(mesh)
}

/// Midline plane whose normal points into the kept hemisphere.
fn hemisphere_plane<A: AtlasProvider + ?Sized>(
    atlas: &A,
    hemisphere: Hemisphere,
) -> Result<Option<Plane>> {
    let sign = match hemisphere {
        Hemisphere::Both => return Ok(None),
        Hemisphere::Left => 1.0,
        Hemisphere::Right => -1.0,
    };
    let [x, y, z] = atlas.axes().medial_lateral;
    let normal = normalize(Vec3::new(x, y, z) * sign)?;
    let plane = resolve_plane(
        &OrientationSpec::Vector([normal.x, normal.y, normal.z]),
        &PositionSpec::Centered,
        &atlas.bounds(),
        &atlas.axes(),
    )?;
    Ok(Some(plane))
}

fn resolve_slab<A: AtlasProvider + ?Sized>(
    atlas: &A,
    position: &PositionSpec,
    orientation: &OrientationSpec,
    thickness: f64,
) -> Result<(Slab, Projector)> {
    let plane = resolve_plane(orientation, position, &atlas.bounds(), &atlas.axes())?;
    let slab = Slab::new(plane, thickness)?;
    Ok((slab, Projector::new(&plane)))
}

/// Section outlines of `regions` without any coloring.
///
/// Uses the same plane and basis as a [`Heatmap`] built from the same
/// position, orientation and thickness. [`ROOT`] may be requested like any
/// other region.
pub fn get_plane_coordinates<A, I, S>(
    atlas: &A,
    regions: I,
    position: &PositionSpec,
    orientation: &OrientationSpec,
    thickness: f64,
) -> Result<RegionCoordinates>
where
    A: AtlasProvider + ?Sized,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut meshes = BTreeMap::new();
    for region in regions {
        let region = region.as_ref();
        let mesh = atlas
            .region_mesh(region)
            .ok_or_else(|| HeatmapError::UnknownRegion(region.to_string()))?;
        meshes.insert(region.to_string(), checked_mesh(region, mesh)?);
    }
    let (slab, projector) = resolve_slab(atlas, position, orientation, thickness)?;
    Ok(meshes
        .into_par_iter()
        .map(|(region, mesh)| {
            let polygons = section_region(mesh, &slab, &projector);
            (region, polygons)
        })
        .collect())
}

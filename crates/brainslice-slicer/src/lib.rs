#![warn(missing_docs)]

//! Planar slicing and 2D projection for brain-region meshes.
//!
//! Given region surface meshes, a cutting plane (from a named anatomical
//! orientation or an explicit normal) and a slab thickness, this crate
//! finds where each region meets the slab and maps the outlines into the
//! plane's own 2D coordinates.
//!
//! # Example
//!
//! ```ignore
//! use brainslice_slicer::{resolve_plane, section_region, AxisConvention, NamedOrientation,
//!     PositionSpec, Projector, Slab};
//!
//! let plane = resolve_plane(
//!     &NamedOrientation::Frontal.into(),
//!     &PositionSpec::Scalar(5000.0),
//!     &atlas_bounds,
//!     &AxisConvention::default(),
//! )?;
//! let slab = Slab::new(plane, 10.0)?;
//! let projector = Projector::new(&plane);
//! let polygons = section_region(&mesh, &slab, &projector);
//! ```

pub mod contour;
pub mod error;
pub mod orientation;
pub mod plane;
pub mod project;
pub mod slab;

pub use contour::{chain_segments, Contour, CHAIN_TOLERANCE};
pub use error::{Result, SlicerError};
pub use orientation::{resolve_plane, AxisConvention, NamedOrientation, OrientationSpec, PositionSpec};
pub use plane::{normalize, Basis2D, OrientedPlane, Plane, Slab, SlabFace};
pub use project::{Polygon2D, Projector};
pub use slab::{clip_mesh_to_half_space, clip_mesh_to_slab, intersect_slab, plane_segments, section_on_plane, SlabSection};

use brainslice_mesh::RegionMesh;
use log::debug;

/// Intersect one region with a slab and project the outline.
///
/// Returns one polygon per connected outline, in chaining order; an empty
/// vector when the region misses the slab.
pub fn section_region(mesh: &RegionMesh, slab: &Slab, projector: &Projector) -> Vec<Polygon2D> {
    let section = intersect_slab(mesh, slab);
    debug!(
        "sectioned {} triangles: {} contours on {:?}",
        mesh.num_triangles(),
        section.contours.len(),
        section.faces
    );
    projector.project_contours(&section.contours)
}

#![warn(missing_docs)]

//! Brain-region heatmaps.
//!
//! Maps one scalar per atlas region onto a colormap and shows the regions
//! either as colored outlines on a planar section or as a 3D scene with
//! the slicing slab.
//!
//! # Example
//!
//! ```ignore
//! use std::collections::BTreeMap;
//! use brainslice::{
//!     Heatmap, HeatmapSettings, MeshAtlas, NamedOrientation, Plotter2D, SvgParams, SvgPlotter,
//! };
//!
//! let atlas = MeshAtlas::load("allen_mouse_25um.json")?;
//! let values = BTreeMap::from([("TH".to_string(), 1.0), ("SS".to_string(), -3.0)]);
//! let settings = HeatmapSettings::default()
//!     .with_orientation(NamedOrientation::Frontal)
//!     .with_position(5000.0)
//!     .with_range(-5.0, 3.0);
//!
//! let heatmap = Heatmap::new(&atlas, values, settings)?;
//! let mut plotter = SvgPlotter::new(SvgParams::default());
//! heatmap.plot(&mut plotter)?;
//! plotter.save("heatmap.svg")?;
//! ```

pub mod annotate;
pub mod atlas;
pub mod colormap;
pub mod error;
pub mod export;
pub mod heatmap;
pub mod plan;
pub mod render;
pub mod scene;
pub mod section;
pub mod settings;

pub use annotate::{pole_of_inaccessibility, Annotation, AnnotationMode};
pub use atlas::{AtlasProvider, AtlasRegistry, MeshAtlas, DEFAULT_ATLAS, ROOT};
pub use colormap::{ColorScale, Colormap, ColormapKind, Rgba};
pub use error::{HeatmapError, Result};
pub use export::{export_section_svg, SvgParams, SvgPlotter};
pub use heatmap::{get_plane_coordinates, Heatmap, HeatmapResult};
pub use plan::{Arrow, ArrowKind, Plan, PlannedPlane};
pub use render::{Plotter2D, SceneRenderer};
pub use scene::{PlaneActor, PlaneInfo, Scene3D, SceneActor};
pub use section::{DrawItem, RegionCoordinates, RegionSection, Section2D};
pub use settings::{Format, HeatmapSettings, Hemisphere};

pub use brainslice_mesh::RegionMesh;
pub use brainslice_slicer::{
    NamedOrientation, OrientationSpec, Polygon2D, PositionSpec, SlicerError,
};

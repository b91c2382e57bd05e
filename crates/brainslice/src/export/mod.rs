//! Output writers for heatmap sections.

pub mod svg;

pub use svg::{export_section_svg, SvgParams, SvgPlotter};

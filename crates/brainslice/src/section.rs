//! 2D section output: colored polygons per region.

use std::collections::BTreeMap;

use brainslice_slicer::Polygon2D;
use serde::{Deserialize, Serialize};

use crate::annotate::Annotation;
use crate::atlas::ROOT;
use crate::colormap::Rgba;
use crate::error::Result;

/// Polygon coordinates per region, in plane units.
pub type RegionCoordinates = BTreeMap<String, Vec<Polygon2D>>;

/// Outline of one region on the section plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSection {
    /// One polygon per connected piece; empty when the region misses the slab.
    pub polygons: Vec<Polygon2D>,
    /// The region's heatmap value; `None` for the root outline.
    pub value: Option<f64>,
    /// Fill color.
    pub color: Rgba,
}

impl RegionSection {
    /// Combined area of all pieces.
    pub fn area(&self) -> f64 {
        self.polygons.iter().map(Polygon2D::area).sum()
    }
}

/// A polygon with everything needed to draw it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem<'a> {
    /// Region acronym.
    pub region: &'a str,
    /// Outline.
    pub polygon: &'a Polygon2D,
    /// Fill color.
    pub color: Rgba,
    /// Whether this is the whole-brain outline.
    pub is_root: bool,
}

/// A planar heatmap section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section2D {
    /// Every requested region, in acronym order.
    pub regions: BTreeMap<String, RegionSection>,
    /// Whole-brain outline.
    pub root: Option<RegionSection>,
    /// Region labels.
    pub annotations: Vec<Annotation>,
    /// Value at the start of the colormap.
    pub vmin: f64,
    /// Value at the end of the colormap.
    pub vmax: f64,
    /// Colormap name.
    pub cmap: String,
    /// Figure title.
    pub title: Option<String>,
    /// Whether plane axes are atlas axes, so axis units are meaningful.
    pub axis_aligned: bool,
    /// Show one labelled colorbar band per region instead of a gradient.
    #[serde(default)]
    pub label_regions: bool,
}

impl Section2D {
    /// Polygons per region, without colors.
    pub fn coordinates(&self) -> RegionCoordinates {
        self.regions
            .iter()
            .map(|(name, section)| (name.clone(), section.polygons.clone()))
            .collect()
    }

    /// Every polygon, root included, largest first so small pieces are not hidden.
    ///
    /// Equal areas keep acronym order with the root first.
    pub fn draw_order(&self) -> Vec<DrawItem<'_>> {
        let root = self.root.iter().map(|s| (ROOT, s, true));
        let regions = self.regions.iter().map(|(n, s)| (n.as_str(), s, false));
        let mut items: Vec<DrawItem<'_>> = root
            .chain(regions)
            .flat_map(|(region, section, is_root)| {
                section.polygons.iter().map(move |polygon| DrawItem {
                    region,
                    polygon,
                    color: section.color,
                    is_root,
                })
            })
            .collect();
        items.sort_by(|a, b| b.polygon.area().total_cmp(&a.polygon.area()));
        items
    }

    /// Regions that appear on the section with their colors, in the order
    /// they are first drawn. The root is left out.
    pub fn legend_entries(&self) -> Vec<(&str, Rgba)> {
        let mut entries: Vec<(&str, Rgba)> = Vec::new();
        for item in self.draw_order() {
            if !item.is_root && !entries.iter().any(|(r, _)| *r == item.region) {
                entries.push((item.region, item.color));
            }
        }
        entries
    }

    /// Bounding box of everything drawn, as `(min, max)` corners.
    pub fn extent(&self) -> Option<([f64; 2], [f64; 2])> {
        self.root
            .iter()
            .chain(self.regions.values())
            .flat_map(|s| s.polygons.iter())
            .filter_map(Polygon2D::bounds)
            .fold(None, |acc, (lo, hi)| {
                let (mut min, mut max) = acc.unwrap_or(([lo.x, lo.y], [hi.x, hi.y]));
                min = [min[0].min(lo.x), min[1].min(lo.y)];
                max = [max[0].max(hi.x), max[1].max(hi.y)];
                Some((min, max))
            })
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

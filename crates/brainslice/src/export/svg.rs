//! SVG export of 2D heatmap sections.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use log::info;

use crate::colormap::{Colormap, Rgba};
use crate::error::{HeatmapError, Result};
use crate::render::Plotter2D;
use crate::section::Section2D;

/// Parameters for SVG export.
#[derive(Debug, Clone)]
pub struct SvgParams {
    /// Width of the SVG in pixels.
    pub width: u32,
    /// Height of the SVG in pixels.
    pub height: u32,
    /// Padding around the content in pixels.
    pub padding: u32,
    /// Stroke width for outlines, in pixels.
    pub stroke_width: f64,
    /// Outline color (CSS color string).
    pub stroke_color: String,
    /// Background color.
    pub background_color: String,
    /// Font size for title, labels and annotations.
    pub font_size: f64,
    /// Horizontal axis label, shown for axis-aligned sections.
    pub xlabel: String,
    /// Vertical axis label, shown for axis-aligned sections.
    pub ylabel: String,
    /// Draw a colorbar right of the section.
    pub show_colorbar: bool,
    /// Label next to the colorbar.
    pub colorbar_label: Option<String>,
    /// Omit axis labels.
    pub hide_axes: bool,
    /// Draw a legend of region colors in the top right corner.
    pub show_legend: bool,
}

impl Default for SvgParams {
    fn default() -> Self {
        Self {
            width: 900,
            height: 700,
            padding: 50,
            stroke_width: 1.0,
            stroke_color: "#000000".to_string(),
            background_color: "#ffffff".to_string(),
            font_size: 14.0,
            xlabel: "µm".to_string(),
            ylabel: "µm".to_string(),
            show_colorbar: true,
            colorbar_label: None,
            hide_axes: false,
            show_legend: false,
        }
    }
}

impl SvgParams {
    /// Set the image size.
    #[must_use]
    pub const fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the axis labels.
    #[must_use]
    pub fn with_labels(mut self, xlabel: &str, ylabel: &str) -> Self {
        self.xlabel = xlabel.to_string();
        self.ylabel = ylabel.to_string();
        self
    }

    /// Show or hide the colorbar.
    #[must_use]
    pub const fn with_colorbar(mut self, show: bool) -> Self {
        self.show_colorbar = show;
        self
    }

    /// Hide axis labels.
    #[must_use]
    pub const fn without_axes(mut self) -> Self {
        self.hide_axes = true;
        self
    }

    /// Show or hide the region legend.
    #[must_use]
    pub const fn with_legend(mut self, show: bool) -> Self {
        self.show_legend = show;
        self
    }
}

const COLORBAR_WIDTH: f64 = 18.0;
const COLORBAR_GAP: f64 = 20.0;
const COLORBAR_STOPS: usize = 16;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn fill_attrs(color: &Rgba) -> String {
    if color.a < 1.0 {
        format!(r#"fill="{}" fill-opacity="{:.2}""#, color.to_hex(), color.a)
    } else {
        format!(r#"fill="{}""#, color.to_hex())
    }
}

/// Render a section to an SVG document.
///
/// Plane `u` runs left to right and `v` top to bottom, with equal scales on
/// both axes. The root outline is drawn first, then regions largest first.
#[must_use]
pub fn export_section_svg(section: &Section2D, params: &SvgParams) -> String {
    let width = f64::from(params.width);
    let height = f64::from(params.height);
    let padding = f64::from(params.padding);
    let font = params.font_size;

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
  <rect width="100%" height="100%" fill="{}"/>
"#,
        params.width, params.height, params.width, params.height, params.background_color
    );

    if let Some(title) = &section.title {
        let _ = writeln!(
            svg,
            r#"  <text x="{:.2}" y="{:.2}" text-anchor="middle" font-family="sans-serif" font-size="{:.1}">{}</text>"#,
            width / 2.0,
            padding / 2.0 + font / 2.0,
            font * 1.2,
            escape(title)
        );
    }

    let colorbar_space = if params.show_colorbar {
        COLORBAR_WIDTH + COLORBAR_GAP + font * 4.0
    } else {
        0.0
    };
    let plot_w = (width - 2.0 * padding - colorbar_space).max(1.0);
    let plot_h = (height - 2.0 * padding).max(1.0);

    let Some((min, max)) = section.extent() else {
        let _ = writeln!(
            svg,
            r##"  <text x="50%" y="50%" text-anchor="middle" fill="#999">Empty section</text>"##
        );
        svg.push_str("</svg>");
        return svg;
    };

    let content_w = max[0] - min[0];
    let content_h = max[1] - min[1];
    let scale = if content_w > 0.0 && content_h > 0.0 {
        (plot_w / content_w).min(plot_h / content_h)
    } else {
        1.0
    };
    let offset_x = padding + (plot_w - content_w * scale) / 2.0;
    let offset_y = padding + (plot_h - content_h * scale) / 2.0;
    let to_svg = |x: f64, y: f64| {
        (
            offset_x + (x - min[0]) * scale,
            offset_y + (y - min[1]) * scale,
        )
    };

    let (root_items, region_items): (Vec<_>, Vec<_>) =
        section.draw_order().into_iter().partition(|item| item.is_root);
    for item in root_items.iter().chain(&region_items) {
        let mut points = String::new();
        for p in &item.polygon.points {
            let (x, y) = to_svg(p.x, p.y);
            if !points.is_empty() {
                points.push(' ');
            }
            let _ = write!(points, "{x:.2},{y:.2}");
        }
        if item.polygon.closed {
            let _ = writeln!(
                svg,
                r#"  <polygon points="{}" {} stroke="{}" stroke-width="{:.2}"><title>{}</title></polygon>"#,
                points,
                fill_attrs(&item.color),
                params.stroke_color,
                params.stroke_width,
                escape(item.region)
            );
        } else {
            let _ = writeln!(
                svg,
                r#"  <polyline points="{}" fill="none" stroke="{}" stroke-width="{:.2}"/>"#,
                points,
                item.color.to_hex(),
                params.stroke_width
            );
        }
    }

    for label in &section.annotations {
        let (x, y) = to_svg(label.position[0], label.position[1]);
        let _ = writeln!(
            svg,
            r#"  <text x="{x:.2}" y="{y:.2}" text-anchor="middle" dominant-baseline="central" font-family="sans-serif" font-size="{font:.1}">{}</text>"#,
            escape(&label.text)
        );
    }

    if section.axis_aligned && !params.hide_axes {
        let _ = writeln!(
            svg,
            r#"  <text x="{:.2}" y="{:.2}" text-anchor="middle" font-family="sans-serif" font-size="{font:.1}">{}</text>"#,
            padding + plot_w / 2.0,
            height - padding / 3.0,
            escape(&params.xlabel)
        );
        let (lx, ly) = (padding / 3.0, padding + plot_h / 2.0);
        let _ = writeln!(
            svg,
            r#"  <text x="{lx:.2}" y="{ly:.2}" text-anchor="middle" transform="rotate(-90 {lx:.2} {ly:.2})" font-family="sans-serif" font-size="{font:.1}">{}</text>"#,
            escape(&params.ylabel)
        );
    }

    if params.show_legend {
        write_legend(&mut svg, section, params, padding + plot_w, padding);
    }

    if params.show_colorbar {
        let x = padding + plot_w + COLORBAR_GAP;
        if section.label_regions {
            write_region_colorbar(&mut svg, section, params, x, padding, plot_h);
        } else {
            write_colorbar(&mut svg, section, params, x, padding, plot_h);
        }
    }

    svg.push_str("</svg>");
    svg
}

/// Swatch and name of every drawn region, right-aligned at `right`.
fn write_legend(svg: &mut String, section: &Section2D, params: &SvgParams, right: f64, top: f64) {
    let entries = section.legend_entries();
    if entries.is_empty() {
        return;
    }
    let font = params.font_size * 0.85;
    let row = font * 1.4;
    let longest = entries.iter().map(|(r, _)| r.chars().count()).max().unwrap_or(0);
    let width = font * (2.2 + 0.6 * longest as f64);
    let x = right - width;

    let _ = writeln!(
        svg,
        r#"  <g class="legend"><rect x="{x:.2}" y="{top:.2}" width="{width:.2}" height="{:.2}" fill="{}" fill-opacity="0.80" stroke="{}" stroke-width="{:.2}"/>"#,
        row * entries.len() as f64 + font * 0.4,
        params.background_color,
        params.stroke_color,
        params.stroke_width
    );
    for (i, (region, color)) in entries.iter().enumerate() {
        let cy = top + font * 0.2 + row * (i as f64 + 0.5);
        let _ = writeln!(
            svg,
            r#"    <rect x="{:.2}" y="{:.2}" width="{font:.2}" height="{font:.2}" {} stroke="{}" stroke-width="{:.2}"/>"#,
            x + font * 0.4,
            cy - font / 2.0,
            fill_attrs(color),
            params.stroke_color,
            params.stroke_width
        );
        let _ = writeln!(
            svg,
            r#"    <text x="{:.2}" y="{cy:.2}" dominant-baseline="central" font-family="sans-serif" font-size="{font:.1}">{}</text>"#,
            x + font * 1.8,
            escape(region)
        );
    }
    svg.push_str("  </g>\n");
}

/// One band per region in acronym order from the bottom, each filled with
/// the region's color and labelled with its acronym.
fn write_region_colorbar(
    svg: &mut String,
    section: &Section2D,
    params: &SvgParams,
    x: f64,
    y: f64,
    h: f64,
) {
    if section.regions.is_empty() {
        return;
    }
    let band = h / section.regions.len() as f64;
    let tx = x + COLORBAR_WIDTH + 4.0;
    for (i, (region, data)) in section.regions.iter().enumerate() {
        let top = y + h - band * (i + 1) as f64;
        let _ = writeln!(
            svg,
            r#"  <rect x="{x:.2}" y="{top:.2}" width="{COLORBAR_WIDTH:.2}" height="{band:.2}" {} stroke="{}" stroke-width="{:.2}"/>"#,
            fill_attrs(&data.color),
            params.stroke_color,
            params.stroke_width
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{tx:.2}" y="{:.2}" dominant-baseline="central" font-family="sans-serif" font-size="{:.1}">{}</text>"#,
            top + band / 2.0,
            params.font_size * 0.85,
            escape(region)
        );
    }
    write_colorbar_label(svg, params, tx, y, h);
}

/// Vertical gradient from `vmin` at the bottom to `vmax` at the top.
fn write_colorbar(svg: &mut String, section: &Section2D, params: &SvgParams, x: f64, y: f64, h: f64) {
    let cmap: Colormap = section.cmap.parse().unwrap_or_default();
    let font = params.font_size;

    svg.push_str(
        "  <defs>\n    <linearGradient id=\"colorbar\" x1=\"0\" y1=\"1\" x2=\"0\" y2=\"0\">\n",
    );
    for i in 0..COLORBAR_STOPS {
        let t = i as f64 / (COLORBAR_STOPS - 1) as f64;
        let _ = writeln!(
            svg,
            r#"      <stop offset="{:.3}" stop-color="{}"/>"#,
            t,
            cmap.sample(t).to_hex()
        );
    }
    svg.push_str("    </linearGradient>\n  </defs>\n");

    let _ = writeln!(
        svg,
        r#"  <rect x="{x:.2}" y="{y:.2}" width="{COLORBAR_WIDTH:.2}" height="{h:.2}" fill="url(#colorbar)" stroke="{}" stroke-width="{:.2}"/>"#,
        params.stroke_color, params.stroke_width
    );
    let tx = x + COLORBAR_WIDTH + 4.0;
    for (value, ty) in [(section.vmax, y + font / 2.0), (section.vmin, y + h)] {
        let _ = writeln!(
            svg,
            r#"  <text x="{tx:.2}" y="{ty:.2}" font-family="sans-serif" font-size="{:.1}">{}</text>"#,
            font * 0.85,
            value
        );
    }
    write_colorbar_label(svg, params, tx, y, h);
}

fn write_colorbar_label(svg: &mut String, params: &SvgParams, tx: f64, y: f64, h: f64) {
    let font = params.font_size;
    if let Some(label) = &params.colorbar_label {
        let (lx, ly) = (tx + font * 3.0, y + h / 2.0);
        let _ = writeln!(
            svg,
            r#"  <text x="{lx:.2}" y="{ly:.2}" text-anchor="middle" transform="rotate(-90 {lx:.2} {ly:.2})" font-family="sans-serif" font-size="{font:.1}">{}</text>"#,
            escape(label)
        );
    }
}

/// A [`Plotter2D`] producing SVG documents.
#[derive(Debug, Clone, Default)]
pub struct SvgPlotter {
    params: SvgParams,
    output: Option<String>,
}

impl SvgPlotter {
    /// Plotter with the given parameters.
    pub fn new(params: SvgParams) -> Self {
        Self {
            params,
            output: None,
        }
    }

    /// Export parameters.
    pub fn params(&self) -> &SvgParams {
        &self.params
    }

    /// The SVG of the last plotted section.
    pub fn to_svg_string(&self) -> Result<&str> {
        self.output
            .as_deref()
            .ok_or_else(|| HeatmapError::Render("no section has been plotted".into()))
    }

    /// Write the SVG of the last plotted section to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        std::fs::write(path, self.to_svg_string()?)?;
        info!("saved heatmap SVG to {}", path.display());
        Ok(path.to_path_buf())
    }
}

impl Plotter2D for SvgPlotter {
    fn plot(&mut self, section: &Section2D) -> Result<()> {
        self.output = Some(export_section_svg(section, &self.params));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::Annotation;
    use crate::section::RegionSection;
    use brainslice_slicer::Polygon2D;
    use std::collections::BTreeMap;

    fn section() -> Section2D {
        let square = |x0: f64, s: f64| {
            Polygon2D::from_coords(&[[x0, 0.0], [x0 + s, 0.0], [x0 + s, s], [x0, s]])
        };
        Section2D {
            regions: BTreeMap::from([
                (
                    "SS".to_string(),
                    RegionSection {
                        polygons: vec![square(0.0, 1.0), square(3.0, 1.0)],
                        value: Some(-3.0),
                        color: Rgba::rgb(1.0, 0.5, 0.5),
                    },
                ),
                (
                    "TH".to_string(),
                    RegionSection {
                        polygons: vec![square(6.0, 2.0)],
                        value: Some(1.0),
                        color: Rgba::rgb(0.8, 0.0, 0.0),
                    },
                ),
            ]),
            root: Some(RegionSection {
                polygons: vec![square(-1.0, 10.0)],
                value: None,
                color: Rgba::ROOT,
            }),
            annotations: vec![Annotation {
                region: "TH".to_string(),
                text: "Thalamus & co".to_string(),
                position: [7.0, 1.0],
            }],
            vmin: -5.0,
            vmax: 3.0,
            cmap: "Reds".to_string(),
            title: Some("frontal".to_string()),
            axis_aligned: true,
            label_regions: false,
        }
    }

    #[test]
    fn test_one_polygon_element_per_polygon() {
        let svg = export_section_svg(&section(), &SvgParams::default());
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<polygon").count(), 4);
        assert!(svg.contains(r#"fill-opacity="0.30""#));
        assert!(svg.contains("Thalamus &amp; co"));
        assert!(svg.contains("url(#colorbar)"));
    }

    #[test]
    fn test_root_drawn_first() {
        let svg = export_section_svg(&section(), &SvgParams::default());
        let first = svg.lines().find(|l| l.contains("<polygon")).unwrap();
        assert!(first.contains("<title>root</title>"));
        let root_at = svg.find("<title>root</title>").unwrap();
        let th_at = svg.find("<title>TH</title>").unwrap();
        assert!(root_at < th_at);
    }

    #[test]
    fn test_v_axis_points_down() {
        let params = SvgParams::default().with_colorbar(false);
        let mut s = section();
        s.root = None;
        s.regions.remove("SS");
        s.annotations.clear();
        let svg = export_section_svg(&s, &params);
        // 800x600 plot area, square (6,0)-(8,2) scaled by 300 and centered
        // horizontally; v = 0 maps to the top padding.
        assert!(svg.contains(r#"points="150.00,50.00 "#));
    }

    #[test]
    fn test_axis_labels_follow_alignment() {
        let mut s = section();
        let svg = export_section_svg(&s, &SvgParams::default());
        assert!(svg.contains(">µm</text>"));
        s.axis_aligned = false;
        let svg = export_section_svg(&s, &SvgParams::default());
        assert!(!svg.contains(">µm</text>"));
        let svg = export_section_svg(&section(), &SvgParams::default().without_axes());
        assert!(!svg.contains(">µm</text>"));
    }

    #[test]
    fn test_legend_lists_drawn_regions() {
        let svg = export_section_svg(&section(), &SvgParams::default());
        assert!(!svg.contains(r#"class="legend""#));

        let svg = export_section_svg(&section(), &SvgParams::default().with_legend(true));
        let legend = &svg[svg.find(r#"class="legend""#).unwrap()..];
        let legend = &legend[..legend.find("</g>").unwrap()];
        assert!(!legend.contains(">root</text>"));
        // TH is the larger piece, so it is drawn and listed first.
        let th = legend.find(">TH</text>").unwrap();
        let ss = legend.find(">SS</text>").unwrap();
        assert!(th < ss);
    }

    #[test]
    fn test_colorbar_bands_per_region() {
        let mut s = section();
        s.label_regions = true;
        let svg = export_section_svg(&s, &SvgParams::default());
        assert!(!svg.contains("url(#colorbar)"));
        assert!(svg.contains(">SS</text>"));
        assert!(svg.contains(">TH</text>"));
        // Two bands splitting the 600 px plot height, SS at the bottom.
        assert!(svg.contains(r##"y="350.00" width="18.00" height="300.00" fill="#ff8080""##));
        assert!(svg.contains(r##"y="50.00" width="18.00" height="300.00" fill="#cc0000""##));
    }

    #[test]
    fn test_empty_section() {
        let mut s = section();
        s.root = None;
        s.regions.clear();
        let svg = export_section_svg(&s, &SvgParams::default());
        assert!(svg.contains("Empty section"));
        assert_eq!(svg.matches("<polygon").count(), 0);
    }

    #[test]
    fn test_plotter_requires_plot_before_output() {
        let mut plotter = SvgPlotter::new(SvgParams::default().with_size(400, 300));
        assert!(matches!(plotter.to_svg_string(), Err(HeatmapError::Render(_))));
        plotter.plot(&section()).unwrap();
        assert!(plotter.to_svg_string().unwrap().contains(r#"width="400""#));
    }
}

//! Heatmap settings, loadable from TOML.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use brainslice_slicer::{OrientationSpec, PositionSpec, SlicerError};
use serde::{Deserialize, Serialize};

use crate::annotate::AnnotationMode;
use crate::colormap::Colormap;
use crate::error::{HeatmapError, Result};

/// Output kind of a heatmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Format {
    /// Planar section with 2D polygons.
    #[default]
    #[serde(rename = "2D")]
    TwoD,
    /// Colored 3D scene with the slab planes.
    #[serde(rename = "3D")]
    ThreeD,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TwoD => "2D",
            Self::ThreeD => "3D",
        })
    }
}

impl FromStr for Format {
    type Err = HeatmapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "2D" => Ok(Self::TwoD),
            "3D" => Ok(Self::ThreeD),
            _ => Err(HeatmapError::InvalidSettings(format!(
                "format must be \"2D\" or \"3D\", got \"{s}\""
            ))),
        }
    }
}

/// Which side of the brain region meshes are drawn on.
///
/// Left and right follow the atlas medial-lateral axis: `Left` keeps the
/// half its positive direction points into, as in the "asr" convention
/// where that axis runs from right to left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    /// Whole meshes.
    #[default]
    Both,
    /// Only the left half.
    Left,
    /// Only the right half.
    Right,
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Both => "both",
            Self::Left => "left",
            Self::Right => "right",
        })
    }
}

impl FromStr for Hemisphere {
    type Err = HeatmapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "both" => Ok(Self::Both),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(HeatmapError::InvalidSettings(format!(
                "hemisphere must be \"both\", \"left\" or \"right\", got \"{s}\""
            ))),
        }
    }
}

/// Heatmap parameters.
///
/// ```toml
/// orientation = "frontal"
/// position = 5000
/// thickness = 10
/// vmin = -5
/// vmax = 3
/// cmap = "Reds"
/// format = "2D"
/// annotate = ["TH"]
/// hemisphere = "left"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapSettings {
    /// Where the plane passes through the atlas.
    #[serde(skip_serializing_if = "PositionSpec::is_centered")]
    pub position: PositionSpec,
    /// Plane orientation.
    pub orientation: OrientationSpec,
    /// Slab thickness in atlas units (µm for most atlases).
    pub thickness: f64,
    /// Value at the start of the colormap; derived from the values when absent.
    pub vmin: Option<f64>,
    /// Value at the end of the colormap; derived from the values when absent.
    pub vmax: Option<f64>,
    /// Colormap name, e.g. `Reds` or `viridis_r`.
    pub cmap: String,
    /// Output kind.
    pub format: Format,
    /// Side of the brain region meshes are cut to; the root stays whole.
    pub hemisphere: Hemisphere,
    /// Figure title.
    pub title: Option<String>,
    /// Atlas to draw on; the registry default when absent.
    pub atlas_name: Option<String>,
    /// Draw the whole-brain outline behind the regions.
    pub show_root: bool,
    /// Region labels in 2D output.
    pub annotate: AnnotationMode,
    /// Replace the 2D colorbar gradient with one labelled band per region.
    pub label_regions: bool,
    /// Reject NaN and infinite region values instead of drawing them grey.
    pub strict_values: bool,
    /// Cut 3D region meshes down to the slab instead of showing them whole.
    pub clip_3d: bool,
    /// Length of the axis arrows drawn by the planner.
    pub arrow_scale: f64,
}

impl Default for HeatmapSettings {
    fn default() -> Self {
        Self {
            position: PositionSpec::Centered,
            orientation: OrientationSpec::default(),
            thickness: 10.0,
            vmin: None,
            vmax: None,
            cmap: "Reds".to_string(),
            format: Format::TwoD,
            hemisphere: Hemisphere::Both,
            title: None,
            atlas_name: None,
            show_root: true,
            annotate: AnnotationMode::None,
            label_regions: false,
            strict_values: false,
            clip_3d: false,
            arrow_scale: 10.0,
        }
    }
}

impl HeatmapSettings {
    /// Parse settings from a TOML document; missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let settings: Self = toml::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Render settings as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Resolved colormap.
    pub fn colormap(&self) -> Result<Colormap> {
        self.cmap.parse()
    }

    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !self.thickness.is_finite() || self.thickness <= 0.0 {
            return Err(SlicerError::InvalidThickness(self.thickness).into());
        }
        for (name, bound) in [("vmin", self.vmin), ("vmax", self.vmax)] {
            if bound.is_some_and(|v| !v.is_finite()) {
                return Err(HeatmapError::InvalidSettings(format!(
                    "{name} must be finite"
                )));
            }
        }
        if !self.arrow_scale.is_finite() || self.arrow_scale <= 0.0 {
            return Err(HeatmapError::InvalidSettings(
                "arrow_scale must be positive".into(),
            ));
        }
        self.colormap()?;
        Ok(())
    }

    /// Set the position, builder style.
    #[must_use]
    pub fn with_position(mut self, position: impl Into<PositionSpec>) -> Self {
        self.position = position.into();
        self
    }

    /// Set the orientation, builder style.
    #[must_use]
    pub fn with_orientation(mut self, orientation: impl Into<OrientationSpec>) -> Self {
        self.orientation = orientation.into();
        self
    }

    /// Set the slab thickness, builder style.
    #[must_use]
    pub fn with_thickness(mut self, thickness: f64) -> Self {
        self.thickness = thickness;
        self
    }

    /// Set explicit colormap bounds, builder style.
    #[must_use]
    pub fn with_range(mut self, vmin: f64, vmax: f64) -> Self {
        self.vmin = Some(vmin);
        self.vmax = Some(vmax);
        self
    }

    /// Set the colormap name, builder style.
    #[must_use]
    pub fn with_cmap(mut self, cmap: impl Into<String>) -> Self {
        self.cmap = cmap.into();
        self
    }

    /// Set the output format, builder style.
    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Set the hemisphere, builder style.
    #[must_use]
    pub fn with_hemisphere(mut self, hemisphere: Hemisphere) -> Self {
        self.hemisphere = hemisphere;
        self
    }

    /// Set region labelling, builder style.
    #[must_use]
    pub fn with_annotations(mut self, annotate: AnnotationMode) -> Self {
        self.annotate = annotate;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainslice_slicer::NamedOrientation;

    #[test]
    fn test_defaults() {
        let settings = HeatmapSettings::default();
        assert_eq!(settings.thickness, 10.0);
        assert_eq!(settings.format, Format::TwoD);
        assert_eq!(settings.position, PositionSpec::Centered);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let settings = HeatmapSettings::from_toml_str(
            r#"
            orientation = "frontal"
            position = 5000
            vmin = -5
            vmax = 3.0
            cmap = "viridis_r"
            format = "3D"
            annotate = ["TH"]
            hemisphere = "right"
            label_regions = true
            "#,
        )
        .unwrap();
        assert_eq!(settings.orientation, OrientationSpec::Named(NamedOrientation::Frontal));
        assert_eq!(settings.position, PositionSpec::Scalar(5000.0));
        assert_eq!(settings.vmin, Some(-5.0));
        assert_eq!(settings.format, Format::ThreeD);
        assert_eq!(settings.thickness, 10.0);
        assert_eq!(settings.annotate.text_for("TH").as_deref(), Some("TH"));
        assert_eq!(settings.hemisphere, Hemisphere::Right);
        assert!(settings.label_regions);
    }

    #[test]
    fn test_parse_vector_orientation_and_point() {
        let settings = HeatmapSettings::from_toml_str(
            r#"
            orientation = [0.2, 0.0, 1.0]
            position = [100.0, 200.0, 300.0]
            "#,
        )
        .unwrap();
        assert_eq!(settings.orientation, OrientationSpec::Vector([0.2, 0.0, 1.0]));
        assert_eq!(settings.position, PositionSpec::Point([100.0, 200.0, 300.0]));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            HeatmapSettings::from_toml_str("thickness = 0"),
            Err(HeatmapError::Slicer(SlicerError::InvalidThickness(_)))
        ));
        assert!(matches!(
            HeatmapSettings::from_toml_str(r#"cmap = "rainbow""#),
            Err(HeatmapError::UnknownColormap(_))
        ));
        assert!(matches!(
            HeatmapSettings::from_toml_str(r#"format = "4D""#),
            Err(HeatmapError::Config(_))
        ));
        assert!(matches!(
            HeatmapSettings::from_toml_str(r#"hemisphere = "middle""#),
            Err(HeatmapError::Config(_))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let settings = HeatmapSettings::default()
            .with_position(5000.0)
            .with_orientation(NamedOrientation::Sagittal)
            .with_range(-1.0, 1.0)
            .with_format(Format::ThreeD)
            .with_hemisphere(Hemisphere::Left);
        let text = settings.to_toml_string().unwrap();
        assert_eq!(HeatmapSettings::from_toml_str(&text).unwrap(), settings);
    }

    #[test]
    fn test_default_settings_serialize() {
        let text = HeatmapSettings::default().to_toml_string().unwrap();
        assert!(!text.contains("position"));
        assert_eq!(HeatmapSettings::from_toml_str(&text).unwrap(), HeatmapSettings::default());
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("3d".parse::<Format>().unwrap(), Format::ThreeD);
        assert_eq!(Format::TwoD.to_string(), "2D");
        assert!("xyz".parse::<Format>().is_err());
    }

    #[test]
    fn test_hemisphere_parse() {
        assert_eq!(HeatmapSettings::default().hemisphere, Hemisphere::Both);
        assert_eq!(" Left".parse::<Hemisphere>().unwrap(), Hemisphere::Left);
        assert_eq!(Hemisphere::Right.to_string(), "right");
        assert!(matches!(
            "up".parse::<Hemisphere>(),
            Err(HeatmapError::InvalidSettings(_))
        ));
    }
}

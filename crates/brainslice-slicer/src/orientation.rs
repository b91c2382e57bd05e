//! Orientation and position resolution: turning user-facing plane
//! descriptions into a concrete [`Plane`].

use std::fmt;
use std::str::FromStr;

use brainslice_math::{dominant_axis, BoundingBox3, Dir3, Point3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlicerError};
use crate::plane::{normalize, Plane};

/// Standard anatomical section orientations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedOrientation {
    /// Coronal section, normal along the anterior-posterior axis.
    Frontal,
    /// Side section, normal along the medial-lateral axis.
    Sagittal,
    /// Top-down section, normal along the dorsal-ventral axis.
    Horizontal,
}

impl NamedOrientation {
    /// All named orientations.
    pub const ALL: [Self; 3] = [Self::Frontal, Self::Sagittal, Self::Horizontal];

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Frontal => "frontal",
            Self::Sagittal => "sagittal",
            Self::Horizontal => "horizontal",
        }
    }
}

impl fmt::Display for NamedOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NamedOrientation {
    type Err = SlicerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "frontal" => Ok(Self::Frontal),
            "sagittal" => Ok(Self::Sagittal),
            "horizontal" => Ok(Self::Horizontal),
            _ => Err(SlicerError::UnknownOrientation(s.to_string())),
        }
    }
}

/// How the cutting plane is oriented: a named section or an explicit normal.
///
/// Deserializes from a lowercase name (`"frontal"`) or a 3-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrientationSpec {
    /// One of the standard anatomical orientations.
    Named(NamedOrientation),
    /// An explicit normal vector, normalized on resolution.
    Vector([f64; 3]),
}

impl Default for OrientationSpec {
    fn default() -> Self {
        Self::Named(NamedOrientation::Frontal)
    }
}

impl From<NamedOrientation> for OrientationSpec {
    fn from(named: NamedOrientation) -> Self {
        Self::Named(named)
    }
}

impl From<[f64; 3]> for OrientationSpec {
    fn from(v: [f64; 3]) -> Self {
        Self::Vector(v)
    }
}

impl FromStr for OrientationSpec {
    type Err = SlicerError;

    fn from_str(s: &str) -> Result<Self> {
        s.parse().map(Self::Named)
    }
}

impl OrientationSpec {
    /// The unit normal this orientation resolves to under `axes`.
    pub fn normal(&self, axes: &AxisConvention) -> Result<Dir3> {
        match self {
            Self::Named(named) => axes.normal_for(*named),
            Self::Vector([x, y, z]) => normalize(Vec3::new(*x, *y, *z)),
        }
    }

    /// Whether the plane is orthogonal to one atlas axis, so that plane
    /// coordinates are plain atlas distances.
    pub fn is_axis_aligned(&self) -> bool {
        match self {
            Self::Named(_) => true,
            Self::Vector(v) => v.iter().filter(|c| **c != 0.0).count() == 1,
        }
    }
}

/// Where the cutting plane passes through the atlas.
///
/// Deserializes from a number, a 3-element array, or null/absent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PositionSpec {
    /// Coordinate along the normal's dominant axis; the other two axes are centered.
    Scalar(f64),
    /// Fully specified center point.
    Point([f64; 3]),
    /// Center of the atlas bounding box.
    #[default]
    Centered,
}

impl PositionSpec {
    /// Whether this is [`PositionSpec::Centered`].
    pub fn is_centered(&self) -> bool {
        matches!(self, Self::Centered)
    }
}

impl From<f64> for PositionSpec {
    fn from(v: f64) -> Self {
        Self::Scalar(v)
    }
}

impl From<[f64; 3]> for PositionSpec {
    fn from(p: [f64; 3]) -> Self {
        Self::Point(p)
    }
}

impl From<Option<f64>> for PositionSpec {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Self::Centered, Self::Scalar)
    }
}

/// Canonical unit axes of an atlas coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisConvention {
    /// Anterior-posterior axis (frontal section normal).
    pub anterior_posterior: [f64; 3],
    /// Dorsal-ventral axis (horizontal section normal).
    pub dorsal_ventral: [f64; 3],
    /// Medial-lateral axis (sagittal section normal).
    pub medial_lateral: [f64; 3],
}

impl AxisConvention {
    /// The "asr" convention: anterior-posterior along X, dorsal-ventral along Y,
    /// medial-lateral along Z.
    pub const ASR: Self = Self {
        anterior_posterior: [1.0, 0.0, 0.0],
        dorsal_ventral: [0.0, 1.0, 0.0],
        medial_lateral: [0.0, 0.0, 1.0],
    };

    /// Unit normal for a named orientation.
    ///
    /// Fails with [`SlicerError::DegenerateVector`] when the configured axis
    /// has zero length or a non-finite component.
    pub fn normal_for(&self, named: NamedOrientation) -> Result<Dir3> {
        let [x, y, z] = match named {
            NamedOrientation::Frontal => self.anterior_posterior,
            NamedOrientation::Sagittal => self.medial_lateral,
            NamedOrientation::Horizontal => self.dorsal_ventral,
        };
        normalize(Vec3::new(x, y, z))
    }
}

impl Default for AxisConvention {
    fn default() -> Self {
        Self::ASR
    }
}

/// Resolve an orientation and a position into a cutting plane.
///
/// Pure function of its inputs:
/// - `Scalar(v)` sets the coordinate along the normal's dominant axis and
///   centers the other two on `bounds`; a normal without a single dominant
///   axis (e.g. `(1, 1, 0)`) is rejected as [`SlicerError::InvalidPosition`].
/// - `Centered` uses the bounding-box midpoint on every axis.
/// - `Point` is used verbatim.
///
/// `Scalar` and `Centered` need non-empty `bounds`; an empty box is an
/// [`SlicerError::InvalidPosition`].
pub fn resolve_plane(
    orientation: &OrientationSpec,
    position: &PositionSpec,
    bounds: &BoundingBox3,
    axes: &AxisConvention,
) -> Result<Plane> {
    let normal = orientation.normal(axes)?;

    let center = match *position {
        PositionSpec::Centered => atlas_center(bounds)?,
        PositionSpec::Point([x, y, z]) => {
            if ![x, y, z].iter().all(|c| c.is_finite()) {
                return Err(SlicerError::InvalidPosition(format!(
                    "position ({x}, {y}, {z}) has a non-finite coordinate"
                )));
            }
            Point3::new(x, y, z)
        }
        PositionSpec::Scalar(value) => {
            if !value.is_finite() {
                return Err(SlicerError::InvalidPosition(format!(
                    "position {value} is not finite"
                )));
            }
            let axis = dominant_axis(&normal).ok_or_else(|| {
                SlicerError::InvalidPosition(format!(
                    "a single position value needs an orientation with one dominant axis, got ({:.3}, {:.3}, {:.3})",
                    normal.x, normal.y, normal.z
                ))
            })?;
            let mut center = atlas_center(bounds)?;
            center[axis] = value;
            center
        }
    };

    Ok(Plane::from_unit(center, normal))
}

fn atlas_center(bounds: &BoundingBox3) -> Result<Point3> {
    let center = bounds.center();
    if !bounds.is_valid() || !center.iter().all(|c| c.is_finite()) {
        return Err(SlicerError::InvalidPosition(
            "atlas bounds are empty, so the plane cannot be centered".to_string(),
        ));
    }
    Ok(center)
}

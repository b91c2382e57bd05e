//! Region labels: which regions get one, what they say, and where they go.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use brainslice_math::Point2;
use brainslice_slicer::Polygon2D;
use serde::{Deserialize, Serialize};

use crate::atlas::ROOT;

/// Label placement precision used for 2D heatmaps, in plane units.
pub const ANNOTATION_PRECISION: f64 = 0.1;

/// Which regions are labelled in a 2D heatmap.
///
/// In settings files this is `false`/`true`, a list of acronyms, or a table
/// mapping acronyms to label text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "AnnotationRepr", into = "AnnotationRepr")]
pub enum AnnotationMode {
    /// No labels.
    #[default]
    None,
    /// Every region, labelled with its acronym.
    All,
    /// Only these regions, labelled with their acronyms.
    Only(BTreeSet<String>),
    /// Only these regions, labelled with the given text.
    Custom(BTreeMap<String, String>),
}

impl AnnotationMode {
    /// Label text for `region`, or `None` if it is not labelled.
    ///
    /// The root outline is never labelled.
    pub fn text_for(&self, region: &str) -> Option<String> {
        if region == ROOT {
            return None;
        }
        match self {
            Self::None => None,
            Self::All => Some(region.to_string()),
            Self::Only(regions) => regions.contains(region).then(|| region.to_string()),
            Self::Custom(texts) => texts.get(region).cloned(),
        }
    }

    /// Whether no region can be labelled.
    pub fn is_none(&self) -> bool {
        match self {
            Self::None => true,
            Self::All => false,
            Self::Only(regions) => regions.is_empty(),
            Self::Custom(texts) => texts.is_empty(),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AnnotationRepr {
    Flag(bool),
    List(Vec<String>),
    Map(BTreeMap<String, LabelText>),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum LabelText {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl From<AnnotationRepr> for AnnotationMode {
    fn from(repr: AnnotationRepr) -> Self {
        match repr {
            AnnotationRepr::Flag(false) => Self::None,
            AnnotationRepr::Flag(true) => Self::All,
            AnnotationRepr::List(regions) => Self::Only(regions.into_iter().collect()),
            AnnotationRepr::Map(texts) => Self::Custom(
                texts
                    .into_iter()
                    .map(|(region, text)| {
                        let text = match text {
                            LabelText::Flag(b) => b.to_string(),
                            LabelText::Number(n) => n.to_string(),
                            LabelText::Text(s) => s,
                        };
                        (region, text)
                    })
                    .collect(),
            ),
        }
    }
}

impl From<AnnotationMode> for AnnotationRepr {
    fn from(mode: AnnotationMode) -> Self {
        match mode {
            AnnotationMode::None => Self::Flag(false),
            AnnotationMode::All => Self::Flag(true),
            AnnotationMode::Only(regions) => Self::List(regions.into_iter().collect()),
            AnnotationMode::Custom(texts) => Self::Map(
                texts
                    .into_iter()
                    .map(|(region, text)| (region, LabelText::Text(text)))
                    .collect(),
            ),
        }
    }
}

/// A text label placed in plane coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Region the label belongs to.
    pub region: String,
    /// Label text.
    pub text: String,
    /// Label anchor, centered on the text.
    pub position: [f64; 2],
}

struct Cell {
    potential: f64,
    distance: f64,
    center: Point2,
    radius: f64,
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Cell {}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering {
        self.potential.total_cmp(&other.potential)
    }
}

/// Point inside `polygon` farthest from its edges (pole of inaccessibility).
///
/// Grid cells covering the bounding box are refined best-first until no cell
/// can beat the current best by more than `precision`. Returns `None` for
/// polygons with fewer than three points or with all points on one line.
pub fn pole_of_inaccessibility(polygon: &Polygon2D, precision: f64) -> Option<Point2> {
    if polygon.len() < 3 || is_collinear(&polygon.points) {
        return None;
    }
    let ring = Polygon2D::new(polygon.points.clone(), true);
    let (lo, hi) = ring.bounds()?;
    let (width, height) = (hi.x - lo.x, hi.y - lo.y);

    let distance = |p: &Point2| {
        if ring.contains(p) {
            ring.distance_to_boundary(p)
        } else {
            f64::NEG_INFINITY
        }
    };
    let cell = |center: Point2, radius: f64| {
        let d = distance(&center);
        Cell {
            potential: d + radius * std::f64::consts::SQRT_2,
            distance: d,
            center,
            radius,
        }
    };

    // Narrow polygons can slip between the points of a coarse grid.
    let mut cell_size = width.min(height) / 4.0;
    let mut queue = BinaryHeap::new();
    for _ in 0..8 {
        let radius = cell_size / 2.0;
        let mut y = lo.y + radius;
        while y < hi.y {
            let mut x = lo.x + radius;
            while x < hi.x {
                let c = cell(Point2::new(x, y), radius);
                if c.distance.is_finite() {
                    queue.push(c);
                }
                x += cell_size;
            }
            y += cell_size;
        }
        if !queue.is_empty() {
            break;
        }
        cell_size /= 2.0;
    }

    let mut best = Point2::new(lo.x + width / 2.0, lo.y + height / 2.0);
    let mut best_distance = distance(&best);

    while let Some(c) = queue.pop() {
        if c.potential - best_distance <= precision {
            break;
        }
        if c.distance > best_distance {
            best_distance = c.distance;
            best = c.center;
        }
        if c.radius > precision / 2.0 {
            let r = c.radius / 2.0;
            for (dx, dy) in [(-r, -r), (r, -r), (-r, r), (r, r)] {
                let sub = cell(Point2::new(c.center.x + dx, c.center.y + dy), r);
                if sub.distance.is_finite() && sub.potential > best_distance + precision {
                    queue.push(sub);
                }
            }
        }
    }

    Some(best)
}

fn is_collinear(points: &[Point2]) -> bool {
    let Some(origin) = points.first() else {
        return true;
    };
    let Some(far) = points.iter().find(|p| *p != origin) else {
        return true;
    };
    let dir = far - origin;
    points.iter().all(|p| {
        let d = p - origin;
        dir.x * d.y - dir.y * d.x == 0.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_inside(coords: &[[f64; 2]]) {
        let polygon = Polygon2D::from_coords(coords);
        let p = pole_of_inaccessibility(&polygon, ANNOTATION_PRECISION).unwrap();
        assert!(polygon.contains(&p), "{p:?} not inside {coords:?}");
    }

    #[test]
    fn test_pole_inside_square() {
        let polygon = Polygon2D::from_coords(&[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]]);
        let p = pole_of_inaccessibility(&polygon, 0.01).unwrap();
        assert!((p.x - 0.5).abs() < 0.05 && (p.y - 0.5).abs() < 0.05);
    }

    #[test]
    fn test_pole_inside_concave() {
        assert_inside(&[
            [0.0, 0.0],
            [0.0, 2.0],
            [2.0, 2.0],
            [2.0, 1.5],
            [0.5, 1.5],
            [0.5, 0.5],
            [2.0, 0.5],
            [2.0, 0.0],
        ]);
    }

    #[test]
    fn test_pole_inside_tiny() {
        assert_inside(&[[0.0, 0.0], [0.0, 0.0001], [0.0001, 0.0001], [0.0001, 0.0]]);
    }

    #[test]
    fn test_pole_inside_narrow_c_shape() {
        assert_inside(&[
            [0.0, 0.0],
            [10.0, 0.0],
            [10.0, 0.5],
            [0.5, 0.5],
            [0.5, 9.5],
            [10.0, 9.5],
            [10.0, 10.0],
            [0.0, 10.0],
        ]);
    }

    #[test]
    fn test_pole_degenerate() {
        let line = Polygon2D::from_coords(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]);
        assert!(pole_of_inaccessibility(&line, 1.0).is_none());
        assert!(pole_of_inaccessibility(&Polygon2D::default(), 1.0).is_none());
    }

    #[test]
    fn test_annotation_text() {
        assert_eq!(AnnotationMode::None.text_for("TH"), None);
        assert_eq!(AnnotationMode::All.text_for("TH").as_deref(), Some("TH"));
        assert_eq!(AnnotationMode::All.text_for(ROOT), None);

        let only = AnnotationMode::Only(["TH".to_string()].into());
        assert_eq!(only.text_for("TH").as_deref(), Some("TH"));
        assert_eq!(only.text_for("RSP"), None);

        let custom = AnnotationMode::Custom([("TH".to_string(), "Thalamus".to_string())].into());
        assert_eq!(custom.text_for("TH").as_deref(), Some("Thalamus"));
        assert_eq!(custom.text_for("AI"), None);
        assert!(AnnotationMode::Only(BTreeSet::new()).is_none());
    }

    #[test]
    fn test_annotation_mode_serde() {
        let mode: AnnotationMode = serde_json::from_str("true").unwrap();
        assert_eq!(mode, AnnotationMode::All);
        let mode: AnnotationMode = serde_json::from_str("false").unwrap();
        assert_eq!(mode, AnnotationMode::None);
        let mode: AnnotationMode = serde_json::from_str(r#"["TH"]"#).unwrap();
        assert_eq!(mode.text_for("TH").as_deref(), Some("TH"));
        let mode: AnnotationMode =
            serde_json::from_str(r#"{"TH": "Thalamus", "RSP": 0.5, "VIS": true}"#).unwrap();
        assert_eq!(mode.text_for("TH").as_deref(), Some("Thalamus"));
        assert_eq!(mode.text_for("RSP").as_deref(), Some("0.5"));
        assert_eq!(mode.text_for("VIS").as_deref(), Some("true"));
    }
}

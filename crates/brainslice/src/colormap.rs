//! Value-to-color mapping: named colormaps and a linear color scale.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HeatmapError;

/// An RGBA color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
    /// Opacity.
    pub a: f64,
}

impl Rgba {
    /// Neutral grey used for regions without a usable value.
    pub const DEFAULT_REGION: Self = Self::rgb(0.75, 0.75, 0.75);

    /// Dark grey used for the whole-brain outline.
    pub const ROOT: Self = Self {
        r: 0.26,
        g: 0.26,
        b: 0.26,
        a: 0.3,
    };

    /// Black.
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);

    /// Opaque color.
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Opaque color from 8-bit channels.
    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(f64::from(r) / 255.0, f64::from(g) / 255.0, f64::from(b) / 255.0)
    }

    /// The same color with a different opacity.
    #[must_use]
    pub const fn with_alpha(mut self, a: f64) -> Self {
        self.a = a;
        self
    }

    /// `#rrggbb`, ignoring alpha.
    pub fn to_hex(&self) -> String {
        let [r, g, b] = self.to_u8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// Channels rounded to 8 bits.
    pub fn to_u8(&self) -> [u8; 3] {
        let q = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }

    fn lerp(&self, other: &Self, t: f64) -> Self {
        let mix = |a: f64, b: f64| a + (b - a) * t;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

/// Built-in colormap families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColormapKind {
    /// White to dark red.
    Reds,
    /// White to dark blue.
    Blues,
    /// White to dark green.
    Greens,
    /// White to black.
    Greys,
    /// White to dark orange.
    Oranges,
    /// White to dark purple.
    Purples,
    /// Perceptually uniform purple-green-yellow.
    Viridis,
    /// Perceptually uniform black-magenta-cream.
    Magma,
    /// Diverging blue-red through light grey.
    Coolwarm,
    /// Diverging blue-white-red.
    Bwr,
}

impl ColormapKind {
    /// Every built-in family.
    pub const ALL: [Self; 10] = [
        Self::Reds,
        Self::Blues,
        Self::Greens,
        Self::Greys,
        Self::Oranges,
        Self::Purples,
        Self::Viridis,
        Self::Magma,
        Self::Coolwarm,
        Self::Bwr,
    ];

    /// Canonical name, as accepted by [`Colormap::from_str`].
    pub fn name(&self) -> &'static str {
        match self {
            Self::Reds => "Reds",
            Self::Blues => "Blues",
            Self::Greens => "Greens",
            Self::Greys => "Greys",
            Self::Oranges => "Oranges",
            Self::Purples => "Purples",
            Self::Viridis => "viridis",
            Self::Magma => "magma",
            Self::Coolwarm => "coolwarm",
            Self::Bwr => "bwr",
        }
    }

    fn anchors(&self) -> &'static [u32] {
        match self {
            Self::Reds => &[
                0xfff5f0, 0xfee0d2, 0xfcbba1, 0xfc9272, 0xfb6a4a, 0xef3b2c, 0xcb181d, 0xa50f15, 0x67000d,
            ],
            Self::Blues => &[
                0xf7fbff, 0xdeebf7, 0xc6dbef, 0x9ecae1, 0x6baed6, 0x4292c6, 0x2171b5, 0x08519c, 0x08306b,
            ],
            Self::Greens => &[
                0xf7fcf5, 0xe5f5e0, 0xc7e9c0, 0xa1d99b, 0x74c476, 0x41ab5d, 0x238b45, 0x006d2c, 0x00441b,
            ],
            Self::Greys => &[
                0xffffff, 0xf0f0f0, 0xd9d9d9, 0xbdbdbd, 0x969696, 0x737373, 0x525252, 0x252525, 0x000000,
            ],
            Self::Oranges => &[
                0xfff5eb, 0xfee6ce, 0xfdd0a2, 0xfdae6b, 0xfd8d3c, 0xf16913, 0xd94801, 0xa63603, 0x7f2704,
            ],
            Self::Purples => &[
                0xfcfbfd, 0xefedf5, 0xdadaeb, 0xbcbddc, 0x9e9ac8, 0x807dba, 0x6a51a3, 0x54278f, 0x3f007d,
            ],
            Self::Viridis => &[
                0x440154, 0x472d7b, 0x3b528b, 0x2c728e, 0x21918c, 0x28ae80, 0x5ec962, 0xaddc30, 0xfde725,
            ],
            Self::Magma => &[
                0x000004, 0x1c1044, 0x4f127b, 0x812581, 0xb5367a, 0xe55964, 0xfb8761, 0xfec287, 0xfcfdbf,
            ],
            Self::Coolwarm => &[
                0x3b4cc0, 0x688aef, 0x99baff, 0xc9d8ef, 0xedd1c2, 0xf7a789, 0xe36a53, 0xb40426,
            ],
            Self::Bwr => &[0x0000ff, 0xffffff, 0xff0000],
        }
    }
}

/// A named colormap, optionally reversed (`"Reds_r"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Colormap {
    /// Color family.
    pub kind: ColormapKind,
    /// Whether the map runs from its last anchor to its first.
    pub reversed: bool,
}

impl Colormap {
    /// A colormap running in its natural direction.
    pub const fn new(kind: ColormapKind) -> Self {
        Self {
            kind,
            reversed: false,
        }
    }

    /// Color at `t` in `[0, 1]` (clamped), interpolated linearly between anchors.
    pub fn sample(&self, t: f64) -> Rgba {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let t = if self.reversed { 1.0 - t } else { t };
        let anchors = self.kind.anchors();
        let color = |hex: u32| Rgba::from_u8((hex >> 16) as u8, (hex >> 8) as u8, hex as u8);

        let last = anchors.len() - 1;
        let pos = t * last as f64;
        let i = (pos.floor() as usize).min(last);
        if i == last {
            return color(anchors[last]);
        }
        color(anchors[i]).lerp(&color(anchors[i + 1]), pos - i as f64)
    }
}

impl Default for Colormap {
    fn default() -> Self {
        Self::new(ColormapKind::Reds)
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.name())?;
        if self.reversed {
            f.write_str("_r")?;
        }
        Ok(())
    }
}

impl FromStr for Colormap {
    type Err = HeatmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, reversed) = match s.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (s, false),
        };
        ColormapKind::ALL
            .into_iter()
            .find(|kind| kind.name() == base)
            .map(|kind| Self { kind, reversed })
            .ok_or_else(|| HeatmapError::UnknownColormap(s.to_string()))
    }
}

/// Linear mapping from values onto a colormap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    /// Value mapped to the start of the colormap.
    pub vmin: f64,
    /// Value mapped to the end of the colormap.
    pub vmax: f64,
    /// The colormap.
    pub cmap: Colormap,
}

impl ColorScale {
    /// Create a scale.
    pub fn new(vmin: f64, vmax: f64, cmap: Colormap) -> Self {
        Self { vmin, vmax, cmap }
    }

    /// Build a scale whose missing bounds come from the finite `values`.
    ///
    /// With no finite values the derived range is `(0, 1)`; when every
    /// finite value is the same `x` it is `(x / 2, x)`.
    pub fn from_values<'a>(
        values: impl IntoIterator<Item = &'a f64>,
        vmin: Option<f64>,
        vmax: Option<f64>,
        cmap: Colormap,
    ) -> Self {
        let (lo, hi) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
            .map(|(lo, hi)| if lo == hi { (hi * 0.5, hi) } else { (lo, hi) })
            .unwrap_or((0.0, 1.0));
        Self::new(vmin.unwrap_or(lo), vmax.unwrap_or(hi), cmap)
    }

    /// `(v - vmin) / (vmax - vmin)` clamped to `[0, 1]`; `0.5` when the range is empty.
    pub fn normalize(&self, v: f64) -> f64 {
        let span = self.vmax - self.vmin;
        if span == 0.0 || !span.is_finite() {
            return 0.5;
        }
        ((v - self.vmin) / span).clamp(0.0, 1.0)
    }

    /// Color for a value; missing or NaN values get [`Rgba::DEFAULT_REGION`].
    pub fn color_for(&self, value: Option<f64>) -> Rgba {
        match value {
            Some(v) if !v.is_nan() => self.cmap.sample(self.normalize(v)),
            _ => Rgba::DEFAULT_REGION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_parse_colormaps() {
        assert_eq!("Reds".parse::<Colormap>().unwrap(), Colormap::new(ColormapKind::Reds));
        let r: Colormap = "viridis_r".parse().unwrap();
        assert_eq!(r.kind, ColormapKind::Viridis);
        assert!(r.reversed);
        assert_eq!(r.to_string(), "viridis_r");
        assert!(matches!(
            "reds".parse::<Colormap>(),
            Err(HeatmapError::UnknownColormap(name)) if name == "reds"
        ));
    }

    #[test]
    fn test_sample_endpoints() {
        let reds = Colormap::new(ColormapKind::Reds);
        assert_eq!(reds.sample(0.0).to_hex(), "#fff5f0");
        assert_eq!(reds.sample(1.0).to_hex(), "#67000d");
        assert_eq!(reds.sample(7.0).to_hex(), "#67000d");
        let bwr = Colormap::new(ColormapKind::Bwr);
        assert_eq!(bwr.sample(0.5).to_hex(), "#ffffff");
        let rev = Colormap {
            kind: ColormapKind::Bwr,
            reversed: true,
        };
        assert_eq!(rev.sample(0.0).to_hex(), "#ff0000");
    }

    #[test]
    fn test_sample_interpolates() {
        let bwr = Colormap::new(ColormapKind::Bwr);
        let c = bwr.sample(0.25);
        assert_abs_diff_eq!(c.r, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(c.g, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(c.b, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_and_clamp() {
        let scale = ColorScale::new(-5.0, 3.0, Colormap::default());
        assert_abs_diff_eq!(scale.normalize(1.0), 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(scale.normalize(-3.0), 0.25, epsilon = 1e-12);
        assert_eq!(scale.normalize(100.0), 1.0);
        assert_eq!(scale.normalize(-100.0), 0.0);
    }

    #[test]
    fn test_zero_span() {
        let scale = ColorScale::new(2.0, 2.0, Colormap::default());
        assert_eq!(scale.normalize(2.0), 0.5);
        assert_eq!(scale.normalize(-9.0), 0.5);
    }

    #[test]
    fn test_missing_value_color() {
        let scale = ColorScale::new(0.0, 1.0, Colormap::default());
        assert_eq!(scale.color_for(None), Rgba::DEFAULT_REGION);
        assert_eq!(scale.color_for(Some(f64::NAN)), Rgba::DEFAULT_REGION);
        assert_ne!(scale.color_for(Some(0.5)), Rgba::DEFAULT_REGION);
    }

    #[test]
    fn test_from_values() {
        let values = [1.0, -3.0, f64::NAN];
        let scale = ColorScale::from_values(&values, None, None, Colormap::default());
        assert_eq!((scale.vmin, scale.vmax), (-3.0, 1.0));

        let scale = ColorScale::from_values(&values, Some(-5.0), None, Colormap::default());
        assert_eq!((scale.vmin, scale.vmax), (-5.0, 1.0));

        let same = [4.0, 4.0];
        let scale = ColorScale::from_values(&same, None, None, Colormap::default());
        assert_eq!((scale.vmin, scale.vmax), (2.0, 4.0));

        let none: [f64; 0] = [];
        let scale = ColorScale::from_values(&none, None, None, Colormap::default());
        assert_eq!((scale.vmin, scale.vmax), (0.0, 1.0));
    }

    #[test]
    fn test_rgba_hex() {
        assert_eq!(Rgba::rgb(1.0, 0.0, 0.5).to_hex(), "#ff0080");
        assert_eq!(Rgba::BLACK.to_hex(), "#000000");
    }
}

//! Collaborator traits for drawing heatmaps.

use crate::error::Result;
use crate::scene::Scene3D;
use crate::section::Section2D;

/// Draws a planar section, e.g. to SVG or an on-screen figure.
pub trait Plotter2D {
    /// Draw `section`; implementations own the output.
    fn plot(&mut self, section: &Section2D) -> Result<()>;
}

/// Draws a 3D scene, e.g. in an interactive viewer.
pub trait SceneRenderer {
    /// Draw `scene`.
    fn render(&mut self, scene: &Scene3D) -> Result<()>;
}

//! Error types for heatmap composition.

use brainslice_mesh::MeshError;
use brainslice_slicer::SlicerError;
use thiserror::Error;

/// Errors that can occur while building or drawing a heatmap.
#[derive(Error, Debug)]
pub enum HeatmapError {
    /// No atlas is registered under this name.
    #[error("atlas \"{0}\" not found")]
    UnknownAtlas(String),

    /// A requested region acronym does not exist in the atlas.
    #[error("region name \"{0}\" not recognized")]
    UnknownRegion(String),

    /// Colormap name is not one of the built-in maps.
    #[error("colormap \"{0}\" not recognized")]
    UnknownColormap(String),

    /// A region value is NaN or infinite and non-finite values are not allowed.
    #[error("heatmap value for region \"{region}\" is not finite")]
    InvalidValue {
        /// Region whose value was rejected.
        region: String,
    },

    /// Settings failed validation.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Plane or slab could not be built.
    #[error(transparent)]
    Slicer(#[from] SlicerError),

    /// A region mesh is malformed.
    #[error("region \"{region}\": {source}")]
    Mesh {
        /// Region whose mesh was rejected.
        region: String,
        /// What was wrong with it.
        source: MeshError,
    },

    /// Reading or writing a file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Settings file could not be parsed.
    #[error("config: {0}")]
    Config(#[from] toml::de::Error),

    /// Settings could not be written as TOML.
    #[error("config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// Atlas or scene JSON could not be read or written.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// A plotter or renderer failed.
    #[error("render failed: {0}")]
    Render(String),
}

/// Result type for heatmap operations.
pub type Result<T> = std::result::Result<T, HeatmapError>;

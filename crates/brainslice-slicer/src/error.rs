//! Error types for the slicer.

use thiserror::Error;

/// Errors that can occur while building a cutting plane or slab.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlicerError {
    /// Orientation vector has zero (or near-zero) length or a non-finite component.
    #[error("orientation vector ({0}, {1}, {2}) cannot be normalized")]
    DegenerateVector(f64, f64, f64),

    /// Slab thickness must be finite and strictly positive.
    #[error("slab thickness must be positive, got {0}")]
    InvalidThickness(f64),

    /// Position does not make sense for the requested orientation.
    #[error("invalid position: {0}")]
    InvalidPosition(String),

    /// Orientation name is not one of frontal, sagittal, horizontal.
    #[error("orientation \"{0}\" not recognized")]
    UnknownOrientation(String),
}

/// Result type for slicer operations.
pub type Result<T> = std::result::Result<T, SlicerError>;

//! Error types for biostack-slice.

use biostack_core::{GeometryError, ShapeError};
use thiserror::Error;

/// Result type alias for slice extraction.
pub type Result<T> = std::result::Result<T, SliceError>;

/// Errors raised while extracting a slice.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SliceError {
    /// The plane does not bound a usable slice.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// The requested timestep does not exist.
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

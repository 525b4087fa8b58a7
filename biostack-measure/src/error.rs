//! Error types for biostack-measure.

use biostack_core::{LeaseError, ShapeError};
use thiserror::Error;

use crate::measurement::MeasurementId;
use crate::pool::Dimension;

/// Result type alias for measurement operations.
pub type Result<T> = std::result::Result<T, MeasureError>;

/// Errors surfaced by pools and the measurement matrix.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeasureError {
    /// The matrix has not been initialized against a stack.
    #[error("measurement matrix is not initialized")]
    NotInitialized,

    /// A (timestep, slice) coordinate lies outside the grid.
    #[error("coordinate (t={timestep}, z={slice}) outside {timesteps}x{slices} grid")]
    OutOfRange {
        timestep: usize,
        slice: usize,
        timesteps: usize,
        slices: usize,
    },

    /// No measurement with this id is known.
    #[error("unknown measurement {0}")]
    UnknownMeasurement(MeasurementId),

    /// No group with this id is registered.
    #[error("unknown group #{0}")]
    UnknownGroup(u64),

    /// A measurement was given no values.
    #[error("a measurement needs at least one value")]
    EmptyValues,

    /// A value update changed the number of values.
    #[error("expected {expected} values, got {found}")]
    ValueCount { expected: usize, found: usize },

    /// The measurement already carries a standard id.
    #[error("measurement {0} is already a standard")]
    AlreadyStandard(MeasurementId),

    /// The measurement carries no standard id.
    #[error("measurement {0} is not a standard")]
    NotStandard(MeasurementId),

    /// No pool is attached for this display surface.
    #[error("no {0} display surface attached")]
    NoSurface(Dimension),

    /// Stack shape validation failed.
    #[error(transparent)]
    Shape(#[from] ShapeError),

    /// Endpoint lease bookkeeping failed.
    #[error(transparent)]
    Lease(#[from] LeaseError),
}

//! Error types for biostack-core.

use thiserror::Error;

/// Errors raised while validating an image-stack shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// The stack does not have the expected number of axes.
    #[error("expected a rank-{expected} stack (time, slice, y, x), found rank {found}")]
    WrongRank { expected: usize, found: usize },

    /// One of the axes has zero length.
    #[error("axis `{axis}` has zero length")]
    EmptyAxis { axis: &'static str },

    /// The number of samples does not match the declared shape.
    #[error("sample count mismatch: expected {expected}, found {found}")]
    SampleCount { expected: usize, found: usize },

    /// A timestep index lies outside the stack.
    #[error("timestep {index} out of range (stack has {count})")]
    TimestepOutOfRange { index: usize, count: usize },
}

/// Errors raised by endpoint pools.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseError {
    /// The binding already holds a lease in this pool.
    #[error("binding #{0} already holds a lease")]
    AlreadyLeased(u64),

    /// The binding holds no lease in this pool.
    #[error("binding #{0} holds no lease")]
    NotLeased(u64),
}

/// Errors raised by plane-box intersection and slice resampling.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The three control points do not span a plane.
    #[error("control points are collinear")]
    Collinear,

    /// The plane touches the box in fewer than three distinct points.
    #[error("plane meets the box in {found} distinct point(s), need at least 3")]
    TooFewIntersections { found: usize },

    /// The requested sampling grid is too small.
    #[error("resampling resolution must be at least 2x2, got {x}x{y}")]
    Resolution { x: usize, y: usize },

    /// A control point index outside 0..3.
    #[error("control point index {0} out of range")]
    ControlPoint(usize),
}

//! biostack-core: shared building blocks for image-stack tooling.
//!
//! This crate provides the geometry primitives, stack domain and volume
//! sampling, reactive notification cells and id allocation used by the
//! measurement and slicing crates.
//!

pub mod cell;
pub mod error;
pub mod geometry;
pub mod id;
pub mod volume;

pub use cell::Cell;
pub use error::{GeometryError, LeaseError, ShapeError};
pub use geometry::{
    distance_scaled, distance_to_segment, project_onto_line, rectangle_corner,
    segment_intersects_rect, Point, Rect,
};
pub use id::IdAllocator;
pub use volume::{Interpolation, StackDomain, Volume};

//! biostack-slice: arbitrary planar slices through an image stack.
//!
//! Three control points inside the stack's bounding box define a plane.
//! The plane is intersected with the box to give a convex outline, and the
//! enclosed region of a volume is resampled onto a flat 2-D image.
//!

pub mod bounds;
pub mod error;
pub mod extractor;
pub mod hull;
pub mod mesh;
pub mod resample;
pub mod selector;

pub use bounds::BoxBounds;
pub use error::{Result, SliceError};
pub use extractor::{SliceConfig, SliceExtractor};
pub use hull::{intersect_box, Hull, DUPLICATE_EPSILON};
pub use mesh::{outline_mesh, PlaneMesh};
pub use resample::{resample, SamplingQuad, SliceImage, SliceStats};
pub use selector::{PlaneSelector, Settled};

//! biostack-measure: point, line and polygon measurements on image stacks.
//!
//! Measurements are filed in a timestep x slice [`MeasurementMatrix`]. The
//! measurements of the displayed coordinate are bound to manipulable
//! endpoints leased from a [`Pool`], one pool per display surface, and kept
//! in sync in both directions as endpoints are dragged or values change.
//!

pub mod binding;
pub mod endpoint;
pub mod error;
pub mod event;
pub mod group;
pub mod list;
pub mod matrix;
pub mod measurement;
pub mod pool;
pub mod projection;
pub mod selection;

pub use binding::{Binding, BindingId, BindingRef};
pub use endpoint::{Endpoint, EndpointId};
pub use error::{MeasureError, Result};
pub use event::MeasureEvent;
pub use group::{Group, GroupId, GroupRegistry};
pub use list::MeasurementList;
pub use matrix::{MatrixConfig, MeasurementMatrix};
pub use measurement::{
    Measurement, MeasurementId, MeasurementKind, MeasurementStore, Rgb, StandardId,
};
pub use pool::{Dimension, LineSet, Marker, Pool, PoolConfig, Polyline, ValueChange};
pub use projection::{AffineProjection, ScreenProjection};
pub use selection::{SelectionBox, SelectionConfig};

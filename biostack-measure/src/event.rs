//! Notifications sent to UI panels.

use crate::measurement::{MeasurementId, StandardId};

/// Change notifications emitted by a [`MeasurementMatrix`](crate::MeasurementMatrix).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeasureEvent {
    /// The single selected measurement changed.
    SelectionChanged { measurement: Option<MeasurementId> },
    /// The displayed (timestep, slice) changed.
    CoordinateChanged { timestep: usize, slice: usize },
    /// A measurement gained or lost its standard tag.
    StandardChanged {
        measurement: MeasurementId,
        standard: Option<StandardId>,
    },
    /// A measurement was removed from the matrix.
    Removed(MeasurementId),
}

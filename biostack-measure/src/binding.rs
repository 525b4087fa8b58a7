//! Bindings between a measurement and a lease of endpoints.
//!
//! A binding is the reactive glue of the measurement model. Endpoint drags
//! flow through [`Binding::derive_values`] into the measurement; measurement
//! changes flow back out through [`Pool::refresh`](crate::Pool::refresh).
//! The binding's [`Cell`] swallows the echo of its own refresh so the two
//! directions never feed each other.

#![allow(clippy::cast_precision_loss)]

use biostack_core::{typed_id, Cell, Point};

use crate::measurement::{Measurement, MeasurementId};
use crate::pool::Dimension;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

typed_id! {
    /// Identifies a binding within its pool.
    pub struct BindingId;
}

/// Non-owning back-reference from a measurement to one of its bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BindingRef {
    /// Display surface of the pool holding the binding.
    pub dim: Dimension,
    pub binding: BindingId,
}

impl BindingRef {
    #[inline]
    pub fn new(dim: Dimension, binding: BindingId) -> Self {
        Self { dim, binding }
    }
}

/// Couples one measurement to the endpoints leased for it.
#[derive(Debug, Clone)]
pub struct Binding {
    id: BindingId,
    measurement: MeasurementId,
    pub(crate) cell: Cell,
}

impl Binding {
    pub(crate) fn new(id: BindingId, measurement: MeasurementId) -> Self {
        Self {
            id,
            measurement,
            cell: Cell::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> BindingId {
        self.id
    }

    /// The measurement this binding mirrors.
    #[inline]
    pub fn measurement(&self) -> MeasurementId {
        self.measurement
    }

    /// The reactive cell watching this binding's endpoints.
    #[inline]
    pub fn cell(&self) -> &Cell {
        &self.cell
    }

    /// Turns dragged endpoint positions into new measurement values.
    ///
    /// In a 3-D pool each depth is snapped to the nearest slice, except for
    /// standard measurements whose depth is kept from the current values.
    pub(crate) fn derive_values(
        &self,
        positions: &[Point],
        measurement: &Measurement,
        dim: Dimension,
        slice_count: usize,
    ) -> Vec<Point> {
        match dim {
            Dimension::Two => positions.to_vec(),
            Dimension::Three => {
                let locked = measurement.standard_id().is_some();
                positions
                    .iter()
                    .zip(measurement.values())
                    .map(|(p, current)| {
                        let z = if locked {
                            current.z
                        } else {
                            snap_depth(p.z, slice_count)
                        };
                        p.with_z(z)
                    })
                    .collect()
            }
        }
    }
}

/// Rounds `z` to the nearest slice index in `[0, slice_count - 1]`.
pub(crate) fn snap_depth(z: f64, slice_count: usize) -> f64 {
    if !z.is_finite() {
        return 0.0;
    }
    let max = slice_count.saturating_sub(1) as f64;
    z.round().clamp(0.0, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::GroupId;
    use crate::measurement::Rgb;

    fn line(z: f64) -> Measurement {
        Measurement::new(
            vec![Point::new(0.0, 0.0, z), Point::new(4.0, 0.0, z)],
            Rgb::WHITE,
            GroupId::NONE,
        )
        .unwrap()
    }

    #[test]
    fn test_snap_depth() {
        assert_eq!(snap_depth(2.4, 5), 2.0);
        assert_eq!(snap_depth(2.6, 5), 3.0);
        assert_eq!(snap_depth(-3.0, 5), 0.0);
        assert_eq!(snap_depth(11.0, 5), 4.0);
        assert_eq!(snap_depth(f64::NAN, 5), 0.0);
    }

    #[test]
    fn test_derive_values_2d_passthrough() {
        let b = Binding::new(BindingId(0), MeasurementId(0));
        let m = line(1.0);
        let pos = [Point::new(1.0, 2.0, 1.0), Point::new(3.3, 4.0, 1.0)];
        assert_eq!(b.derive_values(&pos, &m, Dimension::Two, 5), pos.to_vec());
    }

    #[test]
    fn test_derive_values_3d_snaps_depth() {
        let b = Binding::new(BindingId(0), MeasurementId(0));
        let m = line(1.0);
        let pos = [Point::new(1.0, 2.0, 2.7), Point::new(3.0, 4.0, 0.2)];
        let v = b.derive_values(&pos, &m, Dimension::Three, 5);
        assert_eq!(v[0], Point::new(1.0, 2.0, 3.0));
        assert_eq!(v[1], Point::new(3.0, 4.0, 0.0));
    }

    #[test]
    fn test_derive_values_standard_keeps_depth() {
        let b = Binding::new(BindingId(0), MeasurementId(0));
        let mut m = line(1.0);
        m.set_standard(Some(crate::measurement::StandardId(4)));
        let pos = [Point::new(1.0, 2.0, 2.7), Point::new(3.0, 4.0, 0.2)];
        let v = b.derive_values(&pos, &m, Dimension::Three, 5);
        assert_eq!(v[0].z, 1.0);
        assert_eq!(v[1].z, 1.0);
    }
}

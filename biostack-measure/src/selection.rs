//! Highlight outline around the selected measurement.

#![allow(clippy::cast_precision_loss)]

use biostack_core::{Cell, Point};

use crate::binding::BindingRef;
use crate::pool::{Dimension, Pool};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the selection outline.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SelectionConfig {
    /// Gap between the measurement and the outline, in domain units.
    pub padding: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self { padding: 2.0 }
    }
}

impl SelectionConfig {
    #[must_use]
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }
}

/// Reactive rectangle drawn around whichever binding is selected.
///
/// The outline follows the bound binding's live endpoints, so it tracks
/// drags without waiting for the measurement to update.
#[derive(Debug, Clone, Default)]
pub struct SelectionBox {
    config: SelectionConfig,
    target: Option<BindingRef>,
    cell: Cell,
    outline: Option<Vec<Point>>,
}

impl SelectionBox {
    pub fn new(config: SelectionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[inline]
    pub fn target(&self) -> Option<BindingRef> {
        self.target
    }

    /// Closed five-point loop around the target, if one is shown.
    #[inline]
    pub fn outline(&self) -> Option<&[Point]> {
        self.outline.as_deref()
    }

    /// Attaches the box to `target` (or detaches it) and redraws.
    pub fn bind(&mut self, target: Option<BindingRef>, pool: Option<&Pool>) {
        self.target = target;
        self.recompute(pool);
    }

    /// Called after a binding's endpoints moved.
    pub fn endpoints_changed(&mut self, changed: BindingRef, pool: &Pool) {
        if self.target == Some(changed) && self.cell.notify() {
            self.recompute(Some(pool));
        }
    }

    /// Holds redraws until [`resume`](Self::resume).
    pub fn suspend(&mut self) {
        self.cell.disable();
    }

    /// Redraws once if the target moved while suspended.
    pub fn resume(&mut self, pool: Option<&Pool>) {
        if self.cell.enable() {
            self.recompute(pool);
        }
    }

    fn recompute(&mut self, pool: Option<&Pool>) {
        self.outline = self.target.zip(pool).and_then(|(target, pool)| {
            let points = pool.live_positions(target.binding)?;
            let z = match target.dim {
                Dimension::Two => pool.current_slice() as f64,
                Dimension::Three => points.iter().map(|p| p.z).sum::<f64>() / points.len() as f64,
            };
            bounding_loop(&points, self.config.padding, z)
        });
    }
}

fn bounding_loop(points: &[Point], pad: f64, z: f64) -> Option<Vec<Point>> {
    if points.is_empty() {
        return None;
    }
    let (mut x0, mut y0) = (f64::INFINITY, f64::INFINITY);
    let (mut x1, mut y1) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        x0 = x0.min(p.x);
        y0 = y0.min(p.y);
        x1 = x1.max(p.x);
        y1 = y1.max(p.y);
    }
    let (x0, y0, x1, y1) = (x0 - pad, y0 - pad, x1 + pad, y1 + pad);
    Some(vec![
        Point::new(x0, y0, z),
        Point::new(x1, y0, z),
        Point::new(x1, y1, z),
        Point::new(x0, y1, z),
        Point::new(x0, y0, z),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::GroupId;
    use crate::measurement::{Measurement, MeasurementStore, Rgb};
    use crate::pool::PoolConfig;

    #[test]
    fn test_outline_follows_drag() {
        let mut store = MeasurementStore::new();
        let id = store.insert(Measurement::line(
            Point::new(0.0, 0.0, 0.0),
            Point::new(10.0, 4.0, 0.0),
            Rgb::WHITE,
            GroupId::NONE,
        ));
        let mut pool = Pool::new(Dimension::Two, PoolConfig::default());
        let b = pool.add(id, &mut store).unwrap();
        let target = BindingRef::new(Dimension::Two, b);

        let mut sel = SelectionBox::new(SelectionConfig::default().with_padding(1.0));
        sel.bind(Some(target), Some(&pool));
        let outline = sel.outline().unwrap();
        assert_eq!(outline.len(), 5);
        assert_eq!(outline[0], Point::new(-1.0, -1.0, 0.0));
        assert_eq!(outline[2], Point::new(11.0, 5.0, 0.0));
        assert_eq!(outline.first(), outline.last());

        let end = pool.lease_of(b).unwrap()[1];
        pool.drag_endpoint(end, Point::new(20.0, 4.0, 0.0), &mut store);
        sel.endpoints_changed(target, &pool);
        assert_eq!(sel.outline().unwrap()[2], Point::new(21.0, 5.0, 0.0));

        sel.bind(None, Some(&pool));
        assert!(sel.outline().is_none());
    }

    #[test]
    fn test_suspended_changes_redraw_once() {
        let mut store = MeasurementStore::new();
        let id = store.insert(Measurement::point(Point::new(3.0, 3.0, 0.0), Rgb::WHITE, GroupId::NONE));
        let mut pool = Pool::new(Dimension::Two, PoolConfig::default());
        let b = pool.add(id, &mut store).unwrap();
        let target = BindingRef::new(Dimension::Two, b);
        let mut sel = SelectionBox::new(SelectionConfig::default());
        sel.bind(Some(target), Some(&pool));

        sel.suspend();
        let handle = pool.lease_of(b).unwrap()[0];
        pool.drag_endpoint(handle, Point::new(8.0, 3.0, 0.0), &mut store);
        sel.endpoints_changed(target, &pool);
        assert_eq!(sel.outline().unwrap()[0].x, 1.0);
        sel.resume(Some(&pool));
        assert_eq!(sel.outline().unwrap()[0].x, 6.0);
    }
}

//! Three-point plane selection inside a box.
//!
//! The selector owns three control points and the derived outline. Every
//! change to a control point goes through a [`Cell`]; when it fires the
//! plane is recomputed from scratch, so the result depends only on the
//! current control points.
//!
//! Interactive drags additionally keep each control point on a box edge.
//! A point that has drifted off an edge is snapped back onto the nearest
//! one and written back, which re-fires the cell; the outline is only
//! recomputed once every point has settled.

use biostack_core::{Cell, GeometryError, Point};
use log::{debug, trace};

use crate::bounds::BoxBounds;
use crate::hull::{intersect_box, Hull};
use crate::mesh::{outline_mesh, PlaneMesh};

/// Result of a settled drag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settled {
    /// Control points that were snapped onto a box edge, in snap order.
    pub snapped: Vec<usize>,
}

/// Three control points and the plane outline they define.
#[derive(Debug, Clone)]
pub struct PlaneSelector {
    bounds: BoxBounds,
    control: [Point; 3],
    cell: Cell,
    hull: Option<Hull>,
    mesh: Option<PlaneMesh>,
    last_error: Option<GeometryError>,
    /// Relative distance to a face below which a point counts as on it.
    snap_tolerance: f64,
}

impl PlaneSelector {
    /// Creates a selector whose plane cuts the box horizontally through its
    /// middle slice.
    pub fn new(bounds: BoxBounds, snap_tolerance: f64) -> Self {
        let (lo, hi) = (bounds.min(), bounds.max());
        let z = bounds.center().z;
        let mut selector = Self {
            bounds,
            control: [
                Point::new(lo.x, lo.y, z),
                Point::new(hi.x, lo.y, z),
                Point::new(hi.x, hi.y, z),
            ],
            cell: Cell::new(),
            hull: None,
            mesh: None,
            last_error: None,
            snap_tolerance,
        };
        // An initial failure is kept in `last_error`.
        let _ = selector.compute();
        selector
    }

    #[inline]
    pub fn bounds(&self) -> &BoxBounds {
        &self.bounds
    }

    #[inline]
    pub fn control_points(&self) -> &[Point; 3] {
        &self.control
    }

    /// The most recent successfully computed outline.
    #[inline]
    pub fn hull(&self) -> Option<&Hull> {
        self.hull.as_ref()
    }

    #[inline]
    pub fn mesh(&self) -> Option<&PlaneMesh> {
        self.mesh.as_ref()
    }

    /// Closed outline loop, first vertex repeated last.
    pub fn outline(&self) -> Option<Vec<Point>> {
        self.hull.as_ref().map(Hull::closed_loop)
    }

    /// Why the latest recompute failed, if it did. The previous outline is
    /// kept on display in that case.
    #[inline]
    pub fn last_error(&self) -> Option<&GeometryError> {
        self.last_error.as_ref()
    }

    /// Returns true if the outline reflects the current control points.
    #[inline]
    pub fn is_current(&self) -> bool {
        self.last_error.is_none() && self.hull.is_some()
    }

    /// Replaces the box and pulls the control points into it.
    pub fn set_bounds(&mut self, bounds: BoxBounds) -> Result<(), GeometryError> {
        self.bounds = bounds;
        self.set_control_points(self.control)
    }

    /// Sets all three control points at once, clamped into the box.
    ///
    /// No edge snapping is applied. The writes are batched so the plane is
    /// recomputed once.
    pub fn set_control_points(&mut self, points: [Point; 3]) -> Result<(), GeometryError> {
        self.cell.disable();
        for (slot, p) in self.control.iter_mut().zip(points) {
            *slot = self.bounds.clamp(p);
            let _ = self.cell.notify();
        }
        if self.cell.enable() {
            self.compute()?;
        }
        self.current()
    }

    /// Moves one control point as a user drag would.
    ///
    /// The point is clamped into the box, then every control point is
    /// snapped onto its nearest box edge if needed before the plane is
    /// recomputed.
    pub fn drag_control_point(&mut self, index: usize, to: Point) -> Result<Settled, GeometryError> {
        let slot = self
            .control
            .get_mut(index)
            .ok_or(GeometryError::ControlPoint(index))?;
        *slot = self.bounds.clamp(to);

        let mut settled = Settled::default();
        if !self.cell.notify() {
            return Ok(settled);
        }
        while let Some((i, snapped)) = self.find_unsnapped() {
            trace!("control point {i} snapped to {snapped:?}");
            self.control[i] = snapped;
            settled.snapped.push(i);
            if !self.cell.notify() {
                return Ok(settled);
            }
        }
        self.compute()?;
        Ok(settled)
    }

    /// First control point not lying on a box edge, with its snapped
    /// position.
    fn find_unsnapped(&self) -> Option<(usize, Point)> {
        self.control.iter().enumerate().find_map(|(i, p)| {
            let snapped = snap_to_edge(&self.bounds, *p, self.snap_tolerance);
            (snapped != *p).then_some((i, snapped))
        })
    }

    fn compute(&mut self) -> Result<(), GeometryError> {
        match intersect_box(&self.bounds, &self.control) {
            Ok(hull) => {
                debug!("plane outline has {} vertices", hull.len());
                self.mesh = outline_mesh(&hull);
                self.hull = Some(hull);
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                debug!("plane recompute failed: {e}");
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    fn current(&self) -> Result<(), GeometryError> {
        match &self.last_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

/// Moves `p` onto the box edge nearest to it.
///
/// A point already on two faces is returned unchanged. Otherwise the two
/// axes where it is closest to a face (relative to the box size) are
/// pushed onto that face.
fn snap_to_edge(bounds: &BoxBounds, p: Point, tolerance: f64) -> Point {
    let mut dist = [0.0_f64; 3];
    let mut near_hi = [false; 3];
    for k in 0..3 {
        let extent = bounds.extent(k);
        let below = p.axis(k) - bounds.lo(k);
        let above = bounds.hi(k) - p.axis(k);
        near_hi[k] = above < below;
        dist[k] = if extent > 0.0 {
            below.min(above) / extent
        } else {
            0.0
        };
    }
    if dist.iter().filter(|d| **d <= tolerance).count() >= 2 {
        return p;
    }

    let mut axes = [0, 1, 2];
    axes.sort_by(|&a, &b| dist[a].total_cmp(&dist[b]));
    axes[..2].iter().fold(p, |q, &k| {
        let face = if near_hi[k] { bounds.hi(k) } else { bounds.lo(k) };
        q.with_axis(k, face)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube() -> BoxBounds {
        BoxBounds::new(Point::ORIGIN, Point::new(10.0, 10.0, 10.0))
    }

    #[test]
    fn test_default_plane_is_mid_slice() {
        let s = PlaneSelector::new(cube(), 1e-6);
        let hull = s.hull().unwrap();
        assert_eq!(hull.len(), 4);
        assert!(hull.vertices().iter().all(|p| p.z == 5.0));
        assert!(s.is_current());
        assert_eq!(s.outline().unwrap().len(), 5);
    }

    #[test]
    fn test_snap_to_edge() {
        let b = cube();
        assert_eq!(snap_to_edge(&b, Point::new(1.0, 5.0, 9.0), 1e-6), Point::new(0.0, 5.0, 10.0));
        assert_eq!(snap_to_edge(&b, Point::new(0.0, 5.0, 10.0), 1e-6), Point::new(0.0, 5.0, 10.0));
        assert_eq!(snap_to_edge(&b, Point::new(5.0, 5.0, 5.0), 1e-6).x, 0.0);
    }

    #[test]
    fn test_drag_snaps_and_recomputes() {
        let mut s = PlaneSelector::new(cube(), 1e-6);
        let settled = s.drag_control_point(0, Point::new(1.0, 0.5, 3.0)).unwrap();
        assert_eq!(settled.snapped, vec![0]);
        assert_eq!(s.control_points()[0], Point::new(0.0, 0.0, 3.0));
        assert!(s.is_current());
        let hull = s.hull().unwrap();
        assert!(hull.vertices().iter().any(|p| p.approx_eq(Point::new(0.0, 0.0, 3.0), 1e-9)));
    }

    #[test]
    fn test_drag_clamps_into_box() {
        let mut s = PlaneSelector::new(cube(), 1e-6);
        let settled = s.drag_control_point(2, Point::new(20.0, 20.0, 7.0)).unwrap();
        assert!(settled.snapped.is_empty());
        assert_eq!(s.control_points()[2], Point::new(10.0, 10.0, 7.0));
    }

    #[test]
    fn test_failed_recompute_keeps_outline() {
        let mut s = PlaneSelector::new(cube(), 1e-6);
        let before = s.outline().unwrap();
        let err = s.set_control_points([
            Point::new(1.0, 1.0, 1.0),
            Point::new(2.0, 2.0, 2.0),
            Point::new(3.0, 3.0, 3.0),
        ]);
        assert_eq!(err, Err(GeometryError::Collinear));
        assert!(!s.is_current());
        assert_eq!(s.outline().unwrap(), before);
    }

    #[test]
    fn test_bad_index() {
        let mut s = PlaneSelector::new(cube(), 1e-6);
        assert_eq!(
            s.drag_control_point(3, Point::ORIGIN),
            Err(GeometryError::ControlPoint(3))
        );
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut s = PlaneSelector::new(cube(), 1e-6);
        let pts = [
            Point::new(2.0, 3.0, 4.0),
            Point::new(8.0, 1.0, 6.0),
            Point::new(5.0, 9.0, 2.0),
        ];
        s.set_control_points(pts).unwrap();
        let first = s.hull().unwrap().clone();
        s.set_control_points(pts).unwrap();
        assert_eq!(s.hull().unwrap(), &first);
    }
}

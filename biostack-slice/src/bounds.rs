//! Axis-aligned bounding box of a stack.

#![allow(clippy::cast_precision_loss)]

use biostack_core::{Point, StackDomain};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Relative tolerance for "on a face" tests, scaled by the box diagonal.
const FACE_TOLERANCE: f64 = 1e-9;

/// One box edge: the axis it runs along and the two fixed coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Edge {
    pub free: usize,
    pub fixed: [(usize, f64); 2],
}

/// The box `[x1, x2] x [y1, y2] x [z1, z2]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoxBounds {
    min: Point,
    max: Point,
}

impl BoxBounds {
    /// Creates a box from two opposite corners in any order.
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// The box spanned by a stack's sample coordinates.
    pub fn from_domain(domain: &StackDomain) -> Self {
        let (lo, hi) = domain.extent();
        Self::new(lo, hi)
    }

    #[inline]
    pub fn min(&self) -> Point {
        self.min
    }

    #[inline]
    pub fn max(&self) -> Point {
        self.max
    }

    #[inline]
    pub fn lo(&self, axis: usize) -> f64 {
        self.min.axis(axis)
    }

    #[inline]
    pub fn hi(&self, axis: usize) -> f64 {
        self.max.axis(axis)
    }

    /// Length along `axis`.
    #[inline]
    pub fn extent(&self, axis: usize) -> f64 {
        self.hi(axis) - self.lo(axis)
    }

    pub fn center(&self) -> Point {
        self.min.midpoint(self.max)
    }

    pub fn diagonal(&self) -> f64 {
        self.min.distance(self.max)
    }

    /// Absolute tolerance used for on-face and on-edge tests.
    pub fn tolerance(&self) -> f64 {
        FACE_TOLERANCE * self.diagonal().max(1.0)
    }

    /// Returns true if `p` lies inside the box, allowing `tol` slack.
    pub fn contains(&self, p: Point, tol: f64) -> bool {
        (0..3).all(|k| {
            let v = p.axis(k);
            v >= self.lo(k) - tol && v <= self.hi(k) + tol
        })
    }

    /// Moves `p` onto the nearest point of the box.
    pub fn clamp(&self, p: Point) -> Point {
        Point::new(
            p.x.clamp(self.min.x, self.max.x),
            p.y.clamp(self.min.y, self.max.y),
            p.z.clamp(self.min.z, self.max.z),
        )
    }

    /// Returns true if `v` is at the low or high extent of `axis`.
    pub fn at_extent(&self, axis: usize, v: f64, tol: f64) -> bool {
        (v - self.lo(axis)).abs() <= tol || (v - self.hi(axis)).abs() <= tol
    }

    /// Number of axes on which `p` sits at a box extent.
    pub fn faces_touched(&self, p: Point, tol: f64) -> usize {
        (0..3).filter(|&k| self.at_extent(k, p.axis(k), tol)).count()
    }

    /// Returns true if `a` and `b` lie on a common box face.
    pub fn share_face(&self, a: Point, b: Point, tol: f64) -> bool {
        (0..3).any(|k| {
            let (av, bv) = (a.axis(k), b.axis(k));
            let lo = self.lo(k);
            let hi = self.hi(k);
            ((av - lo).abs() <= tol && (bv - lo).abs() <= tol)
                || ((av - hi).abs() <= tol && (bv - hi).abs() <= tol)
        })
    }

    /// The eight corners, `x` varying fastest.
    pub fn corners(&self) -> [Point; 8] {
        let (a, b) = (self.min, self.max);
        [
            Point::new(a.x, a.y, a.z),
            Point::new(b.x, a.y, a.z),
            Point::new(a.x, b.y, a.z),
            Point::new(b.x, b.y, a.z),
            Point::new(a.x, a.y, b.z),
            Point::new(b.x, a.y, b.z),
            Point::new(a.x, b.y, b.z),
            Point::new(b.x, b.y, b.z),
        ]
    }

    /// The twelve edges, walked so that consecutive edges share a corner.
    pub(crate) fn edges(&self) -> [Edge; 12] {
        let (x1, y1, z1) = (self.min.x, self.min.y, self.min.z);
        let (x2, y2, z2) = (self.max.x, self.max.y, self.max.z);
        let e = |free: usize, a: (usize, f64), b: (usize, f64)| Edge { free, fixed: [a, b] };
        [
            e(0, (1, y1), (2, z1)),
            e(1, (0, x1), (2, z1)),
            e(2, (0, x1), (1, y1)),
            e(1, (0, x1), (2, z2)),
            e(2, (0, x1), (1, y2)),
            e(0, (1, y2), (2, z1)),
            e(2, (0, x2), (1, y2)),
            e(0, (1, y2), (2, z2)),
            e(1, (0, x2), (2, z2)),
            e(0, (1, y1), (2, z2)),
            e(2, (0, x2), (1, y1)),
            e(1, (0, x2), (2, z1)),
        ]
    }
}

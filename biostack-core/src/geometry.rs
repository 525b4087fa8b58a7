//! Geometry primitives shared by the measurement and slicing crates.
//!
//! Coordinates follow the stack layout: `x` and `y` are image columns and
//! rows, `z` is the slice (depth) axis.

use std::ops::{Add, Mul, Neg, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point (or vector) in stack coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    /// Column coordinate.
    pub x: f64,
    /// Row coordinate.
    pub y: f64,
    /// Slice coordinate.
    pub z: f64,
}

impl Point {
    /// The origin.
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    /// Creates a new point.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a point on the `z = 0` plane.
    #[inline]
    #[must_use]
    pub const fn planar(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Returns the coordinate along `axis` (0 = x, 1 = y, 2 = z).
    ///
    /// # Panics
    ///
    /// Panics if `axis > 2`.
    #[inline]
    #[must_use]
    pub fn axis(&self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            2 => self.z,
            _ => panic!("axis index {axis} out of range"),
        }
    }

    /// Returns a copy with the coordinate along `axis` replaced.
    #[inline]
    #[must_use]
    pub fn with_axis(mut self, axis: usize, value: f64) -> Self {
        match axis {
            0 => self.x = value,
            1 => self.y = value,
            _ => self.z = value,
        }
        self
    }

    /// Returns a copy with `z` replaced.
    #[inline]
    #[must_use]
    pub fn with_z(self, z: f64) -> Self {
        Self { z, ..self }
    }

    /// Returns the coordinates as an array.
    #[inline]
    #[must_use]
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    #[inline]
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Euclidean length.
    #[inline]
    #[must_use]
    pub fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Returns the unit vector in the same direction, or `None` for a
    /// zero-length vector.
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let n = self.norm();
        (n > 0.0 && n.is_finite()).then(|| self * (1.0 / n))
    }

    /// Euclidean distance to another point.
    #[inline]
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).norm()
    }

    /// Distance in the `x`/`y` plane only.
    #[inline]
    #[must_use]
    pub fn planar_distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Midpoint between two points.
    #[inline]
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        (self + other) * 0.5
    }

    /// Returns true if every coordinate is finite.
    #[inline]
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Returns true if both points agree within `eps` on every axis.
    #[inline]
    #[must_use]
    pub fn approx_eq(self, other: Self, eps: f64) -> bool {
        (self.x - other.x).abs() <= eps
            && (self.y - other.y).abs() <= eps
            && (self.z - other.z).abs() <= eps
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Point {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Point {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl From<[f64; 3]> for Point {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::planar(x, y)
    }
}

/// Axis-aligned rectangle in the `x`/`y` plane.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    /// Builds a rectangle from two opposite corners in any order.
    #[must_use]
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        Self {
            min_x: a.0.min(b.0),
            min_y: a.1.min(b.1),
            max_x: a.0.max(b.0),
            max_y: a.1.max(b.1),
        }
    }

    /// Returns true if `(x, y)` lies inside or on the border.
    #[inline]
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Minimum distance between point `v` and the segment `a`-`b`.
///
/// `v` is projected onto the infinite line through `a` and `b`. If the
/// projection falls beyond either end (judged on the axis where the
/// segment has the greatest spread) the nearer endpoint is used instead.
/// All three slices must have the same length; extra coordinates on any
/// of them are ignored.
#[must_use]
pub fn distance_to_segment(v: &[f64], a: &[f64], b: &[f64]) -> f64 {
    let len = v.len().min(a.len()).min(b.len());
    let (v, a, b) = (&v[..len], &a[..len], &b[..len]);

    let mut ab2 = 0.0;
    let mut dot = 0.0;
    for i in 0..len {
        let d = b[i] - a[i];
        ab2 += d * d;
        dot += (v[i] - a[i]) * d;
    }
    if ab2 == 0.0 {
        return euclid(v, a);
    }
    let t = dot / ab2;

    // Axis with the greatest spread decides which side of the segment the
    // projection landed on.
    let axis = (0..len)
        .max_by(|&i, &j| (b[i] - a[i]).abs().total_cmp(&(b[j] - a[j]).abs()))
        .unwrap_or(0);
    let c = a[axis] + t * (b[axis] - a[axis]);
    let (lo, hi) = if a[axis] <= b[axis] {
        (a[axis], b[axis])
    } else {
        (b[axis], a[axis])
    };

    if c < lo || c > hi {
        return euclid(v, a).min(euclid(v, b));
    }

    let mut sum = 0.0;
    for i in 0..len {
        let p = a[i] + t * (b[i] - a[i]);
        sum += (v[i] - p) * (v[i] - p);
    }
    sum.sqrt()
}

fn euclid(p: &[f64], q: &[f64]) -> f64 {
    p.iter()
        .zip(q)
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f64>()
        .sqrt()
}

/// Distance between two points after scaling each axis by `scale`.
///
/// Used to convert pixel and slice distances into physical units.
#[must_use]
pub fn distance_scaled(p: Point, q: Point, scale: [f64; 3]) -> f64 {
    let d = p - q;
    Point::new(d.x * scale[0], d.y * scale[1], d.z * scale[2]).norm()
}

/// Projects `p` onto the infinite line through `p1` and `p2`.
///
/// Returns `p1` when the two line points coincide.
#[must_use]
pub fn project_onto_line(p1: Point, p2: Point, p: Point) -> Point {
    let d = p2 - p1;
    let len2 = d.dot(d);
    if len2 == 0.0 {
        return p1;
    }
    p1 + d * ((p - p1).dot(d) / len2)
}

/// Fourth corner of the parallelogram with corners `c1`, `c2`, `c3`,
/// opposite `c1`.
#[inline]
#[must_use]
pub fn rectangle_corner(c1: Point, c2: Point, c3: Point) -> Point {
    c3 + c2 - c1
}

/// Returns true if the segment `a`-`b` touches the rectangle in the
/// `x`/`y` plane.
#[must_use]
pub fn segment_intersects_rect(a: Point, b: Point, rect: &Rect) -> bool {
    if rect.contains(a.x, a.y) || rect.contains(b.x, b.y) {
        return true;
    }
    // Liang-Barsky clip against the four borders.
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    let edges = [
        (-dx, a.x - rect.min_x),
        (dx, rect.max_x - a.x),
        (-dy, a.y - rect.min_y),
        (dy, rect.max_y - a.y),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return false;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return false;
        }
    }
    true
}

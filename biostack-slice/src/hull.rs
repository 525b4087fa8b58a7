//! Plane / box intersection.
//!
//! The plane through three control points cuts the box in a convex polygon
//! of three to six vertices. Each vertex lies on a box edge, so the polygon
//! is found by solving the plane equation along all twelve edges and then
//! walking the hits face by face.

use biostack_core::{GeometryError, Point};
use log::{trace, warn};

use crate::bounds::{BoxBounds, Edge};

/// Hits closer than this on every axis are the same vertex.
pub const DUPLICATE_EPSILON: f64 = 1e-10;

/// Relative threshold below which the control points count as collinear.
const COLLINEAR_EPSILON: f64 = 1e-12;

/// Ordered vertices of a plane/box intersection polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct Hull {
    vertices: Vec<Point>,
    normal: Point,
}

impl Hull {
    /// Vertices in boundary order, without repeating the first.
    #[inline]
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Unit normal of the plane.
    #[inline]
    pub fn normal(&self) -> Point {
        self.normal
    }

    /// The vertices with the first repeated at the end.
    pub fn closed_loop(&self) -> Vec<Point> {
        let mut out = self.vertices.clone();
        if let Some(first) = self.vertices.first() {
            out.push(*first);
        }
        out
    }

    pub fn centroid(&self) -> Point {
        let n = self.vertices.len().max(1);
        #[allow(clippy::cast_precision_loss)]
        let inv = 1.0 / n as f64;
        self.vertices.iter().fold(Point::ORIGIN, |acc, p| acc + *p) * inv
    }

    /// Area of the polygon.
    pub fn area(&self) -> f64 {
        let n = self.vertices.len();
        let twice = (0..n).fold(Point::ORIGIN, |acc, i| {
            acc + self.vertices[i].cross(self.vertices[(i + 1) % n])
        });
        0.5 * twice.dot(self.normal).abs()
    }
}

/// Intersects the plane through `control` with `bounds`.
///
/// Fails if the control points are collinear or the plane touches the box
/// in fewer than three distinct points.
pub fn intersect_box(bounds: &BoxBounds, control: &[Point; 3]) -> Result<Hull, GeometryError> {
    let [p0, p1, p2] = *control;
    let d1 = p1 - p0;
    let d2 = p2 - p0;
    let cross = d1.cross(d2);
    if cross.norm() <= COLLINEAR_EPSILON * d1.norm() * d2.norm() {
        return Err(GeometryError::Collinear);
    }
    let normal = cross.normalized().ok_or(GeometryError::Collinear)?;

    let tol = bounds.tolerance();
    let mut hits: Vec<Point> = Vec::with_capacity(6);
    for edge in bounds.edges() {
        let Some(p) = edge_hit(bounds, &edge, p0, d1, d2, tol) else {
            continue;
        };
        if !hits.iter().any(|q| q.approx_eq(p, DUPLICATE_EPSILON)) {
            hits.push(p);
        }
    }
    trace!("plane meets box edges in {} distinct point(s)", hits.len());
    if hits.len() < 3 {
        return Err(GeometryError::TooFewIntersections { found: hits.len() });
    }

    let vertices = walk_faces(bounds, hits, normal, tol);
    Ok(Hull { vertices, normal })
}

/// Solves `p0 + s*d1 + t*d2` on one edge. Returns the hit if it lies within
/// the edge.
fn edge_hit(bounds: &BoxBounds, edge: &Edge, p0: Point, d1: Point, d2: Point, tol: f64) -> Option<Point> {
    let [(a, qa), (b, qb)] = edge.fixed;
    let f = edge.free;

    let det = d1.axis(a) * d2.axis(b) - d1.axis(b) * d2.axis(a);
    // Plane parallel to the edge: it either misses the edge or contains
    // it, in which case the perpendicular edges supply the corners.
    if det.abs() <= COLLINEAR_EPSILON * d1.norm() * d2.norm() {
        return None;
    }
    let ra = qa - p0.axis(a);
    let rb = qb - p0.axis(b);
    let s = (ra * d2.axis(b) - rb * d2.axis(a)) / det;
    let t = (d1.axis(a) * rb - d1.axis(b) * ra) / det;
    let v = p0.axis(f) + s * d1.axis(f) + t * d2.axis(f);

    let (lo, hi) = (bounds.lo(f), bounds.hi(f));
    if !v.is_finite() || v < lo - tol || v > hi + tol {
        return None;
    }
    let v = if (v - lo).abs() <= tol {
        lo
    } else if (v - hi).abs() <= tol {
        hi
    } else {
        v
    };
    Some(Point::ORIGIN.with_axis(a, qa).with_axis(b, qb).with_axis(f, v))
}

/// Orders hits into a boundary loop.
///
/// From each vertex the walk moves to an unvisited vertex on a shared box
/// face, preferring the nearest when several qualify (a plane lying in a
/// face puts all four corners on that face). If the walk gets stuck the
/// vertices are sorted by angle around their centroid instead.
fn walk_faces(bounds: &BoxBounds, mut pending: Vec<Point>, normal: Point, tol: f64) -> Vec<Point> {
    let mut ordered = vec![pending.remove(0)];
    while !pending.is_empty() {
        let current = ordered[ordered.len() - 1];
        let next = pending
            .iter()
            .enumerate()
            .filter(|(_, p)| bounds.share_face(current, **p, tol))
            .min_by(|(_, a), (_, b)| current.distance(**a).total_cmp(&current.distance(**b)))
            .map(|(i, _)| i);
        match next {
            Some(i) => ordered.push(pending.remove(i)),
            None => {
                warn!("face walk stuck after {} vertices, ordering by angle", ordered.len());
                ordered.append(&mut pending);
                return sort_by_angle(ordered, normal);
            }
        }
    }
    ordered
}

fn sort_by_angle(mut points: Vec<Point>, normal: Point) -> Vec<Point> {
    #[allow(clippy::cast_precision_loss)]
    let center = points.iter().fold(Point::ORIGIN, |acc, p| acc + *p) * (1.0 / points.len() as f64);
    let Some(u) = (points[0] - center).normalized() else {
        return points;
    };
    let w = normal.cross(u);
    points.sort_by(|a, b| {
        let angle = |p: &Point| {
            let d = *p - center;
            d.dot(w).atan2(d.dot(u))
        };
        angle(a).total_cmp(&angle(b))
    });
    points
}

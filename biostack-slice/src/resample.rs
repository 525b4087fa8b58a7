//! Resampling a volume onto a plane.

#![allow(clippy::cast_precision_loss)]

use biostack_core::volume::sample_view;
use biostack_core::{project_onto_line, rectangle_corner, GeometryError, Interpolation, Point};
use ndarray::{Array2, ArrayView3};
use rayon::prelude::*;

use crate::hull::Hull;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rectangle in the slice plane enclosing the hull.
///
/// `u` runs along the hull's longest edge and `v` perpendicular to it, so
/// the rectangle is as tight as that edge allows.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SamplingQuad {
    pub origin: Point,
    pub u: Point,
    pub v: Point,
}

impl SamplingQuad {
    /// Bounding rectangle of `hull`, or `None` for a degenerate hull.
    pub fn from_hull(hull: &Hull) -> Option<Self> {
        let pts = hull.vertices();
        let n = pts.len();
        if n < 3 {
            return None;
        }
        let i = (0..n).max_by(|&a, &b| {
            let la = pts[a].distance(pts[(a + 1) % n]);
            let lb = pts[b].distance(pts[(b + 1) % n]);
            la.total_cmp(&lb)
        })?;
        let (a, b) = (pts[i], pts[(i + 1) % n]);
        let dir = (b - a).normalized()?;
        let along = |p: &&Point| (**p - a).dot(dir);
        let first = pts.iter().min_by(|p, q| along(p).total_cmp(&along(q)))?;
        let last = pts.iter().max_by(|p, q| along(p).total_cmp(&along(q)))?;
        // The hull is convex, so every vertex lies on one side of its edge.
        let offset = pts
            .iter()
            .map(|p| *p - project_onto_line(a, b, *p))
            .max_by(|p, q| p.norm().total_cmp(&q.norm()))?;

        let origin = project_onto_line(a, b, *first);
        let end = project_onto_line(a, b, *last);
        (offset.norm() > 0.0).then_some(Self {
            origin,
            u: end - origin,
            v: offset,
        })
    }

    /// Point at fractional position `(fu, fv)` in `[0, 1]^2`.
    #[inline]
    pub fn at(&self, fu: f64, fv: f64) -> Point {
        self.origin + self.u * fu + self.v * fv
    }

    /// Corners in loop order.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.origin,
            self.origin + self.u,
            rectangle_corner(self.origin, self.origin + self.u, self.origin + self.v),
            self.origin + self.v,
        ]
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.u.norm()
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.v.norm()
    }
}

/// Summary of the finite samples in a slice.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SliceStats {
    /// Samples that fell inside the volume.
    pub inside: usize,
    pub min: f32,
    pub max: f32,
    pub mean: f64,
}

/// A resampled slice: `data[[row, column]]` over the quad.
#[derive(Debug, Clone)]
pub struct SliceImage {
    /// Samples, NaN where the quad leaves the volume.
    pub data: Array2<f32>,
    pub quad: SamplingQuad,
}

impl SliceImage {
    #[inline]
    pub fn resolution(&self) -> (usize, usize) {
        let (rows, cols) = self.data.dim();
        (cols, rows)
    }

    /// Extent of the 2-D domain in stack units, `(width, height)`.
    pub fn extent(&self) -> (f64, f64) {
        (self.quad.width(), self.quad.height())
    }

    /// Stack position of pixel `(column, row)`.
    pub fn position(&self, column: usize, row: usize) -> Point {
        let (cols, rows) = self.resolution();
        let fu = column as f64 / (cols.max(2) - 1) as f64;
        let fv = row as f64 / (rows.max(2) - 1) as f64;
        self.quad.at(fu, fv)
    }

    pub fn stats(&self) -> Option<SliceStats> {
        let mut inside = 0;
        let (mut min, mut max, mut sum) = (f32::INFINITY, f32::NEG_INFINITY, 0.0_f64);
        for v in self.data.iter().copied().filter(|v| v.is_finite()) {
            inside += 1;
            min = min.min(v);
            max = max.max(v);
            sum += f64::from(v);
        }
        (inside > 0).then(|| SliceStats {
            inside,
            min,
            max,
            mean: sum / inside as f64,
        })
    }
}

/// Samples `view` (`[slice, y, x]`) on a `res_x` x `res_y` grid over `quad`.
///
/// Rows are sampled in parallel.
pub fn resample(
    view: &ArrayView3<'_, f32>,
    quad: &SamplingQuad,
    res_x: usize,
    res_y: usize,
    mode: Interpolation,
) -> Result<SliceImage, GeometryError> {
    if res_x < 2 || res_y < 2 {
        return Err(GeometryError::Resolution { x: res_x, y: res_y });
    }
    let step_u = 1.0 / (res_x - 1) as f64;
    let step_v = 1.0 / (res_y - 1) as f64;

    let samples: Vec<f32> = (0..res_y)
        .into_par_iter()
        .flat_map_iter(|row| {
            let fv = row as f64 * step_v;
            (0..res_x).map(move |col| sample_view(view, quad.at(col as f64 * step_u, fv), mode))
        })
        .collect();

    let data = Array2::from_shape_vec((res_y, res_x), samples)
        .map_err(|_| GeometryError::Resolution { x: res_x, y: res_y })?;
    Ok(SliceImage { data, quad: *quad })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::BoxBounds;
    use crate::hull::intersect_box;
    use approx::assert_relative_eq;
    use biostack_core::{StackDomain, Volume};

    #[test]
    fn test_quad_of_face_plane_is_the_face() {
        let bounds = BoxBounds::new(Point::ORIGIN, Point::new(4.0, 6.0, 2.0));
        let hull = intersect_box(
            &bounds,
            &[
                Point::new(0.0, 0.0, 1.0),
                Point::new(4.0, 0.0, 1.0),
                Point::new(0.0, 6.0, 1.0),
            ],
        )
        .unwrap();
        let quad = SamplingQuad::from_hull(&hull).unwrap();
        assert_relative_eq!(quad.width() * quad.height(), 24.0, epsilon = 1e-9);
        assert_relative_eq!(quad.width().max(quad.height()), 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_quad_encloses_corner_triangle() {
        let bounds = BoxBounds::new(Point::ORIGIN, Point::new(10.0, 10.0, 10.0));
        let hull = intersect_box(
            &bounds,
            &[
                Point::new(10.0, 0.0, 0.0),
                Point::new(0.0, 10.0, 0.0),
                Point::new(0.0, 0.0, 10.0),
            ],
        )
        .unwrap();
        assert_eq!(hull.len(), 3);
        let quad = SamplingQuad::from_hull(&hull).unwrap();
        assert_relative_eq!(quad.width(), 10.0 * 2.0_f64.sqrt(), epsilon = 1e-9);
        assert_relative_eq!(quad.height(), 5.0 * 6.0_f64.sqrt(), epsilon = 1e-9);
        assert_relative_eq!(quad.u.dot(quad.v), 0.0, epsilon = 1e-9);

        let corners = quad.corners();
        assert!(corners[2].approx_eq(quad.at(1.0, 1.0), 1e-9));
        for p in hull.vertices() {
            let d = *p - quad.origin;
            let fu = d.dot(quad.u) / quad.u.dot(quad.u);
            let fv = d.dot(quad.v) / quad.v.dot(quad.v);
            assert!((-1e-9..=1.0 + 1e-9).contains(&fu), "{p:?} outside along u");
            assert!((-1e-9..=1.0 + 1e-9).contains(&fv), "{p:?} outside along v");
        }
        // Two hull vertices sit on the base edge, the third on the far side.
        assert!(hull.vertices().iter().any(|p| p.approx_eq(corners[0], 1e-9)));
        assert!(hull.vertices().iter().any(|p| p.approx_eq(corners[1], 1e-9)));
    }

    #[test]
    fn test_resample_axis_aligned_matches_source() {
        let domain = StackDomain::new(1, 3, 5, 5).unwrap();
        let volume = Volume::from_fn(domain, |_, z, y, x| (z * 100 + y * 10 + x) as f32);
        let quad = SamplingQuad {
            origin: Point::new(0.0, 0.0, 2.0),
            u: Point::new(4.0, 0.0, 0.0),
            v: Point::new(0.0, 4.0, 0.0),
        };
        let view = volume.timestep(0).unwrap();
        let img = resample(&view, &quad, 5, 5, Interpolation::Nearest).unwrap();
        assert_eq!(img.resolution(), (5, 5));
        assert_relative_eq!(img.data[[3, 1]], 231.0);
        assert_eq!(img.position(1, 3), Point::new(1.0, 3.0, 2.0));

        let stats = img.stats().unwrap();
        assert_eq!(stats.inside, 25);
        assert_relative_eq!(stats.min, 200.0);
        assert_relative_eq!(stats.max, 244.0);
    }

    #[test]
    fn test_resample_outside_is_nan() {
        let domain = StackDomain::new(1, 2, 4, 4).unwrap();
        let volume = Volume::from_fn(domain, |_, _, _, _| 1.0);
        let quad = SamplingQuad {
            origin: Point::new(-3.0, 0.0, 0.0),
            u: Point::new(6.0, 0.0, 0.0),
            v: Point::new(0.0, 3.0, 0.0),
        };
        let view = volume.timestep(0).unwrap();
        let img = resample(&view, &quad, 3, 2, Interpolation::Trilinear).unwrap();
        assert!(img.data[[0, 0]].is_nan());
        assert_relative_eq!(img.data[[0, 1]], 1.0);
        assert_eq!(img.stats().unwrap().inside, 4);
    }

    #[test]
    fn test_resolution_checked() {
        let domain = StackDomain::new(1, 1, 2, 2).unwrap();
        let volume = Volume::from_fn(domain, |_, _, _, _| 0.0);
        let quad = SamplingQuad {
            origin: Point::ORIGIN,
            u: Point::new(1.0, 0.0, 0.0),
            v: Point::new(0.0, 1.0, 0.0),
        };
        let view = volume.timestep(0).unwrap();
        assert_eq!(
            resample(&view, &quad, 1, 8, Interpolation::Nearest).unwrap_err(),
            GeometryError::Resolution { x: 1, y: 8 }
        );
    }
}

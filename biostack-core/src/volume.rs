//! Image-stack domain and volumetric sampling.
//!
//! A stack is a 4-D array laid out as `[time, slice, y, x]`. Sampling takes
//! a point in `(x, y, slice)` coordinates and interpolates within one
//! timestep.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use crate::error::ShapeError;
use crate::geometry::Point;
use log::debug;
use ndarray::{Array4, ArrayD, ArrayView3, Ix4};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Points up to this far outside the stack are clamped onto its border
/// rather than rejected.
const EDGE_TOLERANCE: f64 = 1e-9;

/// Shape of an image stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StackDomain {
    /// Number of timesteps.
    pub timesteps: usize,
    /// Number of slices per timestep.
    pub slices: usize,
    /// Image height in pixels.
    pub height: usize,
    /// Image width in pixels.
    pub width: usize,
}

impl StackDomain {
    /// Creates a domain, rejecting empty axes.
    pub fn new(
        timesteps: usize,
        slices: usize,
        height: usize,
        width: usize,
    ) -> Result<Self, ShapeError> {
        Self::from_shape(&[timesteps, slices, height, width])
    }

    /// Validates a `[time, slice, y, x]` shape.
    pub fn from_shape(shape: &[usize]) -> Result<Self, ShapeError> {
        const AXES: [&str; 4] = ["time", "slice", "y", "x"];

        if shape.len() != AXES.len() {
            debug!("rejecting rank-{} stack shape {shape:?}", shape.len());
            return Err(ShapeError::WrongRank {
                expected: AXES.len(),
                found: shape.len(),
            });
        }
        if let Some(axis) = shape.iter().position(|&n| n == 0) {
            debug!("rejecting stack shape {shape:?}: axis `{}` is empty", AXES[axis]);
            return Err(ShapeError::EmptyAxis { axis: AXES[axis] });
        }
        Ok(Self {
            timesteps: shape[0],
            slices: shape[1],
            height: shape[2],
            width: shape[3],
        })
    }

    /// Returns the shape as `[time, slice, y, x]`.
    #[must_use]
    pub fn shape(&self) -> [usize; 4] {
        [self.timesteps, self.slices, self.height, self.width]
    }

    /// Number of samples in one timestep.
    #[must_use]
    pub fn samples_per_timestep(&self) -> usize {
        self.slices * self.height * self.width
    }

    /// Lowest and highest sample coordinates in `(x, y, slice)` order.
    #[must_use]
    pub fn extent(&self) -> (Point, Point) {
        (
            Point::ORIGIN,
            Point::new(
                (self.width - 1) as f64,
                (self.height - 1) as f64,
                (self.slices - 1) as f64,
            ),
        )
    }
}

/// Interpolation used when sampling between voxels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Interpolation {
    /// Value of the closest voxel.
    Nearest,
    /// Weighted average of the eight surrounding voxels.
    #[default]
    Trilinear,
}

/// A gridded scalar field over an image stack.
#[derive(Debug, Clone)]
pub struct Volume {
    data: Array4<f32>,
    domain: StackDomain,
}

impl Volume {
    /// Wraps a dynamically shaped array, validating that it is a stack.
    pub fn new(data: ArrayD<f32>) -> Result<Self, ShapeError> {
        let domain = StackDomain::from_shape(data.shape())?;
        let data = data
            .into_dimensionality::<Ix4>()
            .map_err(|_| ShapeError::WrongRank {
                expected: 4,
                found: domain.shape().len(),
            })?;
        Ok(Self { data, domain })
    }

    /// Builds a volume from a flat buffer in `[time, slice, y, x]` order.
    pub fn from_vec(domain: StackDomain, samples: Vec<f32>) -> Result<Self, ShapeError> {
        let expected = domain.timesteps * domain.samples_per_timestep();
        let found = samples.len();
        if found != expected {
            debug!("rejecting {found} samples for {:?} stack", domain.shape());
            return Err(ShapeError::SampleCount { expected, found });
        }
        let data = Array4::from_shape_vec(domain.shape(), samples)
            .map_err(|_| ShapeError::SampleCount { expected, found })?;
        Ok(Self { data, domain })
    }

    /// Builds a volume by evaluating `f(t, z, y, x)` at every voxel.
    pub fn from_fn<F>(domain: StackDomain, f: F) -> Self
    where
        F: Fn(usize, usize, usize, usize) -> f32,
    {
        let data = Array4::from_shape_fn(domain.shape(), |(t, z, y, x)| f(t, z, y, x));
        Self { data, domain }
    }

    #[inline]
    pub fn domain(&self) -> StackDomain {
        self.domain
    }

    /// Returns one timestep as a `[slice, y, x]` view.
    pub fn timestep(&self, t: usize) -> Result<ArrayView3<'_, f32>, ShapeError> {
        if t >= self.domain.timesteps {
            debug!("timestep {t} outside {}-step stack", self.domain.timesteps);
            return Err(ShapeError::TimestepOutOfRange {
                index: t,
                count: self.domain.timesteps,
            });
        }
        Ok(self.data.index_axis(ndarray::Axis(0), t))
    }

    /// Samples timestep `t` at `point`. Returns NaN outside the stack.
    pub fn sample(&self, t: usize, point: Point, mode: Interpolation) -> f32 {
        match self.timestep(t) {
            Ok(view) => sample_view(&view, point, mode),
            Err(_) => f32::NAN,
        }
    }
}

/// Samples a `[slice, y, x]` view at `point` (`x`, `y`, slice).
///
/// Returns NaN when the point lies outside the view.
pub fn sample_view(view: &ArrayView3<'_, f32>, point: Point, mode: Interpolation) -> f32 {
    let (slices, height, width) = view.dim();
    let (Some(ax), Some(ay), Some(az)) = (
        axis_weights(point.x, width),
        axis_weights(point.y, height),
        axis_weights(point.z, slices),
    ) else {
        return f32::NAN;
    };

    match mode {
        Interpolation::Nearest => {
            let pick = |(lo, hi, f): (usize, usize, f64)| if f < 0.5 { lo } else { hi };
            view[[pick(az), pick(ay), pick(ax)]]
        }
        Interpolation::Trilinear => {
            let mut acc = 0.0_f64;
            for (z, wz) in [(az.0, 1.0 - az.2), (az.1, az.2)] {
                for (y, wy) in [(ay.0, 1.0 - ay.2), (ay.1, ay.2)] {
                    for (x, wx) in [(ax.0, 1.0 - ax.2), (ax.1, ax.2)] {
                        let w = wz * wy * wx;
                        if w != 0.0 {
                            acc += w * f64::from(view[[z, y, x]]);
                        }
                    }
                }
            }
            acc as f32
        }
    }
}

/// Lower index, upper index and fractional weight of `coord` along an axis
/// of `len` samples.
fn axis_weights(coord: f64, len: usize) -> Option<(usize, usize, f64)> {
    if len == 0 || !coord.is_finite() {
        return None;
    }
    let max = (len - 1) as f64;
    if coord < -EDGE_TOLERANCE || coord > max + EDGE_TOLERANCE {
        return None;
    }
    let c = coord.clamp(0.0, max);
    let lo = c.floor() as usize;
    let hi = (lo + 1).min(len - 1);
    Some((lo, hi, c - lo as f64))
}

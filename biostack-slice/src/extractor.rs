//! Plane selection plus resampling, configured as one unit.

use biostack_core::{GeometryError, Interpolation, Point, Volume};
use log::{debug, info};
use ndarray::ArrayView3;

use crate::bounds::BoxBounds;
use crate::error::{Result, SliceError};
use crate::resample::{resample, SamplingQuad, SliceImage};
use crate::selector::{PlaneSelector, Settled};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for slice extraction.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SliceConfig {
    /// Output columns.
    pub resolution_x: usize,
    /// Output rows.
    pub resolution_y: usize,
    pub interpolation: Interpolation,
    /// Relative distance to a face below which a control point is on it.
    pub snap_tolerance: f64,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            resolution_x: 64,
            resolution_y: 64,
            interpolation: Interpolation::Trilinear,
            snap_tolerance: 1e-6,
        }
    }
}

impl SliceConfig {
    /// Set the output resolution.
    #[must_use]
    pub fn with_resolution(mut self, x: usize, y: usize) -> Self {
        self.resolution_x = x;
        self.resolution_y = y;
        self
    }

    /// Set the interpolation mode.
    #[must_use]
    pub fn with_interpolation(mut self, mode: Interpolation) -> Self {
        self.interpolation = mode;
        self
    }

    /// Set the edge-snap tolerance.
    #[must_use]
    pub fn with_snap_tolerance(mut self, tol: f64) -> Self {
        self.snap_tolerance = tol;
        self
    }
}

/// Extracts planar slices from volumes sharing one bounding box.
#[derive(Debug, Clone)]
pub struct SliceExtractor {
    selector: PlaneSelector,
    config: SliceConfig,
}

impl SliceExtractor {
    pub fn new(bounds: BoxBounds, config: SliceConfig) -> Self {
        let selector = PlaneSelector::new(bounds, config.snap_tolerance);
        Self { selector, config }
    }

    /// Creates an extractor spanning `volume`'s sample grid.
    pub fn for_volume(volume: &Volume, config: SliceConfig) -> Self {
        Self::new(BoxBounds::from_domain(&volume.domain()), config)
    }

    #[inline]
    pub fn selector(&self) -> &PlaneSelector {
        &self.selector
    }

    #[inline]
    pub fn selector_mut(&mut self) -> &mut PlaneSelector {
        &mut self.selector
    }

    #[inline]
    pub fn config(&self) -> &SliceConfig {
        &self.config
    }

    pub fn set_resolution(&mut self, x: usize, y: usize) {
        self.config.resolution_x = x;
        self.config.resolution_y = y;
    }

    pub fn set_interpolation(&mut self, mode: Interpolation) {
        self.config.interpolation = mode;
    }

    pub fn drag_control_point(&mut self, index: usize, to: Point) -> Result<Settled> {
        Ok(self.selector.drag_control_point(index, to)?)
    }

    pub fn set_control_points(&mut self, points: [Point; 3]) -> Result<()> {
        Ok(self.selector.set_control_points(points)?)
    }

    /// The sampling rectangle for the current plane.
    ///
    /// Fails if the last recompute did not produce an outline for the
    /// current control points.
    pub fn quad(&self) -> Result<SamplingQuad> {
        if let Some(e) = self.selector.last_error() {
            return Err(SliceError::Geometry(e.clone()));
        }
        let hull = self
            .selector
            .hull()
            .ok_or(GeometryError::TooFewIntersections { found: 0 })?;
        SamplingQuad::from_hull(hull)
            .ok_or(SliceError::Geometry(GeometryError::TooFewIntersections { found: hull.len() }))
    }

    /// Resamples one timestep of `volume` on the current plane.
    pub fn extract(&self, volume: &Volume, timestep: usize) -> Result<SliceImage> {
        let view = volume.timestep(timestep)?;
        self.extract_view(&view)
    }

    /// Resamples a single `[slice, y, x]` stack on the current plane.
    pub fn extract_view(&self, view: &ArrayView3<'_, f32>) -> Result<SliceImage> {
        let quad = self.quad()?;
        let (rx, ry) = (self.config.resolution_x, self.config.resolution_y);
        debug!(
            "resampling {rx}x{ry} slice over {:.2}x{:.2}",
            quad.width(),
            quad.height()
        );
        let image = resample(view, &quad, rx, ry, self.config.interpolation)?;
        if let Some(stats) = image.stats() {
            info!(
                "slice: {} of {} samples inside, range [{}, {}]",
                stats.inside,
                rx * ry,
                stats.min,
                stats.max
            );
        }
        Ok(image)
    }
}

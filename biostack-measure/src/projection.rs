//! Screen to domain projection.

/// Maps display pixels into stack coordinates.
///
/// Implemented by whatever renders a pool's endpoints.
pub trait ScreenProjection {
    /// Converts a pixel position to `(x, y)` domain coordinates.
    fn screen_to_domain(&self, sx: f64, sy: f64) -> (f64, f64);

    /// Domain length spanned by `pixels` horizontal pixels.
    fn pixel_span(&self, pixels: f64) -> f64 {
        let (x0, y0) = self.screen_to_domain(0.0, 0.0);
        let (x1, y1) = self.screen_to_domain(pixels, 0.0);
        (x1 - x0).hypot(y1 - y0)
    }
}

/// Per-axis scale and offset: `screen = domain * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineProjection {
    pub scale_x: f64,
    pub scale_y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl AffineProjection {
    pub fn new(scale_x: f64, scale_y: f64, offset_x: f64, offset_y: f64) -> Self {
        Self {
            scale_x,
            scale_y,
            offset_x,
            offset_y,
        }
    }

    /// Identity mapping, one pixel per domain unit.
    pub fn identity() -> Self {
        Self::new(1.0, 1.0, 0.0, 0.0)
    }

    pub fn domain_to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x * self.scale_x + self.offset_x,
            y * self.scale_y + self.offset_y,
        )
    }
}

impl Default for AffineProjection {
    fn default() -> Self {
        Self::identity()
    }
}

impl ScreenProjection for AffineProjection {
    fn screen_to_domain(&self, sx: f64, sy: f64) -> (f64, f64) {
        (
            (sx - self.offset_x) / self.scale_x,
            (sy - self.offset_y) / self.scale_y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_round_trip_and_span() {
        // Flipped y axis, 10 pixels per unit.
        let p = AffineProjection::new(10.0, -10.0, 5.0, 400.0);
        let (sx, sy) = p.domain_to_screen(3.0, 7.0);
        let (x, y) = p.screen_to_domain(sx, sy);
        assert_relative_eq!(x, 3.0);
        assert_relative_eq!(y, 7.0);
        assert_relative_eq!(p.pixel_span(10.0), 1.0);
    }
}

//! Renderable surface for a plane outline.

use biostack_core::Point;

use crate::hull::Hull;

/// A two-column grid of samples covering the slice polygon.
///
/// Samples are stored row by row. Triangles, pentagons and hexagons are
/// approximated by padding the grid with edge midpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneMesh {
    pub columns: usize,
    pub rows: usize,
    pub samples: Vec<Point>,
}

impl PlaneMesh {
    /// Splits each grid cell into two triangles.
    pub fn triangles(&self) -> Vec<[Point; 3]> {
        let at = |row: usize, col: usize| self.samples[row * self.columns + col];
        let mut out = Vec::with_capacity(2 * (self.rows - 1) * (self.columns - 1));
        for row in 0..self.rows.saturating_sub(1) {
            for col in 0..self.columns.saturating_sub(1) {
                let (a, b) = (at(row, col), at(row, col + 1));
                let (c, d) = (at(row + 1, col), at(row + 1, col + 1));
                out.push([a, b, d]);
                out.push([a, d, c]);
            }
        }
        out
    }
}

/// Builds the mesh for a hull of three to six vertices.
pub fn outline_mesh(hull: &Hull) -> Option<PlaneMesh> {
    let v = hull.vertices();
    let (rows, samples) = match v.len() {
        3 => (2, vec![v[0], v[0].midpoint(v[1]), v[2], v[1]]),
        4 => (2, vec![v[0], v[1], v[3], v[2]]),
        5 => (3, vec![v[0], v[1], v[4], v[1].midpoint(v[2]), v[3], v[2]]),
        6 => (3, vec![v[0], v[1], v[5], v[2], v[4], v[3]]),
        _ => return None,
    };
    Some(PlaneMesh {
        columns: 2,
        rows,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::BoxBounds;
    use crate::hull::intersect_box;

    fn hull(control: [Point; 3]) -> Hull {
        let bounds = BoxBounds::new(Point::ORIGIN, Point::new(10.0, 10.0, 10.0));
        intersect_box(&bounds, &control).unwrap()
    }

    #[test]
    fn test_quad_mesh() {
        let h = hull([
            Point::new(0.0, 0.0, 5.0),
            Point::new(10.0, 0.0, 5.0),
            Point::new(0.0, 10.0, 5.0),
        ]);
        let mesh = outline_mesh(&h).unwrap();
        assert_eq!((mesh.columns, mesh.rows), (2, 2));
        assert_eq!(mesh.samples[0], h.vertices()[0]);
        assert_eq!(mesh.samples[2], h.vertices()[3]);
        assert_eq!(mesh.triangles().len(), 2);
    }

    #[test]
    fn test_triangle_mesh_pads_midpoint() {
        let h = hull([
            Point::new(3.0, 0.0, 0.0),
            Point::new(0.0, 3.0, 0.0),
            Point::new(0.0, 0.0, 3.0),
        ]);
        let mesh = outline_mesh(&h).unwrap();
        let v = h.vertices();
        assert_eq!(mesh.samples[1], v[0].midpoint(v[1]));
    }

    #[test]
    fn test_hexagon_mesh_has_three_rows() {
        let h = hull([
            Point::new(5.0, 5.0, 5.0),
            Point::new(10.0, 5.0, 0.0),
            Point::new(0.0, 10.0, 5.0),
        ]);
        let mesh = outline_mesh(&h).unwrap();
        assert_eq!(mesh.rows, 3);
        assert_eq!(mesh.samples.len(), 6);
        assert_eq!(mesh.triangles().len(), 4);
    }
}

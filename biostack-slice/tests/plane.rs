//! Plane outlines and slice extraction through whole stacks.

use approx::assert_relative_eq;
use biostack_core::{GeometryError, Interpolation, Point, StackDomain, Volume};
use biostack_slice::{
    intersect_box, BoxBounds, PlaneSelector, SliceConfig, SliceError, SliceExtractor,
};

struct Lcg(u64);

impl Lcg {
    fn next_unit(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
        #[allow(clippy::cast_precision_loss)]
        let v = (self.0 >> 11) as f64 / (1_u64 << 53) as f64;
        v
    }

    fn inside(&mut self, b: &BoxBounds) -> Point {
        let mut axis = |k: usize| b.lo(k) + self.next_unit() * b.extent(k);
        Point::new(axis(0), axis(1), axis(2))
    }
}

#[test]
fn test_random_planes_give_closed_outlines() {
    let bounds = BoxBounds::new(Point::ORIGIN, Point::new(31.0, 17.0, 9.0));
    let tol = bounds.tolerance() * 10.0;
    let mut rng = Lcg(0x9e37_79b9);
    let mut checked = 0;

    for _ in 0..300 {
        let control = [rng.inside(&bounds), rng.inside(&bounds), rng.inside(&bounds)];
        let hull = match intersect_box(&bounds, &control) {
            Ok(h) => h,
            Err(GeometryError::Collinear) => continue,
            Err(e) => panic!("interior plane failed: {e}"),
        };
        checked += 1;

        assert!((3..=6).contains(&hull.len()), "{} vertices", hull.len());
        let n = hull.normal();
        for v in hull.vertices() {
            assert!(bounds.faces_touched(*v, tol) >= 2, "{v:?} is not on an edge");
            assert!((*v - control[0]).dot(n).abs() < 1e-6, "{v:?} is off the plane");
        }
        for (i, a) in hull.vertices().iter().enumerate() {
            for b in &hull.vertices()[i + 1..] {
                assert!(!a.approx_eq(*b, 1e-10), "duplicate vertex {a:?}");
            }
        }
        let closed = hull.closed_loop();
        assert_eq!(closed.first(), closed.last());
        for pair in closed.windows(2) {
            assert!(bounds.share_face(pair[0], pair[1], tol));
        }
        assert!(hull.area() > 0.0);
    }
    assert!(checked > 250);
}

#[test]
fn test_face_plane_gives_the_face() {
    let bounds = BoxBounds::new(Point::ORIGIN, Point::new(6.0, 4.0, 3.0));
    let hull = intersect_box(
        &bounds,
        &[
            Point::new(6.0, 0.0, 0.0),
            Point::new(6.0, 4.0, 1.0),
            Point::new(6.0, 2.0, 3.0),
        ],
    )
    .unwrap();
    assert_eq!(hull.len(), 4);
    for corner in [
        Point::new(6.0, 0.0, 0.0),
        Point::new(6.0, 4.0, 0.0),
        Point::new(6.0, 4.0, 3.0),
        Point::new(6.0, 0.0, 3.0),
    ] {
        assert!(hull.vertices().contains(&corner), "missing {corner:?}");
    }
    assert_relative_eq!(hull.area(), 12.0, epsilon = 1e-9);
    // Diagonal corners never follow each other.
    let closed = hull.closed_loop();
    for pair in closed.windows(2) {
        assert_relative_eq!(pair[0].x, 6.0);
        assert!(pair[0].y == pair[1].y || pair[0].z == pair[1].z);
    }
}

#[test]
fn test_drag_settles_every_point_on_an_edge() {
    let bounds = BoxBounds::new(Point::ORIGIN, Point::new(20.0, 20.0, 10.0));
    let mut selector = PlaneSelector::new(bounds, 1e-6);
    let tol = bounds.tolerance();

    let settled = selector
        .drag_control_point(1, Point::new(12.0, 3.0, 9.0))
        .unwrap();
    assert_eq!(settled.snapped, vec![1]);
    assert_eq!(selector.control_points()[1], Point::new(12.0, 0.0, 10.0));
    for p in selector.control_points() {
        assert!(bounds.faces_touched(*p, tol) >= 2);
    }
    assert!(selector.is_current());
    assert!(selector.mesh().is_some());
}

#[test]
fn test_degenerate_drag_keeps_previous_outline() {
    let bounds = BoxBounds::new(Point::ORIGIN, Point::new(10.0, 10.0, 10.0));
    let mut selector = PlaneSelector::new(bounds, 1e-6);
    let before = selector.outline().unwrap();

    // Drops point 0 onto point 1.
    let err = selector
        .drag_control_point(0, Point::new(10.0, 0.0, 5.0))
        .unwrap_err();
    assert_eq!(err, GeometryError::Collinear);
    assert_eq!(selector.last_error(), Some(&GeometryError::Collinear));
    assert_eq!(selector.outline().unwrap(), before);

    selector
        .drag_control_point(0, Point::new(0.0, 10.0, 0.0))
        .unwrap();
    assert!(selector.is_current());
}

#[test]
fn test_tilted_slice_samples_the_plane() {
    let domain = StackDomain::new(1, 5, 9, 9).unwrap();
    #[allow(clippy::cast_precision_loss)]
    let volume = Volume::from_fn(domain, |_, z, _, x| (x * 3 + z) as f32);
    let config = SliceConfig::default()
        .with_resolution(17, 11)
        .with_interpolation(Interpolation::Trilinear);
    let mut extractor = SliceExtractor::for_volume(&volume, config);

    // z = x / 2 across the full y range.
    extractor
        .set_control_points([
            Point::new(0.0, 0.0, 0.0),
            Point::new(8.0, 0.0, 4.0),
            Point::new(0.0, 8.0, 0.0),
        ])
        .unwrap();
    assert_eq!(extractor.selector().hull().unwrap().len(), 4);

    let image = extractor.extract(&volume, 0).unwrap();
    assert_eq!(image.resolution(), (17, 11));
    let (w, h) = image.extent();
    assert_relative_eq!(w * h, 8.0 * 80.0_f64.sqrt(), epsilon = 1e-9);

    let stats = image.stats().unwrap();
    assert!(stats.inside > 17 * 11 / 2);
    for row in 0..11 {
        for col in 0..17 {
            let value = image.data[[row, col]];
            if value.is_finite() {
                let p = image.position(col, row);
                assert_relative_eq!(f64::from(value), p.x * 3.0 + p.z, epsilon = 1e-3);
            }
        }
    }
}

#[test]
fn test_extraction_reports_bad_timestep() {
    let domain = StackDomain::new(1, 2, 3, 3).unwrap();
    let volume = Volume::from_fn(domain, |_, _, _, _| 0.0);
    let extractor = SliceExtractor::for_volume(&volume, SliceConfig::default());
    assert!(matches!(extractor.extract(&volume, 4), Err(SliceError::Shape(_))));
}

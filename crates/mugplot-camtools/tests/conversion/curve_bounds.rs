use lyon::geom::{vector, Angle, ArcFlags, QuadraticBezierSegment, SvgArc};
use mugplot_camtools::{linearize_segment, CoordinateMapper, Point, Segment};
use proptest::prelude::*;

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.square_length();
    if len2 == 0.0 {
        return p.distance_to(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance_to(a + ab * t)
}

fn max_deviation(segment: &Segment, tolerance: f64) -> f64 {
    let mut polyline = vec![segment.start()];
    polyline.extend(linearize_segment(segment, tolerance));

    (0..=200)
        .map(|i| segment.point(i as f64 / 200.0))
        .map(|p| {
            polyline
                .windows(2)
                .map(|w| distance_to_segment(p, w[0], w[1]))
                .fold(f64::INFINITY, f64::min)
        })
        .fold(0.0, f64::max)
}

fn coord() -> impl Strategy<Value = f64> {
    -100.0..100.0f64
}

proptest! {
    #[test]
    fn quadratic_stays_within_tolerance(
        x0 in coord(), y0 in coord(),
        x1 in coord(), y1 in coord(),
        x2 in coord(), y2 in coord(),
        tolerance in 0.01..2.0f64,
    ) {
        let segment = Segment::Quadratic(QuadraticBezierSegment {
            from: Point::new(x0, y0),
            ctrl: Point::new(x1, y1),
            to: Point::new(x2, y2),
        });
        prop_assert!(max_deviation(&segment, tolerance) <= tolerance + 1e-9);
    }

    #[test]
    fn circular_arc_stays_within_tolerance(
        radius in 1.0..80.0f64,
        chord_fraction in 0.05..1.0f64,
        large_arc in any::<bool>(),
        sweep in any::<bool>(),
        tolerance in 0.01..1.0f64,
    ) {
        let chord = 2.0 * radius * chord_fraction;
        let segment = Segment::arc(SvgArc {
            from: Point::new(0.0, 0.0),
            to: Point::new(chord, 0.0),
            radii: vector(radius, radius),
            x_rotation: Angle::zero(),
            flags: ArcFlags { large_arc, sweep },
        });
        prop_assert!(max_deviation(&segment, tolerance) <= tolerance + 1e-6);
    }

    #[test]
    fn linearization_ends_at_segment_end(
        x0 in coord(), y0 in coord(),
        x1 in coord(), y1 in coord(),
        x2 in coord(), y2 in coord(),
        tolerance in 0.001..5.0f64,
    ) {
        let segment = Segment::Quadratic(QuadraticBezierSegment {
            from: Point::new(x0, y0),
            ctrl: Point::new(x1, y1),
            to: Point::new(x2, y2),
        });
        let points = linearize_segment(&segment, tolerance);
        prop_assert_eq!(points.last().copied(), Some(Point::new(x2, y2)));
    }

    #[test]
    fn mapping_round_trips(
        x in coord(), y in coord(),
        ox in coord(), oy in coord(),
        flip in any::<bool>(),
        height in 1.0..500.0f64,
    ) {
        let mapper = CoordinateMapper::new(ox, oy, flip, height);
        let back = mapper.unmap(mapper.map(Point::new(x, y)));
        prop_assert!((back.x - x).abs() < 1e-9);
        prop_assert!((back.y - y).abs() < 1e-9);
    }
}

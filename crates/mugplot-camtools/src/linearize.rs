//! Curve linearization
//!
//! Curved segments are flattened by recursive midpoint subdivision: the true
//! point at the middle of a parameter interval is compared with the midpoint of
//! the chord between the interval endpoints. When the gap is within tolerance
//! the chord is accepted, otherwise both halves are refined.
//!
//! The midpoint test bounds the deviation for convex curves and arcs. A cubic
//! with an inflection can pass it while bulging on both sides of the chord.

use crate::geometry::{Point, Segment};

/// Smallest parameter interval that is still subdivided
///
/// Stops the recursion on degenerate curves whose midpoint never converges
/// onto the chord, e.g. when the tolerance is below floating point noise.
pub const MIN_PARAM_INTERVAL: f64 = 1e-6;

/// Flatten a segment into the points a pen must visit after its start
///
/// Lines produce only their endpoint. Curves produce the ordered interval
/// endpoints of the accepted chords, the last one being the segment end.
pub fn linearize_segment(segment: &Segment, tolerance: f64) -> Vec<Point> {
    if !segment.is_curve() {
        return vec![segment.end()];
    }

    let mut points = Vec::new();
    subdivide(segment, 0.0, 1.0, tolerance, &mut points);
    points
}

fn subdivide(segment: &Segment, t0: f64, t1: f64, tolerance: f64, out: &mut Vec<Point>) {
    let p0 = segment.point(t0);
    let p1 = segment.point(t1);
    let t_mid = (t0 + t1) * 0.5;
    let chord_mid = p0.lerp(p1, 0.5);

    if segment.point(t_mid).distance_to(chord_mid) <= tolerance || t1 - t0 < MIN_PARAM_INTERVAL {
        out.push(p1);
        return;
    }

    subdivide(segment, t0, t_mid, tolerance, out);
    subdivide(segment, t_mid, t1, tolerance, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyon::geom::{CubicBezierSegment, QuadraticBezierSegment};

    #[test]
    fn test_line_yields_endpoint() {
        let seg = Segment::line(Point::new(0.0, 0.0), Point::new(10.0, 5.0));
        assert_eq!(linearize_segment(&seg, 0.1), vec![Point::new(10.0, 5.0)]);
    }

    #[test]
    fn test_curve_ends_on_endpoint() {
        let seg = Segment::Quadratic(QuadraticBezierSegment {
            from: Point::new(0.0, 0.0),
            ctrl: Point::new(50.0, 100.0),
            to: Point::new(100.0, 0.0),
        });
        let points = linearize_segment(&seg, 0.1);
        assert!(points.len() > 4);
        assert_eq!(points.last().copied(), Some(Point::new(100.0, 0.0)));
        assert_ne!(points[0], Point::new(0.0, 0.0));
    }

    #[test]
    fn test_coarse_tolerance_single_chord() {
        let seg = Segment::Quadratic(QuadraticBezierSegment {
            from: Point::new(0.0, 0.0),
            ctrl: Point::new(5.0, 1.0),
            to: Point::new(10.0, 0.0),
        });
        assert_eq!(linearize_segment(&seg, 10.0), vec![Point::new(10.0, 0.0)]);
    }

    #[test]
    fn test_degenerate_tolerance_terminates() {
        let seg = Segment::Cubic(CubicBezierSegment {
            from: Point::new(0.0, 0.0),
            ctrl1: Point::new(0.0, 100.0),
            ctrl2: Point::new(100.0, 100.0),
            to: Point::new(100.0, 0.0),
        });
        let points = linearize_segment(&seg, 0.0);
        // 1 / 2^20 < 1e-6, so the depth is bounded at 20
        assert!(points.len() <= 1 << 20);
        assert_eq!(points.last().copied(), Some(Point::new(100.0, 0.0)));
    }

    #[test]
    fn test_collapsed_curve() {
        let p = Point::new(3.0, 3.0);
        let seg = Segment::Cubic(CubicBezierSegment {
            from: p,
            ctrl1: p,
            ctrl2: p,
            to: p,
        });
        assert_eq!(linearize_segment(&seg, 0.1), vec![p]);
    }
}

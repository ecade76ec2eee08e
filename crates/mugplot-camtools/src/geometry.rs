//! Vector geometry model
//!
//! Segments wrap the lyon geometry primitives so every curve exposes the same
//! `point(t)` evaluation over `[0, 1]`. A [`Path`] is a continuous run of
//! segments; a [`Document`] is the ordered list of independent paths read from
//! one SVG file.

use lyon::geom::{Arc, CubicBezierSegment, LineSegment, QuadraticBezierSegment, SvgArc};

/// 2D point in source (SVG) or machine space
pub type Point = lyon::geom::Point<f64>;

/// Elliptical arc in SVG endpoint parameterization
///
/// Keeps the original endpoints so `point(0)` and `point(1)` are exact; the
/// center parameterization is only used for interior samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSegment {
    svg: SvgArc<f64>,
    arc: Arc<f64>,
}

impl ArcSegment {
    /// Build an arc segment, or `None` when the arc degenerates to a straight line
    pub fn new(svg: SvgArc<f64>) -> Option<Self> {
        if svg.is_straight_line() {
            return None;
        }
        Some(Self {
            svg,
            arc: Arc::from_svg_arc(&svg),
        })
    }

    /// The SVG description this arc was built from
    pub fn svg(&self) -> &SvgArc<f64> {
        &self.svg
    }

    fn sample(&self, t: f64) -> Point {
        if t <= 0.0 {
            self.svg.from
        } else if t >= 1.0 {
            self.svg.to
        } else {
            self.arc.sample(t)
        }
    }
}

/// A single geometric segment of a path
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    /// Straight line
    Line(LineSegment<f64>),
    /// Cubic Bézier curve
    Cubic(CubicBezierSegment<f64>),
    /// Quadratic Bézier curve
    Quadratic(QuadraticBezierSegment<f64>),
    /// Elliptical arc
    Arc(ArcSegment),
}

impl Segment {
    /// Straight line between two points
    pub fn line(from: Point, to: Point) -> Self {
        Segment::Line(LineSegment { from, to })
    }

    /// Arc from an SVG description, falling back to a line for degenerate radii
    pub fn arc(svg: SvgArc<f64>) -> Self {
        match ArcSegment::new(svg) {
            Some(arc) => Segment::Arc(arc),
            None => Segment::line(svg.from, svg.to),
        }
    }

    /// First point of the segment
    pub fn start(&self) -> Point {
        match self {
            Segment::Line(s) => s.from,
            Segment::Cubic(s) => s.from,
            Segment::Quadratic(s) => s.from,
            Segment::Arc(s) => s.svg.from,
        }
    }

    /// Last point of the segment
    pub fn end(&self) -> Point {
        match self {
            Segment::Line(s) => s.to,
            Segment::Cubic(s) => s.to,
            Segment::Quadratic(s) => s.to,
            Segment::Arc(s) => s.svg.to,
        }
    }

    /// Evaluate the segment at parameter `t` in `[0, 1]`
    pub fn point(&self, t: f64) -> Point {
        match self {
            Segment::Line(s) => s.sample(t),
            Segment::Cubic(s) => s.sample(t),
            Segment::Quadratic(s) => s.sample(t),
            Segment::Arc(s) => s.sample(t),
        }
    }

    /// Whether the segment needs subdivision to be drawn
    pub fn is_curve(&self) -> bool {
        !matches!(self, Segment::Line(_))
    }
}

/// A continuous sequence of segments
///
/// Each segment starts where the previous one ended. Drawing a path needs a
/// single pen-down; separate paths need a pen lift between them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// Create an empty path
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a path from segments
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        let path = Self { segments };
        debug_assert!(path.is_continuous());
        path
    }

    /// Append a segment
    pub fn push(&mut self, segment: Segment) {
        debug_assert!(self
            .segments
            .last()
            .is_none_or(|last| last.end() == segment.start()));
        self.segments.push(segment);
    }

    /// Segments in drawing order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if the path has no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Start point of the first segment
    pub fn start(&self) -> Option<Point> {
        self.segments.first().map(Segment::start)
    }

    /// End point of the last segment
    pub fn end(&self) -> Option<Point> {
        self.segments.last().map(Segment::end)
    }

    fn is_continuous(&self) -> bool {
        self.segments
            .windows(2)
            .all(|pair| pair[0].end() == pair[1].start())
    }
}

/// An imported drawing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// Independent paths in document order
    pub paths: Vec<Path>,
    /// Height of the `viewBox`, if one was declared
    pub view_box_height: Option<f64>,
    /// The `width` attribute with unit suffix removed, if parseable
    pub declared_width: Option<f64>,
    /// The `height` attribute with unit suffix removed, if parseable
    pub declared_height: Option<f64>,
}

impl Document {
    /// Create a document from paths with no declared size
    pub fn from_paths(paths: Vec<Path>) -> Self {
        Self {
            paths,
            ..Default::default()
        }
    }

    /// Reference height used for the vertical flip
    ///
    /// The viewBox wins over the height attribute; `fallback` (the bed height)
    /// applies when neither is declared.
    pub fn reference_height(&self, fallback: f64) -> f64 {
        self.view_box_height
            .or(self.declared_height)
            .unwrap_or(fallback)
    }
}

/// Affine map between source and machine coordinates
///
/// Translation by the origin plus an optional flip of the vertical axis about
/// the reference height. No rotation or scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    origin_x: f64,
    origin_y: f64,
    flip_y: bool,
    height: f64,
}

impl CoordinateMapper {
    /// Create a mapper for one document
    pub fn new(origin_x: f64, origin_y: f64, flip_y: bool, height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            flip_y,
            height,
        }
    }

    /// Source point to machine point
    pub fn map(&self, p: Point) -> Point {
        let y = if self.flip_y { self.height - p.y } else { p.y };
        Point::new(p.x + self.origin_x, y + self.origin_y)
    }

    /// Machine point back to source point
    pub fn unmap(&self, p: Point) -> Point {
        let y = p.y - self.origin_y;
        let y = if self.flip_y { self.height - y } else { y };
        Point::new(p.x - self.origin_x, y)
    }
}

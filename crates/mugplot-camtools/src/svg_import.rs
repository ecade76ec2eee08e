//! # SVG Import
//!
//! Reads SVG line art into a [`Document`] of continuous paths.
//!
//! Supports:
//! - `path` data with every command (absolute and relative, smooth curves, arcs)
//! - Basic shapes: `rect` (with rounded corners), `circle`, `ellipse`, `line`,
//!   `polyline`, `polygon`
//! - `translate(...)` on elements and groups, accumulated down the tree
//! - Document size from `viewBox`, `width` and `height`
//!
//! Fills, stroke widths, text and images are not drawn. Every subpath becomes its
//! own [`Path`] so the pen is lifted between them.

use crate::geometry::{Document, Path, Point, Segment};
use lyon::geom::{
    vector, Angle, ArcFlags, CubicBezierSegment, QuadraticBezierSegment, SvgArc, Vector,
};
use mugplot_core::{ImportError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path as StdPath;
use std::str::FromStr;
use svgtypes::{PathParser, PathSegment, PointsParser, Transform};

/// Elements whose content is never drawn directly
const NON_RENDERED: &[&str] = &["defs", "clipPath", "mask", "symbol", "marker", "pattern"];

/// Elements that carry drawable content we cannot plot
const UNSUPPORTED: &[&str] = &["text", "image", "use"];

/// SVG importer producing plotter paths
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgImporter;

/// Inherited state of an open element
#[derive(Debug, Clone, Copy)]
struct Frame {
    offset: Vector<f64>,
    hidden: bool,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            offset: vector(0.0, 0.0),
            hidden: false,
        }
    }
}

impl SvgImporter {
    /// Create a new SVG importer
    pub fn new() -> Self {
        Self
    }

    /// Import an SVG file
    pub fn import_file<P: AsRef<StdPath>>(&self, path: P) -> Result<Document> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let content = std::fs::read_to_string(path)?;
        let document = self.import_string(&content)?;
        tracing::info!(
            "Imported {} paths from {}",
            document.paths.len(),
            path.display()
        );
        Ok(document)
    }

    /// Import SVG from string content
    pub fn import_string(&self, svg_content: &str) -> Result<Document> {
        let mut reader = Reader::from_str(svg_content);
        reader.config_mut().trim_text(true);

        let mut document = Document::default();
        let mut found_svg = false;
        let mut stack: Vec<Frame> = Vec::new();

        loop {
            let event = reader.read_event().map_err(|e| ImportError::Xml {
                reason: format!("at byte {}: {}", reader.error_position(), e),
            })?;

            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let is_start = matches!(event, Event::Start(_));
                    let parent = stack.last().copied().unwrap_or_default();
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();

                    let frame = Frame {
                        offset: parent.offset + Self::own_offset(e, &name),
                        hidden: parent.hidden || NON_RENDERED.contains(&name.as_str()),
                    };

                    if name == "svg" && !found_svg {
                        found_svg = true;
                        Self::read_dimensions(e, &mut document);
                    } else if !frame.hidden {
                        let paths = Self::element_paths(e, &name, frame.offset)?;
                        document.paths.extend(paths);
                    }

                    if is_start {
                        stack.push(frame);
                    }
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !found_svg {
            return Err(ImportError::MissingSvgElement.into());
        }

        tracing::debug!(
            "Parsed SVG: {} paths, viewBox height {:?}, height {:?}",
            document.paths.len(),
            document.view_box_height,
            document.declared_height
        );
        Ok(document)
    }

    fn read_dimensions(e: &BytesStart<'_>, document: &mut Document) {
        let finite = |key: &str| {
            attr(e, key)
                .and_then(|v| parse_length(&v))
                .filter(|v| v.is_finite())
        };
        document.declared_width = finite("width");
        document.declared_height = finite("height");

        if let Some(view_box) = attr(e, "viewBox") {
            let parts: Vec<f64> = view_box
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|p| !p.is_empty())
                .map_while(|p| p.parse::<f64>().ok().filter(|v| v.is_finite()))
                .collect();
            if parts.len() == 4 {
                document.view_box_height = Some(parts[3]);
            } else {
                tracing::warn!("Ignoring malformed viewBox '{}'", view_box);
            }
        }
    }

    /// Translation contributed by an element's own `transform` attribute
    fn own_offset(e: &BytesStart<'_>, name: &str) -> Vector<f64> {
        let Some(value) = attr(e, "transform") else {
            return vector(0.0, 0.0);
        };

        match Transform::from_str(&value) {
            Ok(ts) if ts.a == 1.0 && ts.b == 0.0 && ts.c == 0.0 && ts.d == 1.0 => {
                vector(ts.e, ts.f)
            }
            Ok(_) => {
                tracing::warn!(
                    "Ignoring non-translation transform on <{}>: {}",
                    name,
                    value
                );
                vector(0.0, 0.0)
            }
            Err(err) => {
                tracing::warn!("Ignoring unparseable transform on <{}>: {}", name, err);
                vector(0.0, 0.0)
            }
        }
    }

    fn element_paths(e: &BytesStart<'_>, name: &str, offset: Vector<f64>) -> Result<Vec<Path>> {
        let mut builder = PathBuilder::new(offset);
        let num = |key: &str| -> Result<Option<f64>> {
            match attr(e, key).and_then(|v| parse_length(&v)) {
                Some(value) if !value.is_finite() => Err(ImportError::PathData {
                    element: name.to_string(),
                    reason: format!("{} is not a finite number", key),
                }
                .into()),
                value => Ok(value),
            }
        };

        match name {
            "path" => {
                if let Some(d) = attr(e, "d") {
                    builder.path_data(&d).map_err(|reason| ImportError::PathData {
                        element: name.to_string(),
                        reason,
                    })?;
                }
            }
            "rect" => {
                let (x, y) = (num("x")?.unwrap_or(0.0), num("y")?.unwrap_or(0.0));
                let (w, h) = (
                    num("width")?.unwrap_or(0.0),
                    num("height")?.unwrap_or(0.0),
                );
                builder.rect(x, y, w, h, num("rx")?, num("ry")?);
            }
            "circle" => {
                let r = num("r")?.unwrap_or(0.0);
                builder.ellipse(num("cx")?.unwrap_or(0.0), num("cy")?.unwrap_or(0.0), r, r);
            }
            "ellipse" => builder.ellipse(
                num("cx")?.unwrap_or(0.0),
                num("cy")?.unwrap_or(0.0),
                num("rx")?.unwrap_or(0.0),
                num("ry")?.unwrap_or(0.0),
            ),
            "line" => {
                builder.move_to(Point::new(
                    num("x1")?.unwrap_or(0.0),
                    num("y1")?.unwrap_or(0.0),
                ));
                builder.line_to(Point::new(
                    num("x2")?.unwrap_or(0.0),
                    num("y2")?.unwrap_or(0.0),
                ));
            }
            "polyline" | "polygon" => {
                let points = attr(e, "points").unwrap_or_default();
                builder.polyline(&points, name == "polygon");
            }
            _ if UNSUPPORTED.contains(&name) => {
                tracing::warn!("Skipping unsupported <{}> element", name);
            }
            _ => {}
        }

        Ok(builder.finish())
    }
}

/// Incremental builder turning drawing commands into continuous paths
///
/// Positions and control points are tracked in element space; the frame
/// offset is applied when segments are stored.
struct PathBuilder {
    offset: Vector<f64>,
    paths: Vec<Path>,
    current: Path,
    position: Point,
    subpath_start: Point,
    last_cubic_ctrl: Option<Point>,
    last_quad_ctrl: Option<Point>,
}

impl PathBuilder {
    fn new(offset: Vector<f64>) -> Self {
        Self {
            offset,
            paths: Vec::new(),
            current: Path::new(),
            position: Point::origin(),
            subpath_start: Point::origin(),
            last_cubic_ctrl: None,
            last_quad_ctrl: None,
        }
    }

    fn at(&self, p: Point) -> Point {
        p + self.offset
    }

    fn end_subpath(&mut self) {
        if !self.current.is_empty() {
            self.paths.push(std::mem::take(&mut self.current));
        }
    }

    fn move_to(&mut self, p: Point) {
        self.end_subpath();
        self.position = p;
        self.subpath_start = p;
        self.last_cubic_ctrl = None;
        self.last_quad_ctrl = None;
    }

    fn line_to(&mut self, p: Point) {
        let segment = Segment::line(self.at(self.position), self.at(p));
        self.current.push(segment);
        self.position = p;
        self.last_cubic_ctrl = None;
        self.last_quad_ctrl = None;
    }

    fn cubic_to(&mut self, ctrl1: Point, ctrl2: Point, to: Point) {
        let segment = Segment::Cubic(CubicBezierSegment {
            from: self.at(self.position),
            ctrl1: self.at(ctrl1),
            ctrl2: self.at(ctrl2),
            to: self.at(to),
        });
        self.current.push(segment);
        self.position = to;
        self.last_cubic_ctrl = Some(ctrl2);
        self.last_quad_ctrl = None;
    }

    fn quad_to(&mut self, ctrl: Point, to: Point) {
        let segment = Segment::Quadratic(QuadraticBezierSegment {
            from: self.at(self.position),
            ctrl: self.at(ctrl),
            to: self.at(to),
        });
        self.current.push(segment);
        self.position = to;
        self.last_cubic_ctrl = None;
        self.last_quad_ctrl = Some(ctrl);
    }

    fn arc_to(
        &mut self,
        rx: f64,
        ry: f64,
        rotation_deg: f64,
        large_arc: bool,
        sweep: bool,
        to: Point,
    ) {
        let segment = Segment::arc(SvgArc {
            from: self.at(self.position),
            to: self.at(to),
            radii: vector(rx.abs(), ry.abs()),
            x_rotation: Angle::degrees(rotation_deg),
            flags: ArcFlags { large_arc, sweep },
        });
        self.current.push(segment);
        self.position = to;
        self.last_cubic_ctrl = None;
        self.last_quad_ctrl = None;
    }

    fn close(&mut self) {
        if !self.current.is_empty() && self.position != self.subpath_start {
            self.line_to(self.subpath_start);
        }
        self.end_subpath();
        self.position = self.subpath_start;
        self.last_cubic_ctrl = None;
        self.last_quad_ctrl = None;
    }

    /// Control point reflected through the current position
    fn reflect(&self, ctrl: Option<Point>) -> Point {
        match ctrl {
            Some(c) => self.position + (self.position - c),
            None => self.position,
        }
    }

    fn resolve(&self, abs: bool, x: f64, y: f64) -> Point {
        if abs {
            Point::new(x, y)
        } else {
            self.position + vector(x, y)
        }
    }

    fn path_data(&mut self, d: &str) -> std::result::Result<(), String> {
        for segment in PathParser::from(d) {
            let segment = segment.map_err(|e| e.to_string())?;
            match segment {
                PathSegment::MoveTo { abs, x, y } => {
                    let p = self.resolve(abs, x, y);
                    self.move_to(p);
                }
                PathSegment::LineTo { abs, x, y } => {
                    let p = self.resolve(abs, x, y);
                    self.line_to(p);
                }
                PathSegment::HorizontalLineTo { abs, x } => {
                    let x = if abs { x } else { self.position.x + x };
                    self.line_to(Point::new(x, self.position.y));
                }
                PathSegment::VerticalLineTo { abs, y } => {
                    let y = if abs { y } else { self.position.y + y };
                    self.line_to(Point::new(self.position.x, y));
                }
                PathSegment::CurveTo {
                    abs,
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                } => {
                    let ctrl1 = self.resolve(abs, x1, y1);
                    let ctrl2 = self.resolve(abs, x2, y2);
                    let to = self.resolve(abs, x, y);
                    self.cubic_to(ctrl1, ctrl2, to);
                }
                PathSegment::SmoothCurveTo { abs, x2, y2, x, y } => {
                    let ctrl1 = self.reflect(self.last_cubic_ctrl);
                    let ctrl2 = self.resolve(abs, x2, y2);
                    let to = self.resolve(abs, x, y);
                    self.cubic_to(ctrl1, ctrl2, to);
                }
                PathSegment::Quadratic { abs, x1, y1, x, y } => {
                    let ctrl = self.resolve(abs, x1, y1);
                    let to = self.resolve(abs, x, y);
                    self.quad_to(ctrl, to);
                }
                PathSegment::SmoothQuadratic { abs, x, y } => {
                    let ctrl = self.reflect(self.last_quad_ctrl);
                    let to = self.resolve(abs, x, y);
                    self.quad_to(ctrl, to);
                }
                PathSegment::EllipticalArc {
                    abs,
                    rx,
                    ry,
                    x_axis_rotation,
                    large_arc,
                    sweep,
                    x,
                    y,
                } => {
                    let to = self.resolve(abs, x, y);
                    self.arc_to(rx, ry, x_axis_rotation, large_arc, sweep, to);
                }
                PathSegment::ClosePath { .. } => self.close(),
            }
        }
        Ok(())
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, rx: Option<f64>, ry: Option<f64>) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }

        let (rx, ry) = match (rx, ry) {
            (Some(rx), Some(ry)) => (rx, ry),
            (Some(r), None) | (None, Some(r)) => (r, r),
            (None, None) => (0.0, 0.0),
        };
        let rx = rx.clamp(0.0, w / 2.0);
        let ry = ry.clamp(0.0, h / 2.0);

        if rx == 0.0 || ry == 0.0 {
            self.move_to(Point::new(x, y));
            self.line_to(Point::new(x + w, y));
            self.line_to(Point::new(x + w, y + h));
            self.line_to(Point::new(x, y + h));
            self.close();
            return;
        }

        let corner = |b: &mut Self, to: Point| b.arc_to(rx, ry, 0.0, false, true, to);
        let edge = |b: &mut Self, to: Point| {
            if b.position != to {
                b.line_to(to);
            }
        };

        self.move_to(Point::new(x + rx, y));
        edge(self, Point::new(x + w - rx, y));
        corner(self, Point::new(x + w, y + ry));
        edge(self, Point::new(x + w, y + h - ry));
        corner(self, Point::new(x + w - rx, y + h));
        edge(self, Point::new(x + rx, y + h));
        corner(self, Point::new(x, y + h - ry));
        edge(self, Point::new(x, y + ry));
        corner(self, Point::new(x + rx, y));
        self.close();
    }

    fn ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64) {
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }

        self.move_to(Point::new(cx + rx, cy));
        for to in [
            Point::new(cx, cy + ry),
            Point::new(cx - rx, cy),
            Point::new(cx, cy - ry),
            Point::new(cx + rx, cy),
        ] {
            self.arc_to(rx, ry, 0.0, false, true, to);
        }
        self.close();
    }

    fn polyline(&mut self, points: &str, closed: bool) {
        let mut iter = PointsParser::from(points).map(|(x, y)| Point::new(x, y));
        let Some(first) = iter.next() else {
            return;
        };

        self.move_to(first);
        for p in iter {
            self.line_to(p);
        }
        if closed {
            self.close();
        }
    }

    fn finish(mut self) -> Vec<Path> {
        self.end_subpath();
        self.paths
    }
}

/// Read an attribute by local name, unescaping entities
fn attr(e: &BytesStart<'_>, name: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name.as_bytes())
        .and_then(|a| {
            let raw = std::str::from_utf8(&a.value).ok()?;
            quick_xml::escape::unescape(raw).ok().map(|v| v.into_owned())
        })
}

/// Parse a length, ignoring `mm` and `px` unit suffixes
fn parse_length(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let number = trimmed
        .strip_suffix("mm")
        .or_else(|| trimmed.strip_suffix("px"))
        .unwrap_or(trimmed);
    number.trim().parse::<f64>().ok()
}

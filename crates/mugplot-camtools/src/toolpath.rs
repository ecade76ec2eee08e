//! # Toolpath Generation
//!
//! Emits the pen-plotter program for an imported [`Document`]: a fixed
//! header, one pen-up / travel / pen-down / draw block per path, and a footer
//! returning to the drawing origin.
//!
//! Feed rates are modal on the controller, so an `F` word is only written when
//! the feed in force changes. The feed in force is tracked per generation call.

use crate::geometry::{CoordinateMapper, Document, Point};
use crate::linearize::linearize_segment;
use crate::svg_import::SvgImporter;
use mugplot_core::Result;
use mugplot_settings::MachineSettings;
use std::path::{Path as StdPath, PathBuf};

/// Format a coordinate or feed value for G-code
///
/// Three decimals with trailing zeros and a trailing point removed. Values
/// that round to zero are written as `0`, never `-0`.
pub fn format_coord(value: f64) -> String {
    let formatted = format!("{:.3}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Feed rate last written to the program
#[derive(Debug, Default)]
struct FeedState {
    current: Option<f64>,
}

impl FeedState {
    /// Record an unconditional feed word
    fn set(&mut self, feed: f64) -> f64 {
        self.current = Some(feed);
        feed
    }

    /// Feed word to write for a move at `feed`, if it differs from the one in force
    fn change_to(&mut self, feed: f64) -> Option<f64> {
        if self.current == Some(feed) {
            None
        } else {
            Some(self.set(feed))
        }
    }
}

/// G-code program generator for one machine profile
#[derive(Debug, Clone)]
pub struct ToolpathGenerator {
    settings: MachineSettings,
}

impl ToolpathGenerator {
    /// Create a generator for a machine profile
    pub fn new(settings: &MachineSettings) -> Self {
        Self {
            settings: settings.clone(),
        }
    }

    /// Generate the complete program for a document
    ///
    /// Pure: the same document and profile always produce the same lines.
    pub fn generate(&self, document: &Document) -> Vec<String> {
        let s = &self.settings;
        let mapper = CoordinateMapper::new(
            s.origin_x,
            s.origin_y,
            s.flip_y,
            document.reference_height(s.bed_height),
        );

        let mut feed = FeedState::default();
        let mut lines = self.header(&mut feed);

        let mut drawn = 0usize;
        for path in &document.paths {
            let Some(start) = path.start() else {
                continue;
            };

            let mut points: Vec<Point> = vec![mapper.map(start)];
            for segment in path.segments() {
                points.extend(
                    linearize_segment(segment, s.curve_tolerance)
                        .into_iter()
                        .map(|p| mapper.map(p)),
                );
            }
            if points.len() < 2 {
                continue;
            }

            self.emit_path(&points, &mut feed, &mut lines);
            drawn += 1;
        }

        lines.extend(self.footer());
        tracing::debug!("Generated {} lines for {} paths", lines.len(), drawn);
        lines
    }

    fn header(&self, feed: &mut FeedState) -> Vec<String> {
        let s = &self.settings;
        let mut lines = vec![
            "G21 ; mm mode".to_string(),
            "G90 ; absolute positioning".to_string(),
        ];
        if s.home_on_start {
            lines.push("$H ; home X and Y".to_string());
        }
        lines.push("G10 L2 P1 X0 Y0 Z0 ; clear G54 work offset".to_string());
        lines.push("G92 Z0 ; set current Z as zero".to_string());
        lines.push(format!(
            "G0 Z{} F{} ; pen up",
            format_coord(s.z_pen_up),
            format_coord(feed.set(s.z_travel_speed))
        ));
        lines
    }

    fn emit_path(&self, points: &[Point], feed: &mut FeedState, lines: &mut Vec<String>) {
        let s = &self.settings;

        lines.push(format!("G0 Z{}", format_coord(s.z_pen_up)));

        let first = points[0];
        lines.push(with_feed(
            format!("G0 X{} Y{}", format_coord(first.x), format_coord(first.y)),
            feed.change_to(s.travel_speed),
        ));

        lines.push(format!(
            "G1 Z{} F{}",
            format_coord(s.z_pen_down),
            format_coord(feed.set(s.z_travel_speed))
        ));

        for p in &points[1..] {
            lines.push(with_feed(
                format!("G1 X{} Y{}", format_coord(p.x), format_coord(p.y)),
                feed.change_to(s.draw_speed),
            ));
        }
    }

    fn footer(&self) -> Vec<String> {
        let s = &self.settings;
        vec![
            format!("G0 Z{} ; pen up", format_coord(s.z_pen_up)),
            format!(
                "G0 X{} Y{} F{} ; return to origin",
                format_coord(s.origin_x),
                format_coord(s.origin_y),
                format_coord(s.travel_speed)
            ),
            "M2 ; program end".to_string(),
        ]
    }
}

fn with_feed(mut line: String, feed: Option<f64>) -> String {
    if let Some(f) = feed {
        line.push_str(" F");
        line.push_str(&format_coord(f));
    }
    line
}

/// Convert an SVG file to program lines
pub fn svg_to_gcode<P: AsRef<StdPath>>(
    svg_path: P,
    settings: &MachineSettings,
) -> Result<Vec<String>> {
    settings.validate()?;
    let document = SvgImporter::new().import_file(svg_path)?;
    Ok(ToolpathGenerator::new(settings).generate(&document))
}

/// Convert an SVG file and write the program
///
/// Without an explicit output the program is written next to the input with
/// a `.gcode` extension. Returns the path written.
pub fn convert_file<P: AsRef<StdPath>>(
    svg_path: P,
    output_path: Option<&StdPath>,
    settings: &MachineSettings,
) -> Result<PathBuf> {
    let svg_path = svg_path.as_ref();
    let output_path = match output_path {
        Some(path) => path.to_path_buf(),
        None => svg_path.with_extension("gcode"),
    };

    let lines = svg_to_gcode(svg_path, settings)?;
    let mut content = lines.join("\n");
    content.push('\n');
    std::fs::write(&output_path, content)?;

    tracing::info!("Wrote {} lines to {}", lines.len(), output_path.display());
    Ok(output_path)
}

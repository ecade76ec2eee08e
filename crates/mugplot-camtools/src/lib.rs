//! # mugplot CAM Tools
//!
//! Turns SVG line art into a pen-plotter G-code program.
//!
//! - **SVG Import**: paths and basic shapes into continuous [`Path`]s
//! - **Linearize**: adaptive midpoint subdivision of curved segments
//! - **Toolpath**: coordinate mapping and program emission with sticky feed rates
//! - **Validator**: envelope check of a generated program against the bed limits

pub mod geometry;
pub mod linearize;
pub mod svg_import;
pub mod toolpath;
pub mod validator;

pub use geometry::{ArcSegment, CoordinateMapper, Document, Path, Point, Segment};
pub use linearize::{linearize_segment, MIN_PARAM_INTERVAL};
pub use svg_import::SvgImporter;
pub use toolpath::{convert_file, format_coord, svg_to_gcode, ToolpathGenerator};
pub use validator::EnvelopeValidator;

//! Envelope check for generated programs
//!
//! Scans motion lines for axis words outside the drawable area of the machine
//! profile. The check is pure: findings are returned, never raised.

use mugplot_settings::MachineSettings;
use regex::Regex;
use std::sync::OnceLock;

/// Allowed slack around the pen heights
const Z_MARGIN: f64 = 1.0;

/// Checks G-code coordinates against the machine envelope
#[derive(Debug, Clone)]
pub struct EnvelopeValidator {
    x_range: (f64, f64),
    y_range: (f64, f64),
    z_range: (f64, f64),
}

fn motion_regex() -> &'static Regex {
    static MOTION: OnceLock<Regex> = OnceLock::new();
    MOTION.get_or_init(|| Regex::new(r"(?i)^\s*G0*[01]\b").expect("invalid motion regex"))
}

fn axis_word_regex() -> &'static Regex {
    static AXIS_WORD: OnceLock<Regex> = OnceLock::new();
    AXIS_WORD.get_or_init(|| Regex::new(r"(?i)([XYZ])([-\d.]+)").expect("invalid axis regex"))
}

fn paren_comment_regex() -> &'static Regex {
    static PAREN_COMMENT: OnceLock<Regex> = OnceLock::new();
    PAREN_COMMENT.get_or_init(|| Regex::new(r"\([^)]*\)").expect("invalid comment regex"))
}

impl EnvelopeValidator {
    /// Build the envelope for a machine profile
    pub fn new(settings: &MachineSettings) -> Self {
        let z_low = settings.z_pen_up.min(settings.z_pen_down);
        let z_high = settings.z_pen_up.max(settings.z_pen_down);

        Self {
            x_range: (settings.origin_x, settings.origin_x + settings.bed_width),
            y_range: (settings.origin_y, settings.origin_y + settings.bed_height),
            z_range: (z_low - Z_MARGIN, z_high + Z_MARGIN),
        }
    }

    /// Check program lines, returning one message per out-of-range axis word
    ///
    /// Line numbers are 1-based. Only rapid and feed moves are inspected.
    pub fn check<S: AsRef<str>>(&self, lines: &[S]) -> Vec<String> {
        let mut violations = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            let line_no = index + 1;
            let code = line.as_ref().split(';').next().unwrap_or_default();
            let code = paren_comment_regex().replace_all(code, "");
            if !motion_regex().is_match(&code) {
                continue;
            }

            for caps in axis_word_regex().captures_iter(&code) {
                let axis = caps[1].to_ascii_uppercase();
                let Ok(value) = caps[2].parse::<f64>() else {
                    tracing::warn!(
                        "line {}: skipping unparseable {} word '{}'",
                        line_no,
                        axis,
                        &caps[2]
                    );
                    continue;
                };

                let out_of_range = match axis.as_str() {
                    "X" => outside(value, self.x_range).then(|| format_range(self.x_range)),
                    "Y" => outside(value, self.y_range).then(|| format_range(self.y_range)),
                    _ => outside(value, self.z_range).then(|| {
                        format!("[{:.1}, {:.1}]", self.z_range.0, self.z_range.1)
                    }),
                };

                if let Some(range) = out_of_range {
                    violations.push(format!(
                        "line {}: {}{} out of range {}",
                        line_no, axis, value, range
                    ));
                }
            }
        }

        violations
    }
}

fn outside(value: f64, (min, max): (f64, f64)) -> bool {
    !(min <= value && value <= max)
}

fn format_range((min, max): (f64, f64)) -> String {
    format!("[{}, {}]", min, max)
}

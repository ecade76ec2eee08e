//! Program loading
//!
//! Streams carry bare commands only: comments cost receive-buffer space on
//! the controller and are removed before sending.

use mugplot_core::Result;
use std::path::Path as StdPath;

/// Remove `;` and `( )` comments and surrounding whitespace from a line
///
/// Text between a `(` and the next `)` is removed in place, so
/// `G1 X5 (feed) Y10` becomes `G1 X5  Y10`. An unclosed `(` is kept.
pub fn strip_comments(line: &str) -> String {
    let mut code = match line.find(';') {
        Some(pos) => line[..pos].to_string(),
        None => line.to_string(),
    };

    while let Some(start) = code.find('(') {
        let Some(len) = code[start..].find(')') else {
            break;
        };
        code.replace_range(start..=start + len, "");
    }

    code.trim().to_string()
}

/// Load a program file, dropping comments and blank lines
pub fn load_gcode<P: AsRef<StdPath>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let lines: Vec<String> = content
        .lines()
        .map(strip_comments)
        .filter(|l| !l.is_empty())
        .collect();

    tracing::info!("Loaded {} commands from {}", lines.len(), path.display());
    Ok(lines)
}

use super::{fixture, mug_profile};
use mugplot_camtools::{convert_file, svg_to_gcode, SvgImporter, ToolpathGenerator};
use mugplot_settings::MachineSettings;
use tempfile::tempdir;

fn commands(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .map(|l| l.split(';').next().unwrap_or_default().trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

fn axis_values(lines: &[String], axis: char) -> Vec<f64> {
    commands(lines)
        .iter()
        .flat_map(|l| {
            l.split_whitespace()
                .filter_map(|word| word.strip_prefix(axis))
                .filter_map(|v| v.parse::<f64>().ok())
                .collect::<Vec<_>>()
        })
        .collect()
}

#[test]
fn test_square_program_shape() {
    let lines = svg_to_gcode(fixture("square.svg"), &mug_profile()).unwrap();
    let cmds = commands(&lines);
    assert_eq!(cmds[0], "G21");
    assert_eq!(cmds[1], "G90");
    assert_eq!(cmds.last().map(String::as_str), Some("M2"));
    assert!(lines.iter().any(|l| l.starts_with("G0 Z5")));
    assert!(lines.iter().any(|l| l.starts_with("G1 Z0 F300")));
}

#[test]
fn test_square_coordinates_in_bed() {
    let profile = mug_profile();
    let lines = svg_to_gcode(fixture("square.svg"), &profile).unwrap();
    for x in axis_values(&lines, 'X') {
        assert!((0.0..=profile.bed_width).contains(&x), "X={} out of bounds", x);
    }
    for y in axis_values(&lines, 'Y') {
        assert!((0.0..=profile.bed_height).contains(&y), "Y={} out of bounds", y);
    }
}

#[test]
fn test_y_flip_about_view_box() {
    // square spans SVG y 10..50 in a 150 high viewBox
    let lines = svg_to_gcode(fixture("square.svg"), &mug_profile()).unwrap();
    let ys = axis_values(&lines, 'Y');
    assert!(ys.contains(&140.0));
    assert!(ys.contains(&100.0));
}

#[test]
fn test_curve_is_linearized() {
    let lines = svg_to_gcode(fixture("curve.svg"), &mug_profile()).unwrap();
    let draws = lines
        .iter()
        .filter(|l| l.starts_with("G1") && l.contains('X'))
        .count();
    assert!(draws > 2, "expected many draw moves, got {}", draws);
}

#[test]
fn test_multiple_paths_lift_pen() {
    let lines = svg_to_gcode(fixture("multipath.svg"), &mug_profile()).unwrap();
    let pen_ups = lines.iter().filter(|l| l.starts_with("G0 Z5")).count();
    // header, one per path, footer
    assert_eq!(pen_ups, 4);
    let pen_downs = lines.iter().filter(|l| l.starts_with("G1 Z0")).count();
    assert_eq!(pen_downs, 2);
}

#[test]
fn test_generation_is_idempotent() {
    let document = SvgImporter::new()
        .import_file(fixture("multipath.svg"))
        .unwrap();
    let generator = ToolpathGenerator::new(&mug_profile());
    assert_eq!(generator.generate(&document), generator.generate(&document));
}

#[test]
fn test_convert_file_explicit_output() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("test.gcode");
    let written =
        convert_file(fixture("square.svg"), Some(output.as_path()), &mug_profile()).unwrap();
    assert_eq!(written, output);

    let content = std::fs::read_to_string(&output).unwrap();
    assert!(content.starts_with("G21"));
    assert!(content.contains("M2"));
    assert!(content.ends_with('\n'));
}

#[test]
fn test_convert_file_default_output_name() {
    let dir = tempdir().unwrap();
    let svg = dir.path().join("drawing.svg");
    std::fs::copy(fixture("square.svg"), &svg).unwrap();

    let written = convert_file(&svg, None, &mug_profile()).unwrap();
    assert_eq!(written, dir.path().join("drawing.gcode"));
    assert!(written.exists());
}

#[test]
fn test_missing_svg_is_import_error() {
    let dir = tempdir().unwrap();
    let err = svg_to_gcode(dir.path().join("nope.svg"), &mug_profile()).unwrap_err();
    assert!(err.is_import_error());
}

#[test]
fn test_invalid_profile_rejected_before_reading() {
    let profile = MachineSettings {
        draw_speed: 0.0,
        ..mug_profile()
    };
    let err = svg_to_gcode(fixture("square.svg"), &profile).unwrap_err();
    assert!(err.is_config_error());
}

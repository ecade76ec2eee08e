use super::{fixture, mug_profile};
use mugplot_camtools::{svg_to_gcode, EnvelopeValidator};

#[test]
fn test_generated_program_within_envelope() {
    let profile = mug_profile();
    for name in ["square.svg", "curve.svg", "multipath.svg"] {
        let lines = svg_to_gcode(fixture(name), &profile).unwrap();
        let violations = EnvelopeValidator::new(&profile).check(&lines);
        assert!(violations.is_empty(), "{}: {:?}", name, violations);
    }
}

#[test]
fn test_x_overflow_single_violation() {
    let profile = mug_profile();
    let lines = vec![
        "G21".to_string(),
        "G0 X10 Y10".to_string(),
        "G1 X70 Y10".to_string(),
        "M2".to_string(),
    ];
    let violations = EnvelopeValidator::new(&profile).check(&lines);
    assert_eq!(violations.len(), 1);
    assert!(violations[0].starts_with("line 3: X70"));
}

use mugplot_communication::load_gcode;
use std::io::Write;

#[test]
fn test_load_gcode_strips_comments() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "; mugplot program").unwrap();
    writeln!(file, "G21 ; mm mode").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "G1 X5 (feed) Y10").unwrap();
    writeln!(file, "(only a comment)").unwrap();
    writeln!(file, "M2").unwrap();

    let lines = load_gcode(file.path()).unwrap();
    assert_eq!(lines, vec!["G21", "G1 X5  Y10", "M2"]);
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_gcode(dir.path().join("missing.gcode")).unwrap_err();
    assert!(matches!(err, mugplot_core::Error::Io(_)));
}

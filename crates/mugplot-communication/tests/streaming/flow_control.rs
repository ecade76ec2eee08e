use super::settings;
use mugplot_communication::{GcodeStreamer, ScriptedChannel};
use mugplot_core::{ConnectionError, Error, ProgressFn};
use proptest::prelude::*;

fn program() -> Vec<String> {
    vec![
        "G21".to_string(),
        "G90".to_string(),
        "G0 X10 Y10".to_string(),
    ]
}

#[test]
fn test_all_ok_completes() {
    let channel = ScriptedChannel::new();
    let mut streamer = GcodeStreamer::with_channel(&settings(128), Box::new(channel.clone()));

    let result = streamer.stream(&program(), None).unwrap();
    assert!(result.completed);
    assert_eq!(result.lines_sent, 3);
    assert!(result.errors.is_empty());
    assert_eq!(result.alarm, None);
    assert_eq!(result.unacknowledged, 0);
    assert_eq!(channel.written_lines(), program());
}

#[test]
fn test_error_response_continues() {
    let channel = ScriptedChannel::with_responses(["ok", "error:20", "ok"]);
    let mut streamer = GcodeStreamer::with_channel(&settings(128), Box::new(channel));

    let result = streamer.stream(&program(), None).unwrap();
    assert!(result.completed);
    assert_eq!(result.lines_sent, 3);
    assert_eq!(result.errors, vec!["line 2: error:20".to_string()]);
}

#[test]
fn test_alarm_aborts() {
    let channel = ScriptedChannel::with_responses(["ok", "ALARM:1", "ok"]);
    let mut streamer = GcodeStreamer::with_channel(&settings(128), Box::new(channel.clone()));

    let result = streamer.stream(&program(), None).unwrap();
    assert!(!result.completed);
    assert!(!result.cancelled);
    assert_eq!(result.lines_sent, 1);
    assert_eq!(result.alarm.as_deref(), Some("ALARM:1"));
    assert_eq!(result.errors, vec!["ALARM at line 1: ALARM:1".to_string()]);
    assert_eq!(result.unacknowledged, 2);
    assert_eq!(channel.remaining_responses(), 1);
}

#[test]
fn test_status_and_messages_ignored() {
    let channel = ScriptedChannel::with_responses([
        "[MSG:INFO: Homed]",
        "ok",
        "<Run|MPos:10.000,10.000,0.000|FS:500,0>",
        "ok",
        "",
        "ok",
    ]);
    let mut streamer = GcodeStreamer::with_channel(&settings(128), Box::new(channel));

    let result = streamer.stream(&program(), None).unwrap();
    assert!(result.completed);
    assert_eq!(result.lines_sent, 3);
}

#[test]
fn test_progress_reports_each_ack() {
    let channel = ScriptedChannel::new();
    let mut streamer = GcodeStreamer::with_channel(&settings(128), Box::new(channel));
    let lines = ["G0 X1", "G0 X2"];

    let mut calls = Vec::new();
    let mut record = |done: usize, total: usize| calls.push((done, total));
    let result = streamer
        .stream(&lines, Some(&mut record as ProgressFn))
        .unwrap();

    assert!(result.completed);
    assert_eq!(calls, vec![(1, 2), (2, 2)]);
}

#[test]
fn test_stop_handle_cancels() {
    let channel = ScriptedChannel::new();
    let mut streamer = GcodeStreamer::with_channel(&settings(128), Box::new(channel));
    let handle = streamer.stop_handle();
    let lines = ["G0 X1", "G0 X2", "G0 X3", "G0 X4", "G0 X5"];

    let mut stop_after_two = |done: usize, _total: usize| {
        if done == 2 {
            handle.stop();
        }
    };
    let result = streamer
        .stream(&lines, Some(&mut stop_after_two as ProgressFn))
        .unwrap();

    assert!(result.cancelled);
    assert!(!result.completed);
    assert_eq!(result.lines_sent, 2);
    assert_eq!(result.alarm, None);
}

#[test]
fn test_empty_program_completes() {
    let channel = ScriptedChannel::new();
    let mut streamer = GcodeStreamer::with_channel(&settings(128), Box::new(channel.clone()));
    let lines: Vec<String> = Vec::new();

    let result = streamer.stream(&lines, None).unwrap();
    assert!(result.completed);
    assert_eq!(result.lines_sent, 0);
    assert!(channel.written().is_empty());
}

#[test]
fn test_tiny_buffer_one_line_in_flight() {
    let channel = ScriptedChannel::new();
    let mut streamer = GcodeStreamer::with_channel(&settings(30), Box::new(channel.clone()));
    let line = "G1 X12.345 Y67.890 F500";
    assert_eq!(line.len(), 23);
    let lines = vec![line; 4];

    let result = streamer.stream(&lines, None).unwrap();
    assert!(result.completed);
    assert_eq!(channel.peak_in_flight(), 24);
    assert!(channel.peak_in_flight() < 30);
}

#[test]
fn test_oversized_line_rejected_before_writing() {
    let channel = ScriptedChannel::new();
    let mut streamer = GcodeStreamer::with_channel(&settings(16), Box::new(channel.clone()));
    let lines = ["G0 X1", "G1 X12.345 Y67.890 F500"];

    let err = streamer.stream(&lines, None).unwrap_err();
    assert!(err.is_connection_error());
    assert!(matches!(
        err,
        Error::Connection(ConnectionError::LineTooLong {
            line: 2,
            len: 24,
            capacity: 16
        })
    ));
    assert!(channel.written().is_empty());
    assert_eq!(channel.peak_in_flight(), 0);
}

#[test]
fn test_line_filling_buffer_exactly_rejected() {
    let channel = ScriptedChannel::new();
    let mut streamer = GcodeStreamer::with_channel(&settings(16), Box::new(channel.clone()));

    // 14 characters plus the terminator stays below the 16 byte buffer
    let result = streamer.stream(&["G1 X12.34 Y5.6"], None).unwrap();
    assert!(result.completed);
    assert_eq!(channel.peak_in_flight(), 15);

    // 15 characters plus the terminator would fill it completely
    let err = streamer.stream(&["G1 X12.34 Y5.67"], None).unwrap_err();
    assert!(err.to_string().contains("Line 1 is 16 bytes"));
    assert_eq!(channel.written().len(), 1);
}

#[test]
fn test_stream_without_channel() {
    let mut streamer = GcodeStreamer::new(&settings(128));
    let err = streamer.stream(&["G0 X1"], None).unwrap_err();
    assert!(err.is_connection_error());
}

proptest! {
    #[test]
    fn prop_in_flight_stays_below_buffer(
        lines in prop::collection::vec("G1 X[0-9]{1,3}\\.[0-9]{1,3} Y[0-9]{1,3}", 1..40),
        rx_buffer_size in 18usize..128,
    ) {
        let channel = ScriptedChannel::new();
        let mut streamer =
            GcodeStreamer::with_channel(&settings(rx_buffer_size), Box::new(channel.clone()));

        let result = streamer.stream(&lines, None).unwrap();
        prop_assert!(result.completed);
        prop_assert_eq!(result.lines_sent, lines.len());
        prop_assert!(channel.peak_in_flight() < rx_buffer_size);
        prop_assert_eq!(channel.written_lines(), lines);
    }
}

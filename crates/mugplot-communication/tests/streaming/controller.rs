use super::settings;
use mugplot_communication::{read_banner, ByteChannel, GcodeStreamer, ScriptedChannel};

#[test]
fn test_read_banner_and_drain() {
    let mut channel = ScriptedChannel::with_responses([
        "",
        "[MSG:INFO: FluidNC v3.7.8]",
        "Grbl 3.7 [FluidNC v3.7.8 (wifi) '$' for help]",
        "[MSG:late]",
    ]);
    channel.push_input(b"ok\r\n");

    let banner = read_banner(&mut channel, &settings(128)).unwrap();
    assert_eq!(
        banner,
        "[MSG:INFO: FluidNC v3.7.8]\nGrbl 3.7 [FluidNC v3.7.8 (wifi) '$' for help]"
    );
    assert_eq!(channel.bytes_available().unwrap(), 0);
    assert_eq!(channel.remaining_responses(), 1);
}

#[test]
fn test_read_banner_ready_line() {
    let mut channel = ScriptedChannel::with_responses(["Controller READY", "Grbl 1.1h"]);
    let banner = read_banner(&mut channel, &settings(128)).unwrap();
    assert_eq!(banner, "Controller READY");
}

#[test]
fn test_read_banner_times_out() {
    let mut channel = ScriptedChannel::with_responses(["[MSG:boot]"]);
    let banner = read_banner(&mut channel, &settings(128)).unwrap();
    assert_eq!(banner, "[MSG:boot]");
}

#[test]
fn test_connect_with_injected_channel() {
    let channel = ScriptedChannel::with_responses(["Grbl 1.1h"]);
    let mut streamer = GcodeStreamer::with_channel(&settings(128), Box::new(channel.clone()));
    assert!(streamer.is_connected());
    assert_eq!(streamer.connect().unwrap(), "");
    assert_eq!(channel.remaining_responses(), 1);
}

#[test]
fn test_query_status() {
    let mut channel = ScriptedChannel::with_responses([
        "ok",
        "<Idle|MPos:0.000,0.000,5.000|FS:0,0>",
    ]);
    channel.push_input(b"stale\r\n");
    let mut streamer = GcodeStreamer::with_channel(&settings(128), Box::new(channel.clone()));

    let status = streamer.query_status().unwrap();
    assert_eq!(
        status.as_deref(),
        Some("<Idle|MPos:0.000,0.000,5.000|FS:0,0>")
    );
    assert_eq!(channel.written(), vec![b"?".to_vec()]);
    assert_eq!(channel.bytes_available().unwrap(), 0);
}

#[test]
fn test_query_status_timeout() {
    let channel = ScriptedChannel::with_responses(["[MSG:busy]"]);
    let mut streamer = GcodeStreamer::with_channel(&settings(128), Box::new(channel));
    assert_eq!(streamer.query_status().unwrap(), None);
}

#[test]
fn test_realtime_commands() {
    let channel = ScriptedChannel::new();
    let mut streamer = GcodeStreamer::with_channel(&settings(128), Box::new(channel.clone()));

    streamer.feed_hold().unwrap();
    streamer.cycle_resume().unwrap();
    streamer.soft_reset().unwrap();
    assert_eq!(
        channel.written(),
        vec![b"!".to_vec(), b"~".to_vec(), vec![0x18]]
    );
    assert!(channel.written_lines().is_empty());
}

#[test]
fn test_commands_without_channel() {
    let mut streamer = GcodeStreamer::new(&settings(128));
    assert!(!streamer.is_connected());
    assert!(streamer.soft_reset().unwrap_err().is_connection_error());
    assert!(streamer.query_status().unwrap_err().is_connection_error());
}

#[test]
fn test_close_detaches_injected_channel() {
    let channel = ScriptedChannel::new();
    let mut streamer = GcodeStreamer::with_channel(&settings(128), Box::new(channel.clone()));

    streamer.close().unwrap();
    assert!(!streamer.is_connected());
    assert!(!channel.is_closed());

    drop(streamer);
    assert!(!channel.is_closed());
}

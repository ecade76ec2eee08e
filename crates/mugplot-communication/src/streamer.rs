//! Character-counting G-code streamer
//!
//! Implements the Grbl streaming protocol: lines are written while the bytes
//! not yet acknowledged fit in the controller's receive buffer, and every
//! `ok` or `error:` frees the oldest line's bytes. An alarm stops the stream.
//!
//! The loop is a small state machine over [`StreamState`]; all I/O is
//! blocking and bounded by the per-read timeout.

use crate::communication::channel::drain;
use crate::communication::{ByteChannel, RealSerialPort};
use crate::firmware::grbl::ControllerResponse;
use mugplot_core::{ConnectionError, ProgressFn, Result};
use mugplot_settings::SerialSettings;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Wait after the banner before discarding leftover startup output
const BANNER_SETTLE: Duration = Duration::from_millis(100);

/// Pause between reads while discarding leftover startup output
const DRAIN_PAUSE: Duration = Duration::from_millis(50);

/// Phase of the streaming loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Writing lines while the receive buffer has room
    Filling,
    /// Waiting for the controller to answer
    AwaitingAck,
    /// Every line acknowledged
    Completed,
    /// Stopped by an alarm or the stop handle
    Aborted,
}

/// Summary of one `stream` call
///
/// After an alarm the controller discards its receive buffer, so the
/// `unacknowledged` lines that were in flight have unknown outcomes: they may
/// have executed, partly executed, or never run. Only `lines_sent` lines are
/// known to have been accepted or rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamResult {
    /// Lines acknowledged with `ok` or `error:`
    pub lines_sent: usize,
    /// Rejected lines and the alarm entry, in arrival order
    pub errors: Vec<String>,
    /// The alarm response that ended the stream
    pub alarm: Option<String>,
    /// Set when the stop handle ended the stream
    pub cancelled: bool,
    /// Wall time of the call
    pub elapsed: Duration,
    /// Every line acknowledged without alarm or cancellation
    pub completed: bool,
    /// Lines written but never acknowledged
    pub unacknowledged: usize,
}

/// Cloneable signal that aborts a running stream
///
/// The streamer checks it before every read, so a stream stops within one
/// per-read timeout of `stop` being called. Each `stream` call starts by
/// clearing it.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Request the running stream to stop
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous request
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Single-byte commands acted on immediately, outside the receive buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealtimeCommand {
    /// `?` request a status report
    StatusQuery,
    /// `!` pause motion
    FeedHold,
    /// `~` resume after a feed hold
    CycleResume,
    /// `0x18` reset the controller
    SoftReset,
}

impl RealtimeCommand {
    /// Byte sent on the wire
    pub fn as_byte(self) -> u8 {
        match self {
            Self::StatusQuery => b'?',
            Self::FeedHold => b'!',
            Self::CycleResume => b'~',
            Self::SoftReset => 0x18,
        }
    }
}

/// Byte lengths of lines awaiting acknowledgement
#[derive(Debug, Default)]
struct FlowWindow {
    lengths: VecDeque<usize>,
    bytes: usize,
}

impl FlowWindow {
    /// Whether `len` more bytes stay strictly below `capacity`
    fn fits(&self, len: usize, capacity: usize) -> bool {
        self.bytes + len < capacity
    }

    fn push(&mut self, len: usize) {
        self.lengths.push_back(len);
        self.bytes += len;
    }

    fn pop(&mut self) -> bool {
        match self.lengths.pop_front() {
            Some(len) => {
                self.bytes -= len;
                true
            }
            None => false,
        }
    }

    fn len(&self) -> usize {
        self.lengths.len()
    }

    fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }
}

/// Read the controller's startup banner
///
/// Collects lines until one starts with `Grbl` or mentions `ready`, or the
/// connect timeout passes. Leftover startup output is discarded afterwards.
pub fn read_banner(channel: &mut dyn ByteChannel, settings: &SerialSettings) -> Result<String> {
    let deadline = Instant::now() + settings.connect_timeout();
    let mut lines = Vec::new();

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            tracing::warn!("No banner from {} before connect timeout", channel.name());
            break;
        }

        let line = channel.read_line(remaining.min(settings.timeout()))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        tracing::debug!("Banner: {}", line);
        let lower = line.to_ascii_lowercase();
        lines.push(line.to_string());
        if lower.starts_with("grbl") || lower.contains("ready") {
            break;
        }
    }

    std::thread::sleep(BANNER_SETTLE);
    drain(channel, DRAIN_PAUSE)?;
    Ok(lines.join("\n"))
}

/// Streams programs to one controller over an exclusively owned channel
pub struct GcodeStreamer {
    settings: SerialSettings,
    channel: Option<Box<dyn ByteChannel>>,
    owns_channel: bool,
    stop: StopHandle,
}

impl std::fmt::Debug for GcodeStreamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcodeStreamer")
            .field("port", &self.settings.port)
            .field("connected", &self.channel.is_some())
            .field("owns_channel", &self.owns_channel)
            .finish()
    }
}

impl GcodeStreamer {
    /// Create a disconnected streamer for the configured port
    pub fn new(settings: &SerialSettings) -> Self {
        Self {
            settings: settings.clone(),
            channel: None,
            owns_channel: false,
            stop: StopHandle::default(),
        }
    }

    /// Create a streamer over an already open channel
    ///
    /// The channel is used as is: `connect` does not read a banner from it and
    /// `close` detaches it without closing it.
    pub fn with_channel(settings: &SerialSettings, channel: Box<dyn ByteChannel>) -> Self {
        Self {
            settings: settings.clone(),
            channel: Some(channel),
            owns_channel: false,
            stop: StopHandle::default(),
        }
    }

    /// Create a streamer and connect it to the configured port
    pub fn open(settings: &SerialSettings) -> Result<Self> {
        let mut streamer = Self::new(settings);
        let banner = streamer.connect()?;
        if !banner.is_empty() {
            tracing::info!("Controller: {}", banner.replace('\n', " | "));
        }
        Ok(streamer)
    }

    /// Open the serial port and read the startup banner
    ///
    /// Returns the banner lines joined by `\n`, or an empty string when a
    /// channel is already attached.
    pub fn connect(&mut self) -> Result<String> {
        if self.channel.is_some() {
            return Ok(String::new());
        }

        let mut port = RealSerialPort::open(&self.settings)?;
        let banner = read_banner(&mut port, &self.settings)?;
        self.channel = Some(Box::new(port));
        self.owns_channel = true;
        Ok(banner)
    }

    /// Release the channel, closing it when this streamer opened it
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut channel) = self.channel.take() {
            if self.owns_channel {
                channel.close()?;
            } else {
                tracing::debug!("Detached injected channel {}", channel.name());
            }
        }
        self.owns_channel = false;
        Ok(())
    }

    /// Whether a channel is attached
    pub fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    /// Handle that aborts a running `stream` from another thread or a callback
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    fn channel(&mut self) -> Result<&mut Box<dyn ByteChannel>> {
        Ok(self.channel.as_mut().ok_or(ConnectionError::NotConnected)?)
    }

    /// Send a real-time command byte
    pub fn send_realtime(&mut self, command: RealtimeCommand) -> Result<()> {
        let channel = self.channel()?;
        channel.write(&[command.as_byte()])?;
        tracing::debug!("Sent realtime {:?} to {}", command, channel.name());
        Ok(())
    }

    /// Pause motion
    pub fn feed_hold(&mut self) -> Result<()> {
        self.send_realtime(RealtimeCommand::FeedHold)
    }

    /// Resume after a feed hold
    pub fn cycle_resume(&mut self) -> Result<()> {
        self.send_realtime(RealtimeCommand::CycleResume)
    }

    /// Reset the controller
    pub fn soft_reset(&mut self) -> Result<()> {
        tracing::info!("Sending soft reset");
        self.send_realtime(RealtimeCommand::SoftReset)
    }

    /// Request one status report
    ///
    /// Returns `None` when no `<...>` report arrives within the per-read timeout.
    pub fn query_status(&mut self) -> Result<Option<String>> {
        let timeout = self.settings.timeout();
        let channel = self.channel()?;
        drain(&mut **channel, Duration::ZERO)?;
        channel.write(&[RealtimeCommand::StatusQuery.as_byte()])?;

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::warn!("No status report from {}", channel.name());
                return Ok(None);
            }
            if let ControllerResponse::Status(report) =
                ControllerResponse::classify(&channel.read_line(remaining)?)
            {
                return Ok(Some(report));
            }
        }
    }

    /// Stream comment-free program lines with character-counting flow control
    ///
    /// `progress` receives `(acknowledged, total)` after every `ok` or `error:`.
    /// Controller errors are collected and streaming goes on; an alarm or the
    /// stop handle ends the stream early. Transport failures, and a line that
    /// could never fit in the receive buffer, are returned as `Err` before
    /// anything is written.
    pub fn stream<S: AsRef<str>>(
        &mut self,
        lines: &[S],
        mut progress: Option<ProgressFn<'_>>,
    ) -> Result<StreamResult> {
        let capacity = self.settings.rx_buffer_size;
        let timeout = self.settings.timeout();
        let stop = self.stop.clone();
        let channel = self.channel()?;
        stop.reset();

        if let Some((index, len)) = lines
            .iter()
            .map(|line| line.as_ref().len() + 1)
            .enumerate()
            .find(|&(_, len)| len >= capacity)
        {
            tracing::error!(
                "Line {} is {} bytes, too long for the {} byte receive buffer",
                index + 1,
                len,
                capacity
            );
            return Err(ConnectionError::LineTooLong {
                line: index + 1,
                len,
                capacity,
            }
            .into());
        }

        let started = Instant::now();
        let total = lines.len();
        let mut result = StreamResult::default();
        let mut window = FlowWindow::default();
        let mut next = 0;
        let mut ack_count = 0;
        let mut state = StreamState::Filling;

        tracing::info!("Streaming {} lines to {}", total, channel.name());

        loop {
            state = match state {
                StreamState::Filling => {
                    while next < total {
                        let line = lines[next].as_ref();
                        let len = line.len() + 1;
                        if !window.fits(len, capacity) {
                            break;
                        }

                        let mut data = Vec::with_capacity(len);
                        data.extend_from_slice(line.as_bytes());
                        data.push(b'\n');
                        channel.write(&data)?;
                        tracing::debug!("> {}", line);
                        window.push(len);
                        next += 1;
                    }

                    if ack_count >= total {
                        StreamState::Completed
                    } else {
                        StreamState::AwaitingAck
                    }
                }
                StreamState::AwaitingAck => {
                    if stop.is_stopped() {
                        tracing::info!("Stream stopped after {} of {} lines", ack_count, total);
                        result.cancelled = true;
                        StreamState::Aborted
                    } else {
                        let line = channel.read_line(timeout)?;
                        let response = ControllerResponse::classify(&line);
                        match response {
                            ControllerResponse::Empty => {
                                if next >= total && window.is_empty() {
                                    StreamState::Completed
                                } else {
                                    StreamState::AwaitingAck
                                }
                            }
                            ControllerResponse::Ok | ControllerResponse::Error(_) => {
                                if !window.pop() {
                                    tracing::warn!("Acknowledgement with no line in flight");
                                }
                                ack_count += 1;

                                if let ControllerResponse::Error(ref text) = response {
                                    tracing::warn!(
                                        "Line {} rejected: {} ({})",
                                        ack_count,
                                        text,
                                        response.describe().unwrap_or_default()
                                    );
                                    result.errors.push(format!("line {}: {}", ack_count, text));
                                } else {
                                    tracing::debug!("< ok");
                                }

                                if let Some(progress) = progress.as_deref_mut() {
                                    progress(ack_count, total);
                                }
                                StreamState::Filling
                            }
                            ControllerResponse::Alarm(ref text) => {
                                tracing::error!(
                                    "Controller alarm after line {}: {} ({})",
                                    ack_count,
                                    text,
                                    response.describe().unwrap_or_default()
                                );
                                result
                                    .errors
                                    .push(format!("ALARM at line {}: {}", ack_count, text));
                                result.alarm = Some(text.clone());
                                StreamState::Aborted
                            }
                            ControllerResponse::Status(ref report) => {
                                tracing::trace!("< {}", report);
                                StreamState::AwaitingAck
                            }
                            ControllerResponse::Message(ref message) => {
                                tracing::debug!("< {}", message);
                                StreamState::AwaitingAck
                            }
                        }
                    }
                }
                StreamState::Completed | StreamState::Aborted => break,
            };
        }

        result.lines_sent = ack_count;
        result.unacknowledged = window.len();
        result.elapsed = started.elapsed();
        result.completed = ack_count >= total && result.alarm.is_none() && !result.cancelled;

        if result.completed {
            tracing::info!(
                "Streamed {} lines in {:.1}s with {} errors",
                ack_count,
                result.elapsed.as_secs_f64(),
                result.errors.len()
            );
        }
        Ok(result)
    }
}

impl Drop for GcodeStreamer {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("Failed to close channel: {}", e);
        }
    }
}

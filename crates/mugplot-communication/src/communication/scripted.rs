//! In-memory controller double
//!
//! Plays back scripted response lines, or acknowledges every written line
//! with `ok` when no script is given. Clones share state, so a test can keep
//! one handle while the streamer owns another and inspect the traffic later.

use super::channel::ByteChannel;
use mugplot_core::{ConnectionError, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct ScriptState {
    scripted: bool,
    responses: VecDeque<String>,
    pending_input: Vec<u8>,
    written: Vec<Vec<u8>>,
    unanswered: VecDeque<usize>,
    in_flight: usize,
    peak_in_flight: usize,
    closed: bool,
}

impl ScriptState {
    fn record_write(&mut self, data: &[u8]) {
        self.written.push(data.to_vec());
        if data.ends_with(b"\n") {
            self.unanswered.push_back(data.len());
            self.in_flight += data.len();
            self.peak_in_flight = self.peak_in_flight.max(self.in_flight);
        }
    }

    fn record_response(&mut self, line: &str) {
        let line = line.trim();
        if line == "ok" || line.starts_with("error:") {
            if let Some(len) = self.unanswered.pop_front() {
                self.in_flight -= len;
            }
        }
    }

    fn next_response(&mut self) -> Option<String> {
        if self.scripted {
            self.responses.pop_front()
        } else if !self.unanswered.is_empty() {
            Some("ok".to_string())
        } else {
            None
        }
    }
}

/// Scripted byte channel for tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct ScriptedChannel {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedChannel {
    /// Channel answering every line with `ok`
    pub fn new() -> Self {
        Self::default()
    }

    /// Channel returning the given lines in order, then timing out
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let state = ScriptState {
            scripted: true,
            responses: responses.into_iter().map(Into::into).collect(),
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Queue raw bytes reported by `bytes_available`, e.g. a stale response
    pub fn push_input(&self, data: &[u8]) {
        self.state.lock().pending_input.extend_from_slice(data);
    }

    /// Every write in order
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.state.lock().written.clone()
    }

    /// Newline-terminated writes as text, terminator removed
    pub fn written_lines(&self) -> Vec<String> {
        self.state
            .lock()
            .written
            .iter()
            .filter(|w| w.ends_with(b"\n"))
            .map(|w| String::from_utf8_lossy(&w[..w.len() - 1]).into_owned())
            .collect()
    }

    /// Largest number of unacknowledged line bytes seen at once
    pub fn peak_in_flight(&self) -> usize {
        self.state.lock().peak_in_flight
    }

    /// Scripted responses not yet consumed
    pub fn remaining_responses(&self) -> usize {
        self.state.lock().responses.len()
    }

    /// Whether `close` was called
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl ByteChannel for ScriptedChannel {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(ConnectionError::NotConnected.into());
        }
        state.record_write(data);
        Ok(data.len())
    }

    fn read_line(&mut self, _timeout: Duration) -> Result<String> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(ConnectionError::NotConnected.into());
        }
        match state.next_response() {
            Some(line) => {
                state.record_response(&line);
                Ok(line)
            }
            None => Ok(String::new()),
        }
    }

    fn bytes_available(&mut self) -> Result<usize> {
        Ok(self.state.lock().pending_input.len())
    }

    fn read_available(&mut self) -> Result<Vec<u8>> {
        Ok(std::mem::take(&mut self.state.lock().pending_input))
    }

    fn close(&mut self) -> Result<()> {
        self.state.lock().closed = true;
        Ok(())
    }

    fn name(&self) -> String {
        "scripted".to_string()
    }
}

//! Byte channel abstraction
//!
//! The streamer only needs line-oriented reads with a timeout, raw writes and
//! a way to discard pending input. Anything providing those can carry a
//! program: a serial port, or an in-memory double under test.

use mugplot_core::Result;
use std::time::Duration;

/// Bidirectional byte link to a controller
pub trait ByteChannel: Send {
    /// Write bytes, returning how many were written
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Read one line without its terminator
    ///
    /// Returns an empty string when no complete line arrives within `timeout`.
    fn read_line(&mut self, timeout: Duration) -> Result<String>;

    /// Number of received bytes ready to read without blocking
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read everything currently received
    fn read_available(&mut self) -> Result<Vec<u8>>;

    /// Release the underlying link
    fn close(&mut self) -> Result<()>;

    /// Display name of the link
    fn name(&self) -> String;
}

/// Read and discard pending input until none is left
///
/// Waits `pause` between reads so trailing bytes still on the wire are caught.
/// Returns the number of bytes discarded.
pub fn drain(channel: &mut dyn ByteChannel, pause: Duration) -> Result<usize> {
    let mut discarded = 0;
    while channel.bytes_available()? > 0 {
        discarded += channel.read_available()?.len();
        if !pause.is_zero() {
            std::thread::sleep(pause);
        }
    }
    if discarded > 0 {
        tracing::debug!("Drained {} bytes from {}", discarded, channel.name());
    }
    Ok(discarded)
}

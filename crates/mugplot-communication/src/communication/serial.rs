//! Serial port channel
//!
//! Blocking serial I/O through the `serialport` crate. Incoming bytes are
//! buffered until a newline so that a line split across reads is returned
//! whole; a partial line left at a timeout is kept for the next call.

use super::channel::ByteChannel;
use mugplot_core::{ConnectionError, Error, Result};
use mugplot_settings::SerialSettings;
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

/// Shortest timeout handed to a single port read
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// Real serial port implementation using serialport crate
pub struct RealSerialPort {
    port: Option<Box<dyn serialport::SerialPort>>,
    name: String,
    pending: Vec<u8>,
}

impl std::fmt::Debug for RealSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealSerialPort")
            .field("name", &self.name)
            .field("open", &self.port.is_some())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl RealSerialPort {
    /// Open the configured serial port
    pub fn open(settings: &SerialSettings) -> Result<Self> {
        let port = serialport::new(&settings.port, settings.baud_rate)
            .timeout(settings.timeout())
            .open()
            .map_err(|e| {
                tracing::error!("Failed to open serial port {}: {}", settings.port, e);
                ConnectionError::FailedToOpen {
                    port: settings.port.clone(),
                    reason: e.to_string(),
                }
            })?;

        tracing::info!(
            "Opened serial port {} at {} baud",
            settings.port,
            settings.baud_rate
        );
        Ok(Self {
            port: Some(port),
            name: settings.port.clone(),
            pending: Vec::new(),
        })
    }

    fn port(&mut self) -> Result<&mut Box<dyn serialport::SerialPort>> {
        self.port
            .as_mut()
            .ok_or(Error::Connection(ConnectionError::NotConnected))
    }

    /// Take the first complete line out of the pending buffer
    fn take_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.pending.drain(..=end).collect();
        Some(
            String::from_utf8_lossy(&line)
                .trim_end_matches(['\r', '\n'])
                .to_string(),
        )
    }
}

fn io_error(e: impl std::fmt::Display) -> Error {
    Error::Connection(ConnectionError::Io {
        reason: e.to_string(),
    })
}

impl ByteChannel for RealSerialPort {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let port = self.port()?;
        port.write_all(data).map_err(io_error)?;
        port.flush().map_err(io_error)?;
        Ok(data.len())
    }

    fn read_line(&mut self, timeout: Duration) -> Result<String> {
        let deadline = Instant::now() + timeout;
        let mut buf = [0u8; 256];

        loop {
            if let Some(line) = self.take_line() {
                return Ok(line);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(String::new());
            }

            let port = self.port()?;
            port.set_timeout(remaining.max(MIN_READ_TIMEOUT))
                .map_err(io_error)?;
            match port.read(&mut buf) {
                Ok(0) => {}
                Ok(n) => self.pending.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::error!("Serial read failed on {}: {}", self.name, e);
                    return Err(io_error(e));
                }
            }
        }
    }

    fn bytes_available(&mut self) -> Result<usize> {
        let pending = self.pending.len();
        let waiting = self.port()?.bytes_to_read().map_err(io_error)?;
        Ok(pending + waiting as usize)
    }

    fn read_available(&mut self) -> Result<Vec<u8>> {
        let mut data = std::mem::take(&mut self.pending);
        let port = self.port()?;
        let waiting = port.bytes_to_read().map_err(io_error)? as usize;
        if waiting > 0 {
            let mut buf = vec![0u8; waiting];
            let n = port.read(&mut buf).map_err(io_error)?;
            data.extend_from_slice(&buf[..n]);
        }
        Ok(data)
    }

    fn close(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            self.pending.clear();
            tracing::info!("Closed serial port {}", self.name);
        }
        Ok(())
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

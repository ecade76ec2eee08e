//! # mugplot Communication
//!
//! Delivers G-code programs to FluidNC/Grbl controllers over a serial link.
//!
//! - **Channels**: the [`ByteChannel`] seam with a real serial port and an
//!   in-memory scripted double
//! - **Firmware**: controller response classification and code descriptions
//! - **Streamer**: character-counting flow control, real-time commands and
//!   status queries
//! - **Program**: loading program files with comments removed

pub mod communication;
pub mod firmware;
pub mod program;
pub mod streamer;

pub use communication::{ByteChannel, RealSerialPort, ScriptedChannel};
pub use firmware::grbl::{decode_alarm, decode_error, ControllerResponse};
pub use program::{load_gcode, strip_comments};
pub use streamer::{
    read_banner, GcodeStreamer, RealtimeCommand, StopHandle, StreamResult, StreamState,
};

//! Byte channels to the controller

pub mod channel;
pub mod scripted;
pub mod serial;

pub use channel::ByteChannel;
pub use scripted::ScriptedChannel;
pub use serial::RealSerialPort;

//! mugplot Settings Crate
//!
//! Handles the machine profile and serial link configuration.

pub mod config;

pub use config::{Config, MachineSettings, SerialSettings};

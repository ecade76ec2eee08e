//! Configuration for mugplot
//!
//! Configuration is organized into two sections:
//! - Machine profile (bed geometry, pen heights, feed rates, curve tolerance)
//! - Serial link (port, baud rate, controller receive buffer, timeouts)
//!
//! Files may be TOML or JSON. Every field has a default, so a partial file
//! only overrides what it names.

use mugplot_core::{ConfigError, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Machine profile
///
/// Immutable for the duration of a conversion. Coordinates are millimetres,
/// feed rates are mm/min.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineSettings {
    /// Drawable width along X
    pub bed_width: f64,
    /// Drawable height along Y
    pub bed_height: f64,
    /// Machine X of the drawing origin
    pub origin_x: f64,
    /// Machine Y of the drawing origin
    pub origin_y: f64,
    /// Flip the vertical axis relative to the SVG
    pub flip_y: bool,
    /// Z height with the pen lifted
    pub z_pen_up: f64,
    /// Z height with the pen touching the surface
    pub z_pen_down: f64,
    /// Feed rate for pen lift and lower moves
    pub z_travel_speed: f64,
    /// Feed rate while drawing
    pub draw_speed: f64,
    /// Feed rate for rapid travel between paths
    pub travel_speed: f64,
    /// Maximum chord deviation when flattening curves
    pub curve_tolerance: f64,
    /// Emit a homing cycle at program start
    pub home_on_start: bool,
    /// Calibrated dock Y, if any
    pub dock_y: Option<f64>,
    /// Calibrated dock Z, if any
    pub dock_z: Option<f64>,
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            bed_width: 205.0,
            bed_height: 73.0,
            origin_x: 0.0,
            origin_y: 10.0,
            flip_y: false,
            z_pen_up: -6.0,
            z_pen_down: -8.0,
            z_travel_speed: 300.0,
            draw_speed: 800.0,
            travel_speed: 2000.0,
            curve_tolerance: 0.1,
            home_on_start: true,
            dock_y: None,
            dock_z: None,
        }
    }
}

impl MachineSettings {
    /// Validate the profile invariants
    pub fn validate(&self) -> Result<()> {
        if !(self.bed_width > 0.0) {
            return Err(Error::invalid_setting("machine.bed_width", "must be > 0"));
        }
        if !(self.bed_height > 0.0) {
            return Err(Error::invalid_setting("machine.bed_height", "must be > 0"));
        }
        if !(self.curve_tolerance > 0.0) {
            return Err(Error::invalid_setting(
                "machine.curve_tolerance",
                "must be > 0",
            ));
        }

        for (key, value) in [
            ("machine.z_travel_speed", self.z_travel_speed),
            ("machine.draw_speed", self.draw_speed),
            ("machine.travel_speed", self.travel_speed),
        ] {
            if !(value > 0.0) {
                return Err(Error::invalid_setting(key, "feed rate must be > 0"));
            }
        }

        for (key, value) in [
            ("machine.origin_x", self.origin_x),
            ("machine.origin_y", self.origin_y),
            ("machine.z_pen_up", self.z_pen_up),
            ("machine.z_pen_down", self.z_pen_down),
        ] {
            if !value.is_finite() {
                return Err(Error::invalid_setting(key, "must be a finite number"));
            }
        }

        Ok(())
    }
}

/// Serial link settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Controller receive buffer capacity in bytes
    pub rx_buffer_size: usize,
    /// Per-read timeout in milliseconds
    pub timeout_ms: u64,
    /// Time allowed for the startup banner in milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115200,
            rx_buffer_size: 128,
            timeout_ms: 2000,
            connect_timeout_ms: 10000,
        }
    }
}

impl SerialSettings {
    /// Per-read timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Startup banner timeout
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Validate the serial settings
    pub fn validate(&self) -> Result<()> {
        if self.port.trim().is_empty() {
            return Err(Error::invalid_setting("serial.port", "must not be empty"));
        }
        if self.baud_rate == 0 {
            return Err(Error::invalid_setting("serial.baud_rate", "must be > 0"));
        }
        if self.rx_buffer_size == 0 {
            return Err(Error::invalid_setting("serial.rx_buffer_size", "must be > 0"));
        }
        if self.timeout_ms == 0 {
            return Err(Error::invalid_setting("serial.timeout_ms", "must be > 0"));
        }
        if self.connect_timeout_ms == 0 {
            return Err(Error::invalid_setting(
                "serial.connect_timeout_ms",
                "must be > 0",
            ));
        }
        Ok(())
    }
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Machine profile
    pub machine: MachineSettings,
    /// Serial link
    pub serial: SerialSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location, `<config_dir>/mugplot/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mugplot").join("config.toml"))
    }

    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the default location is used
    /// when present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.display().to_string()).into());
                }
                Self::load_from_file(path)
            }
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::load_from_file(&path),
                None => {
                    tracing::debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let parse_error = |reason: String| ConfigError::Parse {
            path: path.display().to_string(),
            reason,
        };

        let config: Self = match extension(path).as_deref() {
            Some("json") => {
                serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?
            }
            Some("toml") => toml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
            _ => {
                return Err(ConfigError::UnsupportedFormat(path.display().to_string()).into())
            }
        };

        config.validate()?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = match extension(path).as_deref() {
            Some("json") => serde_json::to_string_pretty(self)
                .map_err(|e| Error::other(format!("Failed to serialize config: {}", e)))?,
            Some("toml") => toml::to_string_pretty(self)
                .map_err(|e| Error::other(format!("Failed to serialize config: {}", e)))?,
            _ => {
                return Err(ConfigError::UnsupportedFormat(path.display().to_string()).into())
            }
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.machine.validate()?;
        self.serial.validate()
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

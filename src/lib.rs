//! # mugplot
//!
//! Draws SVG line art on a mug with a FluidNC/Grbl pen plotter.
//!
//! ## Architecture
//!
//! mugplot is organized as a workspace with multiple crates:
//!
//! 1. **mugplot-core** - Error types and shared aliases
//! 2. **mugplot-settings** - Machine profile and serial settings
//! 3. **mugplot-camtools** - SVG import, curve linearization, G-code emission, envelope check
//! 4. **mugplot-communication** - Serial channels and character-counting streaming
//! 5. **mugplot** - Command-line binary that integrates all crates

pub mod cli;

pub use mugplot_camtools::{
    convert_file, svg_to_gcode, Document, EnvelopeValidator, SvgImporter, ToolpathGenerator,
};
pub use mugplot_communication::{
    load_gcode, strip_comments, ByteChannel, GcodeStreamer, RealSerialPort, ScriptedChannel,
    StopHandle, StreamResult,
};
pub use mugplot_core::{Error, Result};
pub use mugplot_settings::{Config, MachineSettings, SerialSettings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Log lines go to stderr so that program output on stdout stays clean.
/// `RUST_LOG` overrides the default `info` level.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

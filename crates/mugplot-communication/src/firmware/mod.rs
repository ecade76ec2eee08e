//! Controller firmware protocol support
//!
//! FluidNC speaks the Grbl line protocol, so one implementation serves both.

pub mod grbl;

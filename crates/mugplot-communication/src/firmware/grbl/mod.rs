//! Grbl line protocol

pub mod error_decoder;
pub mod response_parser;

pub use error_decoder::{decode_alarm, decode_error};
pub use response_parser::ControllerResponse;

//! Controller response classification
//!
//! Every line the controller sends while a program streams falls into one of
//! a few kinds. Only `ok` and `error:` acknowledge a line; an alarm ends the
//! stream; status reports and messages are informational.

use super::error_decoder::{decode_alarm, decode_error};
use std::fmt;

/// Classified controller response line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerResponse {
    /// No line arrived before the read timeout
    Empty,
    /// Line accepted
    Ok,
    /// Line rejected; streaming continues
    Error(String),
    /// Controller halted
    Alarm(String),
    /// `<...>` status report
    Status(String),
    /// Anything else, e.g. `[MSG:...]` or a startup banner
    Message(String),
}

impl ControllerResponse {
    /// Classify one received line
    pub fn classify(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        if line == "ok" {
            return Self::Ok;
        }

        let lower = line.to_ascii_lowercase();
        if lower.starts_with("error:") {
            Self::Error(line.to_string())
        } else if lower.starts_with("alarm:") {
            Self::Alarm(line.to_string())
        } else if line.starts_with('<') && line.ends_with('>') {
            Self::Status(line.to_string())
        } else {
            Self::Message(line.to_string())
        }
    }

    /// Numeric code of an error or alarm, if present
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Error(line) | Self::Alarm(line) => line
                .split_once(':')
                .and_then(|(_, code)| code.trim().parse().ok()),
            _ => None,
        }
    }

    /// Whether this response acknowledges a sent line
    pub fn is_acknowledgement(&self) -> bool {
        matches!(self, Self::Ok | Self::Error(_))
    }

    /// Human readable description of an error or alarm code
    pub fn describe(&self) -> Option<String> {
        let code = self.code()?;
        match self {
            Self::Error(_) => Some(decode_error(code)),
            Self::Alarm(_) => Some(decode_alarm(code)),
            _ => None,
        }
    }
}

impl fmt::Display for ControllerResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, ""),
            Self::Ok => write!(f, "ok"),
            Self::Error(line) | Self::Alarm(line) | Self::Status(line) | Self::Message(line) => {
                write!(f, "{}", line)
            }
        }
    }
}

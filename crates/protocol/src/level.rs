//! Severity levels
//!
//! Levels are ordered from most to least severe. A sink configured at a
//! level accepts every message at that level or more severe, so the
//! comparison `message.level() <= sink.level()` decides delivery.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ProtocolError;

/// Log severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Level {
    /// Unrecoverable; the facade terminates the process after dispatch
    Panic = 0,
    /// Fatal error; the facade exits after dispatch
    Fatal = 1,
    /// Error condition
    Error = 2,
    /// Warning
    Warn = 3,
    /// Normal operation
    Info = 4,
    /// More detail than info
    Verbose = 5,
    /// Debugging detail (suppressed in release mode)
    #[default]
    Debug = 6,
    /// Finest detail, carries call-site info (suppressed in release mode)
    Trace = 7,
}

impl Level {
    /// All levels, most severe first
    pub const ALL: [Level; 8] = [
        Self::Panic,
        Self::Fatal,
        Self::Error,
        Self::Warn,
        Self::Info,
        Self::Verbose,
        Self::Debug,
        Self::Trace,
    ];

    /// Parse from raw byte value
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Panic),
            1 => Some(Self::Fatal),
            2 => Some(Self::Error),
            3 => Some(Self::Warn),
            4 => Some(Self::Info),
            5 => Some(Self::Verbose),
            6 => Some(Self::Debug),
            7 => Some(Self::Trace),
            _ => None,
        }
    }

    /// Raw byte value
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Display name ("Info")
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Panic => "Panic",
            Self::Fatal => "Fatal",
            Self::Error => "Error",
            Self::Warn => "Warn",
            Self::Info => "Info",
            Self::Verbose => "Verbose",
            Self::Debug => "Debug",
            Self::Trace => "Trace",
        }
    }

    /// Short bracketed tag used by the text formatter ("[I]")
    #[inline]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Panic => "[P]",
            Self::Fatal => "[F]",
            Self::Error => "[E]",
            Self::Warn => "[W]",
            Self::Info => "[I]",
            Self::Verbose => "[V]",
            Self::Debug => "[D]",
            Self::Trace => "[T]",
        }
    }

    /// Whether a sink configured at `self` accepts a message at `message`
    #[inline]
    pub fn accepts(self, message: Level) -> bool {
        message <= self
    }

    /// Debug and Trace are development-only levels
    #[inline]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Debug | Self::Trace)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "panic" => Ok(Self::Panic),
            "fatal" => Ok(Self::Fatal),
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "verbose" => Ok(Self::Verbose),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(ProtocolError::invalid_level(s)),
        }
    }
}

impl TryFrom<u8> for Level {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, ProtocolError> {
        Self::from_u8(value).ok_or(ProtocolError::InvalidLevelValue(value))
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

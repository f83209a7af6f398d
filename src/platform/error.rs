//! Platform error types
//!
//! This module defines error types for storage medium operations.

use core::fmt;

/// Result type for platform operations
pub type Result<T> = core::result::Result<T, PlatformError>;

/// Platform-level errors
///
/// All storage implementations map their medium-specific errors to these
/// variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformError {
    /// Flash operation failed
    Flash(FlashError),
    /// Invalid configuration provided
    InvalidConfig,
    /// Resource not available
    ResourceUnavailable,
}

/// Flash-specific errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashError {
    /// Erase operation failed
    EraseFailed,
    /// Write operation failed
    WriteFailed,
    /// Read operation failed
    ReadFailed,
    /// Invalid address (out of bounds, protected or unaligned)
    InvalidAddress,
    /// Flash is busy
    Busy,
}

impl FlashError {
    /// Short identifier used in logs
    pub const fn as_str(&self) -> &'static str {
        match self {
            FlashError::EraseFailed => "erase failed",
            FlashError::WriteFailed => "write failed",
            FlashError::ReadFailed => "read failed",
            FlashError::InvalidAddress => "invalid address",
            FlashError::Busy => "busy",
        }
    }
}

impl PlatformError {
    /// Short identifier used in logs
    pub const fn as_str(&self) -> &'static str {
        match self {
            PlatformError::Flash(e) => e.as_str(),
            PlatformError::InvalidConfig => "invalid configuration",
            PlatformError::ResourceUnavailable => "resource not available",
        }
    }
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::Flash(e) => write!(f, "Flash error: {}", e.as_str()),
            PlatformError::InvalidConfig => write!(f, "Invalid configuration"),
            PlatformError::ResourceUnavailable => write!(f, "Resource not available"),
        }
    }
}

impl From<FlashError> for PlatformError {
    fn from(error: FlashError) -> Self {
        PlatformError::Flash(error)
    }
}

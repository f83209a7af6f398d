//! Parameter error types
//!
//! Provides error types for registry, validation and record decoding.

/// Errors from registry and validator operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterError {
    /// No parameter with this name is registered
    UnknownName,
    /// A different descriptor is already registered under this name
    DuplicateName,
    /// Name is empty, longer than `PARAM_NAME_LEN` or not printable ASCII
    InvalidName,
    /// Descriptor is inconsistent (default outside bounds, min > max, non-finite default)
    InvalidDescriptor,
    /// Registry capacity exhausted
    RegistryFull,
    /// Value type does not match the declared parameter type
    TypeMismatch,
    /// Value outside declared bounds, non-finite, or outside the 32-bit range
    OutOfBounds,
    /// Parameter cannot be modified at runtime
    ReadOnly,
}

impl ParameterError {
    /// Short identifier used in logs and shell responses
    pub const fn as_str(&self) -> &'static str {
        match self {
            ParameterError::UnknownName => "unknown name",
            ParameterError::DuplicateName => "duplicate name",
            ParameterError::InvalidName => "invalid name",
            ParameterError::InvalidDescriptor => "invalid descriptor",
            ParameterError::RegistryFull => "registry full",
            ParameterError::TypeMismatch => "type mismatch",
            ParameterError::OutOfBounds => "out of bounds",
            ParameterError::ReadOnly => "read-only",
        }
    }
}

impl core::fmt::Display for ParameterError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from decoding the persisted record format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordError {
    /// Buffer shorter than the structure being decoded
    Truncated,
    /// Store does not start with the expected magic
    BadMagic,
    /// Format version this reader cannot interpret at all
    UnsupportedVersion,
    /// Header or record length smaller than the minimum layout
    BadLayout,
    /// Record name is not valid UTF-8 or does not fit `PARAM_NAME_LEN`
    InvalidName,
    /// Record set does not fit the output buffer or slot
    Overflow,
}

impl core::fmt::Display for RecordError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RecordError::Truncated => write!(f, "record truncated"),
            RecordError::BadMagic => write!(f, "bad store magic"),
            RecordError::UnsupportedVersion => write!(f, "unsupported store version"),
            RecordError::BadLayout => write!(f, "bad store layout"),
            RecordError::InvalidName => write!(f, "invalid record name"),
            RecordError::Overflow => write!(f, "record set overflow"),
        }
    }
}

/// Why a persisted record was not applied at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Parameter was renamed or removed from the manifest
    UnknownName,
    /// Stored type differs from the declared type
    TypeMismatch,
    /// Stored value violates the current bounds
    OutOfBounds,
    /// Parameter is read-only
    ReadOnly,
    /// Type tag is not known to this version
    UnknownType,
    /// Record bytes could not be decoded
    CorruptRecord,
}

impl DropReason {
    /// Short identifier used in logs
    pub const fn as_str(&self) -> &'static str {
        match self {
            DropReason::UnknownName => "unknown name",
            DropReason::TypeMismatch => "type mismatch",
            DropReason::OutOfBounds => "out of bounds",
            DropReason::ReadOnly => "read-only",
            DropReason::UnknownType => "unknown type tag",
            DropReason::CorruptRecord => "corrupt record",
        }
    }
}

impl From<ParameterError> for DropReason {
    fn from(err: ParameterError) -> Self {
        match err {
            ParameterError::TypeMismatch => DropReason::TypeMismatch,
            ParameterError::OutOfBounds => DropReason::OutOfBounds,
            ParameterError::ReadOnly => DropReason::ReadOnly,
            ParameterError::UnknownName | ParameterError::InvalidName => DropReason::UnknownName,
            _ => DropReason::CorruptRecord,
        }
    }
}

impl From<RecordError> for DropReason {
    fn from(_: RecordError) -> Self {
        DropReason::CorruptRecord
    }
}

impl core::fmt::Display for DropReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_reason_from_parameter_error() {
        assert_eq!(
            DropReason::from(ParameterError::OutOfBounds),
            DropReason::OutOfBounds
        );
        assert_eq!(
            DropReason::from(ParameterError::TypeMismatch),
            DropReason::TypeMismatch
        );
        assert_eq!(
            DropReason::from(ParameterError::UnknownName),
            DropReason::UnknownName
        );
        assert_eq!(
            DropReason::from(RecordError::InvalidName),
            DropReason::CorruptRecord
        );
    }
}

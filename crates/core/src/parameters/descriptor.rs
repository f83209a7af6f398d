//! Parameter descriptors
//!
//! A descriptor is the immutable declaration of a parameter: name, type,
//! default, bounds and documentation. Descriptors are built with `const fn`
//! constructors so a manifest can be a plain `const` table.
//!
//! # Example
//!
//! ```
//! use mpc_params_core::parameters::ParamDescriptor;
//!
//! const THR_MIN: ParamDescriptor =
//!     ParamDescriptor::new_float("MPC_THR_MIN", 0.1, Some(0.0), Some(1.0))
//!         .with_unit("norm")
//!         .with_group("Multicopter Position Control")
//!         .with_description("Minimum thrust", "Minimum vertical thrust");
//!
//! assert!(THR_MIN.check().is_ok());
//! ```

use super::error::ParameterError;
use super::value::{ParamType, ParamValue};
use bitflags::bitflags;
use heapless::String;

/// Maximum parameter name length in bytes (MAVLink param_id width)
pub const PARAM_NAME_LEN: usize = 16;

/// Fixed-capacity parameter name
pub type ParamName = String<PARAM_NAME_LEN>;

bitflags! {
    /// Parameter flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ParamFlags: u8 {
        /// Excluded from operator listings
        const HIDDEN = 0b0000_0001;
        /// Rejects runtime writes
        const READ_ONLY = 0b0000_0010;
    }
}

/// Type, default and bounds, kept together so bounds always match the type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    /// 32-bit float with optional inclusive bounds
    Float {
        default: f32,
        min: Option<f32>,
        max: Option<f32>,
    },
    /// 32-bit signed integer with optional inclusive bounds
    Int32 {
        default: i32,
        min: Option<i32>,
        max: Option<i32>,
    },
}

impl ParamKind {
    /// Declared type
    pub const fn param_type(&self) -> ParamType {
        match self {
            ParamKind::Float { .. } => ParamType::Float,
            ParamKind::Int32 { .. } => ParamType::Int32,
        }
    }

    /// Declared default
    pub const fn default_value(&self) -> ParamValue {
        match self {
            ParamKind::Float { default, .. } => ParamValue::Float(*default),
            ParamKind::Int32 { default, .. } => ParamValue::Int32(*default),
        }
    }
}

/// Immutable parameter declaration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Stable name (at most `PARAM_NAME_LEN` bytes)
    pub name: &'static str,
    /// Type, default and bounds
    pub kind: ParamKind,
    /// Unit string (empty when dimensionless)
    pub unit: &'static str,
    /// Group tag used for listing
    pub group: &'static str,
    /// One-line description
    pub short_desc: &'static str,
    /// Extended description
    pub long_desc: &'static str,
    /// Access flags
    pub flags: ParamFlags,
}

impl ParamDescriptor {
    /// Declare a float parameter
    pub const fn new_float(
        name: &'static str,
        default: f32,
        min: Option<f32>,
        max: Option<f32>,
    ) -> Self {
        Self::with_kind(name, ParamKind::Float { default, min, max })
    }

    /// Declare an int32 parameter
    pub const fn new_int32(
        name: &'static str,
        default: i32,
        min: Option<i32>,
        max: Option<i32>,
    ) -> Self {
        Self::with_kind(name, ParamKind::Int32 { default, min, max })
    }

    const fn with_kind(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            unit: "",
            group: "",
            short_desc: "",
            long_desc: "",
            flags: ParamFlags::empty(),
        }
    }

    /// Set the unit string
    pub const fn with_unit(self, unit: &'static str) -> Self {
        Self { unit, ..self }
    }

    /// Set the group tag
    pub const fn with_group(self, group: &'static str) -> Self {
        Self { group, ..self }
    }

    /// Set short and long descriptions
    pub const fn with_description(self, short_desc: &'static str, long_desc: &'static str) -> Self {
        Self {
            short_desc,
            long_desc,
            ..self
        }
    }

    /// Set access flags
    pub const fn with_flags(self, flags: ParamFlags) -> Self {
        Self { flags, ..self }
    }

    /// Declared type
    pub const fn param_type(&self) -> ParamType {
        self.kind.param_type()
    }

    /// Declared default
    pub const fn default_value(&self) -> ParamValue {
        self.kind.default_value()
    }

    /// True if runtime writes are rejected
    pub const fn is_read_only(&self) -> bool {
        self.flags.contains(ParamFlags::READ_ONLY)
    }

    /// True if excluded from operator listings
    pub const fn is_hidden(&self) -> bool {
        self.flags.contains(ParamFlags::HIDDEN)
    }

    /// Build the fixed-capacity key for this descriptor
    pub fn key(&self) -> Result<ParamName, ParameterError> {
        make_name(self.name)
    }

    /// Check internal consistency
    ///
    /// The name must be a valid parameter name, bounds must be ordered and
    /// the default must be finite and inside its own bounds.
    pub fn check(&self) -> Result<(), ParameterError> {
        make_name(self.name)?;

        let consistent = match self.kind {
            ParamKind::Float { default, min, max } => {
                let min_ok = min.map_or(true, |m| m.is_finite() && default >= m);
                let max_ok = max.map_or(true, |m| m.is_finite() && default <= m);
                default.is_finite() && min_ok && max_ok
            }
            ParamKind::Int32 { default, min, max } => {
                min.map_or(true, |m| default >= m) && max.map_or(true, |m| default <= m)
            }
        };

        if consistent {
            Ok(())
        } else {
            Err(ParameterError::InvalidDescriptor)
        }
    }
}

/// Convert a `&str` into a parameter name
///
/// Names must be non-empty, at most `PARAM_NAME_LEN` bytes and printable ASCII
/// without spaces (they are NUL-padded on storage and split on whitespace by
/// the shell).
pub fn make_name(name: &str) -> Result<ParamName, ParameterError> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(ParameterError::InvalidName);
    }
    ParamName::try_from(name).map_err(|_| ParameterError::InvalidName)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_fields() {
        const DESC: ParamDescriptor = ParamDescriptor::new_float("MPC_Z_VEL_MAX", 5.0, Some(0.0), None)
            .with_unit("m/s")
            .with_group("Multicopter Position Control")
            .with_description("Maximum vertical velocity", "AUTO mode limit");

        assert_eq!(DESC.param_type(), ParamType::Float);
        assert_eq!(DESC.default_value(), ParamValue::Float(5.0));
        assert_eq!(DESC.unit, "m/s");
        assert_eq!(DESC.short_desc, "Maximum vertical velocity");
        assert!(!DESC.is_read_only());
        assert!(DESC.check().is_ok());
    }

    #[test]
    fn test_check_rejects_default_outside_bounds() {
        let desc = ParamDescriptor::new_float("BAD", 2.0, Some(0.0), Some(1.0));
        assert_eq!(desc.check(), Err(ParameterError::InvalidDescriptor));

        let desc = ParamDescriptor::new_int32("BAD_INT", -1, Some(0), Some(1));
        assert_eq!(desc.check(), Err(ParameterError::InvalidDescriptor));
    }

    #[test]
    fn test_check_rejects_inverted_bounds() {
        let desc = ParamDescriptor::new_int32("INV", 0, Some(5), Some(-5));
        assert_eq!(desc.check(), Err(ParameterError::InvalidDescriptor));
    }

    #[test]
    fn test_check_rejects_non_finite_default() {
        let desc = ParamDescriptor::new_float("NAN_DEF", f32::NAN, None, None);
        assert_eq!(desc.check(), Err(ParameterError::InvalidDescriptor));
    }

    #[test]
    fn test_make_name() {
        assert!(make_name("AIRD_LOITER_STEP").is_ok()); // exactly 16 bytes
        assert_eq!(
            make_name("AIRD_LOITER_STEPS"),
            Err(ParameterError::InvalidName)
        );
        assert_eq!(make_name(""), Err(ParameterError::InvalidName));
        assert_eq!(make_name("HAS SPACE"), Err(ParameterError::InvalidName));
    }

    #[test]
    fn test_flags() {
        let desc = ParamDescriptor::new_int32("SYS_ID", 1, None, None)
            .with_flags(ParamFlags::READ_ONLY | ParamFlags::HIDDEN);
        assert!(desc.is_read_only());
        assert!(desc.is_hidden());
    }
}

//! Parameter value types
//!
//! `ParamValue` is the resident, type-checked representation. `RawValue` is
//! what an update channel submits before validation: integers arrive as 64-bit
//! and floats as 64-bit so that range checks happen at the API boundary.

/// Scalar parameter type
///
/// The discriminant is the persisted type tag. Tag `1` is reserved for a
/// future boolean type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ParamType {
    /// 32-bit signed integer
    Int32 = 2,
    /// 32-bit floating point
    Float = 3,
}

impl ParamType {
    /// Persisted type tag
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Decode a persisted type tag
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            2 => Some(ParamType::Int32),
            3 => Some(ParamType::Float),
            _ => None,
        }
    }

    /// Type name as shown to operators
    pub const fn as_str(self) -> &'static str {
        match self {
            ParamType::Int32 => "int32",
            ParamType::Float => "float32",
        }
    }
}

/// Type-checked parameter value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    /// 32-bit signed integer
    Int32(i32),
    /// 32-bit floating point
    Float(f32),
}

impl ParamValue {
    /// Raw 32-bit representation (cell storage and persisted records)
    pub fn to_bits(self) -> u32 {
        match self {
            ParamValue::Int32(i) => i as u32,
            ParamValue::Float(f) => f.to_bits(),
        }
    }

    /// Reinterpret raw bits according to `param_type`
    pub fn from_bits(bits: u32, param_type: ParamType) -> Self {
        match param_type {
            ParamType::Int32 => ParamValue::Int32(bits as i32),
            ParamType::Float => ParamValue::Float(f32::from_bits(bits)),
        }
    }

    /// Type of the contained value
    pub const fn param_type(&self) -> ParamType {
        match self {
            ParamValue::Int32(_) => ParamType::Int32,
            ParamValue::Float(_) => ParamType::Float,
        }
    }

    /// Float content, if this is a float
    pub const fn as_f32(&self) -> Option<f32> {
        match self {
            ParamValue::Float(f) => Some(*f),
            ParamValue::Int32(_) => None,
        }
    }

    /// Integer content, if this is an integer
    pub const fn as_i32(&self) -> Option<i32> {
        match self {
            ParamValue::Int32(i) => Some(*i),
            ParamValue::Float(_) => None,
        }
    }

    /// Bit-exact equality (distinguishes `0.0` from `-0.0`)
    pub fn same_bits(&self, other: &ParamValue) -> bool {
        self.to_bits() == other.to_bits()
            && self.param_type() == other.param_type()
    }
}

impl core::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ParamValue::Int32(i) => write!(f, "{}", i),
            ParamValue::Float(v) => write!(f, "{}", v),
        }
    }
}

/// Unvalidated value submitted through an update channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue {
    /// Integer input, any width up to 64 bits
    Int(i64),
    /// Floating point input
    Float(f64),
}

impl From<i32> for RawValue {
    fn from(v: i32) -> Self {
        RawValue::Int(v as i64)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Int(v)
    }
}

impl From<f32> for RawValue {
    fn from(v: f32) -> Self {
        RawValue::Float(v as f64)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Float(v)
    }
}

impl From<ParamValue> for RawValue {
    fn from(v: ParamValue) -> Self {
        match v {
            ParamValue::Int32(i) => RawValue::Int(i as i64),
            ParamValue::Float(f) => RawValue::Float(f as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tags() {
        assert_eq!(ParamType::Int32.tag(), 2);
        assert_eq!(ParamType::Float.tag(), 3);
        assert_eq!(ParamType::from_tag(3), Some(ParamType::Float));
        assert_eq!(ParamType::from_tag(1), None);
        assert_eq!(ParamType::from_tag(0xFF), None);
    }

    #[test]
    fn test_bits_preserve_value() {
        let v = ParamValue::Float(0.05);
        assert_eq!(ParamValue::from_bits(v.to_bits(), ParamType::Float), v);

        let v = ParamValue::Int32(-7);
        assert_eq!(v.to_bits(), 0xFFFF_FFF9);
        assert_eq!(ParamValue::from_bits(v.to_bits(), ParamType::Int32), v);
    }

    #[test]
    fn test_same_bits_distinguishes_signed_zero() {
        let pos = ParamValue::Float(0.0);
        let neg = ParamValue::Float(-0.0);
        assert_eq!(pos, neg);
        assert!(!pos.same_bits(&neg));
        assert!(!ParamValue::Int32(0).same_bits(&pos));
    }

    #[test]
    fn test_raw_value_widening() {
        assert_eq!(RawValue::from(5i32), RawValue::Int(5));
        assert_eq!(RawValue::from(0.5f32), RawValue::Float(0.5));
        assert_eq!(
            RawValue::from(ParamValue::Int32(i32::MIN)),
            RawValue::Int(i32::MIN as i64)
        );
    }
}

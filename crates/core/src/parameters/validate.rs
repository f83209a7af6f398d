//! Type and bounds validation
//!
//! Pure functions, no side effects. Every write path (runtime `set`, load
//! from storage) goes through [`validate`] before a cell is touched.
//!
//! Order of checks:
//! 1. type (integer into float slot or float into integer slot is rejected)
//! 2. representability (non-finite floats, floats overflowing `f32`,
//!    integers outside `i32`)
//! 3. declared bounds, inclusive on both ends

use super::descriptor::{ParamDescriptor, ParamKind};
use super::error::ParameterError;
use super::value::{ParamValue, RawValue};

/// Validate `raw` against `descriptor`, producing the value to store
pub fn validate(descriptor: &ParamDescriptor, raw: RawValue) -> Result<ParamValue, ParameterError> {
    match (descriptor.kind, raw) {
        (ParamKind::Float { min, max, .. }, RawValue::Float(v)) => {
            check_float(v, min, max).map(ParamValue::Float)
        }
        (ParamKind::Int32 { min, max, .. }, RawValue::Int(v)) => {
            check_int32(v, min, max).map(ParamValue::Int32)
        }
        _ => Err(ParameterError::TypeMismatch),
    }
}

/// Check a float input against optional inclusive bounds
pub fn check_float(value: f64, min: Option<f32>, max: Option<f32>) -> Result<f32, ParameterError> {
    if !value.is_finite() {
        return Err(ParameterError::OutOfBounds);
    }

    // Bounds apply to the input, not to its f32 rounding
    if min.is_some_and(|m| value < m as f64) || max.is_some_and(|m| value > m as f64) {
        return Err(ParameterError::OutOfBounds);
    }

    let narrowed = value as f32;
    if !narrowed.is_finite() {
        return Err(ParameterError::OutOfBounds);
    }

    Ok(narrowed)
}

/// Check an integer input against the `i32` range, then optional inclusive bounds
pub fn check_int32(value: i64, min: Option<i32>, max: Option<i32>) -> Result<i32, ParameterError> {
    let narrowed = i32::try_from(value).map_err(|_| ParameterError::OutOfBounds)?;

    if min.is_some_and(|m| narrowed < m) || max.is_some_and(|m| narrowed > m) {
        return Err(ParameterError::OutOfBounds);
    }

    Ok(narrowed)
}

//! Configuration value validation utilities.

use crate::error::AutoCutError;
use crate::Result;

/// Validate a string value against a list of allowed values.
pub fn validate_enum(field: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(AutoCutError::config(format!(
            "Invalid value '{}' for {}. Allowed values: {}",
            value,
            field,
            allowed.join(", ")
        )))
    }
}

/// Validate an unsigned integer within a specified range.
pub fn validate_uint_range(field: &str, value: u32, min: u32, max: u32) -> Result<()> {
    if value < min || value > max {
        return Err(AutoCutError::config(format!(
            "{} = {} is out of range [{}, {}]",
            field, value, min, max
        )));
    }
    Ok(())
}

/// Validate a usize value within a specified range.
pub fn validate_usize_range(field: &str, value: usize, min: usize, max: usize) -> Result<()> {
    if value < min || value > max {
        return Err(AutoCutError::config(format!(
            "{} = {} is out of range [{}, {}]",
            field, value, min, max
        )));
    }
    Ok(())
}

/// Validate a float value within a specified range.
pub fn validate_float_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(AutoCutError::config(format!(
            "{} = {} is out of range [{}, {}]",
            field, value, min, max
        )));
    }
    Ok(())
}

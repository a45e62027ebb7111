use crate::utils::error::{CarpeError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CarpeError::ConfigValidationError {
            field: field_name.to_string(),
            message: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Dotted namespace paths must not contain empty segments (`a..b`, `.a`).
pub fn validate_namespace_path(field_name: &str, path: &str) -> Result<()> {
    validate_non_empty_string(field_name, path)?;

    if let Some(position) = path.split('.').position(|segment| segment.trim().is_empty()) {
        return Err(CarpeError::ConfigValidationError {
            field: field_name.to_string(),
            message: format!("Path '{}' has an empty segment at position {}", path, position),
        });
    }
    Ok(())
}

pub fn validate_identifier(field_name: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field_name, value)?;

    if value.contains('.') || value.chars().any(char::is_whitespace) {
        return Err(CarpeError::ConfigValidationError {
            field: field_name.to_string(),
            message: format!("'{}' must not contain dots or whitespace", value),
        });
    }
    Ok(())
}

/// Returns the first value that appears more than once.
pub fn find_duplicate<'a, I>(values: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    values.into_iter().find(|value| !seen.insert(*value))
}

pub fn validate_either_set<T>(field_name: &str, first: &Option<T>, second: &Option<T>) -> Result<()> {
    if first.is_none() && second.is_none() {
        return Err(CarpeError::ConfigValidationError {
            field: field_name.to_string(),
            message: "At least one of the two options must be set".to_string(),
        });
    }
    Ok(())
}

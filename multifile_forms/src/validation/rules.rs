//! Custom rules used when validating field configuration.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use validator::ValidationError;

lazy_static! {
    static ref EXTENSION_REGEX: Regex = Regex::new(r"^[a-z0-9]+$").unwrap();

    static ref FIELD_NAME_REGEX: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-\[\]]{0,63}$").unwrap();
}

pub fn validate_extensions(extensions: &Vec<String>) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();

    for extension in extensions {
        if !EXTENSION_REGEX.is_match(extension) {
            return Err(ValidationError::new("invalid_extension"));
        }
        if !seen.insert(extension.as_str()) {
            return Err(ValidationError::new("duplicate_extension"));
        }
    }

    Ok(())
}

pub fn validate_field_name(name: &str) -> Result<(), ValidationError> {
    if !FIELD_NAME_REGEX.is_match(name) {
        return Err(ValidationError::new("invalid_field_name"));
    }
    Ok(())
}

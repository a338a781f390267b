//! Validators for multi-file upload fields and the form-level result type.

pub mod allowed;
pub mod required;
pub mod rules;
pub mod size;

pub use allowed::{files_allowed, AllowList, FilesAllowed};
pub use required::{files_required, FilesRequired};
pub use size::{files_size, FilesSize};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use validator::ValidationErrors;

use crate::fields::{FieldFlags, MultipleFileField};

/// Rejection raised by a validator. Stops the remaining validators of the field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationFailure {
    pub code: &'static str,
    pub message: String,
}

impl ValidationFailure {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// A rule attached to a field and run during form validation.
pub trait FieldValidator: Send + Sync {
    fn validate(&self, field: &mut MultipleFileField) -> Result<(), ValidationFailure>;

    /// Flags the validator sets on the field it is attached to.
    fn field_flags(&self) -> Option<FieldFlags> {
        None
    }
}

/// Picks the configured message, falling back to the translated default.
pub(crate) fn failure(
    code: &'static str,
    custom: &Option<String>,
    field: &MultipleFileField,
    default: &str,
) -> ValidationFailure {
    let message = match custom {
        Some(message) => message.clone(),
        None => field.gettext(default),
    };

    tracing::debug!(field = %field.name(), code, message = %message, "Upload field rejected");

    ValidationFailure::new(code, message)
}

/// A positive maximum below the minimum is raised to the minimum.
pub(crate) fn normalize_max(min: i64, max: i64) -> i64 {
    if max > 0 && min > max {
        min
    } else {
        max
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: HashMap<String, Vec<String>>,
    pub field_errors: HashMap<String, FieldValidationError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldValidationError {
    pub field: String,
    pub errors: Vec<String>,
    pub error_codes: Vec<String>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self {
            is_valid: true,
            errors: HashMap::new(),
            field_errors: HashMap::new(),
        }
    }

    pub fn from_validation_errors(errors: ValidationErrors) -> Self {
        let mut result = Self::success();

        for (field, field_errors) in errors.field_errors() {
            let field: &str = &field;
            for error in field_errors {
                let message = match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("Validation failed for field '{}'", field),
                };
                result.add_error(field, &message, &error.code);
            }
        }

        result
    }

    pub fn add_failure(&mut self, field: &str, failure: &ValidationFailure) {
        self.add_error(field, &failure.message, failure.code);
    }

    pub fn add_error(&mut self, field: &str, message: &str, code: &str) {
        self.is_valid = false;
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());

        let entry = self
            .field_errors
            .entry(field.to_string())
            .or_insert_with(|| FieldValidationError {
                field: field.to_string(),
                errors: Vec::new(),
                error_codes: Vec::new(),
            });
        entry.errors.push(message.to_string());
        entry.error_codes.push(code.to_string());
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.is_valid {
            self.is_valid = false;
        }

        for (field, errors) in other.errors {
            self.errors.entry(field).or_default().extend(errors);
        }

        for (field, field_error) in other.field_errors {
            self.field_errors.insert(field, field_error);
        }
    }

    pub fn first_error(&self, field: &str) -> Option<&str> {
        self.errors
            .get(field)
            .and_then(|errors| errors.first())
            .map(String::as_str)
    }

    /// Flattened `field: message` lines, sorted by field name.
    pub fn summary(&self) -> String {
        let mut fields: Vec<&String> = self.errors.keys().collect();
        fields.sort();

        fields
            .into_iter()
            .flat_map(|field| {
                self.errors[field]
                    .iter()
                    .map(move |message| format!("{}: {}", field, message))
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

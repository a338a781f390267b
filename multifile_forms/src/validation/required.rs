//! File count bounds.

use crate::fields::{FieldFlags, MultipleFileField};
use crate::validation::{failure, normalize_max, FieldValidator, ValidationFailure};

pub const CODE: &str = "files_required";

/// Requires the number of selected files to be within `[min, max]`.
///
/// A `min` below 1 makes the field optional. A `max` below 1 allows any number
/// of files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesRequired {
    min: i64,
    max: i64,
    message: Option<String>,
}

impl Default for FilesRequired {
    fn default() -> Self {
        Self::new(1, 0)
    }
}

impl FilesRequired {
    pub fn new(min: i64, max: i64) -> Self {
        Self {
            min,
            max: normalize_max(min, max),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    fn default_message(&self) -> String {
        let upper = if self.max > 0 {
            self.max.to_string()
        } else {
            "an unlimited number of".to_string()
        };
        format!("Please select from {} to {} files.", self.min, upper)
    }

    fn reject(&self, field: &MultipleFileField) -> ValidationFailure {
        failure(CODE, &self.message, field, &self.default_message())
    }
}

impl FieldValidator for FilesRequired {
    fn validate(&self, field: &mut MultipleFileField) -> Result<(), ValidationFailure> {
        if self.min < 1 {
            if !field.has_data() {
                return Ok(());
            }

            if let Some([only]) = field.data() {
                if only.is_placeholder() {
                    return Ok(());
                }
            }
        }

        if !field.has_only_present_files() {
            return Err(self.reject(field));
        }

        let count = field.file_count() as i64;

        if count < self.min {
            return Err(self.reject(field));
        }

        if self.max >= 1 && count > self.max {
            return Err(self.reject(field));
        }

        Ok(())
    }

    fn field_flags(&self) -> Option<FieldFlags> {
        if self.min < 1 {
            Some(FieldFlags::optional())
        } else {
            Some(FieldFlags::required())
        }
    }
}

pub fn files_required(min: i64, max: i64) -> FilesRequired {
    FilesRequired::new(min, max)
}

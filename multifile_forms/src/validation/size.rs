//! Per-file and aggregate size bounds.

use tracing::warn;

use crate::fields::MultipleFileField;
use crate::validation::{failure, normalize_max, FieldValidator, ValidationFailure};

pub const CODE: &str = "files_size";

/// Checks every file's size, in bytes, and the total across all files.
///
/// Any bound below 1 is not enforced. Sizes are measured by reading each
/// stream to its end, after which the stream is rewound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesSize {
    max: i64,
    min: i64,
    min_total: i64,
    max_total: i64,
    message: Option<String>,
}

impl FilesSize {
    pub fn new(max: i64) -> Self {
        Self::with_bounds(max, 0, 0, 0)
    }

    pub fn with_bounds(max: i64, min: i64, min_total: i64, max_total: i64) -> Self {
        Self {
            max: normalize_max(min, max),
            min,
            min_total,
            max_total: normalize_max(min_total, max_total),
            message: None,
        }
    }

    pub fn min(mut self, min: i64) -> Self {
        self.min = min;
        self.max = normalize_max(min, self.max);
        self
    }

    pub fn min_total(mut self, min_total: i64) -> Self {
        self.min_total = min_total;
        self.max_total = normalize_max(min_total, self.max_total);
        self
    }

    pub fn max_total(mut self, max_total: i64) -> Self {
        self.max_total = normalize_max(self.min_total, max_total);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn bounds(&self) -> (i64, i64, i64, i64) {
        (self.max, self.min, self.min_total, self.max_total)
    }

    fn check_file(&self, size: i64, total: i64, is_last: bool) -> Option<String> {
        if self.min_total > 0 && is_last && total < self.min_total {
            return Some(format!(
                "Total upload minimum size must be {} bytes.",
                self.min_total
            ));
        }

        if self.max_total > 0 && total > self.max_total {
            return Some(format!(
                "Total upload maximum size must be {} bytes.",
                self.max_total
            ));
        }

        if self.min > 0 && size < self.min {
            return Some(format!(
                "Independent file minimum size must be {} bytes.",
                self.min
            ));
        }

        if self.max > 0 && size > self.max {
            return Some(format!(
                "Independent file maximum size must be {} bytes.",
                self.max
            ));
        }

        None
    }
}

impl FieldValidator for FilesSize {
    fn validate(&self, field: &mut MultipleFileField) -> Result<(), ValidationFailure> {
        if !field.has_only_present_files() {
            return Ok(());
        }

        let count = field.file_count();
        let mut total: i64 = 0;
        let mut rejection = None;

        for (i, file) in field.data_mut().into_iter().flatten().enumerate() {
            let size = match file.measure_size() {
                Ok(size) => i64::try_from(size).unwrap_or(i64::MAX),
                Err(e) => {
                    warn!(filename = %file.filename(), error = %e, "Failed to measure uploaded file");
                    rejection = Some(format!("Unable to read uploaded file {}.", file.filename()));
                    break;
                }
            };

            total = total.saturating_add(size);

            if let Some(message) = self.check_file(size, total, i + 1 == count) {
                rejection = Some(message);
                break;
            }
        }

        match rejection {
            Some(default) => Err(failure(CODE, &self.message, field, &default)),
            None => Ok(()),
        }
    }
}

pub fn files_size(max: i64) -> FilesSize {
    FilesSize::new(max)
}

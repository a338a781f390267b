//! Named collections of upload fields.

use axum::extract::Multipart;
use tracing::{debug, info};

use crate::error::Result;
use crate::fields::{MultipleFileField, RawValue};
use crate::files::collect_multipart;
use crate::validation::ValidationResult;

#[derive(Debug, Default)]
pub struct UploadForm {
    fields: Vec<MultipleFileField>,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: MultipleFileField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(&self) -> &[MultipleFileField] {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut [MultipleFileField] {
        &mut self.fields
    }

    pub fn field(&self, name: &str) -> Option<&MultipleFileField> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut MultipleFileField> {
        self.fields.iter_mut().find(|f| f.name() == name)
    }

    /// Routes submitted values to fields by name, keeping submission order.
    ///
    /// Values for unknown names are ignored. Every field is processed, so a
    /// field that received nothing ends up absent.
    pub fn process<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = (String, RawValue)>,
    {
        let mut per_field: Vec<Vec<RawValue>> = self.fields.iter().map(|_| Vec::new()).collect();

        for (name, value) in values {
            match self.fields.iter().position(|f| f.name() == name) {
                Some(index) => per_field[index].push(value),
                None => debug!(field = %name, "Ignoring value for unknown field"),
            }
        }

        for (field, values) in self.fields.iter_mut().zip(per_field) {
            field.process_formdata(values);
        }
    }

    pub async fn process_multipart(
        &mut self,
        multipart: Multipart,
        spool_threshold: usize,
    ) -> Result<()> {
        let values = collect_multipart(multipart, spool_threshold).await?;
        self.process(values);
        Ok(())
    }

    /// Validates every field; each field stops at its own first failure.
    pub fn validate(&mut self) -> ValidationResult {
        let mut result = ValidationResult::success();

        for field in &mut self.fields {
            if let Err(failure) = field.validate() {
                result.add_failure(field.name(), &failure);
            }
        }

        info!(
            fields = self.fields.len(),
            valid = result.is_valid,
            "Upload form validated"
        );

        result
    }
}

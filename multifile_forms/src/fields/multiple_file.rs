use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::files::UploadedFile;
use crate::validation::{FieldValidator, ValidationFailure};

/// A value submitted under a field name before the field cleans it up.
#[derive(Debug)]
pub enum RawValue {
    File(UploadedFile),
    Text(String),
    Empty,
}

impl RawValue {
    fn describe(&self) -> String {
        match self {
            RawValue::File(file) => file.filename().to_string(),
            RawValue::Text(text) => text.clone(),
            RawValue::Empty => String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FieldFlags {
    pub required: bool,
    pub optional: bool,
}

impl FieldFlags {
    pub fn required() -> Self {
        Self {
            required: true,
            optional: false,
        }
    }

    pub fn optional() -> Self {
        Self {
            required: false,
            optional: true,
        }
    }
}

pub type Translator = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Form field holding any number of uploaded files.
pub struct MultipleFileField {
    name: String,
    data: Option<Vec<UploadedFile>>,
    raw_data: Vec<String>,
    validators: Vec<Box<dyn FieldValidator>>,
    flags: FieldFlags,
    errors: Vec<String>,
    translator: Option<Translator>,
}

impl MultipleFileField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: None,
            raw_data: Vec::new(),
            validators: Vec::new(),
            flags: FieldFlags::default(),
            errors: Vec::new(),
            translator: None,
        }
    }

    pub fn with_validator(mut self, validator: impl FieldValidator + 'static) -> Self {
        self.add_validator(Box::new(validator));
        self
    }

    pub fn with_translator(mut self, translator: Translator) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn add_validator(&mut self, validator: Box<dyn FieldValidator>) {
        if let Some(flags) = validator.field_flags() {
            self.flags = flags;
        }
        self.validators.push(validator);
    }

    /// Replaces the validator chain, resetting flags to what the new chain sets.
    pub fn set_validators(&mut self, validators: Vec<Box<dyn FieldValidator>>) {
        self.flags = FieldFlags::default();
        self.validators.clear();
        for validator in validators {
            self.add_validator(validator);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> FieldFlags {
        self.flags
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn raw_data(&self) -> &[String] {
        &self.raw_data
    }

    pub fn data(&self) -> Option<&[UploadedFile]> {
        self.data.as_deref()
    }

    pub fn data_mut(&mut self) -> Option<&mut Vec<UploadedFile>> {
        self.data.as_mut()
    }

    pub fn set_data(&mut self, files: Vec<UploadedFile>) {
        self.data = Some(files);
    }

    pub fn take_data(&mut self) -> Option<Vec<UploadedFile>> {
        self.data.take()
    }

    /// True when the field holds at least one entry.
    pub fn has_data(&self) -> bool {
        self.data.as_ref().is_some_and(|files| !files.is_empty())
    }

    /// True when the field holds entries and every one of them is a present file.
    pub fn has_only_present_files(&self) -> bool {
        self.has_data()
            && self
                .data
                .iter()
                .flatten()
                .all(UploadedFile::is_present)
    }

    pub fn file_count(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    pub fn gettext(&self, message: &str) -> String {
        match &self.translator {
            Some(translate) => translate(message),
            None => message.to_string(),
        }
    }

    /// Keeps only present files from the submitted values.
    ///
    /// When nothing survives the data becomes absent and the raw values are
    /// dropped as well.
    pub fn process_formdata<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = RawValue>,
    {
        let mut raw_data = Vec::new();
        let mut files = Vec::new();

        for value in values {
            raw_data.push(value.describe());
            if let RawValue::File(file) = value {
                if file.is_present() {
                    files.push(file);
                }
            }
        }

        if files.is_empty() {
            self.data = None;
            self.raw_data = Vec::new();
        } else {
            self.data = Some(files);
            self.raw_data = raw_data;
        }
    }

    /// Runs the attached validators in order, stopping at the first failure.
    pub fn validate(&mut self) -> Result<(), ValidationFailure> {
        self.validate_with(&[])
    }

    /// Like [`validate`](Self::validate), then runs `extra` after the attached chain.
    pub fn validate_with(
        &mut self,
        extra: &[Box<dyn FieldValidator>],
    ) -> Result<(), ValidationFailure> {
        self.errors.clear();

        let validators = std::mem::take(&mut self.validators);
        let outcome = validators
            .iter()
            .chain(extra.iter())
            .try_for_each(|validator| validator.validate(self));
        self.validators = validators;

        if let Err(failure) = &outcome {
            self.errors.push(failure.message.clone());
        }

        outcome
    }
}

impl fmt::Debug for MultipleFileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipleFileField")
            .field("name", &self.name)
            .field("data", &self.data)
            .field("raw_data", &self.raw_data)
            .field("validators", &self.validators.len())
            .field("flags", &self.flags)
            .field("errors", &self.errors)
            .finish()
    }
}

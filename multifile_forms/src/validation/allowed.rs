//! Extension allow-lists.

use std::fmt;
use std::sync::Arc;

use crate::fields::MultipleFileField;
use crate::files::UploadSet;
use crate::validation::{failure, FieldValidator, ValidationFailure};

pub const CODE: &str = "files_allowed";

#[derive(Clone)]
pub enum AllowList {
    /// Lower-cased extensions without the leading dot.
    Extensions(Vec<String>),
    UploadSet(Arc<dyn UploadSet>),
}

impl AllowList {
    pub fn extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        AllowList::Extensions(
            extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        )
    }

    fn listed(&self) -> Vec<String> {
        match self {
            AllowList::Extensions(extensions) => extensions.clone(),
            AllowList::UploadSet(upload_set) => upload_set.extensions(),
        }
    }
}

impl fmt::Debug for AllowList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllowList::Extensions(extensions) => {
                f.debug_tuple("Extensions").field(extensions).finish()
            }
            AllowList::UploadSet(upload_set) => f
                .debug_tuple("UploadSet")
                .field(&upload_set.extensions())
                .finish(),
        }
    }
}

impl<S: AsRef<str>> From<Vec<S>> for AllowList {
    fn from(extensions: Vec<S>) -> Self {
        AllowList::extensions(extensions)
    }
}

impl<U: UploadSet + 'static> From<Arc<U>> for AllowList {
    fn from(upload_set: Arc<U>) -> Self {
        AllowList::UploadSet(upload_set)
    }
}

/// Rejects the field when any selected file has an extension outside the list.
///
/// Presence is not checked here; an empty field passes.
#[derive(Debug, Clone)]
pub struct FilesAllowed {
    allow_list: AllowList,
    message: Option<String>,
}

impl FilesAllowed {
    pub fn new(allow_list: impl Into<AllowList>) -> Self {
        Self {
            allow_list: allow_list.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    fn reject(&self, field: &MultipleFileField) -> ValidationFailure {
        let default = format!(
            "Files does not have an approved extension/s: {}",
            self.allow_list.listed().join(", ")
        );
        failure(CODE, &self.message, field, &default)
    }
}

impl FieldValidator for FilesAllowed {
    fn validate(&self, field: &mut MultipleFileField) -> Result<(), ValidationFailure> {
        if !field.has_only_present_files() {
            return Ok(());
        }

        for file in field.data().unwrap_or_default() {
            let filename = file.filename().to_lowercase();

            let allowed = match &self.allow_list {
                AllowList::Extensions(extensions) => extensions
                    .iter()
                    .any(|ext| filename.ends_with(&format!(".{}", ext))),
                AllowList::UploadSet(upload_set) => upload_set.file_allowed(file, &filename),
            };

            if !allowed {
                return Err(self.reject(field));
            }
        }

        Ok(())
    }
}

pub fn files_allowed(allow_list: impl Into<AllowList>) -> FilesAllowed {
    FilesAllowed::new(allow_list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::{ExtensionUploadSet, Extensions, UploadedFile};

    fn field_with(validator: FilesAllowed, names: &[&str]) -> MultipleFileField {
        let mut field = MultipleFileField::new("files").with_validator(validator);
        field.set_data(
            names
                .iter()
                .map(|name| UploadedFile::from_bytes(*name, Vec::new()))
                .collect(),
        );
        field
    }

    #[test]
    fn test_extension_list() {
        let names = ["test.txt", "test.docx"];

        assert!(field_with(FilesAllowed::new(vec!["txt"]), &names).validate().is_err());
        assert!(field_with(FilesAllowed::new(vec!["txt", "docx"]), &names).validate().is_ok());
    }

    #[test]
    fn test_case_insensitive_match() {
        assert!(field_with(FilesAllowed::new(vec!["TXT"]), &["NOTES.Txt"]).validate().is_ok());
        assert!(field_with(FilesAllowed::new(vec![".pdf"]), &["scan.PDF"]).validate().is_ok());
    }

    #[test]
    fn test_suffix_without_dot_is_rejected() {
        assert!(field_with(FilesAllowed::new(vec!["txt"]), &["notestxt"]).validate().is_err());
    }

    #[test]
    fn test_upload_set() {
        let names = ["test.txt", "test.docx"];

        let txt_only = Arc::new(ExtensionUploadSet::new("test", Extensions::only(["txt"])));
        assert!(field_with(FilesAllowed::new(txt_only), &names).validate().is_err());

        let both = Arc::new(ExtensionUploadSet::new("test", Extensions::only(["txt", "docx"])));
        assert!(field_with(FilesAllowed::new(both), &names).validate().is_ok());
    }

    #[test]
    fn test_empty_field_is_skipped() {
        let mut field = MultipleFileField::new("files").with_validator(FilesAllowed::new(vec!["txt"]));
        assert!(field.validate().is_ok());

        let mut with_blank = field_with(FilesAllowed::new(vec!["txt"]), &["ok.txt", ""]);
        assert!(with_blank.validate().is_ok());
    }

    #[test]
    fn test_messages() {
        let mut field = field_with(FilesAllowed::new(vec!["txt", "md"]), &["a.exe"]);
        let failure = field.validate().unwrap_err();
        assert_eq!(failure.message, "Files does not have an approved extension/s: txt, md");
        assert_eq!(failure.code, CODE);

        let upload_set = Arc::new(ExtensionUploadSet::new("docs", Extensions::only(["pdf"])));
        let mut field = field_with(FilesAllowed::new(upload_set), &["a.exe"]);
        assert_eq!(
            field.validate().unwrap_err().message,
            "Files does not have an approved extension/s: pdf"
        );

        let mut field = field_with(FilesAllowed::new(vec!["txt"]).with_message("Text only"), &["a.exe"]);
        assert_eq!(field.validate().unwrap_err().message, "Text only");
    }
}

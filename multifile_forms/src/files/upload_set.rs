//! Extension policies that decide whether an uploaded file may be accepted.

use std::collections::HashSet;
use std::path::Path;

use crate::files::UploadedFile;

pub const TEXT: &[&str] = &["txt"];

pub const DOCUMENTS: &[&str] = &[
    "rtf", "odf", "ods", "gnumeric", "abw", "doc", "docx", "xls", "xlsx",
];

pub const IMAGES: &[&str] = &["jpg", "jpe", "jpeg", "png", "gif", "svg", "bmp", "webp"];

pub const AUDIO: &[&str] = &["wav", "mp3", "aac", "ogg", "oga", "flac"];

pub const DATA: &[&str] = &["csv", "ini", "json", "plist", "xml", "yaml", "yml"];

pub const SCRIPTS: &[&str] = &["js", "php", "pl", "py", "rb", "sh"];

pub const ARCHIVES: &[&str] = &["gz", "bz2", "zip", "tar", "tgz", "txz", "7z"];

pub const EXECUTABLES: &[&str] = &["so", "exe", "dll"];

/// Plain text, documents, images and data files.
pub fn default_extensions() -> Vec<&'static str> {
    [TEXT, DOCUMENTS, IMAGES, DATA].concat()
}

/// Decides per file whether it may be uploaded.
pub trait UploadSet: Send + Sync {
    /// `filename` is the lower-cased name of `file`.
    fn file_allowed(&self, file: &UploadedFile, filename: &str) -> bool;

    /// Extensions listed in rejection messages.
    fn extensions(&self) -> Vec<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extensions {
    All,
    Only(HashSet<String>),
}

impl Extensions {
    pub fn only<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Extensions::Only(
            extensions
                .into_iter()
                .map(|e| e.as_ref().to_lowercase())
                .collect(),
        )
    }

    pub fn contains(&self, extension: &str) -> bool {
        match self {
            Extensions::All => true,
            Extensions::Only(set) => set.contains(extension),
        }
    }
}

/// A named group of accepted extensions with explicit allow and deny overrides.
#[derive(Debug, Clone)]
pub struct ExtensionUploadSet {
    name: String,
    extensions: Extensions,
    allow: HashSet<String>,
    deny: HashSet<String>,
}

impl ExtensionUploadSet {
    pub fn new(name: impl Into<String>, extensions: Extensions) -> Self {
        Self {
            name: name.into(),
            extensions,
            allow: HashSet::new(),
            deny: HashSet::new(),
        }
    }

    pub fn with_defaults(name: impl Into<String>) -> Self {
        Self::new(name, Extensions::only(default_extensions()))
    }

    pub fn allow<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allow
            .extend(extensions.into_iter().map(|e| e.as_ref().to_lowercase()));
        self
    }

    pub fn deny<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.deny
            .extend(extensions.into_iter().map(|e| e.as_ref().to_lowercase()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extension_allowed(&self, extension: &str) -> bool {
        self.allow.contains(extension)
            || (self.extensions.contains(extension) && !self.deny.contains(extension))
    }
}

impl UploadSet for ExtensionUploadSet {
    fn file_allowed(&self, _file: &UploadedFile, filename: &str) -> bool {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        self.extension_allowed(&extension)
    }

    fn extensions(&self) -> Vec<String> {
        let mut listed: Vec<String> = match &self.extensions {
            Extensions::All => vec!["*".to_string()],
            Extensions::Only(set) => set
                .iter()
                .filter(|e| !self.deny.contains(*e))
                .cloned()
                .collect(),
        };
        listed.extend(self.allow.iter().cloned());
        listed.sort();
        listed.dedup();
        listed
    }
}

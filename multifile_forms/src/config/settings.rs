use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use validator::Validate;

use crate::fields::MultipleFileField;
use crate::forms::UploadForm;
use crate::validation::rules::{validate_extensions, validate_field_name};
use crate::validation::{FilesAllowed, FilesRequired, FilesSize, ValidationResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub uploads: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_size_mb: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Uploaded parts larger than this are spooled to a temporary file.
    pub spool_threshold_bytes: usize,
    pub fields: Vec<FieldRules>,
}

/// Declarative validator setup for one multi-file field.
///
/// Bounds below 1 are not enforced, except that `min_files < 1` also makes the
/// field optional.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FieldRules {
    #[validate(custom(function = "validate_field_name", message = "Field name must be 1-64 characters and start with a letter or underscore"))]
    pub name: String,

    #[serde(default = "default_min_files")]
    pub min_files: i64,

    #[serde(default)]
    pub max_files: i64,

    #[serde(default)]
    #[validate(custom(function = "validate_extensions", message = "Extensions must be unique lowercase alphanumeric suffixes without a dot"))]
    pub allowed_extensions: Vec<String>,

    #[serde(default)]
    pub min_file_size: i64,

    #[serde(default)]
    pub max_file_size: i64,

    #[serde(default)]
    pub min_total_size: i64,

    #[serde(default)]
    pub max_total_size: i64,

    #[serde(default)]
    pub message: Option<String>,
}

fn default_min_files() -> i64 {
    1
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            uploads: UploadConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_body_size_mb: 50,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            spool_threshold_bytes: 256 * 1024,
            fields: vec![FieldRules::default()],
        }
    }
}

impl Default for FieldRules {
    fn default() -> Self {
        Self {
            name: "files".to_string(),
            min_files: 1,
            max_files: 10,
            allowed_extensions: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "gif".to_string(),
                "pdf".to_string(),
                "txt".to_string(),
                "doc".to_string(),
                "docx".to_string(),
            ],
            min_file_size: 0,
            max_file_size: 10 * 1024 * 1024,
            min_total_size: 0,
            max_total_size: 50 * 1024 * 1024,
            message: None,
        }
    }
}

impl FieldRules {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_files: 1,
            max_files: 0,
            allowed_extensions: Vec::new(),
            min_file_size: 0,
            max_file_size: 0,
            min_total_size: 0,
            max_total_size: 0,
            message: None,
        }
    }

    fn has_size_bounds(&self) -> bool {
        [
            self.min_file_size,
            self.max_file_size,
            self.min_total_size,
            self.max_total_size,
        ]
        .iter()
        .any(|bound| *bound > 0)
    }

    /// Builds the field with count, extension and size validators, in that order.
    pub fn build_field(&self) -> MultipleFileField {
        let mut required = FilesRequired::new(self.min_files, self.max_files);
        if let Some(message) = &self.message {
            required = required.with_message(message.clone());
        }
        let mut field = MultipleFileField::new(self.name.clone()).with_validator(required);

        if !self.allowed_extensions.is_empty() {
            let mut allowed = FilesAllowed::new(self.allowed_extensions.clone());
            if let Some(message) = &self.message {
                allowed = allowed.with_message(message.clone());
            }
            field = field.with_validator(allowed);
        }

        if self.has_size_bounds() {
            let mut size = FilesSize::with_bounds(
                self.max_file_size,
                self.min_file_size,
                self.min_total_size,
                self.max_total_size,
            );
            if let Some(message) = &self.message {
                size = size.with_message(message.clone());
            }
            field = field.with_validator(size);
        }

        field
    }
}

impl UploadConfig {
    pub fn build_form(&self) -> UploadForm {
        self.fields
            .iter()
            .fold(UploadForm::new(), |form, rules| form.with_field(rules.build_field()))
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?);

        if std::path::Path::new("config.toml").exists() {
            builder = builder.add_source(File::with_name("config"));
        }

        builder = builder.add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let app_config: AppConfig = builder.build()?.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    /// Defaults overlaid with a TOML document.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let app_config: AppConfig = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.server.max_body_size_mb == 0 {
            return Err(ConfigError::Message(
                "Max body size must be greater than 0".to_string(),
            ));
        }

        if self.uploads.fields.is_empty() {
            return Err(ConfigError::Message(
                "At least one upload field must be configured".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for rules in &self.uploads.fields {
            if let Err(errors) = rules.validate() {
                return Err(ConfigError::Message(format!(
                    "Invalid upload field '{}': {}",
                    rules.name,
                    ValidationResult::from_validation_errors(errors).summary()
                )));
            }

            if !names.insert(rules.name.as_str()) {
                return Err(ConfigError::Message(format!(
                    "Upload field '{}' is configured more than once",
                    rules.name
                )));
            }
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn max_body_size_bytes(&self) -> usize {
        self.server.max_body_size_mb * 1024 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::UploadedFile;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.uploads.fields.len(), 1);
        assert_eq!(config.uploads.fields[0].name, "files");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.uploads.fields.clear();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.uploads.fields.push(FieldRules::default());
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.uploads.fields[0].allowed_extensions = vec!["tar.gz".to_string()];
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("allowed_extensions"), "{}", err);

        let mut config = AppConfig::default();
        config.uploads.fields[0].name = "bad name".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bind_address() {
        let config = AppConfig::default();
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.max_body_size_bytes(), 50 * 1024 * 1024);
    }

    #[test]
    fn test_from_toml_str() {
        let config = AppConfig::from_toml_str(
            r#"
            [server]
            port = 8080

            [[uploads.fields]]
            name = "attachments"
            min_files = 0
            max_files = 3
            allowed_extensions = ["pdf"]

            [[uploads.fields]]
            name = "photos"
            max_file_size = 1024
            "#,
        )
        .expect("Should parse TOML configuration");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.uploads.fields.len(), 2);

        let photos = &config.uploads.fields[1];
        assert_eq!(photos.min_files, 1);
        assert_eq!(photos.max_files, 0);
        assert!(photos.allowed_extensions.is_empty());
        assert_eq!(photos.max_file_size, 1024);
    }

    #[test]
    fn test_build_field_applies_rules() {
        let mut rules = FieldRules::named("docs");
        rules.max_files = 2;
        rules.allowed_extensions = vec!["pdf".to_string()];
        rules.max_file_size = 4;

        let mut field = rules.build_field();
        assert!(field.flags().required);
        assert!(field.validate().is_err());

        field.set_data(vec![UploadedFile::from_bytes("a.pdf", b"1234".to_vec())]);
        assert!(field.validate().is_ok());

        field.set_data(vec![UploadedFile::from_bytes("a.doc", b"1234".to_vec())]);
        assert_eq!(field.validate().unwrap_err().code, "files_allowed");

        field.set_data(vec![UploadedFile::from_bytes("a.pdf", b"12345".to_vec())]);
        assert_eq!(field.validate().unwrap_err().code, "files_size");
    }

    #[test]
    fn test_shared_message() {
        let mut rules = FieldRules::named("docs");
        rules.min_files = 0;
        rules.max_file_size = 1;
        rules.message = Some("Bad upload".to_string());

        let mut field = rules.build_field();
        assert!(field.flags().optional);
        assert!(field.validate().is_ok());

        field.set_data(vec![UploadedFile::from_bytes("a.bin", b"12".to_vec())]);
        assert_eq!(field.validate().unwrap_err().message, "Bad upload");
    }

    #[test]
    fn test_build_form() {
        let config = AppConfig::default();
        let form = config.uploads.build_form();
        assert_eq!(form.fields().len(), 1);
        assert!(form.field("files").is_some());
    }
}

pub mod settings;

pub use settings::{AppConfig, FieldRules, ServerConfig, UploadConfig};

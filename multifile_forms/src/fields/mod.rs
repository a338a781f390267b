pub mod multiple_file;

pub use multiple_file::{FieldFlags, MultipleFileField, RawValue, Translator};

pub mod models;
pub mod multipart;
pub mod upload_set;

pub use models::{FileStream, UploadedFile};
pub use multipart::collect_multipart;
pub use upload_set::{ExtensionUploadSet, Extensions, UploadSet};

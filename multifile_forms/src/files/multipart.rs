//! Collects an axum multipart body into raw form values.

use std::io::{Seek, SeekFrom, Write};

use axum::extract::multipart::{Field, Multipart};
use axum::http::header;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::fields::RawValue;
use crate::files::UploadedFile;

/// Reads every part of `multipart` in submission order.
///
/// File parts are spooled in memory up to `spool_threshold` bytes and moved to
/// a temporary file beyond that.
pub async fn collect_multipart(
    mut multipart: Multipart,
    spool_threshold: usize,
) -> Result<Vec<(String, RawValue)>> {
    let mut values = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();

        let filename = field.file_name().map(str::to_string);

        let value = match filename {
            Some(filename) => RawValue::File(spool_file(field, filename, spool_threshold).await?),
            None => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read form value: {}", e))
                })?;
                if text.is_empty() {
                    RawValue::Empty
                } else {
                    RawValue::Text(text)
                }
            }
        };

        values.push((name, value));
    }

    Ok(values)
}

async fn spool_file(
    mut field: Field<'_>,
    filename: String,
    spool_threshold: usize,
) -> Result<UploadedFile> {
    let content_type = declared_content_type(&field, &filename);
    let content_length = field
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(0);

    let mut spool = tempfile::spooled_tempfile(spool_threshold);
    let mut written = 0u64;

    while let Some(chunk) = field.chunk().await.map_err(|e| {
        AppError::BadRequest(format!("Failed to read file data: {}", e))
    })? {
        spool.write_all(&chunk)?;
        written += chunk.len() as u64;
    }
    spool.seek(SeekFrom::Start(0))?;

    debug!(
        filename = %filename,
        content_type = %content_type,
        bytes = written,
        rolled_to_disk = spool.is_rolled(),
        "Spooled uploaded file"
    );

    Ok(UploadedFile::new(filename, spool)
        .with_content_type(content_type)
        .with_content_length(content_length))
}

fn declared_content_type(field: &Field<'_>, filename: &str) -> String {
    if let Some(content_type) = field.content_type() {
        return content_type.to_string();
    }

    if filename.is_empty() {
        return mime::APPLICATION_OCTET_STREAM.essence_str().to_string();
    }

    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

//! Multipart form data parsing.
//!
//! The body is already fully buffered when dispatch starts, so it is fed to
//! `multer` as a single-chunk stream and every part is read into a
//! [`FormData`].

use bytes::Bytes;
use std::io;

use crate::{ExtractionError, ExtractionSource, FormData, UploadedFile};

/// Default maximum total body size for multipart (50 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 50 * 1024 * 1024;

/// Default maximum size per field (10 MB).
pub const DEFAULT_MAX_FIELD_SIZE: usize = 10 * 1024 * 1024;

/// Limits applied while reading a multipart body.
#[derive(Debug, Clone)]
pub struct MultipartConfig {
    /// Maximum total body size in bytes.
    pub max_body_size: usize,
    /// Maximum size per field in bytes.
    pub max_field_size: usize,
    /// Maximum number of parts allowed.
    pub max_fields: usize,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            max_field_size: DEFAULT_MAX_FIELD_SIZE,
            max_fields: 100,
        }
    }
}

impl MultipartConfig {
    /// Set the maximum number of parts.
    #[must_use]
    pub fn max_fields(mut self, count: usize) -> Self {
        self.max_fields = count;
        self
    }
}

/// Reads every part of a multipart body.
///
/// Parts with a file name become [`UploadedFile`]s; the rest must be UTF-8
/// text and become form fields.
pub async fn read_multipart(
    content_type: &str,
    body: Bytes,
    config: &MultipartConfig,
) -> Result<FormData, ExtractionError> {
    let boundary = multer::parse_boundary(content_type).map_err(|_| {
        ExtractionError::unsupported_media_type("multipart/form-data; boundary=...", Some(content_type))
    })?;

    if body.len() > config.max_body_size {
        return Err(ExtractionError::too_large(config.max_body_size, body.len()));
    }

    let stream = futures_util::stream::once(async move { Ok::<_, io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);
    let mut form = FormData::new();
    let mut count = 0usize;

    while let Some(field) = multipart.next_field().await.map_err(parse_error)? {
        count += 1;
        if count > config.max_fields {
            return Err(ExtractionError::decode(
                ExtractionSource::Form,
                format!("too many parts (max {})", config.max_fields),
            ));
        }

        let name = field.name().map(String::from);
        let file_name = field.file_name().map(String::from);
        let part_type = field.content_type().map(ToString::to_string);
        let data = field.bytes().await.map_err(parse_error)?;
        if data.len() > config.max_field_size {
            return Err(ExtractionError::too_large(config.max_field_size, data.len()));
        }

        if file_name.is_some() {
            form.push_file(UploadedFile {
                name,
                file_name,
                content_type: part_type,
                data,
            });
        } else if let Some(name) = name {
            let text = String::from_utf8(data.to_vec()).map_err(|e| {
                ExtractionError::invalid_value(ExtractionSource::Form, name.clone(), e.to_string())
            })?;
            form.push_field(name, text);
        }
    }

    Ok(form)
}

fn parse_error(e: multer::Error) -> ExtractionError {
    ExtractionError::decode(ExtractionSource::Form, format!("multipart parse error: {e}"))
}

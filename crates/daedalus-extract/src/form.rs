//! Parsed form fields.
//!
//! Both `application/x-www-form-urlencoded` and `multipart/form-data` bodies
//! are flattened into the same [`FormData`] so that keyed lookups do not care
//! which encoding the client picked.

use bytes::Bytes;

use crate::{ExtractionError, ExtractionSource};

/// Default maximum body size for urlencoded forms (1 MB).
pub const DEFAULT_MAX_FORM_SIZE: usize = 1024 * 1024;

/// A file part received in a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Form field name
    pub name: Option<String>,
    /// Client supplied file name
    pub file_name: Option<String>,
    /// Part content type
    pub content_type: Option<String>,
    /// Raw file contents
    pub data: Bytes,
}

impl UploadedFile {
    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Text fields and files of a form body, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: Vec<(String, String)>,
    files: Vec<UploadedFile>,
}

impl FormData {
    /// Creates an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an urlencoded body.
    ///
    /// # Example
    ///
    /// ```rust
    /// use daedalus_extract::FormData;
    ///
    /// let form = FormData::from_urlencoded(b"a=1&b=hello+world").unwrap();
    /// assert_eq!(form.get("b"), Some("hello world"));
    /// ```
    pub fn from_urlencoded(body: &[u8]) -> Result<Self, ExtractionError> {
        if body.len() > DEFAULT_MAX_FORM_SIZE {
            return Err(ExtractionError::too_large(
                DEFAULT_MAX_FORM_SIZE,
                body.len(),
            ));
        }
        let fields: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
            .map_err(|e| ExtractionError::decode(ExtractionSource::Form, e.to_string()))?;
        Ok(Self {
            fields,
            files: Vec::new(),
        })
    }

    /// Appends a text field.
    pub fn push_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Appends a file part.
    pub fn push_file(&mut self, file: UploadedFile) {
        self.files.push(file);
    }

    /// Returns the first value of a text field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the first file uploaded under `name`.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.name.as_deref() == Some(name))
    }

    /// Returns all text fields.
    #[must_use]
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Returns all file parts.
    #[must_use]
    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    /// Re-encodes the text fields as an urlencoded string.
    pub fn to_urlencoded(&self) -> Result<String, ExtractionError> {
        serde_urlencoded::to_string(&self.fields)
            .map_err(|e| ExtractionError::decode(ExtractionSource::Form, e.to_string()))
    }

    /// Returns true if there are neither fields nor files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.files.is_empty()
    }
}

//! Multipart form parsing.
//!
//! The request stream is drained up front so every file part is available as
//! a seekable, spooled buffer before anything touches the target directory.

use std::io::{self, Seek, SeekFrom, Write};

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use tempfile::SpooledTempFile;

use super::error::UploadError;
use super::naming::client_base_name;

/// A file attached to a multipart form.
#[derive(Debug)]
pub struct FilePart {
    /// Form field the file was sent under.
    pub field_name: String,
    /// File name declared by the client (untrusted), reduced to its last
    /// path component.
    pub file_name: String,
    /// Number of bytes received.
    pub size: u64,
    /// File content, positioned at the start.
    pub content: SpooledTempFile,
}

impl FilePart {
    /// Build a part from an in-memory buffer.
    pub fn from_bytes(
        field_name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: &[u8],
    ) -> io::Result<Self> {
        let mut content = SpooledTempFile::new(bytes.len());
        content.write_all(bytes)?;
        content.seek(SeekFrom::Start(0))?;

        Ok(Self {
            field_name: field_name.into(),
            file_name: file_name.into(),
            size: bytes.len() as u64,
            content,
        })
    }
}

/// A fully parsed multipart form.
#[derive(Debug, Default)]
pub struct ParsedForm {
    /// File parts in the order the decoder produced them.
    pub files: Vec<FilePart>,
    /// Plain (non-file) fields as name/value pairs.
    pub fields: Vec<(String, String)>,
}

impl ParsedForm {
    /// Get the first value of a plain field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

fn map_multipart_error(limit: u64) -> impl Fn(MultipartError) -> UploadError {
    move |e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::RequestTooLarge { limit }
        } else {
            UploadError::MalformedForm(e.body_text())
        }
    }
}

/// Tracks bytes consumed across the whole form.
struct Budget {
    used: u64,
    limit: u64,
}

impl Budget {
    fn spend(&mut self, bytes: usize) -> Result<(), UploadError> {
        self.used = self.used.saturating_add(bytes as u64);
        if self.used > self.limit {
            return Err(UploadError::RequestTooLarge { limit: self.limit });
        }
        Ok(())
    }
}

/// Drain a multipart form, spooling file parts.
///
/// A part counts as a file only when it declares a non-empty file name; an
/// unfilled file input (`filename=""`) is kept as an empty text field.
/// Fails with [`UploadError::RequestTooLarge`] as soon as the field payloads
/// seen so far exceed `limit` bytes.
pub async fn parse_form(
    mut multipart: Multipart,
    limit: u64,
    spool_threshold: usize,
) -> Result<ParsedForm, UploadError> {
    let mut form = ParsedForm::default();
    let mut budget = Budget { used: 0, limit };
    let map_err = map_multipart_error(limit);

    while let Some(mut field) = multipart.next_field().await.map_err(&map_err)? {
        let field_name = field.name().unwrap_or_default().to_string();

        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(|name| client_base_name(name).to_string());

        match file_name {
            Some(file_name) => {
                let part =
                    spool_file(&mut field, field_name, file_name, spool_threshold, &mut budget)
                        .await?;
                tracing::debug!(
                    field = %part.field_name,
                    file_name = %part.file_name,
                    size = part.size,
                    "Received file part"
                );
                form.files.push(part);
            }
            None => {
                let mut value = Vec::new();
                while let Some(chunk) = field.chunk().await.map_err(&map_err)? {
                    budget.spend(chunk.len())?;
                    value.extend_from_slice(&chunk);
                }
                form.fields
                    .push((field_name, String::from_utf8_lossy(&value).into_owned()));
            }
        }
    }

    Ok(form)
}

async fn spool_file(
    field: &mut Field<'_>,
    field_name: String,
    file_name: String,
    spool_threshold: usize,
    budget: &mut Budget,
) -> Result<FilePart, UploadError> {
    let map_err = map_multipart_error(budget.limit);
    let mut content = SpooledTempFile::new(spool_threshold);
    let mut size = 0u64;

    while let Some(chunk) = field.chunk().await.map_err(&map_err)? {
        budget.spend(chunk.len())?;
        content
            .write_all(&chunk)
            .map_err(UploadError::stream_io(&file_name))?;
        size += chunk.len() as u64;
    }
    content
        .seek(SeekFrom::Start(0))
        .map_err(UploadError::stream_io(&file_name))?;

    Ok(FilePart {
        field_name,
        file_name,
        size,
        content,
    })
}

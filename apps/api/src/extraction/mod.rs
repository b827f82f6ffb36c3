//! File Text Extractor: turns an uploaded résumé (PDF, Word, plain text)
//! into plain UTF-8 text.
//!
//! Type and size are validated from the upload metadata before a single
//! byte is decoded. Decoding is CPU-bound and runs on the blocking pool.

pub mod pdf;
pub mod word;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info};

use crate::sections::RawResumeText;

/// Largest accepted upload: 5 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type '{0}'")]
    UnsupportedFormat(String),

    #[error("file is {size} bytes, limit is {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("{0}")]
    ExtractionFailure(String),
}

impl ExtractError {
    pub(crate) fn failure(reason: impl Into<String>) -> Self {
        ExtractError::ExtractionFailure(reason.into())
    }
}

/// Declared metadata of an upload, as received from the client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    /// Declared (or observed) size in bytes.
    pub size: u64,
    /// Declared MIME type; may be missing for some clients.
    pub mime: Option<String>,
}

/// The four accepted document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    LegacyWord,
    WordXml,
    PlainText,
}

impl DocumentKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "application/pdf" => Some(Self::Pdf),
            "application/msword" => Some(Self::LegacyWord),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(Self::WordXml)
            }
            "text/plain" => Some(Self::PlainText),
            _ => None,
        }
    }

    /// Fallback for clients that send no usable MIME type.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, extension) = name.rsplit_once('.')?;
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "doc" => Some(Self::LegacyWord),
            "docx" => Some(Self::WordXml),
            "txt" => Some(Self::PlainText),
            _ => None,
        }
    }

    pub fn as_mime(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::LegacyWord => "application/msword",
            Self::WordXml => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::PlainText => "text/plain",
        }
    }
}

/// Resolves the document kind for an upload. A declared MIME type decides;
/// only a missing or generic (`application/octet-stream`) type falls back
/// to the file extension.
pub fn resolve_kind(file: &UploadedFile) -> Result<DocumentKind, ExtractError> {
    let declared = file
        .mime
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty() && !m.eq_ignore_ascii_case("application/octet-stream"));

    match declared {
        Some(mime) => {
            DocumentKind::from_mime(mime).ok_or_else(|| ExtractError::UnsupportedFormat(mime.to_string()))
        }
        None => DocumentKind::from_file_name(&file.name)
            .ok_or_else(|| ExtractError::UnsupportedFormat(file.name.clone())),
    }
}

/// Validates type, then size, from metadata alone. Nothing is decoded here.
pub fn check_upload(file: &UploadedFile) -> Result<DocumentKind, ExtractError> {
    let kind = resolve_kind(file)?;
    if file.size > MAX_UPLOAD_BYTES {
        return Err(ExtractError::FileTooLarge {
            size: file.size,
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(kind)
}

/// Validates the upload and decodes it into text.
pub async fn extract_text(file: &UploadedFile, data: Bytes) -> Result<RawResumeText, ExtractError> {
    let kind = check_upload(file)?;

    let actual = data.len() as u64;
    if actual > MAX_UPLOAD_BYTES {
        return Err(ExtractError::FileTooLarge {
            size: actual,
            limit: MAX_UPLOAD_BYTES,
        });
    }

    info!(file_name = %file.name, mime = kind.as_mime(), bytes = actual, "Extracting resume text");

    let text = tokio::task::spawn_blocking(move || decode(kind, &data))
        .await
        .map_err(|e| ExtractError::failure(format!("the document could not be decoded ({e})")))??;

    debug!(chars = text.as_str().len(), "Extraction finished");
    Ok(text)
}

/// Synchronous decode for an already-validated document.
pub fn decode(kind: DocumentKind, data: &[u8]) -> Result<RawResumeText, ExtractError> {
    let text = match kind {
        DocumentKind::Pdf => pdf::extract_pdf(data)?,
        DocumentKind::WordXml => word::extract_docx(data)?,
        DocumentKind::LegacyWord => word::extract_doc(data)?,
        DocumentKind::PlainText => extract_plain(data)?,
    };

    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    if text.trim().is_empty() {
        return Err(ExtractError::failure("the document contains no extractable text"));
    }
    Ok(RawResumeText::new(text))
}

fn extract_plain(data: &[u8]) -> Result<String, ExtractError> {
    let text = std::str::from_utf8(data)
        .map_err(|e| ExtractError::failure(format!("the file is not valid UTF-8 text ({e})")))?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
}

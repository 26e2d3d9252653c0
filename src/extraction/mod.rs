//! Text extraction from uploaded files.
//!
//! Format parsing is delegated to libraries: `zip` + `quick-xml` for DOCX, `pdf-extract` for
//! PDF, and `mailparse` for RFC 822 messages. Extraction is CPU-bound; async callers should run
//! [`extract_text`] on the blocking pool.

mod docx;
mod email;
pub mod file_kind;

pub use file_kind::{FileKind, detect_file_kind, sanitize_file_name};

use thiserror::Error;

/// Errors raised while turning an upload into plain text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The file name does not map to a supported format.
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
    /// The file claims a supported format but could not be parsed.
    #[error("Failed to extract text: {0}")]
    Malformed(String),
}

/// Extract plain text from `bytes` interpreted as `kind`.
pub fn extract_text(kind: FileKind, bytes: &[u8]) -> Result<String, ExtractionError> {
    let text = match kind {
        FileKind::Docx => docx::extract_docx_text(bytes)?,
        FileKind::Pdf => extract_pdf_text(bytes)?,
        FileKind::Eml => email::extract_eml_text(bytes)?,
        FileKind::Text => extract_plain_text(bytes)?,
    };
    tracing::debug!(kind = %kind, bytes = bytes.len(), chars = text.len(), "Extracted text");
    Ok(text)
}

fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|error| ExtractionError::Malformed(format!("invalid PDF: {error}")))
}

fn extract_plain_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    String::from_utf8(bytes.to_vec()).map_err(|error| {
        ExtractionError::Malformed(format!("plain text file is not valid UTF-8: {error}"))
    })
}

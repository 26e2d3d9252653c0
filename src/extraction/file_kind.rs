//! File-kind detection from upload names.

use super::ExtractionError;
use std::fmt;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Document formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// Word Open XML document.
    Docx,
    /// Portable Document Format.
    Pdf,
    /// RFC 822 email message.
    Eml,
    /// UTF-8 plain text.
    Text,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Docx => "docx",
            Self::Pdf => "pdf",
            Self::Eml => "eml",
            Self::Text => "text",
        };
        f.write_str(label)
    }
}

/// Strip directory components and unsafe characters from a client-supplied file name.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim();
    base.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_start_matches('.')
        .to_lowercase()
}

/// Determine the [`FileKind`] of an upload from its file name.
pub fn detect_file_kind(file_name: &str) -> Result<FileKind, ExtractionError> {
    let sanitized = sanitize_file_name(file_name);
    let mime = mime_guess::from_path(&sanitized).first_raw();

    let kind = match mime {
        Some(DOCX_MIME) => Some(FileKind::Docx),
        Some("application/pdf") => Some(FileKind::Pdf),
        Some("text/plain") => Some(FileKind::Text),
        Some("message/rfc822") => Some(FileKind::Eml),
        _ if sanitized.ends_with(".eml") => Some(FileKind::Eml),
        _ => None,
    };

    kind.ok_or_else(|| {
        ExtractionError::UnsupportedFileType(mime.map_or_else(
            || format!("unknown ({file_name})"),
            |value| value.to_string(),
        ))
    })
}

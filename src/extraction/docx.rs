//! DOCX text extraction: unzip `word/document.xml` and collect the text runs.

use super::ExtractionError;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::{Cursor, Read};

const DOCUMENT_PART: &str = "word/document.xml";

/// Extract paragraph text from a DOCX file held in memory, one paragraph per line.
pub(crate) fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|error| ExtractionError::Malformed(format!("invalid DOCX archive: {error}")))?;
    let mut part = archive.by_name(DOCUMENT_PART).map_err(|error| {
        ExtractionError::Malformed(format!("DOCX is missing {DOCUMENT_PART}: {error}"))
    })?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|error| ExtractionError::Malformed(format!("unreadable {DOCUMENT_PART}: {error}")))?;

    document_xml_to_text(&xml)
}

fn document_xml_to_text(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"w:t" => in_text = true,
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                b"w:p" => paragraphs.push(String::new()),
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text => current.push_str(&String::from_utf8_lossy(e)),
            Ok(Event::CData(ref e)) if in_text => current.push_str(&String::from_utf8_lossy(e)),
            Ok(Event::GeneralRef(ref e)) if in_text => {
                let name = String::from_utf8_lossy(e);
                current.push_str(&resolve_entity(&name));
            }
            Ok(Event::Eof) => break,
            Err(error) => {
                return Err(ExtractionError::Malformed(format!(
                    "invalid {DOCUMENT_PART}: {error}"
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if !current.is_empty() {
        paragraphs.push(current);
    }

    Ok(paragraphs.join("\n"))
}

/// Resolve a predefined XML entity or character reference by name (`amp`, `#38`, `#x26`).
fn resolve_entity(name: &str) -> String {
    if let Some(reference) = name.strip_prefix('#') {
        let code = match reference.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => reference.parse().ok(),
        };
        return code
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default();
    }

    match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        _ => "",
    }
    .to_string()
}

//! RFC 822 message text extraction.

use super::ExtractionError;
use mailparse::ParsedMail;

/// Extract the readable body of an email message.
///
/// Multipart messages contribute every `text/plain` part (nested parts included) in walk order.
/// Single-part messages return their decoded body whatever the content type.
pub(crate) fn extract_eml_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let message = mailparse::parse_mail(bytes)
        .map_err(|error| ExtractionError::Malformed(format!("invalid email message: {error}")))?;

    if message.subparts.is_empty() {
        return decode_body(&message);
    }

    let mut text = String::new();
    collect_plain_text(&message, &mut text)?;
    Ok(text)
}

fn collect_plain_text(part: &ParsedMail<'_>, out: &mut String) -> Result<(), ExtractionError> {
    if part.ctype.mimetype.eq_ignore_ascii_case("text/plain") {
        out.push_str(&decode_body(part)?);
    }
    for subpart in &part.subparts {
        collect_plain_text(subpart, out)?;
    }
    Ok(())
}

fn decode_body(part: &ParsedMail<'_>) -> Result<String, ExtractionError> {
    part.get_body()
        .map_err(|error| ExtractionError::Malformed(format!("undecodable email body: {error}")))
}

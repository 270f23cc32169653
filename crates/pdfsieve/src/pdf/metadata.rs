//! Document properties from the PDF info dictionary.

use crate::document::Document;
use crate::types::DocumentMetadata;

/// Read the standard info-dictionary properties.
///
/// A document without an info dictionary yields metadata with only the page
/// count and version set.
pub fn extract_metadata(document: &Document) -> DocumentMetadata {
    let pdf = document.pdf();
    let mut metadata = DocumentMetadata {
        pdf_version: Some(pdf.version.to_string()).filter(|v| !v.is_empty()),
        page_count: document.page_count(),
        ..Default::default()
    };

    let Some(info) = info_dictionary(pdf) else {
        tracing::debug!("Document has no info dictionary");
        return metadata;
    };

    metadata.title = get_string_from_dict(info, b"Title");
    metadata.author = get_string_from_dict(info, b"Author");
    metadata.subject = get_string_from_dict(info, b"Subject");
    metadata.keywords = get_string_from_dict(info, b"Keywords");
    metadata.creator = get_string_from_dict(info, b"Creator");
    metadata.producer = get_string_from_dict(info, b"Producer");
    metadata.creation_date = get_string_from_dict(info, b"CreationDate").map(|d| parse_pdf_date(&d));
    metadata.modification_date = get_string_from_dict(info, b"ModDate").map(|d| parse_pdf_date(&d));

    metadata
}

fn info_dictionary(pdf: &lopdf::Document) -> Option<&lopdf::Dictionary> {
    match pdf.trailer.get(b"Info").ok()? {
        lopdf::Object::Reference(id) => pdf.get_dictionary(*id).ok(),
        lopdf::Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// Decode a text string, skipping values that are blank after trimming.
fn get_string_from_dict(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    let value = match dict.get(key).ok()? {
        lopdf::Object::String(bytes, _) => decode_text_string(bytes),
        lopdf::Object::Name(bytes) => String::from_utf8(bytes.clone()).ok()?,
        _ => return None,
    };

    let trimmed = value.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// UTF-16BE with BOM, then UTF-8, then Latin-1.
fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Convert `D:YYYYMMDDHHmmSSOHH'mm'` to ISO 8601; unparseable values pass
/// through.
///
/// The offset is kept as written (`Z`, `+HH:mm` or `-HH:mm`). A date without
/// one is local time in an unknown zone and gets no suffix.
fn parse_pdf_date(date_str: &str) -> String {
    let cleaned = date_str.trim();
    let digits = cleaned.strip_prefix("D:").unwrap_or(cleaned);

    let field = |range: std::ops::Range<usize>| -> Option<&str> {
        digits
            .get(range)
            .filter(|s| s.chars().all(|c| c.is_ascii_digit()))
    };

    let (Some(year), Some(month), Some(day)) = (field(0..4), field(4..6), field(6..8)) else {
        return date_str.to_string();
    };

    let mut time = ["00", "00", "00"];
    let mut pos = 8;
    for slot in time.iter_mut() {
        match field(pos..pos + 2) {
            Some(value) => {
                *slot = value;
                pos += 2;
            }
            None => break,
        }
    }

    let Some(zone) = digits.get(pos..).and_then(parse_pdf_offset) else {
        return date_str.to_string();
    };

    format!(
        "{}-{}-{}T{}:{}:{}{}",
        year, month, day, time[0], time[1], time[2], zone
    )
}

/// `Z`, `+HH'mm'` or `-HH'mm'` (minutes optional) as an ISO 8601 suffix.
fn parse_pdf_offset(suffix: &str) -> Option<String> {
    let two_digits = |s: &str| s.get(0..2).filter(|d| d.chars().all(|c| c.is_ascii_digit())).map(str::to_string);

    let mut chars = suffix.chars();
    let sign = match chars.next() {
        None => return Some(String::new()),
        Some('Z') | Some('z') => return Some("Z".to_string()),
        Some(sign @ ('+' | '-')) => sign,
        Some(_) => return None,
    };

    let rest = chars.as_str();
    let hours = two_digits(rest)?;
    let rest = rest[2..].trim_start_matches('\'');
    let (minutes, rest) = if rest.is_empty() {
        ("00".to_string(), rest)
    } else {
        (two_digits(rest)?, &rest[2..])
    };

    if !rest.is_empty() && rest != "'" {
        return None;
    }
    Some(format!("{}{}:{}", sign, hours, minutes))
}

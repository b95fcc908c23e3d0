//! XML Encoding Detection and Conversion
//!
//! Handles detection of UTF-16 and other encodings based on an explicit
//! label, the BOM, or the XML declaration, and converts non-UTF-8 input
//! to UTF-8 for parsing. Writers use [`XmlEncoding::encode`] for output.

use crate::error::{Result, XmlError};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Character encodings understood by readers and writers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    /// ISO-8859-1
    Latin1,
    /// US-ASCII
    Ascii,
}

impl XmlEncoding {
    /// Detect encoding from byte order mark or initial bytes
    pub fn detect(input: &[u8]) -> Option<Self> {
        match input {
            [0xFF, 0xFE, ..] => Some(XmlEncoding::Utf16Le),
            [0xFE, 0xFF, ..] => Some(XmlEncoding::Utf16Be),
            [0xEF, 0xBB, 0xBF, ..] => Some(XmlEncoding::Utf8),
            // No BOM - check for UTF-16 pattern (< next to a null byte)
            [0x00, b'<', ..] => Some(XmlEncoding::Utf16Be),
            [b'<', 0x00, ..] => Some(XmlEncoding::Utf16Le),
            _ => None,
        }
    }

    /// Look up an encoding by its IANA name, ignoring case.
    /// Plain "UTF-16" resolves to big endian; a BOM overrides it in [`resolve`].
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_uppercase();
        match label.as_str() {
            "UTF-8" | "UTF8" => Some(XmlEncoding::Utf8),
            "UTF-16" | "UTF-16BE" | "UTF16" => Some(XmlEncoding::Utf16Be),
            "UTF-16LE" => Some(XmlEncoding::Utf16Le),
            "ISO-8859-1" | "ISO8859-1" | "LATIN1" | "LATIN-1" => Some(XmlEncoding::Latin1),
            "US-ASCII" | "ASCII" => Some(XmlEncoding::Ascii),
            _ => None,
        }
    }

    /// Canonical name, as written into XML declarations
    pub fn label(self) -> &'static str {
        match self {
            XmlEncoding::Utf8 => "UTF-8",
            XmlEncoding::Utf16Le => "UTF-16LE",
            XmlEncoding::Utf16Be => "UTF-16BE",
            XmlEncoding::Latin1 => "ISO-8859-1",
            XmlEncoding::Ascii => "US-ASCII",
        }
    }

    /// Check if input in this encoding can be parsed as UTF-8 bytes directly
    pub fn is_utf8_compatible(self) -> bool {
        matches!(self, XmlEncoding::Utf8 | XmlEncoding::Ascii)
    }

    /// Decode input bytes into a UTF-8 string, dropping any BOM
    pub fn decode(self, input: Vec<u8>) -> Result<String> {
        match self {
            XmlEncoding::Utf8 => {
                let mut bytes = input;
                if bytes.starts_with(UTF8_BOM) {
                    bytes.drain(..UTF8_BOM.len());
                }
                String::from_utf8(bytes)
                    .map_err(|e| XmlError::Encoding(format!("Invalid UTF-8: {}", e.utf8_error())))
            }
            XmlEncoding::Ascii => match input.iter().position(|b| !b.is_ascii()) {
                Some(at) => Err(XmlError::Encoding(format!("Non-ASCII byte at offset {at}"))),
                // All bytes are ASCII, which is always valid UTF-8
                None => String::from_utf8(input).map_err(|e| XmlError::Encoding(e.to_string())),
            },
            XmlEncoding::Latin1 => Ok(input.iter().map(|&b| char::from(b)).collect()),
            XmlEncoding::Utf16Le => decode_utf16(&input, [0xFF, 0xFE], u16::from_le_bytes, "LE"),
            XmlEncoding::Utf16Be => decode_utf16(&input, [0xFE, 0xFF], u16::from_be_bytes, "BE"),
        }
    }

    /// Encode a UTF-8 string for output in this encoding
    pub fn encode(self, text: &str) -> Result<Vec<u8>> {
        match self {
            XmlEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            XmlEncoding::Utf16Le => Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
            XmlEncoding::Utf16Be => Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect()),
            XmlEncoding::Latin1 | XmlEncoding::Ascii => {
                let max = if self == XmlEncoding::Ascii { 0x7F } else { 0xFF };
                text.chars()
                    .map(|c| {
                        u8::try_from(u32::from(c))
                            .ok()
                            .filter(|&b| u32::from(b) <= max)
                            .ok_or_else(|| {
                                XmlError::Encoding(format!("Character {c:?} cannot be encoded as {}", self.label()))
                            })
                    })
                    .collect()
            }
        }
    }
}

/// Convert UTF-16 bytes to a String
fn decode_utf16(input: &[u8], bom: [u8; 2], unit: fn([u8; 2]) -> u16, order: &str) -> Result<String> {
    let bytes = input.strip_prefix(&bom).unwrap_or(input);

    // Ensure even number of bytes
    if bytes.len() % 2 != 0 {
        return Err(XmlError::Encoding(format!("Invalid UTF-16 {order}: odd number of bytes")));
    }

    let code_units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| unit([chunk[0], chunk[1]]))
        .collect();

    String::from_utf16(&code_units).map_err(|e| XmlError::Encoding(format!("Invalid UTF-16 {order}: {e}")))
}

/// Read the `encoding` pseudo-attribute of an ASCII-compatible XML declaration
pub fn declared_encoding(head: &[u8]) -> Option<&str> {
    let head = head.strip_prefix(UTF8_BOM).unwrap_or(head);
    if !head.starts_with(b"<?xml") {
        return None;
    }
    let end = memchr::memmem::find(head, b"?>")?;
    let decl = std::str::from_utf8(&head[..end]).ok()?;
    let at = decl.find("encoding")?;
    let rest = decl[at + "encoding".len()..].trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| matches!(c, '"' | '\''))?;
    let value = &rest[1..];
    value.find(quote).map(|close| &value[..close])
}

/// Pick the input encoding: BOM first, then the caller's hint, then the
/// XML declaration, defaulting to UTF-8.
pub fn resolve(hint: Option<&str>, head: &[u8]) -> Result<XmlEncoding> {
    if let Some(encoding) = XmlEncoding::detect(head) {
        return Ok(encoding);
    }
    if let Some(label) = hint {
        return XmlEncoding::from_label(label)
            .ok_or_else(|| XmlError::Encoding(format!("Unsupported encoding: {label}")));
    }
    if let Some(label) = declared_encoding(head) {
        return XmlEncoding::from_label(label)
            .ok_or_else(|| XmlError::Encoding(format!("Unsupported encoding: {label}")));
    }
    Ok(XmlEncoding::Utf8)
}

/// Decode a complete document into UTF-8
pub fn decode_document(input: Vec<u8>, hint: Option<&str>) -> Result<String> {
    resolve(hint, &input)?.decode(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(XmlEncoding::detect(b"<root/>"), None);
        assert_eq!(XmlEncoding::detect(&[0xEF, 0xBB, 0xBF, b'<']), Some(XmlEncoding::Utf8));
        assert_eq!(XmlEncoding::detect(&[0xFF, 0xFE, b'<', 0x00]), Some(XmlEncoding::Utf16Le));
        assert_eq!(XmlEncoding::detect(&[0x00, b'<']), Some(XmlEncoding::Utf16Be));
    }

    #[test]
    fn test_convert_utf16_le() {
        // "<r/>" in UTF-16 LE with BOM
        let utf16_le = vec![0xFF, 0xFE, b'<', 0x00, b'r', 0x00, b'/', 0x00, b'>', 0x00];
        assert_eq!(decode_document(utf16_le, None).unwrap(), "<r/>");
    }

    #[test]
    fn test_convert_utf16_be_odd() {
        let odd = vec![0xFE, 0xFF, 0x00, b'<', 0x00];
        let err = decode_document(odd, None).unwrap_err();
        assert_eq!(err.to_string(), "Encoding error: Invalid UTF-16 BE: odd number of bytes");
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let input = [UTF8_BOM, b"<a/>"].concat();
        assert_eq!(decode_document(input, None).unwrap(), "<a/>");
    }

    #[test]
    fn test_latin1_from_declaration() {
        let mut input = b"<?xml version='1.0' encoding='ISO-8859-1'?><a>".to_vec();
        input.push(0xE9);
        input.extend_from_slice(b"</a>");
        let text = decode_document(input, None).unwrap();
        assert!(text.ends_with("<a>é</a>"));
    }

    #[test]
    fn test_hint_and_labels() {
        assert_eq!(resolve(Some("utf-8"), b"<a/>").unwrap(), XmlEncoding::Utf8);
        assert!(resolve(Some("EBCDIC"), b"<a/>").is_err());
        assert_eq!(XmlEncoding::from_label("latin1"), Some(XmlEncoding::Latin1));
        assert!(XmlEncoding::Ascii.decode(vec![b'a', 0xC3]).is_err());
    }

    #[test]
    fn test_declared_encoding() {
        assert_eq!(declared_encoding(b"<?xml version=\"1.0\" encoding = \"UTF-16\"?>"), Some("UTF-16"));
        assert_eq!(declared_encoding(b"<?xml version=\"1.0\"?>"), None);
        assert_eq!(declared_encoding(b"<a/>"), None);
    }

    #[test]
    fn test_encode() {
        assert_eq!(XmlEncoding::Utf16Le.encode("<a").unwrap(), vec![b'<', 0, b'a', 0]);
        assert_eq!(XmlEncoding::Latin1.encode("é").unwrap(), vec![0xE9]);
        assert!(XmlEncoding::Ascii.encode("é").is_err());
    }
}

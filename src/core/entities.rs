//! XML Entity Decoding
//!
//! Handles decoding of XML entities:
//! - Built-in entities: &lt; &gt; &amp; &quot; &apos;
//! - Numeric character references: &#123; &#x7B;
//!
//! Anything else is reported as an error; there is no DTD entity expansion.
//! Uses Cow for zero-copy when no entities are present.

use memchr::memchr;
use std::borrow::Cow;

/// Decode a single entity reference (without & and ;)
pub fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => decode_numeric_entity(entity.strip_prefix('#')?),
    }
}

/// Decode a numeric character reference, validated against the XML Char production
fn decode_numeric_entity(digits: &str) -> Option<char> {
    let codepoint = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u32>().ok()?,
    };
    if !is_valid_xml_char(codepoint) {
        return None;
    }
    char::from_u32(codepoint)
}

/// Check if a code point is a valid XML 1.0 Char
/// Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
#[inline]
pub fn is_valid_xml_char(codepoint: u32) -> bool {
    matches!(codepoint,
        0x9 | 0xA | 0xD |
        0x20..=0xD7FF |
        0xE000..=0xFFFD |
        0x10000..=0x10FFFF
    )
}

/// Decode text content, handling entity references
///
/// Returns Borrowed if no entities present (zero-copy). An unknown or
/// unterminated reference is an error carrying its byte offset.
pub fn decode_text(input: &str) -> Result<Cow<'_, str>, (String, usize)> {
    let bytes = input.as_bytes();
    // Fast path: check if there are any entities using SIMD
    let Some(first) = memchr(b'&', bytes) else {
        return Ok(Cow::Borrowed(input));
    };

    let mut result = String::with_capacity(input.len());
    result.push_str(&input[..first]);
    let mut pos = first;

    while pos < bytes.len() {
        let Some(amp) = memchr(b'&', &bytes[pos..]) else {
            result.push_str(&input[pos..]);
            break;
        };
        result.push_str(&input[pos..pos + amp]);
        pos += amp;

        let semi = memchr(b';', &bytes[pos..])
            .ok_or_else(|| ("Unterminated entity reference".to_string(), pos))?;
        let name = &input[pos + 1..pos + semi];
        let decoded = decode_entity(name)
            .ok_or_else(|| (format!("Unknown entity reference '&{name};'"), pos))?;
        result.push(decoded);
        pos += semi + 1;
    }

    Ok(Cow::Owned(result))
}

/// Encode text for XML element content
pub fn encode_text(input: &str) -> Cow<'_, str> {
    // Fast path: check if any escaping needed
    if !input.bytes().any(|b| matches!(b, b'<' | b'>' | b'&')) {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Encode text for use in a double-quoted XML attribute value.
/// Tab, CR and LF become character references so they survive value normalization.
pub fn encode_attribute(input: &str) -> Cow<'_, str> {
    if !input
        .bytes()
        .any(|b| matches!(b, b'<' | b'>' | b'&' | b'"' | b'\t' | b'\n' | b'\r'))
    {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\t' => result.push_str("&#9;"),
            '\n' => result.push_str("&#10;"),
            '\r' => result.push_str("&#13;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_entities() {
        let result = decode_text("Hello, World!").unwrap();
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, "Hello, World!");
    }

    #[test]
    fn test_basic_entities() {
        let result = decode_text("&lt;hello&gt; &amp; &quot;world&apos;").unwrap();
        assert_eq!(result, "<hello> & \"world'");
    }

    #[test]
    fn test_numeric() {
        assert_eq!(decode_text("&#65;&#x42;&#X43;").unwrap(), "ABC");
        assert_eq!(decode_text("&#x1F600;").unwrap(), "😀");
        assert_eq!(decode_entity("#0"), None);
        assert_eq!(decode_entity("#xD800"), None);
    }

    #[test]
    fn test_unknown_entity() {
        let (message, offset) = decode_text("ab&nbsp;").unwrap_err();
        assert_eq!(message, "Unknown entity reference '&nbsp;'");
        assert_eq!(offset, 2);
        assert!(decode_text("a & b").is_err());
    }

    #[test]
    fn test_encode_text() {
        assert_eq!(encode_text("<hello> & \"world\""), "&lt;hello&gt; &amp; \"world\"");
        assert!(matches!(encode_text("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_encode_attribute() {
        assert_eq!(encode_attribute("a\"b\nc&"), "a&quot;b&#10;c&amp;");
    }
}

//! XML Attribute Parsing
//!
//! Parses XML attributes from tag content. Namespace declarations are kept
//! as ordinary attributes here; the reader separates them out.

use super::entities::decode_text;
use super::scanner::{is_name_char, is_name_start_char, is_whitespace};
use super::tokenizer::ParseError;
use crate::reader::events::split_name;
use std::borrow::Cow;

/// A parsed XML attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    /// Attribute name (may include namespace prefix)
    pub name: &'a str,
    /// Attribute value (entities decoded)
    pub value: Cow<'a, str>,
}

impl<'a> Attribute<'a> {
    /// Prefix (before colon), if any
    pub fn prefix(&self) -> Option<&'a str> {
        split_name(self.name).0
    }

    /// Local name (after colon, if namespaced)
    pub fn local_name(&self) -> &'a str {
        split_name(self.name).1
    }

    /// Check if this is `xmlns` or `xmlns:*`
    pub fn is_namespace_declaration(&self) -> bool {
        self.name == "xmlns" || self.prefix() == Some("xmlns")
    }
}

/// Parse attributes from raw tag content (after the element name).
///
/// `base` is the byte offset of `input` in the document, used for error
/// positions. Values must be quoted and names must be unique.
pub fn parse_attributes(input: &str, base: usize) -> Result<Vec<Attribute<'_>>, ParseError> {
    let bytes = input.as_bytes();
    let mut attrs: Vec<Attribute<'_>> = Vec::new();
    let mut pos = 0;

    loop {
        let ws_start = pos;
        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }
        if pos == ws_start {
            return Err(ParseError::new("Whitespace required between attributes", base + pos));
        }

        // Parse attribute name
        let name_start = pos;
        if !is_name_start_char(bytes[pos]) {
            return Err(ParseError::new(
                "Attribute name must start with letter, underscore, or colon",
                base + pos,
            ));
        }
        while pos < bytes.len() && is_name_char(bytes[pos]) {
            pos += 1;
        }
        let name = &input[name_start..pos];

        // Skip whitespace around '='
        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }
        if pos >= bytes.len() || bytes[pos] != b'=' {
            return Err(ParseError::new(
                format!("Attribute '{name}' requires a value"),
                base + pos,
            ));
        }
        pos += 1;
        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }

        let quote = match bytes.get(pos) {
            Some(&q @ (b'"' | b'\'')) => q,
            _ => {
                return Err(ParseError::new("Attribute value must be quoted", base + pos));
            }
        };
        pos += 1;
        let value_start = pos;
        while pos < bytes.len() && bytes[pos] != quote {
            if bytes[pos] == b'<' {
                return Err(ParseError::new("Attribute value cannot contain '<'", base + pos));
            }
            pos += 1;
        }
        if pos >= bytes.len() {
            return Err(ParseError::new("Attribute value has mismatched quotes", base + value_start));
        }

        let value = decode_text(&input[value_start..pos])
            .map_err(|(message, offset)| ParseError::new(message, base + value_start + offset))?;
        pos += 1; // Skip closing quote

        if attrs.iter().any(|a| a.name == name) {
            return Err(ParseError::new(
                format!("Duplicate attribute '{name}'"),
                base + name_start,
            ));
        }
        attrs.push(Attribute { name, value });
    }

    Ok(attrs)
}

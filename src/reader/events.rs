//! XML Event Types
//!
//! The canonical event vocabulary every reader backend is normalized to,
//! plus the small value types handed out by the reader accessors.

use std::fmt;

/// Canonical XML parsing event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Before the first event; the initial state of every reader
    StartDocument,
    /// End of input; terminal state
    EndDocument,
    /// Start of an element, including empty elements
    StartElement,
    /// End of an element, synthesized for empty elements
    EndElement,
    /// Coalesced text, CDATA and entity references
    Characters,
    /// Processing instruction: <?target data?>
    ProcessingInstruction,
    /// DOCTYPE declaration
    Dtd,
}

impl EventType {
    /// Upper-case event name, as used in error messages
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::StartDocument => "START_DOCUMENT",
            EventType::EndDocument => "END_DOCUMENT",
            EventType::StartElement => "START_ELEMENT",
            EventType::EndElement => "END_ELEMENT",
            EventType::Characters => "CHARACTERS",
            EventType::ProcessingInstruction => "PROCESSING_INSTRUCTION",
            EventType::Dtd => "DTD",
        }
    }

    /// Check if this is an element boundary event
    #[inline]
    pub fn is_element(self) -> bool {
        matches!(self, EventType::StartElement | EventType::EndElement)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute of the current start element, with its namespace resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Namespace URI, `None` for unprefixed attributes
    pub namespace_uri: Option<String>,
    /// Local name (after colon)
    pub local_name: String,
    /// Decoded value
    pub value: String,
}

impl Attribute {
    /// Create an attribute
    pub fn new(
        namespace_uri: Option<impl Into<String>>,
        local_name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Attribute {
            namespace_uri: namespace_uri.map(Into::into),
            local_name: local_name.into(),
            value: value.into(),
        }
    }

    /// Check if this attribute has the given namespace and local name
    #[inline]
    pub fn matches(&self, namespace_uri: Option<&str>, local_name: &str) -> bool {
        self.namespace_uri.as_deref() == namespace_uri && self.local_name == local_name
    }
}

/// 1-based line and column in the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Start of input
    pub const START: Position = Position { line: 1, column: 1 };

    /// Advance over `text`, counting one column per character.
    /// Only LF ends a line; CR takes no column.
    pub fn advance(&mut self, text: &[u8]) {
        for &b in text {
            match b {
                b'\n' => {
                    self.line += 1;
                    self.column = 1;
                }
                // UTF-8 continuation bytes do not start a character
                b'\r' | 0x80..=0xBF => {}
                _ => self.column += 1,
            }
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::START
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Split a qualified name into prefix and local name at the colon
pub fn split_name(name: &str) -> (Option<&str>, &str) {
    if let Some(pos) = memchr::memchr(b':', name.as_bytes()) {
        (Some(&name[..pos]), &name[pos + 1..])
    } else {
        (None, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(EventType::StartElement.to_string(), "START_ELEMENT");
        assert_eq!(EventType::ProcessingInstruction.to_string(), "PROCESSING_INSTRUCTION");
        assert!(EventType::EndElement.is_element());
        assert!(!EventType::Characters.is_element());
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("svg:rect"), (Some("svg"), "rect"));
        assert_eq!(split_name("div"), (None, "div"));
    }

    #[test]
    fn test_position_advance() {
        let mut pos = Position::START;
        pos.advance(b"ab\ncd");
        assert_eq!(pos, Position { line: 2, column: 3 });

        let mut pos = Position::START;
        pos.advance(b"a\r\nbc");
        assert_eq!(pos, Position { line: 2, column: 3 });

        let mut pos = Position::START;
        pos.advance("héllo".as_bytes());
        assert_eq!(pos.column, 6);
    }

    #[test]
    fn test_attribute_matches() {
        let attr = Attribute::new(Some("urn:x"), "a", "1");
        assert!(attr.matches(Some("urn:x"), "a"));
        assert!(!attr.matches(None, "a"));
        let plain = Attribute::new(None::<String>, "a", "1");
        assert!(plain.matches(None, "a"));
    }
}

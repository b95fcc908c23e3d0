//! Error types for reading and writing XML.
//!
//! Every failure carries an [`ErrorKind`] so callers can tell a caller bug
//! (illegal state, bad index) apart from bad data (malformed input, I/O).

use std::fmt;

use thiserror::Error;

use crate::reader::events::{EventType, Position};

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, XmlError>;

/// Broad category of an [`XmlError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input or a failing byte source.
    Xml,
    /// An operation was called in a state where it is not allowed.
    IllegalState,
    /// An attribute index was outside `0..attribute_count`.
    IndexOutOfBounds,
    /// A writer invariant was broken (unbalanced tags, double start...).
    Writer,
    /// No usable backend could be selected.
    Factory,
}

/// Errors produced by readers, writers and factories.
#[derive(Debug, Error)]
pub enum XmlError {
    /// Input is not well-formed XML.
    #[error("{message}{}", at(.position))]
    Syntax {
        message: String,
        position: Option<Position>,
    },

    /// The input ended inside the document.
    #[error("Unexpected end of document{}", at(.position))]
    UnexpectedEof { position: Option<Position> },

    /// The engine produced a token kind the reader does not know.
    #[error("Unknown token: {0}")]
    UnknownToken(String),

    /// An element or attribute prefix has no namespace binding.
    #[error("Unbound namespace prefix '{prefix}'{}", at(.position))]
    UnboundPrefix {
        prefix: String,
        position: Option<Position>,
    },

    /// Input bytes could not be decoded, or the encoding is unsupported.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// The document does not have the structure a caller required.
    #[error("{message}{}", at(.position))]
    Structure {
        message: String,
        position: Option<Position>,
    },

    /// The underlying byte source or sink failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reported by the quick-xml engine.
    #[cfg(feature = "stream")]
    #[error("XML error: {0}")]
    QuickXml(#[from] quick_xml::Error),

    /// Accessor called for an event it does not apply to.
    #[error("{operation} not allowed for {event}")]
    NotAllowed {
        operation: &'static str,
        event: EventType,
    },

    /// `next` called after `END_DOCUMENT`.
    #[error("Already at END_DOCUMENT")]
    AfterEndDocument,

    /// Attribute index outside the current element's attributes.
    #[error("{index} (attributeCount: {count})")]
    IndexOutOfBounds { index: usize, count: usize },

    /// Writer invariant violated.
    #[error("{0}")]
    Writer(String),

    /// No backend available for a factory.
    #[error("{0}")]
    Factory(String),
}

impl XmlError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            XmlError::Syntax { .. }
            | XmlError::UnexpectedEof { .. }
            | XmlError::UnknownToken(_)
            | XmlError::UnboundPrefix { .. }
            | XmlError::Encoding(_)
            | XmlError::Structure { .. }
            | XmlError::Io(_) => ErrorKind::Xml,
            #[cfg(feature = "stream")]
            XmlError::QuickXml(_) => ErrorKind::Xml,
            XmlError::NotAllowed { .. } | XmlError::AfterEndDocument => ErrorKind::IllegalState,
            XmlError::IndexOutOfBounds { .. } => ErrorKind::IndexOutOfBounds,
            XmlError::Writer(_) => ErrorKind::Writer,
            XmlError::Factory(_) => ErrorKind::Factory,
        }
    }

    /// Create a syntax error.
    pub fn syntax(message: impl Into<String>, position: Option<Position>) -> Self {
        Self::Syntax {
            message: message.into(),
            position,
        }
    }

    /// Create a structure error.
    pub fn structure(message: impl Into<String>, position: Option<Position>) -> Self {
        Self::Structure {
            message: message.into(),
            position,
        }
    }

    /// Create a writer error.
    pub fn writer(message: impl Into<String>) -> Self {
        Self::Writer(message.into())
    }

    /// Position the error was detected at, when known.
    pub fn position(&self) -> Option<Position> {
        match self {
            XmlError::Syntax { position, .. }
            | XmlError::UnexpectedEof { position }
            | XmlError::UnboundPrefix { position, .. }
            | XmlError::Structure { position, .. } => *position,
            _ => None,
        }
    }
}

/// Renders " at line:column" for the error messages above.
fn at(position: &Option<Position>) -> Located {
    Located(*position)
}

struct Located(Option<Position>);

impl fmt::Display for Located {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(p) => write!(f, " at {}:{}", p.line, p.column),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(XmlError::syntax("bad", None).kind(), ErrorKind::Xml);
        assert_eq!(XmlError::AfterEndDocument.kind(), ErrorKind::IllegalState);
        assert_eq!(
            XmlError::IndexOutOfBounds { index: 2, count: 2 }.kind(),
            ErrorKind::IndexOutOfBounds
        );
        assert_eq!(XmlError::writer("x").kind(), ErrorKind::Writer);
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        assert_eq!(XmlError::from(io).kind(), ErrorKind::Xml);
    }

    #[test]
    fn test_messages() {
        let err = XmlError::NotAllowed {
            operation: "text",
            event: EventType::StartElement,
        };
        assert_eq!(err.to_string(), "text not allowed for START_ELEMENT");

        let err = XmlError::IndexOutOfBounds { index: 3, count: 1 };
        assert_eq!(err.to_string(), "3 (attributeCount: 1)");

        let err = XmlError::UnexpectedEof {
            position: Some(Position { line: 4, column: 2 }),
        };
        assert_eq!(err.to_string(), "Unexpected end of document at 4:2");
        assert_eq!(err.position(), Some(Position { line: 4, column: 2 }));
    }
}

//! Raw token sources
//!
//! The seam between an XML engine and the canonical cursor. Each backend
//! reports its native tokens as [`RawKind`] values and exposes the data of
//! the current token through [`TokenSource`]; the cursor does the rest.

use crate::error::Result;
use crate::reader::events::Position;

/// Raw token kinds, a superset of what any single engine reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawKind {
    StartDocument,
    EndDocument,
    StartTag,
    EndTag,
    Text,
    CData,
    EntityRef,
    IgnorableWhitespace,
    Comment,
    XmlDeclaration,
    EntityDeclaration,
    NotationDeclaration,
    NamespaceDeclaration,
    AttributePseudo,
    ProcessingInstruction,
    DocTypeDeclaration,
    /// A token the engine produced that has no mapping; the payload names it
    Unrecognized(String),
}

impl RawKind {
    /// Check if this token carries character data that gets coalesced
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            RawKind::Text | RawKind::CData | RawKind::EntityRef | RawKind::IgnorableWhitespace
        )
    }
}

/// Qualified name of the current tag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawName {
    pub prefix: Option<String>,
    pub local_name: String,
}

impl RawName {
    pub fn new(prefix: Option<&str>, local_name: &str) -> Self {
        RawName {
            prefix: prefix.map(str::to_string),
            local_name: local_name.to_string(),
        }
    }
}

/// Attribute exactly as written, namespace declarations included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttribute {
    pub prefix: Option<String>,
    pub local_name: String,
    pub value: String,
}

impl RawAttribute {
    /// Check if this is `xmlns` or `xmlns:*`
    pub fn is_namespace_declaration(&self) -> bool {
        match &self.prefix {
            Some(prefix) => prefix == "xmlns",
            None => self.local_name == "xmlns",
        }
    }
}

/// A low-level XML token stream.
///
/// Accessors describe the token most recently returned by `next_token` and
/// are only meaningful for the kinds noted on each method. Empty elements
/// are reported as a `StartTag` followed by an `EndTag`.
pub trait TokenSource {
    /// Advance to the next raw token. Blocks on the underlying input.
    fn next_token(&mut self) -> Result<RawKind>;

    /// Decoded text of a text-like token
    fn text(&self) -> &str;

    /// Name of a `StartTag` or `EndTag`
    fn tag_name(&self) -> &RawName;

    /// Attributes of a `StartTag`
    fn attributes(&self) -> &[RawAttribute];

    /// Resolve a prefix in the scope of the current tag;
    /// `None` asks for the default namespace
    fn resolve_namespace(&self, prefix: Option<&str>) -> Option<String>;

    /// Target and data of a `ProcessingInstruction`
    fn processing_instruction(&self) -> (&str, &str);

    /// Position just after the current token, when the engine tracks it
    fn position(&self) -> Option<Position>;
}

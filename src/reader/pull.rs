//! Pull backend
//!
//! [`TokenSource`] over the crate's own tokenizer. The whole document is
//! decoded to UTF-8 up front, then tokenized lazily. This adapter adds what
//! the tokenizer leaves out: namespace scopes, tag balancing, synthesized
//! end tags for empty elements, and the prolog/epilog whitespace policy.

use std::io::Read;

use crate::core::attributes::parse_attributes;
use crate::core::encoding::decode_document;
use crate::core::entities::decode_entity;
use crate::core::namespace::NamespaceScopes;
use crate::core::scanner::is_whitespace;
use crate::core::tokenizer::{ParseError, Token, TokenKind, Tokenizer};
use crate::error::{Result, XmlError};
use crate::reader::buffered::read_all;
use crate::reader::events::{split_name, Position};
use crate::reader::pi::split_processing_instruction;
use crate::reader::source::{RawAttribute, RawKind, RawName, TokenSource};

/// Token source backed by the in-crate tokenizer
pub struct PullSource {
    document: String,
    state: PullState,
}

/// Everything that changes while tokenizing; kept apart from the document
/// so tokens can borrow the one while updating the other.
#[derive(Default)]
struct PullState {
    offset: usize,
    position: Position,
    scopes: NamespaceScopes,
    /// Qualified names of the open elements
    open: Vec<String>,
    /// Scope of the last end tag, popped on the next advance
    pop_pending: bool,
    /// End tag owed for the last empty-element tag
    end_pending: bool,
    seen_root: bool,
    started: bool,
    finished: bool,
    text: String,
    name: RawName,
    attributes: Vec<RawAttribute>,
    pi_target: String,
    pi_data: String,
}

impl PullSource {
    /// Read and decode a whole document. `encoding` overrides the
    /// declared encoding unless the input starts with a BOM.
    pub fn new<R: Read>(reader: R, encoding: Option<&str>) -> Result<Self> {
        let bytes = read_all(reader)?;
        Ok(Self::from_string(decode_document(bytes, encoding)?))
    }

    /// Tokenize an already decoded document
    pub fn from_string(document: impl Into<String>) -> Self {
        PullSource {
            document: document.into(),
            state: PullState {
                position: Position::START,
                ..PullState::default()
            },
        }
    }
}

impl PullState {
    fn position_at(&self, document: &str, offset: usize) -> Position {
        let mut position = self.position;
        let end = offset.clamp(self.offset, document.len());
        position.advance(&document.as_bytes()[self.offset..end]);
        position
    }

    fn syntax(&self, document: &str, error: ParseError) -> XmlError {
        XmlError::syntax(error.message, Some(self.position_at(document, error.position)))
    }

    fn error_here(&self, message: impl Into<String>) -> XmlError {
        XmlError::syntax(message, Some(self.position))
    }

    fn advance(&mut self, document: &str) -> Result<RawKind> {
        let token = Tokenizer::at(document, self.offset)
            .next_token()
            .map_err(|e| self.syntax(document, e))?;

        if token.kind == TokenKind::StartTag || token.kind == TokenKind::EmptyTag {
            // Attribute errors are reported at their own offset
            let attributes = parse_attributes(token.content, token.span.0 + 1 + token.name.len())
                .map_err(|e| self.syntax(document, e))?;
            self.attributes = attributes
                .iter()
                .map(|a| RawAttribute {
                    prefix: a.prefix().map(str::to_string),
                    local_name: a.local_name().to_string(),
                    value: a.value.to_string(),
                })
                .collect();
        }

        self.position.advance(&document.as_bytes()[self.offset..token.span.1]);
        self.offset = token.span.1;
        self.classify(token)
    }

    fn classify(&mut self, token: Token<'_>) -> Result<RawKind> {
        let in_root = !self.open.is_empty();
        match token.kind {
            TokenKind::Eof => {
                if in_root || !self.seen_root {
                    return Err(XmlError::UnexpectedEof {
                        position: Some(self.position),
                    });
                }
                self.finished = true;
                Ok(RawKind::EndDocument)
            }
            TokenKind::StartTag | TokenKind::EmptyTag => {
                if !in_root && self.seen_root {
                    return Err(self.error_here("Only one root element is allowed"));
                }
                self.seen_root = true;
                self.start_element(token.name)?;
                self.end_pending = token.kind == TokenKind::EmptyTag;
                Ok(RawKind::StartTag)
            }
            TokenKind::EndTag => {
                match self.open.pop() {
                    Some(open) if open == token.name => {}
                    Some(open) => {
                        return Err(self.error_here(format!(
                            "End tag '</{}>' does not match start tag '<{open}>'",
                            token.name
                        )));
                    }
                    None => {
                        return Err(self.error_here(format!("Unexpected end tag '</{}>'", token.name)));
                    }
                }
                let (prefix, local_name) = split_name(token.name);
                self.name = RawName::new(prefix, local_name);
                self.pop_pending = true;
                Ok(RawKind::EndTag)
            }
            TokenKind::Text => {
                self.text.clear();
                self.text.push_str(token.content);
                if in_root {
                    Ok(RawKind::Text)
                } else if token.content.bytes().all(is_whitespace) {
                    Ok(RawKind::IgnorableWhitespace)
                } else {
                    Err(self.error_here("Text is not allowed outside the root element"))
                }
            }
            TokenKind::EntityRef | TokenKind::CData if !in_root => {
                Err(self.error_here("Character data is not allowed outside the root element"))
            }
            TokenKind::EntityRef => {
                let decoded = decode_entity(token.content).ok_or_else(|| {
                    self.error_here(format!("Unknown entity reference '&{};'", token.content))
                })?;
                self.text.clear();
                self.text.push(decoded);
                Ok(RawKind::EntityRef)
            }
            TokenKind::CData => {
                self.text.clear();
                self.text.push_str(token.content);
                Ok(RawKind::CData)
            }
            TokenKind::Comment => Ok(RawKind::Comment),
            TokenKind::XmlDeclaration => Ok(RawKind::XmlDeclaration),
            TokenKind::ProcessingInstruction => {
                let (target, data) = split_processing_instruction(token.content);
                self.pi_target = target.to_string();
                self.pi_data = data.to_string();
                Ok(RawKind::ProcessingInstruction)
            }
            TokenKind::DocType => {
                if self.seen_root {
                    return Err(self.error_here("DOCTYPE must come before the root element"));
                }
                self.text.clear();
                self.text.push_str(token.content);
                Ok(RawKind::DocTypeDeclaration)
            }
            TokenKind::Unknown => Ok(RawKind::Unrecognized(format!("<!{}", token.name))),
        }
    }

    /// Open a new element scope and record its namespace declarations
    fn start_element(&mut self, qname: &str) -> Result<()> {
        self.scopes.push_scope();
        for attr in &self.attributes {
            match (attr.prefix.as_deref(), attr.local_name.as_str()) {
                (None, "xmlns") => self.scopes.declare_default(&attr.value),
                (Some("xmlns"), prefix) => {
                    if attr.value.is_empty() {
                        return Err(self.error_here(format!("Prefix '{prefix}' cannot be undeclared")));
                    }
                    self.scopes.declare(prefix, &attr.value);
                }
                _ => {}
            }
        }
        let (prefix, local_name) = split_name(qname);
        self.name = RawName::new(prefix, local_name);
        self.open.push(qname.to_string());
        Ok(())
    }
}

impl TokenSource for PullSource {
    fn next_token(&mut self) -> Result<RawKind> {
        let state = &mut self.state;
        if !state.started {
            state.started = true;
            return Ok(RawKind::StartDocument);
        }
        if state.finished {
            return Err(XmlError::UnexpectedEof {
                position: Some(state.position),
            });
        }
        if state.pop_pending {
            state.scopes.pop_scope();
            state.pop_pending = false;
        }
        if state.end_pending {
            // Synthesized end of an empty element, same name and scope
            state.end_pending = false;
            state.open.pop();
            state.pop_pending = true;
            return Ok(RawKind::EndTag);
        }
        state.advance(&self.document)
    }

    fn text(&self) -> &str {
        &self.state.text
    }

    fn tag_name(&self) -> &RawName {
        &self.state.name
    }

    fn attributes(&self) -> &[RawAttribute] {
        &self.state.attributes
    }

    fn resolve_namespace(&self, prefix: Option<&str>) -> Option<String> {
        self.state.scopes.resolve(prefix.unwrap_or("")).map(str::to_string)
    }

    fn processing_instruction(&self) -> (&str, &str) {
        (&self.state.pi_target, &self.state.pi_data)
    }

    fn position(&self) -> Option<Position> {
        Some(self.state.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Result<Vec<RawKind>> {
        let mut source = PullSource::from_string(input);
        let mut kinds = Vec::new();
        loop {
            let kind = source.next_token()?;
            let done = kind == RawKind::EndDocument;
            kinds.push(kind);
            if done {
                return Ok(kinds);
            }
        }
    }

    #[test]
    fn test_empty_element_expanded() {
        let mut source = PullSource::from_string("<a><b x='1'/></a>");
        assert_eq!(source.next_token().unwrap(), RawKind::StartDocument);
        assert_eq!(source.next_token().unwrap(), RawKind::StartTag);
        assert_eq!(source.next_token().unwrap(), RawKind::StartTag);
        assert_eq!(source.tag_name().local_name, "b");
        assert_eq!(source.attributes().len(), 1);
        assert_eq!(source.next_token().unwrap(), RawKind::EndTag);
        assert_eq!(source.tag_name().local_name, "b");
        assert_eq!(source.next_token().unwrap(), RawKind::EndTag);
        assert_eq!(source.tag_name().local_name, "a");
        assert_eq!(source.next_token().unwrap(), RawKind::EndDocument);
    }

    #[test]
    fn test_prolog_whitespace_is_ignorable() {
        let kinds = tokens("<?xml version='1.0'?>\n<!-- c -->\n<a> </a>\n").unwrap();
        assert_eq!(
            kinds,
            [
                RawKind::StartDocument,
                RawKind::XmlDeclaration,
                RawKind::IgnorableWhitespace,
                RawKind::Comment,
                RawKind::IgnorableWhitespace,
                RawKind::StartTag,
                RawKind::Text,
                RawKind::EndTag,
                RawKind::IgnorableWhitespace,
                RawKind::EndDocument,
            ]
        );
    }

    #[test]
    fn test_namespace_scope_at_end_tag() {
        let mut source = PullSource::from_string("<p:a xmlns:p='urn:p'><b/></p:a>");
        source.next_token().unwrap();
        source.next_token().unwrap();
        assert_eq!(source.resolve_namespace(Some("p")).as_deref(), Some("urn:p"));
        source.next_token().unwrap(); // <b>
        source.next_token().unwrap(); // </b>
        assert_eq!(source.next_token().unwrap(), RawKind::EndTag);
        assert_eq!(source.tag_name().prefix.as_deref(), Some("p"));
        assert_eq!(source.resolve_namespace(Some("p")).as_deref(), Some("urn:p"));
        assert_eq!(source.next_token().unwrap(), RawKind::EndDocument);
        assert_eq!(source.resolve_namespace(Some("p")), None);
    }

    #[test]
    fn test_entity_ref_token() {
        let mut source = PullSource::from_string("<a>&#x41;</a>");
        source.next_token().unwrap();
        source.next_token().unwrap();
        assert_eq!(source.next_token().unwrap(), RawKind::EntityRef);
        assert_eq!(source.text(), "A");
    }

    #[test]
    fn test_processing_instruction_split() {
        let mut source = PullSource::from_string("<?magic  two words ?><a/>");
        source.next_token().unwrap();
        assert_eq!(source.next_token().unwrap(), RawKind::ProcessingInstruction);
        assert_eq!(source.processing_instruction(), ("magic", "two words "));
        assert_eq!(source.position(), Some(Position { line: 1, column: 22 }));
    }

    #[test]
    fn test_unknown_declaration() {
        let kinds = tokens("<!ELEMENT a ANY><a/>").unwrap();
        assert_eq!(kinds[1], RawKind::Unrecognized("<!ELEMENT".into()));
    }

    #[test]
    fn test_structure_errors() {
        assert!(matches!(tokens("<a>"), Err(XmlError::UnexpectedEof { .. })));
        assert!(matches!(tokens(""), Err(XmlError::UnexpectedEof { .. })));
        assert!(matches!(tokens("<a></b>"), Err(XmlError::Syntax { .. })));
        assert!(matches!(tokens("<a/><b/>"), Err(XmlError::Syntax { .. })));
        assert!(matches!(tokens("x<a/>"), Err(XmlError::Syntax { .. })));
        assert!(matches!(tokens("\u{c}<a/>"), Err(XmlError::Syntax { .. })));
        assert!(matches!(tokens("<a/>\u{a0}"), Err(XmlError::Syntax { .. })));
        assert!(matches!(tokens("<a>&bogus;</a>"), Err(XmlError::Syntax { .. })));
        assert!(matches!(tokens("<a xmlns:p=''/>"), Err(XmlError::Syntax { .. })));
    }

    #[test]
    fn test_xml_whitespace_characters_outside_root() {
        let kinds = tokens(" \t\r\n<a/>\n").unwrap();
        assert_eq!(
            kinds,
            vec![
                RawKind::StartDocument,
                RawKind::IgnorableWhitespace,
                RawKind::StartTag,
                RawKind::EndTag,
                RawKind::IgnorableWhitespace,
                RawKind::EndDocument,
            ]
        );
    }

    #[test]
    fn test_error_position() {
        let err = tokens("<a>\n  <b x=1/></a>").unwrap_err();
        assert_eq!(err.position(), Some(Position { line: 2, column: 8 }));
    }

    #[test]
    fn test_eof_after_end_document() {
        let mut source = PullSource::from_string("<a/>");
        while source.next_token().unwrap() != RawKind::EndDocument {}
        assert!(matches!(source.next_token(), Err(XmlError::UnexpectedEof { .. })));
    }
}

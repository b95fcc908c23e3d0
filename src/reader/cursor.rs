//! Canonical event cursor
//!
//! [`XmlCursor`] turns any [`TokenSource`] into the canonical event stream:
//! - raw kinds are mapped to [`EventType`], absorbing the ones with no
//!   canonical counterpart
//! - adjacent text, CDATA and entity tokens are coalesced into one
//!   `CHARACTERS` event, with one token of lookahead kept for the next call
//! - element and attribute names are resolved against the source's
//!   namespace scopes, and namespace declarations are filtered out
//! - every accessor is checked against the current event

use crate::core::namespace::ns;
use crate::error::{Result, XmlError};
use crate::reader::events::{Attribute, EventType, Position};
use crate::reader::helpers::qualified_name;
use crate::reader::source::{RawKind, TokenSource};
use crate::reader::XmlRead;

const ELEMENT_EVENTS: &[EventType] = &[EventType::StartElement, EventType::EndElement];
const START_ELEMENT: &[EventType] = &[EventType::StartElement];
const CHARACTERS: &[EventType] = &[EventType::Characters];
const PROCESSING_INSTRUCTION: &[EventType] = &[EventType::ProcessingInstruction];

/// Canonical reader over a raw token source
pub struct XmlCursor<S> {
    source: S,
    event: EventType,
    /// First non-text token seen while coalescing, consumed by the next `next`
    lookahead: Option<RawKind>,
    namespace_uri: Option<String>,
    local_name: String,
    attributes: Vec<Attribute>,
    text: String,
    pi_target: String,
    pi_data: String,
    position: Option<Position>,
}

impl<S: TokenSource> XmlCursor<S> {
    /// Create a cursor positioned at `START_DOCUMENT`
    pub fn new(source: S) -> Self {
        XmlCursor {
            source,
            event: EventType::StartDocument,
            lookahead: None,
            namespace_uri: None,
            local_name: String::new(),
            attributes: Vec::new(),
            text: String::new(),
            pi_target: String::new(),
            pi_data: String::new(),
            position: None,
        }
    }

    /// The underlying token source
    pub fn source(&self) -> &S {
        &self.source
    }

    fn require(&self, operation: &'static str, allowed: &[EventType]) -> Result<()> {
        if allowed.contains(&self.event) {
            Ok(())
        } else {
            Err(XmlError::NotAllowed {
                operation,
                event: self.event,
            })
        }
    }

    fn indexed(&self, operation: &'static str, index: usize) -> Result<&Attribute> {
        self.require(operation, START_ELEMENT)?;
        self.attributes.get(index).ok_or(XmlError::IndexOutOfBounds {
            index,
            count: self.attributes.len(),
        })
    }

    /// Map one raw token; `None` means it was absorbed
    fn classify(&mut self, raw: RawKind) -> Result<Option<EventType>> {
        let event = match raw {
            RawKind::StartDocument
            | RawKind::IgnorableWhitespace
            | RawKind::Comment
            | RawKind::XmlDeclaration
            | RawKind::EntityDeclaration
            | RawKind::NotationDeclaration
            | RawKind::NamespaceDeclaration
            | RawKind::AttributePseudo => {
                tracing::trace!(kind = ?raw, "absorbed raw token");
                return Ok(None);
            }
            RawKind::EndDocument => EventType::EndDocument,
            RawKind::StartTag => {
                self.load_element(true)?;
                EventType::StartElement
            }
            RawKind::EndTag => {
                self.load_element(false)?;
                EventType::EndElement
            }
            RawKind::Text | RawKind::CData | RawKind::EntityRef => {
                self.coalesce()?;
                return Ok(Some(EventType::Characters));
            }
            RawKind::ProcessingInstruction => {
                let (target, data) = self.source.processing_instruction();
                self.pi_target.clear();
                self.pi_target.push_str(target);
                self.pi_data.clear();
                self.pi_data.push_str(data);
                EventType::ProcessingInstruction
            }
            RawKind::DocTypeDeclaration => EventType::Dtd,
            RawKind::Unrecognized(kind) => return Err(XmlError::UnknownToken(kind)),
        };
        self.position = self.source.position();
        Ok(Some(event))
    }

    /// Pull text-like tokens until something else shows up. Comments and
    /// other absorbed tokens inside the run are dropped without ending it.
    fn coalesce(&mut self) -> Result<()> {
        self.text.clear();
        self.text.push_str(self.source.text());
        let mut position = self.source.position();
        let mut fragments = 1usize;

        loop {
            let next = self.source.next_token()?;
            if matches!(
                next,
                RawKind::Comment
                    | RawKind::XmlDeclaration
                    | RawKind::EntityDeclaration
                    | RawKind::NotationDeclaration
                    | RawKind::NamespaceDeclaration
                    | RawKind::AttributePseudo
            ) {
                continue;
            }
            if !next.is_text() {
                self.lookahead = Some(next);
                break;
            }
            self.text.push_str(self.source.text());
            position = self.source.position();
            fragments += 1;
        }

        tracing::trace!(fragments, len = self.text.len(), "coalesced character data");
        self.position = position;
        Ok(())
    }

    fn load_element(&mut self, start: bool) -> Result<()> {
        let name = self.source.tag_name();
        let namespace_uri = resolve(&self.source, name.prefix.as_deref())?;
        let local_name = name.local_name.clone();

        self.attributes.clear();
        if start {
            for raw in self.source.attributes() {
                if raw.is_namespace_declaration() {
                    continue;
                }
                // Unprefixed attributes never take the default namespace
                let namespace_uri = match raw.prefix.as_deref() {
                    None => None,
                    prefix => resolve(&self.source, prefix)?,
                };
                let duplicate = self
                    .attributes
                    .iter()
                    .any(|a| a.local_name == raw.local_name && a.namespace_uri == namespace_uri);
                if duplicate {
                    return Err(XmlError::syntax(
                        format!(
                            "Duplicate attribute '{}'",
                            qualified_name(namespace_uri.as_deref(), &raw.local_name)
                        ),
                        self.source.position(),
                    ));
                }
                self.attributes.push(Attribute {
                    namespace_uri,
                    local_name: raw.local_name.clone(),
                    value: raw.value.clone(),
                });
            }
        }

        self.namespace_uri = namespace_uri;
        self.local_name = local_name;
        Ok(())
    }
}

/// Resolve an element or attribute prefix; `None` is the default namespace
fn resolve<S: TokenSource>(source: &S, prefix: Option<&str>) -> Result<Option<String>> {
    match prefix {
        None => Ok(source.resolve_namespace(None)),
        Some("xml") => Ok(Some(ns::XML.to_string())),
        Some(prefix) => match source.resolve_namespace(Some(prefix)) {
            Some(uri) => Ok(Some(uri)),
            None => Err(XmlError::UnboundPrefix {
                prefix: prefix.to_string(),
                position: source.position(),
            }),
        },
    }
}

impl<S: TokenSource> XmlRead for XmlCursor<S> {
    fn event_type(&self) -> EventType {
        self.event
    }

    fn next(&mut self) -> Result<EventType> {
        if self.event == EventType::EndDocument {
            return Err(XmlError::AfterEndDocument);
        }
        loop {
            let raw = match self.lookahead.take() {
                Some(raw) => raw,
                None => self.source.next_token()?,
            };
            if let Some(event) = self.classify(raw)? {
                self.event = event;
                return Ok(event);
            }
        }
    }

    fn namespace_uri(&self) -> Result<Option<&str>> {
        self.require("namespace_uri", ELEMENT_EVENTS)?;
        Ok(self.namespace_uri.as_deref())
    }

    fn local_name(&self) -> Result<&str> {
        self.require("local_name", ELEMENT_EVENTS)?;
        Ok(&self.local_name)
    }

    fn attribute_count(&self) -> Result<usize> {
        self.require("attribute_count", START_ELEMENT)?;
        Ok(self.attributes.len())
    }

    fn attributes(&self) -> Result<&[Attribute]> {
        self.require("attributes", START_ELEMENT)?;
        Ok(&self.attributes)
    }

    fn attribute(&self, index: usize) -> Result<&Attribute> {
        self.indexed("attribute", index)
    }

    fn attribute_namespace_uri(&self, index: usize) -> Result<Option<&str>> {
        Ok(self.indexed("attribute_namespace_uri", index)?.namespace_uri.as_deref())
    }

    fn attribute_local_name(&self, index: usize) -> Result<&str> {
        Ok(&self.indexed("attribute_local_name", index)?.local_name)
    }

    fn attribute_value(&self, index: usize) -> Result<&str> {
        Ok(&self.indexed("attribute_value", index)?.value)
    }

    fn attribute_value_by_name(&self, namespace_uri: Option<&str>, local_name: &str) -> Result<Option<&str>> {
        self.require("attribute_value_by_name", START_ELEMENT)?;
        Ok(self
            .attributes
            .iter()
            .find(|a| a.matches(namespace_uri, local_name))
            .map(|a| a.value.as_str()))
    }

    fn attribute_value_by_local_name(&self, local_name: &str) -> Result<Option<&str>> {
        self.require("attribute_value_by_local_name", START_ELEMENT)?;
        Ok(self
            .attributes
            .iter()
            .find(|a| a.local_name == local_name)
            .map(|a| a.value.as_str()))
    }

    fn text(&self) -> Result<&str> {
        self.require("text", CHARACTERS)?;
        Ok(&self.text)
    }

    fn pi_target(&self) -> Result<&str> {
        self.require("pi_target", PROCESSING_INSTRUCTION)?;
        Ok(&self.pi_target)
    }

    fn pi_data(&self) -> Result<&str> {
        self.require("pi_data", PROCESSING_INSTRUCTION)?;
        Ok(&self.pi_data)
    }

    fn position(&self) -> Option<Position> {
        self.position
    }
}

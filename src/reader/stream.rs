//! Stream backend
//!
//! [`TokenSource`] over quick-xml's [`NsReader`]. quick-xml resolves
//! namespaces and splits PIs itself; this adapter adds empty-element
//! expansion, the prolog/epilog whitespace policy, a single-root check and
//! line/column tracking of the consumed bytes.

use std::io::{BufRead, Read};
use std::str;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{QName, ResolveResult};
use quick_xml::NsReader;

use crate::core::scanner::is_whitespace;
use crate::error::{Result, XmlError};
use crate::reader::buffered::{DecodedInput, TrackingReader};
use crate::reader::events::{split_name, Position};
use crate::reader::source::{RawAttribute, RawKind, RawName, TokenSource};

/// Token source backed by quick-xml
pub struct StreamSource<R: BufRead> {
    reader: NsReader<TrackingReader<R>>,
    buf: Vec<u8>,
    depth: usize,
    seen_root: bool,
    started: bool,
    finished: bool,
    /// End tag owed for the last empty-element tag
    end_pending: bool,
    text: String,
    name: RawName,
    attributes: Vec<RawAttribute>,
    pi_target: String,
    pi_data: String,
}

impl<R: Read> StreamSource<DecodedInput<R>> {
    /// Stream from any reader, transcoding to UTF-8 if its encoding requires
    pub fn new(reader: R, encoding: Option<&str>) -> Result<Self> {
        Ok(Self::from_buf_read(DecodedInput::new(reader, encoding)?))
    }
}

impl<R: BufRead> StreamSource<R> {
    /// Stream from UTF-8 input
    pub fn from_buf_read(reader: R) -> Self {
        let mut reader = NsReader::from_reader(TrackingReader::new(reader));
        reader.config_mut().trim_text(false);
        StreamSource {
            reader,
            buf: Vec::new(),
            depth: 0,
            seen_root: false,
            started: false,
            finished: false,
            end_pending: false,
            text: String::new(),
            name: RawName::default(),
            attributes: Vec::new(),
            pi_target: String::new(),
            pi_data: String::new(),
        }
    }

    fn current_position(&self) -> Position {
        self.reader.get_ref().position()
    }

    fn error_here(&self, message: impl Into<String>) -> XmlError {
        XmlError::syntax(message, Some(self.current_position()))
    }

    fn set_text(&mut self, bytes: &[u8]) -> Result<()> {
        let text = str::from_utf8(bytes).map_err(|e| XmlError::Encoding(e.to_string()))?;
        self.text.clear();
        self.text.push_str(text);
        Ok(())
    }

    fn start_element(&mut self, start: &BytesStart<'_>) -> Result<()> {
        if self.depth == 0 && self.seen_root {
            return Err(self.error_here("Only one root element is allowed"));
        }
        self.seen_root = true;
        self.depth += 1;

        let qname = str::from_utf8(start.name().as_ref())
            .map_err(|e| XmlError::Encoding(e.to_string()))?
            .to_string();
        let (prefix, local_name) = split_name(&qname);
        self.name = RawName::new(prefix, local_name);

        self.attributes.clear();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = str::from_utf8(attr.key.as_ref()).map_err(|e| XmlError::Encoding(e.to_string()))?;
            let (prefix, local_name) = split_name(key);
            let value = attr.unescape_value()?;
            self.attributes.push(RawAttribute {
                prefix: prefix.map(str::to_string),
                local_name: local_name.to_string(),
                value: value.into_owned(),
            });
        }
        Ok(())
    }

    fn read_token(&mut self) -> Result<RawKind> {
        self.buf.clear();
        let event = self.reader.read_event_into(&mut self.buf)?.into_owned();
        let in_root = self.depth > 0;

        match event {
            Event::Start(start) => {
                self.start_element(&start)?;
                Ok(RawKind::StartTag)
            }
            Event::Empty(start) => {
                self.start_element(&start)?;
                self.end_pending = true;
                Ok(RawKind::StartTag)
            }
            Event::End(end) => {
                let qname = str::from_utf8(end.name().as_ref())
                    .map_err(|e| XmlError::Encoding(e.to_string()))?
                    .to_string();
                let (prefix, local_name) = split_name(&qname);
                self.name = RawName::new(prefix, local_name);
                self.depth = self.depth.saturating_sub(1);
                Ok(RawKind::EndTag)
            }
            Event::Text(text) => {
                let unescaped = text.unescape()?;
                self.text.clear();
                self.text.push_str(&unescaped);
                if in_root {
                    Ok(RawKind::Text)
                } else if self.text.bytes().all(is_whitespace) {
                    Ok(RawKind::IgnorableWhitespace)
                } else {
                    Err(self.error_here("Text is not allowed outside the root element"))
                }
            }
            Event::CData(_) if !in_root => {
                Err(self.error_here("Character data is not allowed outside the root element"))
            }
            Event::CData(cdata) => {
                self.set_text(&cdata)?;
                Ok(RawKind::CData)
            }
            Event::Comment(_) => Ok(RawKind::Comment),
            Event::Decl(_) => Ok(RawKind::XmlDeclaration),
            Event::PI(pi) => {
                let target = str::from_utf8(pi.target()).map_err(|e| XmlError::Encoding(e.to_string()))?;
                let content = str::from_utf8(pi.content()).map_err(|e| XmlError::Encoding(e.to_string()))?;
                self.pi_target = target.to_string();
                self.pi_data = content
                    .trim_start_matches([' ', '\t', '\r', '\n'])
                    .to_string();
                Ok(RawKind::ProcessingInstruction)
            }
            Event::DocType(doctype) => {
                if self.seen_root {
                    return Err(self.error_here("DOCTYPE must come before the root element"));
                }
                self.set_text(&doctype)?;
                Ok(RawKind::DocTypeDeclaration)
            }
            Event::Eof => {
                if in_root || !self.seen_root {
                    return Err(XmlError::UnexpectedEof {
                        position: Some(self.current_position()),
                    });
                }
                self.finished = true;
                Ok(RawKind::EndDocument)
            }
        }
    }
}

impl<R: BufRead> TokenSource for StreamSource<R> {
    fn next_token(&mut self) -> Result<RawKind> {
        if !self.started {
            self.started = true;
            return Ok(RawKind::StartDocument);
        }
        if self.finished {
            return Err(XmlError::UnexpectedEof {
                position: Some(self.current_position()),
            });
        }
        if self.end_pending {
            // quick-xml keeps the empty element's scope until the next read
            self.end_pending = false;
            self.depth -= 1;
            return Ok(RawKind::EndTag);
        }
        self.read_token()
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn tag_name(&self) -> &RawName {
        &self.name
    }

    fn attributes(&self) -> &[RawAttribute] {
        &self.attributes
    }

    fn resolve_namespace(&self, prefix: Option<&str>) -> Option<String> {
        let name = match prefix {
            Some(prefix) => format!("{prefix}:_"),
            None => "_".to_string(),
        };
        match self.reader.resolve_element(QName(name.as_bytes())).0 {
            ResolveResult::Bound(ns) => str::from_utf8(ns.as_ref()).ok().map(str::to_string),
            ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
        }
    }

    fn processing_instruction(&self) -> (&str, &str) {
        (&self.pi_target, &self.pi_data)
    }

    fn position(&self) -> Option<Position> {
        Some(self.current_position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn source(input: &str) -> StreamSource<&[u8]> {
        StreamSource::from_buf_read(input.as_bytes())
    }

    #[test]
    fn test_empty_element_expanded() {
        let mut source = source("<a><b/></a>");
        assert_eq!(source.next_token().unwrap(), RawKind::StartDocument);
        assert_eq!(source.next_token().unwrap(), RawKind::StartTag);
        assert_eq!(source.next_token().unwrap(), RawKind::StartTag);
        assert_eq!(source.tag_name().local_name, "b");
        assert_eq!(source.next_token().unwrap(), RawKind::EndTag);
        assert_eq!(source.tag_name().local_name, "b");
        assert_eq!(source.next_token().unwrap(), RawKind::EndTag);
        assert_eq!(source.next_token().unwrap(), RawKind::EndDocument);
    }

    #[test]
    fn test_default_namespace_resolution() {
        let mut source = source("<a xmlns='urn:d'><p:b xmlns:p='urn:p'/></a>");
        source.next_token().unwrap();
        source.next_token().unwrap();
        assert_eq!(source.resolve_namespace(None).as_deref(), Some("urn:d"));
        source.next_token().unwrap();
        assert_eq!(source.resolve_namespace(Some("p")).as_deref(), Some("urn:p"));
        assert_eq!(source.next_token().unwrap(), RawKind::EndTag);
        assert_eq!(source.resolve_namespace(Some("p")).as_deref(), Some("urn:p"));
        assert_eq!(source.resolve_namespace(Some("q")), None);
    }

    #[test]
    fn test_pi_data_leading_whitespace_removed() {
        let mut source = source("<?magic   processing instruction 1?><a/>");
        source.next_token().unwrap();
        assert_eq!(source.next_token().unwrap(), RawKind::ProcessingInstruction);
        assert_eq!(source.processing_instruction(), ("magic", "processing instruction 1"));
        assert_eq!(source.position(), Some(Position { line: 1, column: 37 }));
    }

    #[test]
    fn test_epilog_whitespace_is_ignorable() {
        let mut source = source("<a/>\n");
        source.next_token().unwrap();
        source.next_token().unwrap();
        source.next_token().unwrap();
        assert_eq!(source.next_token().unwrap(), RawKind::IgnorableWhitespace);
        assert_eq!(source.next_token().unwrap(), RawKind::EndDocument);
        assert!(source.next_token().is_err());
    }

    #[test]
    fn test_structure_errors() {
        let mut two_roots = source("<a/><b/>");
        let err = loop {
            if let Err(e) = two_roots.next_token() {
                break e;
            }
        };
        assert!(matches!(err, XmlError::Syntax { .. }));

        let mut truncated = source("<a>text");
        let err = loop {
            if let Err(e) = truncated.next_token() {
                break e;
            }
        };
        assert_eq!(err.kind(), ErrorKind::Xml);
    }

    #[test]
    fn test_form_feed_is_not_whitespace() {
        let mut prolog = source("\u{c}<a/>");
        assert_eq!(prolog.next_token().unwrap(), RawKind::StartDocument);
        assert!(matches!(prolog.next_token(), Err(XmlError::Syntax { .. })));

        let mut epilog = source("<a/>\u{c}");
        let err = loop {
            if let Err(e) = epilog.next_token() {
                break e;
            }
        };
        assert!(matches!(err, XmlError::Syntax { .. }));
    }
}

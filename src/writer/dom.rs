//! DOM-building writer
//!
//! Implements [`XmlWrite`] by growing a [`Document`]. Namespace
//! declarations decided by [`WriterState`] become `xmlns` attributes on the
//! element, so replaying the tree reproduces the same prefixes.

use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::reader::events::split_name;
use crate::writer::state::WriterState;
use crate::writer::XmlWrite;

/// Writer producing an in-memory [`Document`]
#[derive(Debug, Default)]
pub struct DomWriter {
    document: Document,
    /// Innermost open element, or the document node
    current: NodeId,
    state: WriterState,
}

impl DomWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tree built so far
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    fn open(&mut self, namespace_uri: Option<&str>, local_name: &str, empty: bool) -> Result<()> {
        let tag = self.state.start_tag(namespace_uri, local_name, empty)?;
        let (prefix, _) = split_name(&tag.qname);
        let namespace_uri = namespace_uri.filter(|uri| !uri.is_empty());
        let element = self
            .document
            .create_element(self.current, namespace_uri, prefix, local_name)?;
        for declaration in &tag.declarations {
            self.document
                .add_namespace_declaration(element, declaration.prefix.as_deref(), &declaration.uri)?;
        }
        self.current = element;
        Ok(())
    }
}

impl XmlWrite for DomWriter {
    fn start_document(&mut self) -> Result<()> {
        self.state.start_document()?;
        self.current = self.document.document_node();
        Ok(())
    }

    fn set_prefix(&mut self, prefix: &str, namespace_uri: &str) -> Result<()> {
        self.state.set_prefix(prefix, namespace_uri)
    }

    fn start_tag(&mut self, namespace_uri: Option<&str>, local_name: &str) -> Result<()> {
        self.open(namespace_uri, local_name, false)
    }

    fn empty_tag(&mut self, namespace_uri: Option<&str>, local_name: &str) -> Result<()> {
        self.open(namespace_uri, local_name, true)
    }

    fn attribute(&mut self, namespace_uri: Option<&str>, local_name: &str, value: &str) -> Result<()> {
        let name = self.state.attribute(namespace_uri, local_name)?;
        if let Some(declaration) = &name.declaration {
            self.document
                .add_namespace_declaration(self.current, declaration.prefix.as_deref(), &declaration.uri)?;
        }
        let (prefix, _) = split_name(&name.qname);
        let namespace_uri = namespace_uri.filter(|uri| !uri.is_empty());
        self.document
            .add_attribute(self.current, namespace_uri, prefix, local_name, value)
    }

    fn text(&mut self, characters: &str) -> Result<()> {
        self.state.text(characters)?;
        // Whitespace between top-level nodes has no place in the tree
        if self.state.depth() == 0 || characters.is_empty() {
            return Ok(());
        }
        self.document.append_text(self.current, characters)?;
        Ok(())
    }

    fn end_tag(&mut self, namespace_uri: Option<&str>, local_name: &str) -> Result<()> {
        self.state.end_tag(namespace_uri, local_name)?;
        self.current = self
            .document
            .get_node(self.current)
            .and_then(|n| n.parent)
            .unwrap_or_else(|| self.document.document_node());
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        self.state.end_document()
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::namespace::ns;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builds_tree() {
        let mut w = DomWriter::new();
        w.start_document().unwrap();
        w.set_prefix("ab", "urn:x").unwrap();
        w.start_tag(Some("urn:x"), "test").unwrap();
        w.start_tag(Some("urn:x"), "hello").unwrap();
        w.attribute(None, "type", "greeting").unwrap();
        w.end_tag(Some("urn:x"), "hello").unwrap();
        w.text("a").unwrap();
        w.text("b").unwrap();
        w.empty_tag(Some("urn:x"), "world").unwrap();
        w.end_tag(Some("urn:x"), "world").unwrap();
        w.end_tag(Some("urn:x"), "test").unwrap();
        w.text("\n").unwrap();
        w.end_document().unwrap();

        let doc = w.into_document();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.prefix(root), Some("ab"));
        assert_eq!(doc.get_attribute(root, Some(ns::XMLNS), "ab"), Some("urn:x"));

        let children: Vec<_> = doc.children(root).collect();
        assert_eq!(children.len(), 3);
        assert_eq!(doc.local_name(children[0]), Some("hello"));
        assert_eq!(doc.namespace_uri(children[0]), Some("urn:x"));
        assert_eq!(doc.get_attribute(children[0], None, "type"), Some("greeting"));
        assert_eq!(doc.text(children[1]), Some("ab"));
        assert_eq!(doc.local_name(children[2]), Some("world"));
        assert_eq!(doc.children(0).count(), 1);
    }

    #[test]
    fn test_requires_started_document() {
        let mut w = DomWriter::new();
        let err = w.start_tag(None, "a").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Writer);
    }

    #[test]
    fn test_unbalanced_end_tag() {
        let mut w = DomWriter::new();
        w.start_document().unwrap();
        w.start_tag(None, "a").unwrap();
        assert!(w.end_tag(Some("urn:x"), "a").is_err());
        assert!(w.end_document().is_err());
    }
}

//! XML Document
//!
//! Owned arena tree: node 0 is the document node, elements and text nodes
//! are linked through parent/child/sibling ids, attributes of an element
//! occupy one contiguous range of the attribute arena.

use crate::core::namespace::ns;
use crate::dom::node::{NodeId, NodeKind, XmlAttribute, XmlNode};
use crate::dom::strings::StringPool;
use crate::error::{Result, XmlError};
use crate::writer::XmlWrite;

/// Arena-based XML document
#[derive(Debug)]
pub struct Document {
    nodes: Vec<XmlNode>,
    attributes: Vec<XmlAttribute>,
    strings: StringPool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document containing only the document node
    pub fn new() -> Self {
        Document {
            nodes: vec![XmlNode::document()],
            attributes: Vec::new(),
            strings: StringPool::new(),
        }
    }

    /// The document node (always id 0)
    pub fn document_node(&self) -> NodeId {
        0
    }

    /// First element child of the document node
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(0).find(|&id| self.nodes[id as usize].is_element())
    }

    /// Get a node by ID
    #[inline]
    pub fn get_node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id as usize)
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get_node(id).map(|n| n.kind)
    }

    /// Number of nodes, the document node included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn strings(&self) -> &StringPool {
        &self.strings
    }

    /// Iterate over the children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        let first = self.get_node(id).and_then(|n| n.first_child);
        ChildIter { doc: self, next: first }
    }

    /// Local name of an element
    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id).filter(|n| n.is_element())?;
        self.strings.get(node.value_id)
    }

    /// Namespace URI of an element, `None` when it has none
    pub fn namespace_uri(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id).filter(|n| n.is_element())?;
        self.strings.get_opt(node.namespace_id)
    }

    /// Prefix the element was written with
    pub fn prefix(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id).filter(|n| n.is_element())?;
        self.strings.get_opt(node.prefix_id)
    }

    /// Content of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id).filter(|n| n.is_text())?;
        self.strings.get(node.value_id)
    }

    /// Concatenated text of all descendants
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        for child in self.children(id) {
            match self.text(child) {
                Some(text) => out.push_str(text),
                None => self.collect_text(child, out),
            }
        }
    }

    /// Attributes of an element, namespace declarations included
    pub fn attributes(&self, id: NodeId) -> &[XmlAttribute] {
        match self.get_node(id) {
            Some(node) if node.is_element() => &self.attributes[node.attributes.start as usize..node.attributes.end()],
            _ => &[],
        }
    }

    pub fn attribute_namespace_uri(&self, attr: &XmlAttribute) -> Option<&str> {
        self.strings.get_opt(attr.namespace_id)
    }

    pub fn attribute_prefix(&self, attr: &XmlAttribute) -> Option<&str> {
        self.strings.get_opt(attr.prefix_id)
    }

    pub fn attribute_local_name<'a>(&'a self, attr: &XmlAttribute) -> &'a str {
        self.strings.get(attr.name_id).unwrap_or_default()
    }

    pub fn attribute_value<'a>(&'a self, attr: &XmlAttribute) -> &'a str {
        self.strings.get(attr.value_id).unwrap_or_default()
    }

    /// Check if the attribute is an `xmlns` or `xmlns:*` declaration
    pub fn is_namespace_declaration(&self, attr: &XmlAttribute) -> bool {
        self.attribute_namespace_uri(attr) == Some(ns::XMLNS)
    }

    /// Value of the attribute with this namespace and local name
    pub fn get_attribute(&self, id: NodeId, namespace_uri: Option<&str>, local_name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|a| {
                self.attribute_namespace_uri(a) == namespace_uri && self.attribute_local_name(a) == local_name
            })
            .map(|a| self.attribute_value(a))
    }

    /// Push `node` and append it to its parent's children
    fn push_child(&mut self, parent: NodeId, node: XmlNode) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        match self.nodes[parent as usize].last_child {
            Some(last) => self.nodes[last as usize].next_sibling = Some(id),
            None => self.nodes[parent as usize].first_child = Some(id),
        }
        self.nodes[parent as usize].last_child = Some(id);
        id
    }

    fn parent_depth(&self, parent: NodeId) -> Result<u32> {
        match self.get_node(parent) {
            Some(node) if node.kind != NodeKind::Text => Ok(node.depth),
            _ => Err(XmlError::structure(format!("Node {parent} cannot have children"), None)),
        }
    }

    /// Append an element to `parent`
    pub fn create_element(
        &mut self,
        parent: NodeId,
        namespace_uri: Option<&str>,
        prefix: Option<&str>,
        local_name: &str,
    ) -> Result<NodeId> {
        let depth = self.parent_depth(parent)? + 1;
        let mut node = XmlNode::new(NodeKind::Element, Some(parent), depth, self.strings.intern(local_name));
        node.namespace_id = self.strings.intern_opt(namespace_uri);
        node.prefix_id = self.strings.intern_opt(prefix);
        node.attributes.start = self.attributes.len() as u32;
        Ok(self.push_child(parent, node))
    }

    /// Add an attribute to the most recently created element
    pub fn add_attribute(
        &mut self,
        element: NodeId,
        namespace_uri: Option<&str>,
        prefix: Option<&str>,
        local_name: &str,
        value: &str,
    ) -> Result<()> {
        let attributes_len = self.attributes.len();
        let node = match self.nodes.get(element as usize) {
            Some(node) if node.is_element() => node,
            _ => return Err(XmlError::structure(format!("Node {element} is not an element"), None)),
        };
        if node.attributes.end() != attributes_len {
            return Err(XmlError::structure(
                "Attributes can only be added to the newest element",
                None,
            ));
        }

        let attr = XmlAttribute {
            namespace_id: self.strings.intern_opt(namespace_uri),
            prefix_id: self.strings.intern_opt(prefix),
            name_id: self.strings.intern(local_name),
            value_id: self.strings.intern(value),
        };
        self.attributes.push(attr);
        self.nodes[element as usize].attributes.len += 1;
        Ok(())
    }

    /// Add a namespace declaration to the most recently created element.
    /// `None` declares the default namespace.
    pub fn add_namespace_declaration(&mut self, element: NodeId, prefix: Option<&str>, uri: &str) -> Result<()> {
        match prefix {
            Some(prefix) => self.add_attribute(element, Some(ns::XMLNS), Some("xmlns"), prefix, uri),
            None => self.add_attribute(element, Some(ns::XMLNS), None, "xmlns", uri),
        }
    }

    /// Append text to `parent`, merging into a trailing text node
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId> {
        let depth = self.parent_depth(parent)? + 1;
        if let Some(last) = self.nodes[parent as usize].last_child {
            if let Some(existing) = self.text(last) {
                let merged = format!("{existing}{text}");
                self.nodes[last as usize].value_id = self.strings.intern(&merged);
                return Ok(last);
            }
        }

        let node = XmlNode::new(NodeKind::Text, Some(parent), depth, self.strings.intern(text));
        Ok(self.push_child(parent, node))
    }

    /// Replay the whole document as writer calls
    pub fn write_to<W: XmlWrite + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.start_document()?;
        for child in self.children(0) {
            self.write_node(writer, child)?;
        }
        writer.end_document()
    }

    fn write_node<W: XmlWrite + ?Sized>(&self, writer: &mut W, id: NodeId) -> Result<()> {
        if let Some(text) = self.text(id) {
            return writer.text(text);
        }
        let local_name = self.local_name(id).unwrap_or_default();
        let namespace_uri = self.namespace_uri(id);
        let attributes = self.attributes(id);

        let mut has_attributes = false;
        for attr in attributes {
            if self.is_namespace_declaration(attr) {
                let prefix = match self.attribute_prefix(attr) {
                    Some(_) => self.attribute_local_name(attr),
                    None => "",
                };
                writer.set_prefix(prefix, self.attribute_value(attr))?;
            } else {
                has_attributes = true;
            }
        }

        let childless = self.get_node(id).is_some_and(|n| !n.has_children());
        if childless && !has_attributes {
            writer.empty_tag(namespace_uri, local_name)?;
        } else {
            writer.start_tag(namespace_uri, local_name)?;
            for attr in attributes.iter().filter(|a| !self.is_namespace_declaration(a)) {
                writer.attribute(
                    self.attribute_namespace_uri(attr),
                    self.attribute_local_name(attr),
                    self.attribute_value(attr),
                )?;
            }
            for child in self.children(id) {
                self.write_node(writer, child)?;
            }
        }
        writer.end_tag(namespace_uri, local_name)
    }
}

/// Iterator over child nodes
pub struct ChildIter<'d> {
    doc: &'d Document,
    next: Option<NodeId>,
}

impl<'d> Iterator for ChildIter<'d> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.get_node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::TextWriter;
    use pretty_assertions::assert_eq;

    fn sample() -> Document {
        let mut doc = Document::new();
        let root = doc.create_element(0, Some("urn:x"), Some("ab"), "root").unwrap();
        doc.add_namespace_declaration(root, Some("ab"), "urn:x").unwrap();
        doc.add_attribute(root, None, None, "a", "1").unwrap();
        doc.append_text(root, "one ").unwrap();
        doc.append_text(root, "two").unwrap();
        let child = doc.create_element(root, Some("urn:x"), Some("ab"), "child").unwrap();
        doc.append_text(child, "x").unwrap();
        doc.create_element(root, None, None, "empty").unwrap();
        doc
    }

    #[test]
    fn test_navigation() {
        let doc = sample();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.local_name(root), Some("root"));
        assert_eq!(doc.namespace_uri(root), Some("urn:x"));
        assert_eq!(doc.prefix(root), Some("ab"));
        assert_eq!(doc.attributes(root).len(), 2);
        assert_eq!(doc.get_attribute(root, None, "a"), Some("1"));
        assert_eq!(doc.get_attribute(root, Some(ns::XMLNS), "ab"), Some("urn:x"));
        assert_eq!(doc.get_attribute(root, None, "missing"), None);

        let children: Vec<_> = doc.children(root).collect();
        assert_eq!(children.len(), 3);
        assert_eq!(doc.text(children[0]), Some("one two"));
        assert_eq!(doc.text_content(root), "one twox");
        assert_eq!(doc.get_node(children[1]).unwrap().depth, 2);
    }

    #[test]
    fn test_attributes_only_on_newest_element() {
        let mut doc = Document::new();
        let a = doc.create_element(0, None, None, "a").unwrap();
        doc.create_element(a, None, None, "b").unwrap();
        assert!(doc.add_attribute(a, None, None, "x", "1").is_err());
        let text = doc.append_text(a, "t").unwrap();
        assert!(doc.create_element(text, None, None, "c").is_err());
    }

    #[test]
    fn test_write_to() {
        let doc = sample();
        let mut writer = TextWriter::new(Vec::new()).xml_declaration(false);
        doc.write_to(&mut writer).unwrap();
        assert_eq!(
            String::from_utf8(writer.into_inner()).unwrap(),
            r#"<ab:root xmlns:ab="urn:x" a="1">one two<ab:child>x</ab:child><empty/></ab:root>"#
        );
    }
}

//! Arena node types
//!
//! Nodes refer to each other by [`NodeId`] and to their strings by
//! [`StringPool`](crate::dom::StringPool) ids, where 0 means absent.

/// Index into the node arena
pub type NodeId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Node 0, parent of the root element
    Document,
    Element,
    /// Character data; adjacent writes are merged into one node
    Text,
}

/// Slice of the attribute arena owned by one element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttributeRange {
    pub start: u32,
    pub len: u32,
}

impl AttributeRange {
    #[inline]
    pub fn end(self) -> usize {
        self.start as usize + self.len as usize
    }
}

#[derive(Debug, Clone)]
pub struct XmlNode {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub depth: u32,
    /// Local name of an element, content of a text node
    pub value_id: u32,
    pub prefix_id: u32,
    pub namespace_id: u32,
    pub attributes: AttributeRange,
}

impl XmlNode {
    pub(crate) fn new(kind: NodeKind, parent: Option<NodeId>, depth: u32, value_id: u32) -> Self {
        XmlNode {
            kind,
            parent,
            first_child: None,
            last_child: None,
            next_sibling: None,
            depth,
            value_id,
            prefix_id: 0,
            namespace_id: 0,
            attributes: AttributeRange::default(),
        }
    }

    pub fn document() -> Self {
        Self::new(NodeKind::Document, None, 0, 0)
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }
}

/// Stored attribute. Namespace declarations are kept as attributes in the
/// `xmlns` namespace, like the W3C DOM does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmlAttribute {
    pub namespace_id: u32,
    pub prefix_id: u32,
    pub name_id: u32,
    pub value_id: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_node() {
        let doc = XmlNode::document();
        assert_eq!(doc.kind, NodeKind::Document);
        assert!(doc.parent.is_none());
        assert!(!doc.has_children());
        assert_eq!(doc.attributes.end(), 0);
    }

    #[test]
    fn test_attribute_range_end() {
        let range = AttributeRange { start: 4, len: 3 };
        assert_eq!(range.end(), 7);
    }
}

//! DOM Module - Arena-based XML Document
//!
//! The tree built by [`crate::writer::DomWriter`]:
//! - Arena allocation for nodes
//! - NodeId (u32) indices for cache-friendly traversal
//! - String interning for names, URIs, values and text
//!
//! A [`Document`] can replay itself into any [`crate::writer::XmlWrite`].

pub mod document;
pub mod node;
pub mod strings;

pub use document::{ChildIter, Document};
pub use node::{AttributeRange, NodeId, NodeKind, XmlAttribute, XmlNode};
pub use strings::StringPool;

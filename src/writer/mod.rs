//! XML Writer Module
//!
//! [`XmlWrite`] mirrors the reader: one call per structural event. All
//! backends share [`state::WriterState`] for validation and namespace
//! bookkeeping:
//! - Text: the crate's own serializer
//! - Quick: serializer on top of `quick_xml::Writer`
//! - Dom: builds a [`crate::dom::Document`] instead of bytes

pub mod dom;
#[cfg(feature = "stream")]
pub mod quick;
pub mod state;
pub mod text;

pub use dom::DomWriter;
#[cfg(feature = "stream")]
pub use quick::QuickWriter;
pub use state::WriterState;
pub use text::TextWriter;

use crate::error::Result;

/// Forward-only XML writer.
///
/// Calls must form a well-formed document: `start_document`, one root
/// element, `end_document`. Violations fail with
/// [`crate::ErrorKind::Writer`].
pub trait XmlWrite {
    /// Begin the document, writing the XML declaration if configured
    fn start_document(&mut self) -> Result<()>;

    /// Bind `prefix` to `namespace_uri`, declared on the next opened element
    fn set_prefix(&mut self, prefix: &str, namespace_uri: &str) -> Result<()>;

    /// Open an element that may have content
    fn start_tag(&mut self, namespace_uri: Option<&str>, local_name: &str) -> Result<()>;

    /// Open an element without content. It must still be closed with
    /// [`end_tag`](Self::end_tag), and nothing else may be written until then.
    fn empty_tag(&mut self, namespace_uri: Option<&str>, local_name: &str) -> Result<()>;

    /// Add an attribute to the element opened by the last `start_tag`
    fn attribute(&mut self, namespace_uri: Option<&str>, local_name: &str, value: &str) -> Result<()>;

    /// Write character data, escaped as needed
    fn text(&mut self, characters: &str) -> Result<()>;

    /// Close the innermost element
    fn end_tag(&mut self, namespace_uri: Option<&str>, local_name: &str) -> Result<()>;

    fn end_document(&mut self) -> Result<()>;

    /// Push buffered output to the underlying sink
    fn flush(&mut self) -> Result<()>;
}

//! XML Reader Module
//!
//! Canonical event cursor over interchangeable token sources:
//! - Events: canonical event vocabulary
//! - Source: raw token seam ([`TokenSource`]) and its kinds
//! - Pull: source backed by the in-crate tokenizer
//! - Stream: source backed by quick-xml
//! - Cursor: coalescing and accessor guard ([`XmlCursor`])
//! - Helpers: `require`/`skip_element` style conveniences

pub mod buffered;
pub mod cursor;
pub mod events;
pub mod helpers;
pub mod pi;
#[cfg(feature = "pull")]
pub mod pull;
pub mod source;
#[cfg(feature = "stream")]
pub mod stream;

pub use cursor::XmlCursor;
pub use events::{Attribute, EventType, Position};
pub use helpers::XmlReadExt;
#[cfg(feature = "pull")]
pub use pull::PullSource;
pub use source::{RawAttribute, RawKind, RawName, TokenSource};
#[cfg(feature = "stream")]
pub use stream::StreamSource;

use crate::error::Result;

/// Forward-only XML event reader.
///
/// Starts at [`EventType::StartDocument`] and ends at
/// [`EventType::EndDocument`]. Accessors are only legal for the events
/// listed on them and otherwise fail with [`crate::ErrorKind::IllegalState`].
pub trait XmlRead {
    /// Current event
    fn event_type(&self) -> EventType;

    /// Advance to the next event. Illegal once at `END_DOCUMENT`.
    fn next(&mut self) -> Result<EventType>;

    /// Namespace URI of the element (`START_ELEMENT`, `END_ELEMENT`)
    fn namespace_uri(&self) -> Result<Option<&str>>;

    /// Local name of the element (`START_ELEMENT`, `END_ELEMENT`)
    fn local_name(&self) -> Result<&str>;

    /// Number of attributes, namespace declarations excluded (`START_ELEMENT`)
    fn attribute_count(&self) -> Result<usize>;

    /// All attributes in document order (`START_ELEMENT`)
    fn attributes(&self) -> Result<&[Attribute]>;

    /// Attribute at `index` (`START_ELEMENT`)
    fn attribute(&self, index: usize) -> Result<&Attribute>;

    fn attribute_namespace_uri(&self, index: usize) -> Result<Option<&str>>;

    fn attribute_local_name(&self, index: usize) -> Result<&str>;

    fn attribute_value(&self, index: usize) -> Result<&str>;

    /// Value of the first attribute with this namespace and local name;
    /// `Ok(None)` if there is none (`START_ELEMENT`)
    fn attribute_value_by_name(&self, namespace_uri: Option<&str>, local_name: &str) -> Result<Option<&str>>;

    /// Value of the first attribute with this local name in any namespace
    /// (`START_ELEMENT`)
    fn attribute_value_by_local_name(&self, local_name: &str) -> Result<Option<&str>>;

    /// Coalesced character data (`CHARACTERS`)
    fn text(&self) -> Result<&str>;

    /// PI target (`PROCESSING_INSTRUCTION`)
    fn pi_target(&self) -> Result<&str>;

    /// PI data, possibly empty (`PROCESSING_INSTRUCTION`)
    fn pi_data(&self) -> Result<&str>;

    /// Position just after the current event, when the backend tracks it
    fn position(&self) -> Option<Position>;

    fn line_number(&self) -> Option<usize> {
        self.position().map(|p| p.line)
    }

    fn column_number(&self) -> Option<usize> {
        self.position().map(|p| p.column)
    }
}

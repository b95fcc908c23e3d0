//! xmlcursor - one XML reader/writer interface over interchangeable engines
//!
//! Backends:
//! Pull: the crate's own memchr tokenizer and text serializer (`pull`)
//! Stream: quick-xml reader and writer (`stream`)
//!
//! Readers are forward-only cursors over canonical events
//! ([`EventType`]); adjacent text is coalesced and whitespace outside the
//! root element is dropped, whatever the engine. Writers share one state
//! machine ([`WriterState`]) for tag balance and namespace prefixes.
//! [`DomWriter`] builds a [`dom::Document`] that can be replayed into any
//! writer, and [`copy_events`] pipes a reader into a writer.

#[cfg(not(any(feature = "pull", feature = "stream")))]
compile_error!("xmlcursor needs at least one backend: enable the `pull` or `stream` feature");

pub mod config;
pub mod core;
pub mod dom;
pub mod error;
pub mod factory;
pub mod pipe;
pub mod reader;
pub mod writer;

pub use config::{Backend, ReaderConfig, WriterConfig};
pub use error::{ErrorKind, Result, XmlError};
pub use factory::{AnyReader, AnyWriter, ReaderFactory, WriterFactory};
pub use pipe::copy_events;
pub use reader::{Attribute, EventType, Position, XmlCursor, XmlRead, XmlReadExt};
pub use writer::{DomWriter, TextWriter, WriterState, XmlWrite};
#[cfg(feature = "stream")]
pub use writer::QuickWriter;

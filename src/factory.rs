//! Reader and writer factories
//!
//! A factory is built once from its config, settles on a compiled-in
//! backend up front and then hands out readers or writers as tagged
//! variants. Callers pass the factory down instead of looking one up.

use std::io::{Read, Write};

use crate::config::{Backend, ReaderConfig, WriterConfig};
use crate::core::encoding::XmlEncoding;
use crate::error::{Result, XmlError};
#[cfg(feature = "stream")]
use crate::reader::buffered::DecodedInput;
#[cfg(feature = "pull")]
use crate::reader::PullSource;
#[cfg(feature = "stream")]
use crate::reader::StreamSource;
use crate::reader::{Attribute, EventType, Position, XmlCursor, XmlRead};
#[cfg(feature = "stream")]
use crate::writer::QuickWriter;
use crate::writer::{TextWriter, XmlWrite};

fn unavailable(backend: Backend) -> XmlError {
    XmlError::Factory(format!("XML backend '{backend}' is not compiled in"))
}

/// Creates readers on the first available configured backend
#[derive(Debug, Clone)]
pub struct ReaderFactory {
    backend: Backend,
    encoding: Option<String>,
}

impl ReaderFactory {
    pub fn new(config: ReaderConfig) -> Result<Self> {
        let backend = config
            .backends
            .iter()
            .copied()
            .find(|b| b.is_available())
            .ok_or_else(|| {
                let tried: Vec<_> = config.backends.iter().map(|b| b.name()).collect();
                XmlError::Factory(format!(
                    "No XML reader backend available (tried: {})",
                    tried.join(", ")
                ))
            })?;
        tracing::debug!(%backend, "selected XML reader backend");
        Ok(ReaderFactory {
            backend,
            encoding: config.encoding,
        })
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Create a reader over `input`. `encoding` overrides the configured
    /// one; a byte order mark overrides both.
    pub fn create_reader<R: Read>(&self, input: R, encoding: Option<&str>) -> Result<AnyReader<R>> {
        let encoding = encoding.or(self.encoding.as_deref());
        tracing::debug!(backend = %self.backend, ?encoding, "creating XML reader");
        match self.backend {
            #[cfg(feature = "pull")]
            Backend::Pull => Ok(AnyReader::Pull(XmlCursor::new(PullSource::new(input, encoding)?))),
            #[cfg(feature = "stream")]
            Backend::Stream => Ok(AnyReader::Stream(XmlCursor::new(StreamSource::new(input, encoding)?))),
            #[allow(unreachable_patterns)]
            backend => Err(unavailable(backend)),
        }
    }
}

/// A reader on whichever backend the factory selected
pub enum AnyReader<R: Read> {
    #[cfg(feature = "pull")]
    Pull(XmlCursor<PullSource>),
    #[cfg(feature = "stream")]
    Stream(XmlCursor<StreamSource<DecodedInput<R>>>),
    /// Keeps `R` in use when only the pull backend is compiled
    #[cfg(not(feature = "stream"))]
    #[doc(hidden)]
    Unused(std::convert::Infallible, std::marker::PhantomData<R>),
}

macro_rules! reader_dispatch {
    ($self:ident, $reader:ident => $body:expr) => {
        match $self {
            #[cfg(feature = "pull")]
            AnyReader::Pull($reader) => $body,
            #[cfg(feature = "stream")]
            AnyReader::Stream($reader) => $body,
            #[cfg(not(feature = "stream"))]
            AnyReader::Unused(never, _) => match *never {},
        }
    };
}

impl<R: Read> AnyReader<R> {
    pub fn backend(&self) -> Backend {
        match self {
            #[cfg(feature = "pull")]
            AnyReader::Pull(_) => Backend::Pull,
            #[cfg(feature = "stream")]
            AnyReader::Stream(_) => Backend::Stream,
            #[cfg(not(feature = "stream"))]
            AnyReader::Unused(never, _) => match *never {},
        }
    }
}

impl<R: Read> XmlRead for AnyReader<R> {
    fn event_type(&self) -> EventType {
        reader_dispatch!(self, r => r.event_type())
    }

    fn next(&mut self) -> Result<EventType> {
        reader_dispatch!(self, r => r.next())
    }

    fn namespace_uri(&self) -> Result<Option<&str>> {
        reader_dispatch!(self, r => r.namespace_uri())
    }

    fn local_name(&self) -> Result<&str> {
        reader_dispatch!(self, r => r.local_name())
    }

    fn attribute_count(&self) -> Result<usize> {
        reader_dispatch!(self, r => r.attribute_count())
    }

    fn attributes(&self) -> Result<&[Attribute]> {
        reader_dispatch!(self, r => r.attributes())
    }

    fn attribute(&self, index: usize) -> Result<&Attribute> {
        reader_dispatch!(self, r => r.attribute(index))
    }

    fn attribute_namespace_uri(&self, index: usize) -> Result<Option<&str>> {
        reader_dispatch!(self, r => r.attribute_namespace_uri(index))
    }

    fn attribute_local_name(&self, index: usize) -> Result<&str> {
        reader_dispatch!(self, r => r.attribute_local_name(index))
    }

    fn attribute_value(&self, index: usize) -> Result<&str> {
        reader_dispatch!(self, r => r.attribute_value(index))
    }

    fn attribute_value_by_name(&self, namespace_uri: Option<&str>, local_name: &str) -> Result<Option<&str>> {
        reader_dispatch!(self, r => r.attribute_value_by_name(namespace_uri, local_name))
    }

    fn attribute_value_by_local_name(&self, local_name: &str) -> Result<Option<&str>> {
        reader_dispatch!(self, r => r.attribute_value_by_local_name(local_name))
    }

    fn text(&self) -> Result<&str> {
        reader_dispatch!(self, r => r.text())
    }

    fn pi_target(&self) -> Result<&str> {
        reader_dispatch!(self, r => r.pi_target())
    }

    fn pi_data(&self) -> Result<&str> {
        reader_dispatch!(self, r => r.pi_data())
    }

    fn position(&self) -> Option<Position> {
        reader_dispatch!(self, r => r.position())
    }
}

/// Creates writers on the configured backend, or the first available one
#[derive(Debug, Clone)]
pub struct WriterFactory {
    config: WriterConfig,
}

impl WriterFactory {
    pub fn new(config: WriterConfig) -> Result<Self> {
        let backend = if config.backend.is_available() {
            config.backend
        } else {
            Backend::ALL
                .into_iter()
                .find(|b| b.is_available())
                .ok_or_else(|| XmlError::Factory("No XML writer backend available".to_string()))?
        };
        if XmlEncoding::from_label(&config.encoding).is_none() {
            return Err(XmlError::Factory(format!(
                "Unsupported output encoding '{}'",
                config.encoding
            )));
        }
        tracing::debug!(%backend, requested = %config.backend, "selected XML writer backend");
        Ok(WriterFactory {
            config: WriterConfig { backend, ..config },
        })
    }

    pub fn backend(&self) -> Backend {
        self.config.backend
    }

    pub fn create_writer<W: Write>(&self, output: W) -> Result<AnyWriter<W>> {
        let config = &self.config;
        tracing::debug!(backend = %config.backend, encoding = %config.encoding, "creating XML writer");
        match config.backend {
            Backend::Pull => Ok(AnyWriter::Text(
                TextWriter::with_encoding(output, &config.encoding)?.xml_declaration(config.xml_declaration),
            )),
            #[cfg(feature = "stream")]
            Backend::Stream => Ok(AnyWriter::Quick(
                QuickWriter::with_encoding(output, &config.encoding)?.xml_declaration(config.xml_declaration),
            )),
            #[allow(unreachable_patterns)]
            backend => Err(unavailable(backend)),
        }
    }
}

/// A writer on whichever backend the factory selected
pub enum AnyWriter<W: Write> {
    Text(TextWriter<W>),
    #[cfg(feature = "stream")]
    Quick(QuickWriter<W>),
}

macro_rules! writer_dispatch {
    ($self:ident, $writer:ident => $body:expr) => {
        match $self {
            AnyWriter::Text($writer) => $body,
            #[cfg(feature = "stream")]
            AnyWriter::Quick($writer) => $body,
        }
    };
}

impl<W: Write> AnyWriter<W> {
    /// Recover the output sink
    pub fn into_inner(self) -> W {
        writer_dispatch!(self, w => w.into_inner())
    }
}

impl<W: Write> XmlWrite for AnyWriter<W> {
    fn start_document(&mut self) -> Result<()> {
        writer_dispatch!(self, w => w.start_document())
    }

    fn set_prefix(&mut self, prefix: &str, namespace_uri: &str) -> Result<()> {
        writer_dispatch!(self, w => w.set_prefix(prefix, namespace_uri))
    }

    fn start_tag(&mut self, namespace_uri: Option<&str>, local_name: &str) -> Result<()> {
        writer_dispatch!(self, w => w.start_tag(namespace_uri, local_name))
    }

    fn empty_tag(&mut self, namespace_uri: Option<&str>, local_name: &str) -> Result<()> {
        writer_dispatch!(self, w => w.empty_tag(namespace_uri, local_name))
    }

    fn attribute(&mut self, namespace_uri: Option<&str>, local_name: &str, value: &str) -> Result<()> {
        writer_dispatch!(self, w => w.attribute(namespace_uri, local_name, value))
    }

    fn text(&mut self, characters: &str) -> Result<()> {
        writer_dispatch!(self, w => w.text(characters))
    }

    fn end_tag(&mut self, namespace_uri: Option<&str>, local_name: &str) -> Result<()> {
        writer_dispatch!(self, w => w.end_tag(namespace_uri, local_name))
    }

    fn end_document(&mut self) -> Result<()> {
        writer_dispatch!(self, w => w.end_document())
    }

    fn flush(&mut self) -> Result<()> {
        writer_dispatch!(self, w => w.flush())
    }
}

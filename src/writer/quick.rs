//! quick-xml serializer
//!
//! Same contract as [`super::TextWriter`], rendered through
//! [`quick_xml::Writer`]. The open start tag is held as a [`BytesStart`]
//! until its content is known, then written as `Start` or `Empty`. Each
//! call's output is transcoded into the target encoding as it is drained.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::core::encoding::XmlEncoding;
use crate::core::entities::encode_attribute;
use crate::error::{Result, XmlError};
use crate::writer::state::{Declaration, WriterState};
use crate::writer::XmlWrite;

/// Serializer backed by quick-xml
pub struct QuickWriter<W: Write> {
    writer: Writer<Vec<u8>>,
    output: W,
    encoding: XmlEncoding,
    xml_declaration: bool,
    state: WriterState,
    /// Start tag still accepting attributes
    pending: Option<BytesStart<'static>>,
}

fn push_attribute(start: &mut BytesStart<'static>, name: &str, value: &str) {
    let value = encode_attribute(value);
    start.push_attribute((name.as_bytes(), value.as_bytes()));
}

fn push_declaration(start: &mut BytesStart<'static>, declaration: &Declaration) {
    push_attribute(start, &declaration.attribute_name(), &declaration.uri);
}

impl<W: Write> QuickWriter<W> {
    /// UTF-8 output with an XML declaration
    pub fn new(output: W) -> Self {
        QuickWriter {
            writer: Writer::new(Vec::new()),
            output,
            encoding: XmlEncoding::Utf8,
            xml_declaration: true,
            state: WriterState::new(),
            pending: None,
        }
    }

    /// Output in the encoding named by `label`
    pub fn with_encoding(output: W, label: &str) -> Result<Self> {
        let encoding = XmlEncoding::from_label(label)
            .ok_or_else(|| XmlError::Encoding(format!("Unsupported encoding '{label}'")))?;
        Ok(QuickWriter {
            encoding,
            ..Self::new(output)
        })
    }

    /// Enable or disable the `<?xml ...?>` declaration
    pub fn xml_declaration(mut self, enabled: bool) -> Self {
        self.xml_declaration = enabled;
        self
    }

    pub fn get_ref(&self) -> &W {
        &self.output
    }

    pub fn into_inner(self) -> W {
        self.output
    }

    /// Write the held start tag as an element with content
    fn open_pending(&mut self) -> Result<()> {
        if let Some(start) = self.pending.take() {
            self.writer.write_event(Event::Start(start))?;
        }
        Ok(())
    }

    fn open(&mut self, namespace_uri: Option<&str>, local_name: &str, empty: bool) -> Result<()> {
        let tag = self.state.start_tag(namespace_uri, local_name, empty)?;
        if tag.close_parent {
            self.open_pending()?;
        }
        let mut start = BytesStart::new(tag.qname);
        for declaration in &tag.declarations {
            push_declaration(&mut start, declaration);
        }
        self.pending = Some(start);
        self.drain()
    }

    fn drain(&mut self) -> Result<()> {
        let bytes = std::mem::take(self.writer.get_mut());
        if bytes.is_empty() {
            return Ok(());
        }
        if self.encoding == XmlEncoding::Utf8 {
            self.output.write_all(&bytes)?;
        } else {
            let text = String::from_utf8(bytes).map_err(|e| XmlError::Encoding(e.to_string()))?;
            self.output.write_all(&self.encoding.encode(&text)?)?;
        }
        Ok(())
    }
}

impl<W: Write> XmlWrite for QuickWriter<W> {
    fn start_document(&mut self) -> Result<()> {
        self.state.start_document()?;
        if self.xml_declaration {
            let decl = BytesDecl::new("1.0", Some(self.encoding.label()), None);
            self.writer.write_event(Event::Decl(decl))?;
        }
        self.drain()
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
        if let Some(start) = self.pending.as_mut() {
            if let Some(declaration) = &name.declaration {
                push_declaration(start, declaration);
            }
            push_attribute(start, &name.qname, value);
        }
        Ok(())
    }

    fn text(&mut self, characters: &str) -> Result<()> {
        if self.state.text(characters)? {
            self.open_pending()?;
        }
        self.writer.write_event(Event::Text(BytesText::new(characters)))?;
        self.drain()
    }

    fn end_tag(&mut self, namespace_uri: Option<&str>, local_name: &str) -> Result<()> {
        let end = self.state.end_tag(namespace_uri, local_name)?;
        match self.pending.take() {
            Some(start) if end.self_closing => self.writer.write_event(Event::Empty(start))?,
            _ => self.writer.write_event(Event::End(BytesEnd::new(end.qname)))?,
        }
        self.drain()
    }

    fn end_document(&mut self) -> Result<()> {
        self.state.end_document()?;
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        self.drain()?;
        self.output.flush()?;
        Ok(())
    }
}

//! Native serializer
//!
//! Renders [`WriterState`] decisions as text, escaping with
//! [`crate::core::entities`] and encoding with [`XmlEncoding`]. Start tags
//! are left open until the first child, text or end tag, so an element
//! without content is written as `<name/>`.

use std::io::Write;

use crate::core::encoding::XmlEncoding;
use crate::core::entities::{encode_attribute, encode_text};
use crate::error::{Result, XmlError};
use crate::writer::state::{Declaration, WriterState};
use crate::writer::XmlWrite;

/// Serializer writing to any [`Write`]
pub struct TextWriter<W: Write> {
    output: W,
    encoding: XmlEncoding,
    xml_declaration: bool,
    state: WriterState,
    /// Rendered text of the current call, encoded on drain
    buffer: String,
}

impl<W: Write> TextWriter<W> {
    /// UTF-8 output with an XML declaration
    pub fn new(output: W) -> Self {
        TextWriter {
            output,
            encoding: XmlEncoding::Utf8,
            xml_declaration: true,
            state: WriterState::new(),
            buffer: String::new(),
        }
    }

    /// Output in the encoding named by `label`
    pub fn with_encoding(output: W, label: &str) -> Result<Self> {
        let encoding = XmlEncoding::from_label(label)
            .ok_or_else(|| XmlError::Encoding(format!("Unsupported encoding '{label}'")))?;
        Ok(TextWriter {
            encoding,
            ..Self::new(output)
        })
    }

    /// Enable or disable the `<?xml ...?>` declaration
    pub fn xml_declaration(mut self, enabled: bool) -> Self {
        self.xml_declaration = enabled;
        self
    }

    pub fn encoding(&self) -> XmlEncoding {
        self.encoding
    }

    pub fn get_ref(&self) -> &W {
        &self.output
    }

    pub fn into_inner(self) -> W {
        self.output
    }

    fn push_declaration(&mut self, declaration: &Declaration) {
        self.buffer.push(' ');
        self.buffer.push_str(&declaration.attribute_name());
        self.buffer.push_str("=\"");
        self.buffer.push_str(&encode_attribute(&declaration.uri));
        self.buffer.push('"');
    }

    fn open(&mut self, namespace_uri: Option<&str>, local_name: &str, empty: bool) -> Result<()> {
        let tag = self.state.start_tag(namespace_uri, local_name, empty)?;
        if tag.close_parent {
            self.buffer.push('>');
        }
        self.buffer.push('<');
        self.buffer.push_str(&tag.qname);
        for declaration in &tag.declarations {
            self.push_declaration(declaration);
        }
        self.drain()
    }

    /// Encode the pending text into the output
    fn drain(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let bytes = self.encoding.encode(&self.buffer)?;
        self.buffer.clear();
        self.output.write_all(&bytes)?;
        Ok(())
    }
}

impl<W: Write> XmlWrite for TextWriter<W> {
    fn start_document(&mut self) -> Result<()> {
        self.state.start_document()?;
        if self.xml_declaration {
            self.buffer.push_str("<?xml version=\"1.0\" encoding=\"");
            self.buffer.push_str(self.encoding.label());
            self.buffer.push_str("\"?>");
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
        if let Some(declaration) = &name.declaration {
            self.push_declaration(declaration);
        }
        self.buffer.push(' ');
        self.buffer.push_str(&name.qname);
        self.buffer.push_str("=\"");
        self.buffer.push_str(&encode_attribute(value));
        self.buffer.push('"');
        self.drain()
    }

    fn text(&mut self, characters: &str) -> Result<()> {
        if self.state.text(characters)? {
            self.buffer.push('>');
        }
        self.buffer.push_str(&encode_text(characters));
        self.drain()
    }

    fn end_tag(&mut self, namespace_uri: Option<&str>, local_name: &str) -> Result<()> {
        let end = self.state.end_tag(namespace_uri, local_name)?;
        if end.self_closing {
            self.buffer.push_str("/>");
        } else {
            self.buffer.push_str("</");
            self.buffer.push_str(&end.qname);
            self.buffer.push('>');
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

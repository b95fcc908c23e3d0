//! Reader to writer pipeline

use crate::error::Result;
use crate::reader::{EventType, XmlRead, XmlReadExt};
use crate::writer::XmlWrite;

/// Replay a whole document from `reader` into `writer`.
///
/// The reader must still be at `START_DOCUMENT`. Processing instructions
/// and the DOCTYPE have no writer counterpart and are dropped; namespace
/// prefixes are chosen by the writer. Returns the number of events read.
pub fn copy_events<R, W>(reader: &mut R, writer: &mut W) -> Result<usize>
where
    R: XmlRead + ?Sized,
    W: XmlWrite + ?Sized,
{
    reader.require(EventType::StartDocument)?;
    writer.start_document()?;
    let mut events = 0usize;

    loop {
        let event = reader.next()?;
        events += 1;
        match event {
            EventType::StartElement => {
                writer.start_tag(reader.namespace_uri()?, reader.local_name()?)?;
                for attr in reader.attributes()? {
                    writer.attribute(attr.namespace_uri.as_deref(), &attr.local_name, &attr.value)?;
                }
            }
            EventType::EndElement => writer.end_tag(reader.namespace_uri()?, reader.local_name()?)?,
            EventType::Characters => writer.text(reader.text()?)?,
            EventType::ProcessingInstruction | EventType::Dtd => {
                tracing::trace!(%event, "event has no writer counterpart");
            }
            EventType::EndDocument => break,
            EventType::StartDocument => {}
        }
    }

    writer.end_document()?;
    tracing::debug!(events, "copied document");
    Ok(events)
}

#[cfg(all(test, feature = "pull"))]
mod tests {
    use super::*;
    use crate::reader::{PullSource, XmlCursor};
    use crate::writer::TextWriter;
    use pretty_assertions::assert_eq;

    fn copy(input: &str) -> String {
        let mut reader = XmlCursor::new(PullSource::from_string(input));
        let mut writer = TextWriter::new(Vec::new()).xml_declaration(false);
        copy_events(&mut reader, &mut writer).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_copy_normalizes() {
        assert_eq!(
            copy("<?xml version='1.0'?>\n<!-- c --><a x='1'><b>t&amp;<![CDATA[<c>]]></b><?pi d?><e></e></a>\n"),
            r#"<a x="1"><b>t&amp;&lt;c&gt;</b><e/></a>"#
        );
    }

    #[test]
    fn test_copy_namespaces() {
        assert_eq!(
            copy("<p:a xmlns:p='urn:p' xmlns='urn:d'><b p:x='1'/></p:a>"),
            r#"<a xmlns="urn:p"><b xmlns="urn:d" xmlns:ns1="urn:p" ns1:x="1"/></a>"#
        );
    }

    #[test]
    fn test_reader_must_be_fresh() {
        let mut reader = XmlCursor::new(PullSource::from_string("<a/>"));
        reader.next().unwrap();
        let mut writer = TextWriter::new(Vec::new());
        assert!(copy_events(&mut reader, &mut writer).is_err());
    }
}

//! Buffered XML input
//!
//! Byte sources for the readers:
//! - DecodedInput: reads any `Read`, transcoding to UTF-8 when needed
//! - TrackingReader: counts lines and columns of the bytes consumed
//! - read_all: slurps a whole document for the pull backend

use std::io::{self, BufRead, BufReader, Cursor, Read};

use crate::core::encoding;
use crate::error::Result;
use crate::reader::events::Position;

/// Buffer size for reading chunks
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// UTF-8 view of an input stream.
///
/// UTF-8 (and ASCII) input is streamed through a buffer with its BOM
/// removed; other encodings are read fully and transcoded once.
pub enum DecodedInput<R> {
    Utf8(BufReader<R>),
    Transcoded(Cursor<Vec<u8>>),
}

impl<R: Read> DecodedInput<R> {
    /// Wrap `reader`, resolving its encoding from the BOM, `hint` or the
    /// XML declaration
    pub fn new(reader: R, hint: Option<&str>) -> Result<Self> {
        let mut reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, reader);
        let (encoding, has_bom) = {
            let head = reader.fill_buf()?;
            (encoding::resolve(hint, head)?, head.starts_with(&[0xEF, 0xBB, 0xBF]))
        };

        if encoding.is_utf8_compatible() {
            if has_bom {
                reader.consume(3);
            }
            return Ok(DecodedInput::Utf8(reader));
        }

        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let text = encoding.decode(bytes)?;
        tracing::debug!(encoding = encoding.label(), "transcoded input to UTF-8");
        Ok(DecodedInput::Transcoded(Cursor::new(text.into_bytes())))
    }
}

impl<R: Read> Read for DecodedInput<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            DecodedInput::Utf8(r) => r.read(buf),
            DecodedInput::Transcoded(r) => r.read(buf),
        }
    }
}

impl<R: Read> BufRead for DecodedInput<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            DecodedInput::Utf8(r) => r.fill_buf(),
            DecodedInput::Transcoded(r) => r.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            DecodedInput::Utf8(r) => r.consume(amt),
            DecodedInput::Transcoded(r) => r.consume(amt),
        }
    }
}

/// Buffered reader that tracks the line and column after the last consumed byte
pub struct TrackingReader<R> {
    reader: R,
    position: Position,
}

impl<R: BufRead> TrackingReader<R> {
    /// Create a new tracking reader
    pub fn new(reader: R) -> Self {
        TrackingReader {
            reader,
            position: Position::START,
        }
    }

    /// Position just after the bytes consumed so far
    pub fn position(&self) -> Position {
        self.position
    }
}

impl<R: BufRead> Read for TrackingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl<R: BufRead> BufRead for TrackingReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.reader.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        if amt > 0 {
            // The bytes being consumed are still buffered, so this never reads
            if let Ok(buffered) = self.reader.fill_buf() {
                let n = amt.min(buffered.len());
                self.position.advance(&buffered[..n]);
            }
        }
        self.reader.consume(amt);
    }
}

/// Read entire XML document from a Read source
pub fn read_all<R: Read>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;
    Ok(buffer)
}

//! Reader and writer configuration
//!
//! Plain values with builder-style setters, consumed by
//! [`crate::ReaderFactory`] and [`crate::WriterFactory`].

use std::fmt;

/// XML engine behind a reader or writer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// The crate's own tokenizer and serializer (`pull` feature)
    Pull,
    /// quick-xml (`stream` feature)
    Stream,
}

impl Backend {
    /// All backends, most preferred first
    pub const ALL: [Backend; 2] = [Backend::Pull, Backend::Stream];

    /// Check if this backend was compiled in
    pub fn is_available(self) -> bool {
        match self {
            Backend::Pull => cfg!(feature = "pull"),
            Backend::Stream => cfg!(feature = "stream"),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Backend::Pull => "pull",
            Backend::Stream => "stream",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reader settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Candidate backends in order of preference
    pub backends: Vec<Backend>,
    /// Encoding used when the caller passes none; a BOM still wins
    pub encoding: Option<String>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            backends: Backend::ALL.to_vec(),
            encoding: None,
        }
    }
}

impl ReaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use exactly this backend
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backends = vec![backend];
        self
    }

    /// Try these backends in order
    pub fn backends(mut self, backends: impl IntoIterator<Item = Backend>) -> Self {
        self.backends = backends.into_iter().collect();
        self
    }

    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }
}

/// Writer settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    /// Preferred backend; another available one is used if it is missing
    pub backend: Backend,
    /// Output encoding label
    pub encoding: String,
    /// Write `<?xml version="1.0" encoding="..."?>` on `start_document`
    pub xml_declaration: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        WriterConfig {
            backend: Backend::Pull,
            encoding: "UTF-8".to_string(),
            xml_declaration: true,
        }
    }
}

impl WriterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn xml_declaration(mut self, enabled: bool) -> Self {
        self.xml_declaration = enabled;
        self
    }
}

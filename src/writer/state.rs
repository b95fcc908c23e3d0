//! Writer state machine
//!
//! Every writer backend drives one [`WriterState`]. It validates each call
//! and works out the qualified names and namespace declarations to emit, so
//! the backends only have to render what it returns.
//!
//! - `start_document` and `end_document` run once each, in that order
//! - there is exactly one root element
//! - `end_tag` must name the innermost open element
//! - after `empty_tag`, only `end_tag` (or `set_prefix`) is accepted
//! - attributes are accepted only while the start tag is still open

use crate::core::namespace::{ns, NamespaceScopes};
use crate::core::scanner::is_whitespace;
use crate::error::{Result, XmlError};

const EMPTY_PENDING: &str = "Not allowed inside an empty tag. Use 'endTag' first.";

/// A namespace declaration to attach to a start tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// `None` declares the default namespace
    pub prefix: Option<String>,
    /// Empty when undeclaring the default namespace
    pub uri: String,
}

impl Declaration {
    /// Attribute name of this declaration: `xmlns` or `xmlns:prefix`
    pub fn attribute_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_string(),
        }
    }
}

/// Output for `start_tag` / `empty_tag`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    pub qname: String,
    pub declarations: Vec<Declaration>,
    /// The parent's start tag is still open and must be closed first
    pub close_parent: bool,
}

/// Output for `attribute`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeName {
    pub qname: String,
    /// Declaration for a generated prefix, written before the attribute
    pub declaration: Option<Declaration>,
}

/// Output for `end_tag`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndTag {
    pub qname: String,
    /// No content was written, so the element can be closed with `/>`
    pub self_closing: bool,
}

#[derive(Debug, Clone)]
struct OpenTag {
    namespace_uri: Option<String>,
    local_name: String,
    qname: String,
}

/// Shared writer bookkeeping
#[derive(Debug, Default)]
pub struct WriterState {
    started: bool,
    ended: bool,
    root_written: bool,
    open: Vec<OpenTag>,
    /// Current start tag has no content yet and still takes attributes
    start_tag_open: bool,
    empty_pending: bool,
    /// Bindings from `set_prefix`, attached to the next opened tag
    pending_prefixes: Vec<(String, String)>,
    scopes: NamespaceScopes,
    generated: usize,
}

/// Empty namespace URIs mean "no namespace"
fn normalize(namespace_uri: Option<&str>) -> Option<&str> {
    namespace_uri.filter(|uri| !uri.is_empty())
}

/// Record a default namespace declaration, replacing one already pending
/// so a tag never carries two `xmlns` attributes
fn declare_default(declarations: &mut Vec<Declaration>, uri: &str) {
    match declarations.iter_mut().find(|d| d.prefix.is_none()) {
        Some(existing) => existing.uri = uri.to_string(),
        None => declarations.push(Declaration {
            prefix: None,
            uri: uri.to_string(),
        }),
    }
}

fn display_name(namespace_uri: Option<&str>, local_name: &str) -> String {
    match namespace_uri {
        Some(uri) => format!("{local_name} xmlns=\"{uri}\""),
        None => local_name.to_string(),
    }
}

impl WriterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if an element is open whose start tag still takes attributes
    pub fn is_start_tag_open(&self) -> bool {
        self.start_tag_open
    }

    /// Check if the last opened element was started with `empty_tag`
    pub fn is_empty_pending(&self) -> bool {
        self.empty_pending
    }

    /// Number of open elements
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    fn require_document(&self) -> Result<()> {
        if !self.started {
            return Err(XmlError::writer("Document has not been started"));
        }
        if self.ended {
            return Err(XmlError::writer("Document has already ended"));
        }
        Ok(())
    }

    fn require_not_empty(&self) -> Result<()> {
        if self.empty_pending {
            return Err(XmlError::writer(EMPTY_PENDING));
        }
        Ok(())
    }

    pub fn start_document(&mut self) -> Result<()> {
        if self.started {
            return Err(XmlError::writer("Document has already been started"));
        }
        self.started = true;
        Ok(())
    }

    /// Bind `prefix` to `uri` on the next opened element.
    /// The empty prefix binds the default namespace.
    pub fn set_prefix(&mut self, prefix: &str, uri: &str) -> Result<()> {
        self.require_document()?;
        if prefix == "xmlns" || (prefix == "xml" && uri != ns::XML) {
            return Err(XmlError::writer(format!("Prefix '{prefix}' cannot be rebound")));
        }
        if !prefix.is_empty() && uri.is_empty() {
            return Err(XmlError::writer(format!("Prefix '{prefix}' cannot be bound to an empty URI")));
        }
        self.pending_prefixes.retain(|(p, _)| p != prefix);
        self.pending_prefixes.push((prefix.to_string(), uri.to_string()));
        Ok(())
    }

    /// Open an element; `empty` marks it empty-pending
    pub fn start_tag(&mut self, namespace_uri: Option<&str>, local_name: &str, empty: bool) -> Result<StartTag> {
        self.require_document()?;
        self.require_not_empty()?;
        if self.open.is_empty() && self.root_written {
            return Err(XmlError::writer("Only one root element is allowed"));
        }
        if local_name.is_empty() {
            return Err(XmlError::writer("Element name must not be empty"));
        }
        let namespace_uri = normalize(namespace_uri);

        self.scopes.push_scope();
        let mut declarations = Vec::new();
        for (prefix, uri) in std::mem::take(&mut self.pending_prefixes) {
            let current = if prefix.is_empty() {
                self.scopes.resolve_default()
            } else {
                self.scopes.resolve(&prefix)
            };
            if current == normalize(Some(&uri)) || prefix == "xml" {
                continue;
            }
            if prefix.is_empty() {
                self.scopes.declare_default(&uri);
                declarations.push(Declaration { prefix: None, uri });
            } else {
                self.scopes.declare(&prefix, &uri);
                declarations.push(Declaration {
                    prefix: Some(prefix),
                    uri,
                });
            }
        }

        let qname = match namespace_uri {
            Some(uri) => match self.scopes.prefix_for(uri) {
                Some("") => local_name.to_string(),
                Some(prefix) => format!("{prefix}:{local_name}"),
                None => {
                    self.scopes.declare_default(uri);
                    declare_default(&mut declarations, uri);
                    local_name.to_string()
                }
            },
            None => {
                if self.scopes.resolve_default().is_some() {
                    self.scopes.declare_default("");
                    declare_default(&mut declarations, "");
                }
                local_name.to_string()
            }
        };

        let close_parent = self.start_tag_open;
        self.open.push(OpenTag {
            namespace_uri: namespace_uri.map(str::to_string),
            local_name: local_name.to_string(),
            qname: qname.clone(),
        });
        self.root_written = true;
        self.start_tag_open = true;
        self.empty_pending = empty;

        Ok(StartTag {
            qname,
            declarations,
            close_parent,
        })
    }

    /// Qualify an attribute of the open start tag
    pub fn attribute(&mut self, namespace_uri: Option<&str>, local_name: &str) -> Result<AttributeName> {
        self.require_document()?;
        self.require_not_empty()?;
        if !self.start_tag_open {
            return Err(XmlError::writer("Attributes must be written right after 'startTag'"));
        }
        let uri = match normalize(namespace_uri) {
            None => {
                return Ok(AttributeName {
                    qname: local_name.to_string(),
                    declaration: None,
                })
            }
            Some(uri) => uri,
        };

        if let Some(prefix) = self.scopes.named_prefix_for(uri) {
            return Ok(AttributeName {
                qname: format!("{prefix}:{local_name}"),
                declaration: None,
            });
        }

        let prefix = loop {
            self.generated += 1;
            let candidate = format!("ns{}", self.generated);
            if self.scopes.resolve(&candidate).is_none() {
                break candidate;
            }
        };
        self.scopes.declare(&prefix, uri);
        Ok(AttributeName {
            qname: format!("{prefix}:{local_name}"),
            declaration: Some(Declaration {
                prefix: Some(prefix),
                uri: uri.to_string(),
            }),
        })
    }

    /// Character data; returns whether the open start tag must be closed first
    pub fn text(&mut self, characters: &str) -> Result<bool> {
        self.require_document()?;
        self.require_not_empty()?;
        if self.open.is_empty() && !characters.bytes().all(is_whitespace) {
            return Err(XmlError::writer("Text is not allowed outside the root element"));
        }
        Ok(std::mem::replace(&mut self.start_tag_open, false))
    }

    /// Close the innermost element, which must match the given name
    pub fn end_tag(&mut self, namespace_uri: Option<&str>, local_name: &str) -> Result<EndTag> {
        self.require_document()?;
        let namespace_uri = normalize(namespace_uri);
        let top = self.open.pop().ok_or_else(|| {
            XmlError::writer(format!(
                "Unexpected end tag </{}>",
                display_name(namespace_uri, local_name)
            ))
        })?;
        if top.local_name != local_name || top.namespace_uri.as_deref() != namespace_uri {
            let err = XmlError::writer(format!(
                "Unbalanced end tag (<{}> vs </{}>)",
                display_name(top.namespace_uri.as_deref(), &top.local_name),
                display_name(namespace_uri, local_name)
            ));
            self.open.push(top);
            return Err(err);
        }

        self.scopes.pop_scope();
        let self_closing = std::mem::replace(&mut self.start_tag_open, false);
        self.empty_pending = false;
        Ok(EndTag {
            qname: top.qname,
            self_closing,
        })
    }

    pub fn end_document(&mut self) -> Result<()> {
        self.require_document()?;
        if let Some(top) = self.open.last() {
            return Err(XmlError::writer(format!(
                "Can't end document with open element <{}>",
                top.qname
            )));
        }
        if !self.root_written {
            return Err(XmlError::writer("Can't end document without a root element"));
        }
        self.ended = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn started() -> WriterState {
        let mut state = WriterState::new();
        state.start_document().unwrap();
        state
    }

    #[test]
    fn test_prefix_declared_on_next_tag() {
        let mut state = started();
        state.set_prefix("ab", "urn:x").unwrap();
        let root = state.start_tag(Some("urn:x"), "root", false).unwrap();
        assert_eq!(root.qname, "ab:root");
        assert_eq!(
            root.declarations,
            [Declaration {
                prefix: Some("ab".into()),
                uri: "urn:x".into()
            }]
        );
        assert!(!root.close_parent);

        let child = state.start_tag(Some("urn:x"), "child", true).unwrap();
        assert_eq!(child.qname, "ab:child");
        assert!(child.declarations.is_empty());
        assert!(child.close_parent);
    }

    #[test]
    fn test_undeclared_namespace_becomes_default() {
        let mut state = started();
        let root = state.start_tag(Some("urn:d"), "a", false).unwrap();
        assert_eq!(root.qname, "a");
        assert_eq!(root.declarations[0].attribute_name(), "xmlns");
        assert_eq!(root.declarations[0].uri, "urn:d");

        let inner = state.start_tag(Some("urn:d"), "b", false).unwrap();
        assert!(inner.declarations.is_empty());

        let plain = state.start_tag(None, "c", false).unwrap();
        assert_eq!(
            plain.declarations,
            [Declaration {
                prefix: None,
                uri: String::new()
            }]
        );
    }

    #[test]
    fn test_single_default_declaration() {
        let mut state = started();
        state.set_prefix("", "urn:d").unwrap();
        let tag = state.start_tag(None, "a", false).unwrap();
        assert_eq!(
            tag.declarations,
            [Declaration {
                prefix: None,
                uri: String::new()
            }]
        );
    }

    #[test]
    fn test_attribute_prefixes() {
        let mut state = started();
        state.set_prefix("p", "urn:p").unwrap();
        state.start_tag(None, "a", false).unwrap();
        assert_eq!(state.attribute(None, "x").unwrap().qname, "x");
        assert_eq!(state.attribute(Some("urn:p"), "y").unwrap().qname, "p:y");

        let generated = state.attribute(Some("urn:q"), "z").unwrap();
        assert_eq!(generated.qname, "ns1:z");
        assert_eq!(generated.declaration.unwrap().attribute_name(), "xmlns:ns1");
        // Reused once declared
        assert_eq!(state.attribute(Some("urn:q"), "w").unwrap().qname, "ns1:w");
    }

    #[test]
    fn test_empty_pending_rejects_content() {
        let mut state = started();
        state.start_tag(None, "a", false).unwrap();
        state.start_tag(None, "b", true).unwrap();
        for err in [
            state.text("x").unwrap_err(),
            state.start_tag(None, "c", false).unwrap_err(),
            state.attribute(None, "x").unwrap_err(),
        ] {
            assert_eq!(err.kind(), ErrorKind::Writer);
            assert_eq!(err.to_string(), EMPTY_PENDING);
        }
        let end = state.end_tag(None, "b").unwrap();
        assert!(end.self_closing);
        assert!(!state.text("x").unwrap());
        assert!(!state.end_tag(None, "a").unwrap().self_closing);
    }

    #[test]
    fn test_attribute_after_content() {
        let mut state = started();
        state.start_tag(None, "a", false).unwrap();
        state.text("x").unwrap();
        assert!(state.attribute(None, "late").is_err());
    }

    #[test]
    fn test_unbalanced_end_tag() {
        let mut state = started();
        state.start_tag(Some("urn:x"), "a", false).unwrap();
        let err = state.end_tag(None, "a").unwrap_err();
        assert_eq!(err.to_string(), "Unbalanced end tag (<a xmlns=\"urn:x\"> vs </a>)");
        assert!(state.end_tag(Some("urn:x"), "b").is_err());
        state.end_tag(Some("urn:x"), "a").unwrap();
        assert!(state.end_tag(Some("urn:x"), "a").is_err());
    }

    #[test]
    fn test_document_lifecycle() {
        let mut state = WriterState::new();
        assert!(state.start_tag(None, "a", false).is_err());
        state.start_document().unwrap();
        assert!(state.start_document().is_err());
        assert!(state.end_document().is_err());
        assert!(state.text("outside").is_err());
        assert!(state.text("\u{c}").is_err());
        state.text("\n").unwrap();

        state.start_tag(None, "a", false).unwrap();
        assert!(state.end_document().is_err());
        state.end_tag(None, "a").unwrap();
        assert!(state.start_tag(None, "b", false).is_err());
        state.end_document().unwrap();
        assert!(state.end_document().is_err());
        assert!(state.text(" ").is_err());
    }

    #[test]
    fn test_reserved_prefixes() {
        let mut state = started();
        assert!(state.set_prefix("xmlns", "urn:x").is_err());
        assert!(state.set_prefix("xml", "urn:x").is_err());
        assert!(state.set_prefix("p", "").is_err());
        state.set_prefix("xml", ns::XML).unwrap();
        let tag = state.start_tag(Some(ns::XML), "a", false).unwrap();
        assert_eq!(tag.qname, "xml:a");
        assert!(tag.declarations.is_empty());
    }
}

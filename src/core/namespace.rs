//! Namespace Resolution
//!
//! Stack-based namespace scopes shared by the pull reader and the writers.
//! Bindings are tagged with the depth they were declared at and dropped
//! when that scope is popped.

/// Well-known namespace URIs
pub mod ns {
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
}

/// Namespace binding (prefix -> URI); the empty prefix is the default namespace
#[derive(Debug, Clone)]
struct NsBinding {
    prefix: String,
    /// `None` undeclares the default namespace (`xmlns=""`)
    uri: Option<String>,
    depth: usize,
}

/// Stack-based namespace resolver
#[derive(Debug, Clone)]
pub struct NamespaceScopes {
    bindings: Vec<NsBinding>,
    depth: usize,
}

impl Default for NamespaceScopes {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceScopes {
    /// Create a resolver with the `xml` and `xmlns` prefixes pre-bound
    pub fn new() -> Self {
        let mut scopes = NamespaceScopes {
            bindings: Vec::with_capacity(16),
            depth: 0,
        };
        scopes.bindings.push(NsBinding {
            prefix: "xml".to_string(),
            uri: Some(ns::XML.to_string()),
            depth: 0,
        });
        scopes.bindings.push(NsBinding {
            prefix: "xmlns".to_string(),
            uri: Some(ns::XMLNS.to_string()),
            depth: 0,
        });
        scopes
    }

    /// Enter a new element scope
    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave an element scope, removing any bindings declared in it
    pub fn pop_scope(&mut self) {
        while let Some(binding) = self.bindings.last() {
            if binding.depth < self.depth {
                break;
            }
            self.bindings.pop();
        }
        self.depth = self.depth.saturating_sub(1);
    }

    /// Declare a prefix binding for the current scope.
    /// `xml` and `xmlns` cannot be rebound and are ignored.
    pub fn declare(&mut self, prefix: &str, uri: &str) {
        if prefix == "xml" || prefix == "xmlns" {
            return;
        }
        self.bindings.push(NsBinding {
            prefix: prefix.to_string(),
            uri: Some(uri.to_string()),
            depth: self.depth,
        });
    }

    /// Declare (or with `""`, undeclare) the default namespace for current scope
    pub fn declare_default(&mut self, uri: &str) {
        self.bindings.push(NsBinding {
            prefix: String::new(),
            uri: (!uri.is_empty()).then(|| uri.to_string()),
            depth: self.depth,
        });
    }

    /// Resolve a prefix to a namespace URI.
    ///
    /// Returns `None` when the prefix was never bound.
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|b| b.prefix == prefix)
            .and_then(|b| b.uri.as_deref())
    }

    /// Resolve the default namespace
    pub fn resolve_default(&self) -> Option<&str> {
        self.resolve("")
    }

    /// Find a prefix currently bound to `uri` that is not shadowed by an
    /// inner binding. The default namespace is reported as `""`.
    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .filter(|b| b.uri.as_deref() == Some(uri))
            .map(|b| b.prefix.as_str())
            .find(|prefix| self.resolve(prefix) == Some(uri))
    }

    /// Like [`prefix_for`](Self::prefix_for), skipping the default namespace.
    /// Attributes can only be qualified this way.
    pub fn named_prefix_for(&self, uri: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .filter(|b| !b.prefix.is_empty() && b.uri.as_deref() == Some(uri))
            .map(|b| b.prefix.as_str())
            .find(|prefix| self.resolve(prefix) == Some(uri))
    }

    /// Get current depth
    pub fn depth(&self) -> usize {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_namespaces() {
        let scopes = NamespaceScopes::new();
        assert_eq!(scopes.resolve("xml"), Some(ns::XML));
        assert_eq!(scopes.resolve_default(), None);
    }

    #[test]
    fn test_scope_pop() {
        let mut scopes = NamespaceScopes::new();

        scopes.push_scope();
        scopes.declare("foo", "http://example.com/foo");
        assert_eq!(scopes.resolve("foo"), Some("http://example.com/foo"));

        scopes.pop_scope();
        assert_eq!(scopes.resolve("foo"), None);
    }

    #[test]
    fn test_shadow_binding() {
        let mut scopes = NamespaceScopes::new();

        scopes.push_scope();
        scopes.declare("ns", "http://example.com/ns1");
        scopes.push_scope();
        scopes.declare("ns", "http://example.com/ns2");
        assert_eq!(scopes.resolve("ns"), Some("http://example.com/ns2"));
        assert_eq!(scopes.prefix_for("http://example.com/ns1"), None);

        scopes.pop_scope();
        assert_eq!(scopes.resolve("ns"), Some("http://example.com/ns1"));
        assert_eq!(scopes.prefix_for("http://example.com/ns1"), Some("ns"));
    }

    #[test]
    fn test_undeclare_default() {
        let mut scopes = NamespaceScopes::new();
        scopes.push_scope();
        scopes.declare_default("urn:d");
        assert_eq!(scopes.resolve_default(), Some("urn:d"));
        assert_eq!(scopes.prefix_for("urn:d"), Some(""));

        scopes.push_scope();
        scopes.declare_default("");
        assert_eq!(scopes.resolve_default(), None);
        assert_eq!(scopes.prefix_for("urn:d"), None);
    }

    #[test]
    fn test_xml_prefix_fixed() {
        let mut scopes = NamespaceScopes::new();
        scopes.push_scope();
        scopes.declare("xml", "urn:other");
        assert_eq!(scopes.resolve("xml"), Some(ns::XML));
    }

    #[test]
    fn test_named_prefix_skips_default() {
        let mut scopes = NamespaceScopes::new();
        scopes.push_scope();
        scopes.declare("p", "urn:x");
        scopes.declare_default("urn:x");
        assert_eq!(scopes.prefix_for("urn:x"), Some(""));
        assert_eq!(scopes.named_prefix_for("urn:x"), Some("p"));
        assert_eq!(scopes.named_prefix_for("urn:y"), None);
    }

    #[test]
    fn test_scopes_deeper_than_u16() {
        let mut scopes = NamespaceScopes::new();
        scopes.push_scope();
        scopes.declare("p", "urn:outer");
        for _ in 0..70_000 {
            scopes.push_scope();
        }
        scopes.declare("p", "urn:inner");
        assert_eq!(scopes.depth(), 70_001);
        assert_eq!(scopes.resolve("p"), Some("urn:inner"));

        for _ in 0..70_000 {
            scopes.pop_scope();
        }
        assert_eq!(scopes.depth(), 1);
        assert_eq!(scopes.resolve("p"), Some("urn:outer"));
    }
}

//! String Interning Pool
//!
//! Deduplicated storage for element names, prefixes, namespace URIs,
//! attribute values and text content. Strings are copied into one buffer
//! and addressed by a `u32` id; id 0 is reserved for "no string".
//!
//! Uses hash-based lookup to avoid storing duplicate string data.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Interned string: (offset_in_data, length)
#[derive(Debug, Clone, Copy)]
struct StringEntry(u32, u32);

/// String interning pool
#[derive(Debug)]
pub struct StringPool {
    /// Entries indexed by string ID
    entries: Vec<StringEntry>,
    data: String,
    /// Hash of string content -> list of IDs with that hash
    hash_index: HashMap<u64, Vec<u32>>,
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StringPool {
    /// Create a new empty string pool
    pub fn new() -> Self {
        let mut pool = StringPool {
            entries: Vec::with_capacity(64),
            data: String::with_capacity(1024),
            hash_index: HashMap::new(),
        };
        pool.entries.push(StringEntry(0, 0));
        pool
    }

    #[inline]
    fn compute_hash(s: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        hasher.finish()
    }

    /// Intern a string, returning the id of an equal string if one exists.
    /// The empty string is always id 0.
    pub fn intern(&mut self, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }

        let hash = Self::compute_hash(s);
        if let Some(ids) = self.hash_index.get(&hash) {
            for &id in ids {
                if self.get(id) == Some(s) {
                    return id;
                }
            }
        }

        let offset = self.data.len() as u32;
        self.data.push_str(s);
        let id = self.entries.len() as u32;
        self.entries.push(StringEntry(offset, s.len() as u32));
        self.hash_index.entry(hash).or_default().push(id);
        id
    }

    /// Intern an optional string; `None` and `""` both map to id 0
    pub fn intern_opt(&mut self, s: Option<&str>) -> u32 {
        s.map_or(0, |s| self.intern(s))
    }

    /// Get a string by ID
    pub fn get(&self, id: u32) -> Option<&str> {
        let StringEntry(offset, len) = *self.entries.get(id as usize)?;
        let start = offset as usize;
        self.data.get(start..start + len as usize)
    }

    /// Get a string by ID, mapping id 0 to `None`
    pub fn get_opt(&self, id: u32) -> Option<&str> {
        if id == 0 {
            None
        } else {
            self.get(id)
        }
    }

    /// Get the number of unique strings stored
    pub fn len(&self) -> usize {
        self.entries.len() - 1
    }

    /// Check if the pool is empty
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }
}

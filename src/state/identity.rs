//! Listing identity and duplicate suppression

use std::collections::HashSet;
use std::fmt;

/// Identity of a listing across pages: `title + "_" + company`
///
/// Two distinct postings sharing title and company collapse into one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn new(title: &str, company: &str) -> Self {
        Self(format!("{}_{}", title, company))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Session-scoped set of seen identity keys. It only grows.
#[derive(Debug, Default)]
pub struct IdentityTracker {
    seen: HashSet<IdentityKey>,
}

impl IdentityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self, key: &IdentityKey) -> bool {
        self.seen.contains(key)
    }

    /// Records `key`, returning true if it was not seen before
    pub fn record(&mut self, key: IdentityKey) -> bool {
        self.seen.insert(key)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

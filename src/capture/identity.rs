//! Identity of the document a capture targets.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Address of the captured document.
///
/// In-page anchors do not change the document: `doc#a` and `doc#b` are the same.
///
/// # Examples
///
/// ```
/// use vdom_capture::capture::DocumentIdentity;
///
/// let page = DocumentIdentity::new("https://notes.example/p/42");
/// assert!(page.same_document(&DocumentIdentity::new("https://notes.example/p/42#setup")));
/// assert!(!page.same_document(&DocumentIdentity::new("https://notes.example/p/43")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentIdentity(String);

impl DocumentIdentity {
    /// Wrap a document address.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Full address.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Address without its fragment.
    pub fn base(&self) -> &str {
        self.0.split('#').next().unwrap_or(&self.0)
    }

    /// Whether both identities denote the same document.
    pub fn same_document(&self, other: &DocumentIdentity) -> bool {
        self.base() == other.base()
    }
}

impl fmt::Display for DocumentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentIdentity {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_ignored() {
        let a = DocumentIdentity::new("doc#one");
        let b = DocumentIdentity::new("doc");
        assert_eq!(a.base(), "doc");
        assert!(a.same_document(&b));
        assert_ne!(a, b);
    }
}

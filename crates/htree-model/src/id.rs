//! Dotted hierarchical identifiers
//!
//! Node ids such as `"1.2.3"` encode tree position: every `.`-separated
//! segment is one level of depth. The backend is the authority on parentage
//! (via `parent_id`); the prefix structure here is only a fallback when no
//! edge is known for a node.

use crate::error::ModelError;
use std::fmt;
use std::str::FromStr;

/// Parent id used by the backend to mark a root node
pub const ROOT_SENTINEL: &str = "0";

/// A validated dotted identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DottedId(String);

impl DottedId {
    /// Borrow the raw id
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of segments (`"1"` is depth 1, `"1.2"` is depth 2)
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.split('.').count()
    }

    /// Parent inferred from the id prefix, `None` for single-segment ids
    #[must_use]
    pub fn prefix_parent(&self) -> Option<DottedId> {
        prefix_parent(&self.0).map(|p| DottedId(p.to_string()))
    }
}

impl FromStr for DottedId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_dotted(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(ModelError::InvalidDottedId(s.to_string()))
        }
    }
}

impl fmt::Display for DottedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DottedId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Whether `s` is a non-empty `.`-separated list of integers
#[must_use]
pub fn is_dotted(s: &str) -> bool {
    !s.is_empty()
        && s.split('.')
            .all(|seg| !seg.is_empty() && seg.bytes().all(|b| b.is_ascii_digit()))
}

/// Parent of a raw id by dropping its last segment
///
/// Works on any string containing `.`; returns `None` when there is nothing
/// to drop.
#[must_use]
pub fn prefix_parent(id: &str) -> Option<&str> {
    id.rfind('.').map(|idx| &id[..idx]).filter(|p| !p.is_empty())
}

/// Whether `parent` is absent or the root sentinel
#[inline]
#[must_use]
pub fn is_root_parent(parent: Option<&str>) -> bool {
    matches!(parent, None | Some("" | ROOT_SENTINEL))
}

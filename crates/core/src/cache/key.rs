//! Cache key normalization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical form of a search term used for cache lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(transparent)]
pub struct NormalizedKey(String);

impl NormalizedKey {
    /// Wrap a term that was normalized before it was stored.
    pub(crate) fn from_stored(term: String) -> Self {
        Self(term)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercase a raw search term. Whitespace and everything else is kept verbatim.
pub fn normalize(term: &str) -> NormalizedKey {
    NormalizedKey(term.to_lowercase())
}

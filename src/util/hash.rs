//! Identity digests for configurations, specs, and cache keys.
//!
//! Everything the resolver memoizes is keyed by a SHA-256 digest over
//! its canonical string form. Digests must be stable across process
//! runs (cross-run cache reuse), so no randomized hashers appear here.

use std::fmt;

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::util::Symbol;

/// A stable content identity: a hex-encoded SHA-256 digest.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity(String);

impl Identity {
    /// The full hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.short())
    }
}

impl Serialize for Identity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

/// Incrementally builds an [`Identity`] from named components.
///
/// Each update is NUL-terminated so that component boundaries cannot
/// alias (`["ab", "c"]` and `["a", "bc"]` digest differently).
#[derive(Default)]
pub struct IdentityHasher {
    hasher: Sha256,
}

impl IdentityHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one string component.
    pub fn write_str(&mut self, s: &str) -> &mut Self {
        self.hasher.update(s.as_bytes());
        self.hasher.update(b"\0");
        self
    }

    /// Add a key/value pair.
    pub fn write_pair(&mut self, key: &str, value: &str) -> &mut Self {
        self.write_str(key).write_str(value)
    }

    /// Add a component that may be absent. Presence is marked so that
    /// `None` and `Some("")` digest differently.
    pub fn write_opt(&mut self, value: Option<&str>) -> &mut Self {
        match value {
            Some(s) => {
                self.hasher.update(b"\x01");
                self.write_str(s);
            }
            None => {
                self.hasher.update(b"\x00");
            }
        }
        self
    }

    /// Add an already-sorted sequence of symbols.
    pub fn write_symbols<'a>(&mut self, items: impl IntoIterator<Item = &'a Symbol>) -> &mut Self {
        for sym in items {
            self.write_str(sym.as_str());
        }
        self
    }

    /// Finalize into an identity digest.
    pub fn finish(self) -> Identity {
        Identity(hex::encode(self.hasher.finalize()))
    }
}

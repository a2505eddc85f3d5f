//! Configurations - points in the build constraint space.
//!
//! A Configuration maps constraint axes to values. Axes not present are
//! unset, which is distinct from any value; that distinction is what
//! lets the dedup transition collapse configurations by removing an
//! axis. Configurations are immutable: every operation returns a
//! derived copy, and the shared map is Arc-backed so copies are cheap.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::core::axis::{ConstraintAxis, ConstraintValue};
use crate::util::{Identity, IdentityHasher};

/// Two distinct values claimed for one axis within a single batch.
///
/// This is a hard error, not an override: within one `with_values` call
/// there is no layering order that could make last-write-wins
/// meaningful.
#[derive(Debug, Clone, Error)]
#[error("axis `{axis}` assigned both `{first}` and `{second}` in one batch")]
pub struct AxisCollision {
    /// The contested axis.
    pub axis: ConstraintAxis,
    /// The value seen first.
    pub first: ConstraintValue,
    /// The conflicting value.
    pub second: ConstraintValue,
}

/// An immutable assignment of values to constraint axes.
///
/// Identity is structural: two configurations are the same iff their
/// axis-value mappings are equal as sets, regardless of how they were
/// built.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Configuration {
    entries: Arc<BTreeMap<ConstraintAxis, ConstraintValue>>,
}

impl Configuration {
    /// The empty configuration: every axis unset.
    pub fn empty() -> Self {
        Configuration::default()
    }

    /// Derive a configuration with one axis set (or overwritten).
    pub fn with_value(&self, value: ConstraintValue) -> Configuration {
        let mut entries = (*self.entries).clone();
        entries.insert(value.axis(), value);
        Configuration {
            entries: Arc::new(entries),
        }
    }

    /// Derive a configuration with a batch of axes set.
    ///
    /// Unlike repeated `with_value` calls, a batch has no ordering, so
    /// two distinct values for the same axis are a collision error
    /// rather than a silent last-write-wins.
    pub fn with_values(&self, values: &[ConstraintValue]) -> Result<Configuration, AxisCollision> {
        let mut batch: BTreeMap<ConstraintAxis, ConstraintValue> = BTreeMap::new();
        for &value in values {
            if let Some(&first) = batch.get(&value.axis()) {
                if first != value {
                    return Err(AxisCollision {
                        axis: value.axis(),
                        first,
                        second: value,
                    });
                }
                continue;
            }
            batch.insert(value.axis(), value);
        }

        let mut entries = (*self.entries).clone();
        entries.extend(batch);
        Ok(Configuration {
            entries: Arc::new(entries),
        })
    }

    /// Derive a configuration with one axis removed entirely.
    ///
    /// A no-op (returning an equal configuration) when the axis is
    /// already unset.
    pub fn without_axis(&self, axis: ConstraintAxis) -> Configuration {
        if !self.entries.contains_key(&axis) {
            return self.clone();
        }
        let mut entries = (*self.entries).clone();
        entries.remove(&axis);
        Configuration {
            entries: Arc::new(entries),
        }
    }

    /// The value set on an axis, if any.
    pub fn get(&self, axis: ConstraintAxis) -> Option<ConstraintValue> {
        self.entries.get(&axis).copied()
    }

    /// Whether the axis has a value set.
    pub fn contains_axis(&self, axis: ConstraintAxis) -> bool {
        self.entries.contains_key(&axis)
    }

    /// Iterate entries in canonical (axis name) order.
    pub fn iter(&self) -> impl Iterator<Item = ConstraintValue> + '_ {
        self.entries.values().copied()
    }

    /// Number of set axes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no axis is set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical identity digest.
    ///
    /// Order-independent by construction: the digest runs over the
    /// sorted axis-value pairs, so any sequence of operations producing
    /// equal mappings produces equal identities, across process runs.
    pub fn identity(&self) -> Identity {
        let mut hasher = IdentityHasher::new();
        hasher.write_str("configuration");
        for value in self.entries.values() {
            hasher.write_pair(value.axis().name().as_str(), value.value().as_str());
        }
        hasher.finish()
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        for value in self.entries.values() {
            set.entry(&format_args!("{}", value));
        }
        set.finish()
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("<unconstrained>");
        }
        let mut first = true;
        for value in self.entries.values() {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{}", value)?;
            first = false;
        }
        Ok(())
    }
}

impl Serialize for Configuration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for value in self.entries.values() {
            map.serialize_entry(value.axis().name().as_str(), value.value().as_str())?;
        }
        map.end()
    }
}

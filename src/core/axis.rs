//! Constraint axes and values - the coordinates of configuration space.
//!
//! A ConstraintAxis is one named dimension of build configuration (for
//! example the bootstrap mode, or the target architecture). A
//! ConstraintValue is one admissible point on exactly one axis. Both are
//! interned and Copy.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::util::Symbol;

/// A named dimension of build configuration.
///
/// Axes are globally unique by name: constructing the same name twice
/// yields the same axis.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintAxis {
    name: Symbol,
}

impl ConstraintAxis {
    /// Create (or look up) the axis with the given name.
    pub fn new(name: impl Into<Symbol>) -> Self {
        ConstraintAxis { name: name.into() }
    }

    /// The axis name.
    pub fn name(&self) -> Symbol {
        self.name
    }
}

impl fmt::Debug for ConstraintAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_str())
    }
}

impl fmt::Display for ConstraintAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_str())
    }
}

impl Serialize for ConstraintAxis {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name.as_str())
    }
}

/// One admissible value on an axis.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintValue {
    axis: ConstraintAxis,
    value: Symbol,
}

impl ConstraintValue {
    /// Create a value belonging to the given axis.
    pub fn new(axis: ConstraintAxis, value: impl Into<Symbol>) -> Self {
        ConstraintValue {
            axis,
            value: value.into(),
        }
    }

    /// The axis this value belongs to.
    pub fn axis(&self) -> ConstraintAxis {
        self.axis
    }

    /// The value name.
    pub fn value(&self) -> Symbol {
        self.value
    }
}

impl fmt::Debug for ConstraintValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.axis, self.value)
    }
}

impl fmt::Display for ConstraintValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.axis, self.value)
    }
}

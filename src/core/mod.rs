//! Core data structures for smelter.
//!
//! This module contains the foundational types used throughout the
//! graph compiler:
//! - Constraint axes and values (the dimensions of configuration space)
//! - Configurations and their canonical identities
//! - Package declarations and their on-disk manifest form

pub mod axis;
pub mod configuration;
pub mod manifest;
pub mod package;

pub use axis::{ConstraintAxis, ConstraintValue};
pub use configuration::{AxisCollision, Configuration};
pub use manifest::PackageDecl;
pub use package::{BuildRule, DepRequest, PackageId, PackageSpec, PolarArgs, SourceArtifact};

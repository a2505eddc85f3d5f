//! Smelter - the build-graph compiler of a source-based Linux distro.
//!
//! Given a package declaration and a configuration (a point in a
//! multi-dimensional constraint space), this crate deterministically
//! produces the enabled feature set, the concrete dependency edges,
//! the build-argument list, and the linear post-build transform chain,
//! deduplicating configuration-independent work along the way. The
//! actual build execution (compilers, archives, installation) lives
//! outside; this crate only decides what nodes and edges exist.

pub mod bootstrap;
pub mod core;
pub mod resolver;
pub mod transform;
pub mod transition;
pub mod util;

pub use crate::core::{
    configuration::Configuration, manifest::PackageDecl, package::PackageSpec, ConstraintAxis,
    ConstraintValue,
};

pub use bootstrap::{BootstrapStage, StageGraph};
pub use resolver::{Profile, ResolveError, ResolvedPackage, Resolver};
pub use transform::TransformChain;
pub use transition::TransitionRegistry;
pub use util::Symbol;

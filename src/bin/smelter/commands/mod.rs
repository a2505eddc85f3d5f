//! Command implementations and shared loading helpers.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use smelter::core::{Configuration, ConstraintAxis, ConstraintValue, PackageDecl, PackageSpec};
use smelter::resolver::{Profile, ResolveError};

pub mod chain;
pub mod flags;
pub mod resolve;

/// Load and validate a package declaration.
pub fn load_spec(path: &Path) -> Result<PackageSpec> {
    PackageDecl::load(path)?.to_spec()
}

/// Load the profile, or an empty one when no path was given.
pub fn load_profile(path: Option<&PathBuf>) -> Result<Profile> {
    match path {
        Some(path) => Profile::load(path),
        None => Ok(Profile::empty()),
    }
}

/// Build the ambient configuration from `--set AXIS=VALUE` pairs.
///
/// Applied as one batch, so conflicting values for one axis surface as
/// a collision instead of silently keeping the last one.
pub fn parse_configuration(pairs: &[String]) -> Result<Configuration> {
    let mut values = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let Some((axis, value)) = pair.split_once('=') else {
            bail!("invalid --set `{}`: expected AXIS=VALUE", pair);
        };
        values.push(ConstraintValue::new(ConstraintAxis::new(axis), value));
    }
    Configuration::empty()
        .with_values(&values)
        .context("conflicting --set values")
}

/// Render a resolution error through its diagnostic.
pub fn diagnose(err: ResolveError) -> anyhow::Error {
    anyhow::anyhow!("{}", err.to_diagnostic().format(false).trim_end())
}

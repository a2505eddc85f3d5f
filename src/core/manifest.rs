//! package.toml parsing and schema.
//!
//! A package declaration file is the on-disk form of a PackageSpec.
//! Parsing goes through raw serde structs mirroring the TOML layout,
//! then `to_spec()` converts and validates into the interned domain
//! types. Declarations describe sources but nothing here fetches them.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use semver::Version;
use serde::Deserialize;

use crate::core::package::{BuildRule, DepRequest, PackageSpec, SourceArtifact};

/// A dependency entry as written in package.toml.
///
/// Either a bare package name, or a table carrying the edge transition:
/// `deps = ["zlib", { name = "gcc", transition = "default" }]`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DepEntry {
    /// Bare name, edge resolved in the consumer's configuration
    Simple(String),
    /// Name plus an edge-scoped transition
    Detailed {
        name: String,
        #[serde(default)]
        transition: Option<String>,
    },
}

impl DepEntry {
    fn to_request(&self) -> DepRequest {
        match self {
            DepEntry::Simple(name) => DepRequest::new(name.as_str()),
            DepEntry::Detailed { name, transition } => {
                let mut dep = DepRequest::new(name.as_str());
                if let Some(t) = transition {
                    dep = dep.with_transition(t.as_str());
                }
                dep
            }
        }
    }
}

/// One flag-gated transform, declaration order preserved by using an
/// array of tables rather than a map.
#[derive(Debug, Clone, Deserialize)]
pub struct UseTransformEntry {
    pub flag: String,
    pub transform: String,
}

/// The `[package]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageSection {
    pub name: String,
    pub version: String,
    pub build: String,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub sha256: Option<String>,

    /// Built from files in the tree; carries no upstream artifact.
    #[serde(default)]
    pub local_only: bool,

    /// Declared flag set.
    #[serde(default)]
    pub iuse: Vec<String>,

    /// Flags enabled by default.
    #[serde(default)]
    pub use_defaults: Vec<String>,

    /// Unconditional dependencies.
    #[serde(default)]
    pub deps: Vec<DepEntry>,

    /// Always-applied transforms, in pipeline order.
    #[serde(default)]
    pub transforms: Vec<String>,
}

/// The parsed package.toml declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageDecl {
    pub package: PackageSection,

    /// Flag-conditional dependencies: `ssl = ["openssl"]`
    #[serde(default)]
    pub use_deps: BTreeMap<String, Vec<DepEntry>>,

    /// Flag-conditional arguments. A leading `-` on the key selects the
    /// disabled polarity: `"-ssl" = ["--without-ssl"]`
    #[serde(default)]
    pub use_args: BTreeMap<String, Vec<String>>,

    /// CMake-style fan-out of one flag to several definition names.
    #[serde(default)]
    pub option_fanout: BTreeMap<String, Vec<String>>,

    /// Flag-gated transforms, appended after `transforms`.
    #[serde(default)]
    pub use_transforms: Vec<UseTransformEntry>,
}

impl PackageDecl {
    /// Load a declaration from disk.
    pub fn load(path: &Path) -> Result<PackageDecl> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read package declaration: {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse package declaration: {}", path.display()))
    }

    /// Parse a declaration from TOML text.
    pub fn parse(contents: &str) -> Result<PackageDecl> {
        Ok(toml::from_str(contents)?)
    }

    /// Convert and validate into a PackageSpec.
    pub fn to_spec(&self) -> Result<PackageSpec> {
        let pkg = &self.package;

        let version: Version = pkg
            .version
            .parse()
            .with_context(|| format!("package `{}`: invalid version `{}`", pkg.name, pkg.version))?;

        let Some(build) = BuildRule::parse(&pkg.build) else {
            bail!(
                "package `{}`: unknown build rule `{}` (expected one of \
                 simple, autotools, cmake, meson, cargo, go, binary)",
                pkg.name,
                pkg.build
            );
        };

        let source = if pkg.local_only {
            SourceArtifact::local()
        } else {
            SourceArtifact {
                url: pkg.url.clone(),
                sha256: pkg.sha256.clone(),
                local_only: false,
            }
        };
        let missing = source.missing_fields();
        if !missing.is_empty() {
            bail!(
                "package `{}`: missing {} (add the field or set local_only = true)",
                pkg.name,
                missing.join(" and ")
            );
        }

        let mut spec = PackageSpec::new(pkg.name.as_str(), version, build)
            .with_source(source)
            .with_iuse(pkg.iuse.iter())
            .with_defaults(pkg.use_defaults.iter())
            .with_transforms(pkg.transforms.iter());

        for dep in &pkg.deps {
            spec = spec.with_static_dep(dep.to_request());
        }

        for (flag, deps) in &self.use_deps {
            for dep in deps {
                spec = spec.with_use_dep(flag.as_str(), dep.to_request());
            }
        }

        for (key, args) in &self.use_args {
            if let Some(flag) = key.strip_prefix('-') {
                for arg in args {
                    spec = spec.with_disabled_arg(flag, arg.as_str());
                }
            } else {
                for arg in args {
                    spec = spec.with_enabled_arg(key.as_str(), arg.as_str());
                }
            }
        }

        for (flag, options) in &self.option_fanout {
            spec = spec.with_option_fanout(flag.as_str(), options.iter().map(String::as_str));
        }

        for entry in &self.use_transforms {
            spec = spec.with_use_transform(entry.flag.as_str(), entry.transform.as_str());
        }

        Ok(spec)
    }
}

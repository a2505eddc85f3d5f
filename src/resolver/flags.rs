//! Layered USE-flag resolution.
//!
//! The effective flag set of a package instance is resolved in three
//! layers: the package's own defaults, then the profile's global
//! overrides, then its per-package overrides. Each override is
//! tri-state - absent keys pass the lower layer through untouched.
//! Overrides naming flags outside the package's declared set are
//! ignored silently; a profile is shared by thousands of packages and
//! most of its entries apply to only a few of them.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::core::PackageSpec;
use crate::util::{Identity, IdentityHasher, Symbol};

/// The externally supplied override layers, threaded explicitly
/// through every resolution call - never a process-wide singleton.
#[derive(Debug, Clone, Default)]
pub struct Profile {
    /// Global `[use]` layer: flag -> enable/disable.
    global: BTreeMap<Symbol, bool>,
    /// Per-package `[use.PKG]` layer, applied after (and winning over)
    /// the global layer.
    per_package: BTreeMap<Symbol, BTreeMap<Symbol, bool>>,
    /// USE_EXPAND variables: each value of `video_cards = ["fbdev"]`
    /// expands to a `video_cards_fbdev` candidate flag.
    use_expand: BTreeMap<Symbol, Vec<Symbol>>,
}

impl Profile {
    /// An empty profile: package defaults only.
    pub fn empty() -> Self {
        Profile::default()
    }

    /// Set a global override.
    pub fn set_global(&mut self, flag: impl Into<Symbol>, enabled: bool) -> &mut Self {
        self.global.insert(flag.into(), enabled);
        self
    }

    /// Set a per-package override.
    pub fn set_package(
        &mut self,
        package: impl Into<Symbol>,
        flag: impl Into<Symbol>,
        enabled: bool,
    ) -> &mut Self {
        self.per_package
            .entry(package.into())
            .or_default()
            .insert(flag.into(), enabled);
        self
    }

    /// Set a USE_EXPAND variable, replacing its previous value list
    /// entirely. An empty list is valid and expands to nothing.
    pub fn set_expand<I, S>(&mut self, variable: impl Into<Symbol>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        self.use_expand.insert(
            variable.into(),
            values.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// The values of a USE_EXPAND variable, if set.
    pub fn expand_values(&self, variable: &str) -> Option<&[Symbol]> {
        self.use_expand.get(variable).map(Vec::as_slice)
    }

    /// Candidate flags produced by USE_EXPAND expansion.
    pub fn expanded_flags(&self) -> Vec<Symbol> {
        let mut flags = Vec::new();
        for (variable, values) in &self.use_expand {
            for value in values {
                flags.push(Symbol::new(format!("{}_{}", variable, value)));
            }
        }
        flags
    }

    /// Load a profile from disk.
    pub fn load(path: &Path) -> Result<Profile> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read profile: {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("failed to parse profile: {}", path.display()))
    }

    /// Parse a profile from TOML text.
    ///
    /// The `[use]` table mixes global booleans with per-package
    /// sub-tables:
    ///
    /// ```toml
    /// [use]
    /// ssl = true
    ///
    /// [use.zlib]
    /// ssl = false
    ///
    /// [use_expand]
    /// video_cards = ["fbdev", "vesa"]
    /// ```
    pub fn parse(contents: &str) -> Result<Profile> {
        #[derive(Deserialize)]
        struct ProfileDoc {
            #[serde(default, rename = "use")]
            use_table: BTreeMap<String, toml::Value>,
            #[serde(default)]
            use_expand: BTreeMap<String, Vec<String>>,
        }

        let doc: ProfileDoc = toml::from_str(contents)?;
        let mut profile = Profile::empty();

        for (key, value) in &doc.use_table {
            match value {
                toml::Value::Boolean(enabled) => {
                    profile.set_global(key.as_str(), *enabled);
                }
                toml::Value::Table(flags) => {
                    for (flag, state) in flags {
                        let Some(enabled) = state.as_bool() else {
                            bail!(
                                "profile: [use.{}] {} must be a boolean, got {}",
                                key,
                                flag,
                                state.type_str()
                            );
                        };
                        profile.set_package(key.as_str(), flag.as_str(), enabled);
                    }
                }
                other => {
                    bail!(
                        "profile: [use] {} must be a boolean or a package table, got {}",
                        key,
                        other.type_str()
                    );
                }
            }
        }

        for (variable, values) in &doc.use_expand {
            profile.set_expand(variable.as_str(), values.iter().map(String::as_str));
        }

        Ok(profile)
    }

    /// Stable identity over all override layers, part of every
    /// memoization key.
    pub fn identity(&self) -> Identity {
        let mut hasher = IdentityHasher::new();
        hasher.write_str("profile");

        hasher.write_str("global");
        for (flag, enabled) in &self.global {
            hasher.write_pair(flag.as_str(), if *enabled { "1" } else { "0" });
        }

        hasher.write_str("per-package");
        for (package, flags) in &self.per_package {
            hasher.write_str(package.as_str());
            for (flag, enabled) in flags {
                hasher.write_pair(flag.as_str(), if *enabled { "1" } else { "0" });
            }
        }

        hasher.write_str("use-expand");
        for (variable, values) in &self.use_expand {
            hasher.write_str(variable.as_str());
            hasher.write_symbols(values.iter());
        }

        hasher.finish()
    }
}

/// Resolve the enabled-flag set for one package instance.
///
/// Layering: defaults, then USE_EXPAND expansion and global overrides,
/// then per-package overrides. A flag enabled by no layer is disabled.
/// Output is sorted; equal inputs yield byte-identical output.
pub fn resolve_flags(spec: &PackageSpec, profile: &Profile) -> BTreeSet<Symbol> {
    let declared: BTreeSet<Symbol> = spec.iuse().iter().copied().collect();
    let mut enabled: BTreeSet<Symbol> = BTreeSet::new();

    // Layer 1: package defaults.
    for &flag in spec.use_defaults() {
        if declared.contains(&flag) {
            enabled.insert(flag);
        } else {
            tracing::warn!(
                package = %spec.name(),
                flag = %flag,
                "default flag is not in iuse; ignored"
            );
        }
    }

    // Layer 2a: USE_EXPAND expansion, enable-only at the global layer.
    for flag in profile.expanded_flags() {
        if declared.contains(&flag) {
            enabled.insert(flag);
        }
    }

    // Layer 2b: global overrides.
    for (&flag, &state) in &profile.global {
        if !declared.contains(&flag) {
            tracing::debug!(
                package = %spec.name(),
                flag = %flag,
                "global override names a flag outside iuse; ignored"
            );
            continue;
        }
        if state {
            enabled.insert(flag);
        } else {
            enabled.remove(&flag);
        }
    }

    // Layer 3: per-package overrides win over everything above.
    if let Some(overrides) = profile.per_package.get(&spec.name()) {
        for (&flag, &state) in overrides {
            if !declared.contains(&flag) {
                tracing::debug!(
                    package = %spec.name(),
                    flag = %flag,
                    "per-package override names a flag outside iuse; ignored"
                );
                continue;
            }
            if state {
                enabled.insert(flag);
            } else {
                enabled.remove(&flag);
            }
        }
    }

    enabled
}

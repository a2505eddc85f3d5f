//! Package declarations - WHAT a package is and how it may vary.
//!
//! A PackageSpec is the immutable declaration of one package: its
//! build-rule kind, declared flag set, conditional dependency and
//! argument maps, and transform lists. Specs are defined once (usually
//! from a package.toml, see `core::manifest`) and never mutated; all
//! configuration-dependent variation happens in the resolver.

use std::collections::BTreeMap;
use std::fmt;

use semver::Version;
use serde::Serialize;

use crate::util::{Identity, IdentityHasher, Symbol};

/// The fixed set of build-rule kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildRule {
    /// Opaque script build, no feature switch syntax
    Simple,
    /// ./configure style
    Autotools,
    /// CMake cache definitions
    CMake,
    /// Meson feature options
    Meson,
    /// Cargo feature lists
    Cargo,
    /// Go build tags
    Go,
    /// Prebuilt binary, repackaged only
    Binary,
}

impl BuildRule {
    /// Parse the manifest spelling of a build rule.
    pub fn parse(s: &str) -> Option<BuildRule> {
        match s {
            "simple" => Some(BuildRule::Simple),
            "autotools" => Some(BuildRule::Autotools),
            "cmake" => Some(BuildRule::CMake),
            "meson" => Some(BuildRule::Meson),
            "cargo" => Some(BuildRule::Cargo),
            "go" => Some(BuildRule::Go),
            "binary" => Some(BuildRule::Binary),
            _ => None,
        }
    }

    /// The manifest spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildRule::Simple => "simple",
            BuildRule::Autotools => "autotools",
            BuildRule::CMake => "cmake",
            BuildRule::Meson => "meson",
            BuildRule::Cargo => "cargo",
            BuildRule::Go => "go",
            BuildRule::Binary => "binary",
        }
    }
}

impl fmt::Display for BuildRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies a package instance: name plus version.
///
/// Two declarations sharing a name but differing in version are fully
/// independent packages with independent source artifacts and edges.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PackageId {
    name: Symbol,
    version: Version,
}

impl PackageId {
    pub fn new(name: impl Into<Symbol>, version: Version) -> Self {
        PackageId {
            name: name.into(),
            version,
        }
    }

    pub fn name(&self) -> Symbol {
        self.name
    }

    pub fn version(&self) -> &Version {
        &self.version
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.version)
    }
}

/// Where a package's source artifact comes from.
///
/// The core never fetches anything; url and sha256 only shape identity
/// and completeness validation. `local_only` marks packages assembled
/// from files in the tree, which carry no upstream artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceArtifact {
    pub url: Option<String>,
    pub sha256: Option<String>,
    pub local_only: bool,
}

impl SourceArtifact {
    /// An upstream tarball source.
    pub fn remote(url: impl Into<String>, sha256: impl Into<String>) -> Self {
        SourceArtifact {
            url: Some(url.into()),
            sha256: Some(sha256.into()),
            local_only: false,
        }
    }

    /// A tree-local source with no upstream artifact.
    pub fn local() -> Self {
        SourceArtifact {
            url: None,
            sha256: None,
            local_only: true,
        }
    }

    /// Field names missing for a non-local source, in manifest order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        if self.local_only {
            return Vec::new();
        }
        let mut missing = Vec::new();
        if self.url.is_none() {
            missing.push("url");
        }
        if self.sha256.is_none() {
            missing.push("sha256");
        }
        missing
    }
}

/// A dependency request: the target package name, plus the optional
/// edge-scoped transition steering the edge into a different region of
/// configuration space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepRequest {
    pub name: Symbol,
    pub transition: Option<Symbol>,
}

impl DepRequest {
    pub fn new(name: impl Into<Symbol>) -> Self {
        DepRequest {
            name: name.into(),
            transition: None,
        }
    }

    pub fn with_transition(mut self, transition: impl Into<Symbol>) -> Self {
        self.transition = Some(transition.into());
        self
    }
}

/// Arguments contributed by one flag, split by polarity.
///
/// `when_enabled` entries fire when the flag is on, `when_disabled`
/// entries when it is off. The same argument string appearing on both
/// sides is a specification error, detected at resolution time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PolarArgs {
    pub when_enabled: Vec<String>,
    pub when_disabled: Vec<String>,
}

/// The immutable declaration of one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    id: PackageId,
    build: BuildRule,
    source: SourceArtifact,
    /// Declared flags, declaration order preserved.
    iuse: Vec<Symbol>,
    /// Flags enabled by default.
    use_defaults: Vec<Symbol>,
    /// Unconditional dependencies.
    static_deps: Vec<DepRequest>,
    /// Flag-conditional dependencies.
    use_deps: BTreeMap<Symbol, Vec<DepRequest>>,
    /// Flag-conditional arguments, by polarity.
    use_args: BTreeMap<Symbol, PolarArgs>,
    /// CMake-style fan-out: one flag driving several definition names.
    option_fanout: BTreeMap<Symbol, Vec<String>>,
    /// Always-applied transforms, in pipeline order.
    transforms: Vec<Symbol>,
    /// Flag-gated transforms, declaration order preserved.
    use_transforms: Vec<(Symbol, Symbol)>,
}

impl PackageSpec {
    /// Start a declaration. Builder methods fill in the variation maps.
    pub fn new(name: impl Into<Symbol>, version: Version, build: BuildRule) -> Self {
        PackageSpec {
            id: PackageId::new(name, version),
            build,
            source: SourceArtifact::local(),
            iuse: Vec::new(),
            use_defaults: Vec::new(),
            static_deps: Vec::new(),
            use_deps: BTreeMap::new(),
            use_args: BTreeMap::new(),
            option_fanout: BTreeMap::new(),
            transforms: Vec::new(),
            use_transforms: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: SourceArtifact) -> Self {
        self.source = source;
        self
    }

    pub fn with_iuse<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        self.iuse = flags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_defaults<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        self.use_defaults = flags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_static_dep(mut self, dep: DepRequest) -> Self {
        self.static_deps.push(dep);
        self
    }

    pub fn with_use_dep(mut self, flag: impl Into<Symbol>, dep: DepRequest) -> Self {
        self.use_deps.entry(flag.into()).or_default().push(dep);
        self
    }

    pub fn with_enabled_arg(mut self, flag: impl Into<Symbol>, arg: impl Into<String>) -> Self {
        self.use_args
            .entry(flag.into())
            .or_default()
            .when_enabled
            .push(arg.into());
        self
    }

    pub fn with_disabled_arg(mut self, flag: impl Into<Symbol>, arg: impl Into<String>) -> Self {
        self.use_args
            .entry(flag.into())
            .or_default()
            .when_disabled
            .push(arg.into());
        self
    }

    pub fn with_option_fanout<I, S>(mut self, flag: impl Into<Symbol>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.option_fanout
            .insert(flag.into(), options.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_transforms<I, S>(mut self, transforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        self.transforms = transforms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_use_transform(
        mut self,
        flag: impl Into<Symbol>,
        transform: impl Into<Symbol>,
    ) -> Self {
        self.use_transforms.push((flag.into(), transform.into()));
        self
    }

    pub fn id(&self) -> &PackageId {
        &self.id
    }

    pub fn name(&self) -> Symbol {
        self.id.name()
    }

    pub fn version(&self) -> &Version {
        self.id.version()
    }

    pub fn build(&self) -> BuildRule {
        self.build
    }

    pub fn source(&self) -> &SourceArtifact {
        &self.source
    }

    pub fn iuse(&self) -> &[Symbol] {
        &self.iuse
    }

    pub fn use_defaults(&self) -> &[Symbol] {
        &self.use_defaults
    }

    pub fn static_deps(&self) -> &[DepRequest] {
        &self.static_deps
    }

    pub fn use_deps(&self) -> &BTreeMap<Symbol, Vec<DepRequest>> {
        &self.use_deps
    }

    pub fn use_args(&self) -> &BTreeMap<Symbol, PolarArgs> {
        &self.use_args
    }

    pub fn option_fanout(&self) -> &BTreeMap<Symbol, Vec<String>> {
        &self.option_fanout
    }

    pub fn transforms(&self) -> &[Symbol] {
        &self.transforms
    }

    pub fn use_transforms(&self) -> &[(Symbol, Symbol)] {
        &self.use_transforms
    }

    /// Whether the flag is declared in iuse.
    pub fn declares_flag(&self, flag: Symbol) -> bool {
        self.iuse.contains(&flag)
    }

    /// Stable identity digest over the full declaration.
    ///
    /// Part of every memoization key: any change to the declaration
    /// produces a different resolved package, never an in-place update.
    pub fn identity(&self) -> Identity {
        let mut hasher = IdentityHasher::new();
        hasher.write_str("package-spec");
        hasher.write_pair("name", self.id.name().as_str());
        hasher.write_pair("version", &self.id.version().to_string());
        hasher.write_pair("build", self.build.as_str());
        hasher.write_opt(self.source.url.as_deref());
        hasher.write_opt(self.source.sha256.as_deref());
        hasher.write_pair("local_only", if self.source.local_only { "1" } else { "0" });

        hasher.write_str("iuse");
        hasher.write_symbols(self.iuse.iter());
        hasher.write_str("defaults");
        hasher.write_symbols(self.use_defaults.iter());

        hasher.write_str("static-deps");
        for dep in &self.static_deps {
            hasher.write_str(dep.name.as_str());
            hasher.write_opt(dep.transition.map(|t| t.as_str()));
        }

        hasher.write_str("use-deps");
        for (flag, deps) in &self.use_deps {
            hasher.write_str(flag.as_str());
            for dep in deps {
                hasher.write_str(dep.name.as_str());
                hasher.write_opt(dep.transition.map(|t| t.as_str()));
            }
        }

        hasher.write_str("use-args");
        for (flag, args) in &self.use_args {
            hasher.write_str(flag.as_str());
            for arg in &args.when_enabled {
                hasher.write_pair("+", arg);
            }
            for arg in &args.when_disabled {
                hasher.write_pair("-", arg);
            }
        }

        hasher.write_str("fanout");
        for (flag, options) in &self.option_fanout {
            hasher.write_str(flag.as_str());
            for option in options {
                hasher.write_str(option);
            }
        }

        hasher.write_str("transforms");
        hasher.write_symbols(self.transforms.iter());
        hasher.write_str("use-transforms");
        for (flag, transform) in &self.use_transforms {
            hasher.write_pair(flag.as_str(), transform.as_str());
        }

        hasher.finish()
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

//! Post-build transform chains.
//!
//! Every package owns one strictly linear pipeline from its raw build
//! output to the artifact published under its alias: always-applied
//! transforms first, then flag-gated ones in declaration order. Flags
//! decide whether a step is present, never which of several
//! alternatives runs. Transform names are opaque here - the execution
//! layer maps them to actions; this module only emits the chain
//! description.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::core::PackageSpec;
use crate::resolver::errors::{FlagRef, ResolveError};
use crate::util::Symbol;

/// Label of the raw build output, the input of the first step.
pub const RAW_OUTPUT: &str = "build";

/// One pipeline stage: consumes the previous stage's artifact and
/// produces one artifact, labeled by the step name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformStep {
    pub name: Symbol,
    pub input: Symbol,
    pub output: Symbol,
}

/// The composed pipeline of one package instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformChain {
    steps: Vec<TransformStep>,
    /// The artifact label the package's public alias points at.
    alias: Symbol,
}

impl TransformChain {
    /// The pipeline stages, in execution order.
    pub fn steps(&self) -> &[TransformStep] {
        &self.steps
    }

    /// The artifact label published under the package alias: the last
    /// step's output, or the raw build output for an empty chain.
    pub fn alias(&self) -> Symbol {
        self.alias
    }

    /// Number of transform stages (excluding the raw build output).
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Compose the transform chain for an enabled-flag set.
///
/// Always-applied transforms keep their declared order; flag-gated
/// transforms whose flag is enabled are appended after them, in the
/// order the gates were declared.
pub fn compose_chain(
    spec: &PackageSpec,
    enabled: &BTreeSet<Symbol>,
) -> Result<TransformChain, ResolveError> {
    let mut names: Vec<Symbol> = spec.transforms().to_vec();

    for &(flag, transform) in spec.use_transforms() {
        if !spec.declares_flag(flag) {
            return Err(ResolveError::UnknownFlag {
                package: spec.name().to_string(),
                flag: flag.to_string(),
                referenced_by: FlagRef::TransformMap,
            });
        }
        if enabled.contains(&flag) {
            names.push(transform);
        }
    }

    let mut steps = Vec::with_capacity(names.len());
    let mut previous = Symbol::new(RAW_OUTPUT);
    for name in names {
        steps.push(TransformStep {
            name,
            input: previous,
            output: name,
        });
        previous = name;
    }

    Ok(TransformChain {
        steps,
        alias: previous,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BuildRule;
    use semver::Version;

    fn zlib_spec() -> PackageSpec {
        PackageSpec::new("zlib", Version::new(1, 3, 1), BuildRule::Autotools)
            .with_iuse(["ima"])
            .with_transforms(["strip", "stamp"])
            .with_use_transform("ima", "sign")
    }

    fn enabled(flags: &[&str]) -> BTreeSet<Symbol> {
        flags.iter().map(Symbol::new).collect()
    }

    fn assert_linear(chain: &TransformChain) {
        let mut previous = Symbol::new(RAW_OUTPUT);
        for step in chain.steps() {
            assert_eq!(step.input, previous, "step {} breaks the chain", step.name);
            previous = step.output;
        }
        assert_eq!(chain.alias(), previous);
    }

    #[test]
    fn test_gated_transform_absent_when_flag_off() {
        let chain = compose_chain(&zlib_spec(), &enabled(&[])).unwrap();

        let names: Vec<&str> = chain.steps().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["strip", "stamp"]);
        assert_eq!(chain.alias().as_str(), "stamp");
        assert_linear(&chain);
    }

    #[test]
    fn test_gated_transform_appended_when_flag_on() {
        let chain = compose_chain(&zlib_spec(), &enabled(&["ima"])).unwrap();

        // build -> stripped -> stamped -> signed
        let names: Vec<&str> = chain.steps().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["strip", "stamp", "sign"]);
        assert_eq!(chain.steps()[0].input.as_str(), RAW_OUTPUT);
        assert_eq!(chain.alias().as_str(), "sign");
        assert_linear(&chain);
    }

    #[test]
    fn test_empty_chain_aliases_raw_output() {
        let spec = PackageSpec::new("baselayout", Version::new(2, 0, 0), BuildRule::Simple);
        let chain = compose_chain(&spec, &enabled(&[])).unwrap();

        assert!(chain.is_empty());
        assert_eq!(chain.alias().as_str(), RAW_OUTPUT);
    }

    #[test]
    fn test_only_optional_step_consumes_raw_output() {
        let spec = PackageSpec::new("keys", Version::new(1, 0, 0), BuildRule::Simple)
            .with_iuse(["ima"])
            .with_use_transform("ima", "sign");

        let chain = compose_chain(&spec, &enabled(&["ima"])).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.steps()[0].input.as_str(), RAW_OUTPUT);
        assert_eq!(chain.alias().as_str(), "sign");
    }

    #[test]
    fn test_multiple_gates_keep_declaration_order() {
        let spec = PackageSpec::new("busybox", Version::new(1, 36, 0), BuildRule::Simple)
            .with_iuse(["ima", "compress"])
            .with_transforms(["strip"])
            .with_use_transform("ima", "sign")
            .with_use_transform("compress", "zstd-pack");

        let chain = compose_chain(&spec, &enabled(&["compress", "ima"])).unwrap();
        let names: Vec<&str> = chain.steps().iter().map(|s| s.name.as_str()).collect();
        // Gate order follows declaration, not flag sort order.
        assert_eq!(names, vec!["strip", "sign", "zstd-pack"]);
        assert_linear(&chain);
    }

    #[test]
    fn test_gate_on_undeclared_flag_is_error() {
        let spec = PackageSpec::new("busybox", Version::new(1, 36, 0), BuildRule::Simple)
            .with_use_transform("ima", "sign");

        let err = compose_chain(&spec, &enabled(&[])).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::UnknownFlag {
                referenced_by: FlagRef::TransformMap,
                ..
            }
        ));
    }

    #[test]
    fn test_chain_serializes_for_execution_layer() {
        let chain = compose_chain(&zlib_spec(), &enabled(&["ima"])).unwrap();
        let json = serde_json::to_value(&chain).unwrap();

        assert_eq!(json["alias"], "sign");
        assert_eq!(json["steps"][0]["name"], "strip");
        assert_eq!(json["steps"][0]["input"], "build");
        assert_eq!(json["steps"][2]["output"], "sign");
    }
}

//! Flag-conditional dependency and argument selection.
//!
//! Given the enabled-flag set, the selector turns the declaration's
//! per-flag maps into concrete dependency edges and argument strings.
//! Four syntax adapters share the selection core and differ only in
//! how a flag is spelled for the target build tool.

use std::collections::BTreeSet;

use crate::core::{BuildRule, DepRequest, PackageSpec};
use crate::resolver::errors::{FlagRef, ResolveError};
use crate::util::Symbol;

/// Select the concrete dependency requests for an enabled-flag set.
///
/// Static dependencies are always included; each flag-conditional set
/// is included iff its flag is enabled. Negated selectors are argument
/// syntax only - a `-flag` key in a dependency map is a specification
/// error, not an ignorable entry.
pub fn select_dependencies(
    spec: &PackageSpec,
    enabled: &BTreeSet<Symbol>,
) -> Result<Vec<DepRequest>, ResolveError> {
    let mut deps: Vec<DepRequest> = spec.static_deps().to_vec();

    for (&flag, requests) in spec.use_deps() {
        if flag.as_str().starts_with('-') {
            return Err(ResolveError::NegatedDependency {
                package: spec.name().to_string(),
                key: flag.to_string(),
            });
        }
        if !spec.declares_flag(flag) {
            return Err(ResolveError::UnknownFlag {
                package: spec.name().to_string(),
                flag: flag.to_string(),
                referenced_by: FlagRef::DependencyMap,
            });
        }
        if enabled.contains(&flag) {
            deps.extend(requests.iter().cloned());
        }
    }

    Ok(deps)
}

/// Select the explicit per-flag arguments for an enabled-flag set.
///
/// Each flag contributes its `when_enabled` arguments when on and its
/// `when_disabled` arguments when off. The same argument string under
/// both polarities of one flag is ambiguous and rejected.
pub fn select_args(
    spec: &PackageSpec,
    enabled: &BTreeSet<Symbol>,
) -> Result<Vec<String>, ResolveError> {
    let mut args = Vec::new();

    for (&flag, polar) in spec.use_args() {
        if !spec.declares_flag(flag) {
            return Err(ResolveError::UnknownFlag {
                package: spec.name().to_string(),
                flag: flag.to_string(),
                referenced_by: FlagRef::ArgumentMap,
            });
        }

        if let Some(argument) = polar
            .when_enabled
            .iter()
            .find(|arg| polar.when_disabled.contains(*arg))
        {
            return Err(ResolveError::ConflictingArgument {
                package: spec.name().to_string(),
                flag: flag.to_string(),
                argument: argument.clone(),
            });
        }

        let side = if enabled.contains(&flag) {
            &polar.when_enabled
        } else {
            &polar.when_disabled
        };
        args.extend(side.iter().cloned());
    }

    Ok(args)
}

/// How a build tool spells a feature flag on its command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureSyntax {
    /// `--enable-ssl` / `--disable-ssl`
    Autoconf,
    /// `-DSSL=ON` / `-DSSL=OFF`, with optional fan-out
    CMake,
    /// `-Dssl=enabled` / `-Dssl=disabled`
    Meson,
    /// `--features a,b`, or `--no-default-features` when empty
    CargoFeatures,
    /// `-tags=a,b`, omitted when empty
    GoTags,
}

impl FeatureSyntax {
    /// The syntax a build rule speaks, if any. Simple and binary rules
    /// take no feature switches.
    pub fn for_build_rule(rule: BuildRule) -> Option<FeatureSyntax> {
        match rule {
            BuildRule::Autotools => Some(FeatureSyntax::Autoconf),
            BuildRule::CMake => Some(FeatureSyntax::CMake),
            BuildRule::Meson => Some(FeatureSyntax::Meson),
            BuildRule::Cargo => Some(FeatureSyntax::CargoFeatures),
            BuildRule::Go => Some(FeatureSyntax::GoTags),
            BuildRule::Simple | BuildRule::Binary => None,
        }
    }
}

/// Render the build-tool feature switches for every declared flag.
///
/// Pair-style syntaxes emit one switch per declared flag, in
/// declaration order; accumulating syntaxes join the enabled flags
/// into a single list argument.
pub fn feature_switches(
    spec: &PackageSpec,
    enabled: &BTreeSet<Symbol>,
) -> Result<Vec<String>, ResolveError> {
    // Fan-out entries are part of the declaration and validated even
    // for rules that never read them.
    for &flag in spec.option_fanout().keys() {
        if !spec.declares_flag(flag) {
            return Err(ResolveError::UnknownFlag {
                package: spec.name().to_string(),
                flag: flag.to_string(),
                referenced_by: FlagRef::FanoutMap,
            });
        }
    }

    let Some(syntax) = FeatureSyntax::for_build_rule(spec.build()) else {
        return Ok(Vec::new());
    };

    let mut switches = Vec::new();
    match syntax {
        FeatureSyntax::Autoconf => {
            for &flag in spec.iuse() {
                if enabled.contains(&flag) {
                    switches.push(format!("--enable-{}", flag));
                } else {
                    switches.push(format!("--disable-{}", flag));
                }
            }
        }
        FeatureSyntax::CMake => {
            for &flag in spec.iuse() {
                let state = if enabled.contains(&flag) { "ON" } else { "OFF" };
                match spec.option_fanout().get(&flag) {
                    Some(options) => {
                        for option in options {
                            switches.push(format!("-D{}={}", option, state));
                        }
                    }
                    None => {
                        switches.push(format!("-D{}={}", cmake_option_name(flag), state));
                    }
                }
            }
        }
        FeatureSyntax::Meson => {
            for &flag in spec.iuse() {
                let state = if enabled.contains(&flag) {
                    "enabled"
                } else {
                    "disabled"
                };
                switches.push(format!("-D{}={}", flag, state));
            }
        }
        FeatureSyntax::CargoFeatures => {
            let features: Vec<&str> = spec
                .iuse()
                .iter()
                .filter(|flag| enabled.contains(*flag))
                .map(|flag| flag.as_str())
                .collect();
            if features.is_empty() {
                switches.push("--no-default-features".to_string());
            } else {
                switches.push("--features".to_string());
                switches.push(features.join(","));
            }
        }
        FeatureSyntax::GoTags => {
            let tags: Vec<&str> = spec
                .iuse()
                .iter()
                .filter(|flag| enabled.contains(*flag))
                .map(|flag| flag.as_str())
                .collect();
            if !tags.is_empty() {
                switches.push(format!("-tags={}", tags.join(",")));
            }
        }
    }

    Ok(switches)
}

/// CMake cache variables are conventionally upper snake case.
fn cmake_option_name(flag: Symbol) -> String {
    flag.as_str().replace('-', "_").to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use semver::Version;

    fn spec(build: BuildRule) -> PackageSpec {
        PackageSpec::new("curl", Version::new(8, 9, 0), build)
    }

    fn enabled(flags: &[&str]) -> BTreeSet<Symbol> {
        flags.iter().map(Symbol::new).collect()
    }

    #[test]
    fn test_static_deps_always_selected() {
        let spec = spec(BuildRule::Autotools).with_static_dep(DepRequest::new("zlib"));
        let deps = select_dependencies(&spec, &enabled(&[])).unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name.as_str(), "zlib");
    }

    #[test]
    fn test_flag_gated_deps() {
        let spec = spec(BuildRule::Autotools)
            .with_iuse(["ssl"])
            .with_use_dep("ssl", DepRequest::new("openssl"));

        let with = select_dependencies(&spec, &enabled(&["ssl"])).unwrap();
        assert_eq!(with.len(), 1);

        let without = select_dependencies(&spec, &enabled(&[])).unwrap();
        assert!(without.is_empty());
    }

    #[test]
    fn test_dep_on_undeclared_flag_is_error() {
        let spec = spec(BuildRule::Autotools).with_use_dep("http3", DepRequest::new("quiche"));

        let err = select_dependencies(&spec, &enabled(&[])).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownFlag { .. }));
        assert!(err.to_string().contains("http3"));
    }

    #[test]
    fn test_negated_dep_key_is_error() {
        let spec = spec(BuildRule::Autotools)
            .with_iuse(["ssl"])
            .with_use_dep("-ssl", DepRequest::new("gnutls"));

        let err = select_dependencies(&spec, &enabled(&[])).unwrap_err();
        assert!(matches!(err, ResolveError::NegatedDependency { .. }));
    }

    #[test]
    fn test_polar_args_follow_flag_state() {
        let spec = spec(BuildRule::Autotools)
            .with_iuse(["ssl"])
            .with_enabled_arg("ssl", "--with-ssl")
            .with_disabled_arg("ssl", "--without-ssl");

        assert_eq!(
            select_args(&spec, &enabled(&["ssl"])).unwrap(),
            vec!["--with-ssl"]
        );
        assert_eq!(
            select_args(&spec, &enabled(&[])).unwrap(),
            vec!["--without-ssl"]
        );
    }

    #[test]
    fn test_conflicting_argument_detected() {
        let spec = spec(BuildRule::Autotools)
            .with_iuse(["ssl"])
            .with_enabled_arg("ssl", "--with-crypto")
            .with_disabled_arg("ssl", "--with-crypto");

        let err = select_args(&spec, &enabled(&["ssl"])).unwrap_err();
        match err {
            ResolveError::ConflictingArgument { flag, argument, .. } => {
                assert_eq!(flag, "ssl");
                assert_eq!(argument, "--with-crypto");
            }
            other => panic!("expected ConflictingArgument, got {other}"),
        }
    }

    #[test]
    fn test_arg_on_undeclared_flag_is_error() {
        let spec = spec(BuildRule::Autotools).with_enabled_arg("zstd", "--with-zstd");
        let err = select_args(&spec, &enabled(&[])).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownFlag { .. }));
    }

    #[test]
    fn test_autoconf_pairs() {
        let spec = spec(BuildRule::Autotools).with_iuse(["ssl", "ipv6"]);
        let switches = feature_switches(&spec, &enabled(&["ssl"])).unwrap();
        assert_eq!(switches, vec!["--enable-ssl", "--disable-ipv6"]);
    }

    #[test]
    fn test_cmake_on_off() {
        let spec = spec(BuildRule::CMake).with_iuse(["ssl", "zstd-support"]);
        let switches = feature_switches(&spec, &enabled(&["ssl"])).unwrap();
        assert_eq!(switches, vec!["-DSSL=ON", "-DZSTD_SUPPORT=OFF"]);
    }

    #[test]
    fn test_cmake_fanout() {
        let spec = spec(BuildRule::CMake)
            .with_iuse(["ssl"])
            .with_option_fanout("ssl", ["ENABLE_SSL", "USE_OPENSSL"]);

        let switches = feature_switches(&spec, &enabled(&["ssl"])).unwrap();
        assert_eq!(switches, vec!["-DENABLE_SSL=ON", "-DUSE_OPENSSL=ON"]);

        let switches = feature_switches(&spec, &enabled(&[])).unwrap();
        assert_eq!(switches, vec!["-DENABLE_SSL=OFF", "-DUSE_OPENSSL=OFF"]);
    }

    #[test]
    fn test_meson_enabled_disabled() {
        let spec = spec(BuildRule::Meson).with_iuse(["ssl"]);
        assert_eq!(
            feature_switches(&spec, &enabled(&["ssl"])).unwrap(),
            vec!["-Dssl=enabled"]
        );
        assert_eq!(
            feature_switches(&spec, &enabled(&[])).unwrap(),
            vec!["-Dssl=disabled"]
        );
    }

    #[test]
    fn test_cargo_feature_list() {
        let spec = spec(BuildRule::Cargo).with_iuse(["tls", "http2"]);
        assert_eq!(
            feature_switches(&spec, &enabled(&["tls", "http2"])).unwrap(),
            vec!["--features", "tls,http2"]
        );
    }

    #[test]
    fn test_cargo_empty_falls_back() {
        let spec = spec(BuildRule::Cargo).with_iuse(["tls"]);
        assert_eq!(
            feature_switches(&spec, &enabled(&[])).unwrap(),
            vec!["--no-default-features"]
        );
    }

    #[test]
    fn test_go_tags() {
        let spec = spec(BuildRule::Go).with_iuse(["netgo", "osusergo"]);
        assert_eq!(
            feature_switches(&spec, &enabled(&["netgo", "osusergo"])).unwrap(),
            vec!["-tags=netgo,osusergo"]
        );
        assert!(feature_switches(&spec, &enabled(&[])).unwrap().is_empty());
    }

    #[test]
    fn test_simple_rule_takes_no_switches() {
        let spec = spec(BuildRule::Simple).with_iuse(["ssl"]);
        assert!(feature_switches(&spec, &enabled(&["ssl"])).unwrap().is_empty());
    }

    #[test]
    fn test_fanout_on_undeclared_flag_is_error() {
        let spec = spec(BuildRule::CMake).with_option_fanout("ssl", ["ENABLE_SSL"]);
        let err = feature_switches(&spec, &enabled(&[])).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::UnknownFlag {
                referenced_by: FlagRef::FanoutMap,
                ..
            }
        ));
    }
}

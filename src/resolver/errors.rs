//! Resolution error types and diagnostics.
//!
//! Every error here is a local validation failure: resolution either
//! produces a complete ResolvedPackage or one of these, never a partial
//! result. Nothing is retried because resolution is pure.

use thiserror::Error;

use crate::core::AxisCollision;
use crate::transition::UnknownTransition;
use crate::util::diagnostic::Diagnostic;

/// Which declaration map referenced a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagRef {
    DependencyMap,
    ArgumentMap,
    FanoutMap,
    TransformMap,
}

impl FlagRef {
    fn describe(&self) -> &'static str {
        match self {
            FlagRef::DependencyMap => "dependency map",
            FlagRef::ArgumentMap => "argument map",
            FlagRef::FanoutMap => "option fan-out map",
            FlagRef::TransformMap => "transform map",
        }
    }
}

/// Error during package resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("package `{package}`: flag `{flag}` is not in iuse")]
    UnknownFlag {
        package: String,
        flag: String,
        referenced_by: FlagRef,
    },

    #[error("package `{package}`: argument `{argument}` claimed by both `{flag}` and `-{flag}`")]
    ConflictingArgument {
        package: String,
        flag: String,
        argument: String,
    },

    #[error("package `{package}`: dependency map key `{key}` is negated")]
    NegatedDependency { package: String, key: String },

    #[error(transparent)]
    UnknownTransition(#[from] UnknownTransition),

    #[error(transparent)]
    AxisCollision(#[from] AxisCollision),
}

impl ResolveError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::UnknownFlag {
                package,
                flag,
                referenced_by,
            } => Diagnostic::error(format!(
                "package `{}` references undeclared flag `{}`",
                package, flag
            ))
            .with_context(format!("referenced by its {}", referenced_by.describe()))
            .with_suggestion(format!(
                "Add `{}` to iuse in the declaration of `{}`",
                flag, package
            ))
            .with_suggestion(format!("Or remove the `{}` entry from the map", flag)),

            ResolveError::ConflictingArgument {
                package,
                flag,
                argument,
            } => Diagnostic::error(format!(
                "conflicting argument mapping in `{}`",
                package
            ))
            .with_context(format!(
                "`{}` is produced both when `{}` is enabled and when it is disabled",
                argument, flag
            ))
            .with_suggestion(
                "Keep the argument under exactly one polarity of the flag".to_string(),
            ),

            ResolveError::NegatedDependency { package, key } => Diagnostic::error(format!(
                "negated dependency selector `{}` in `{}`",
                key, package
            ))
            .with_context("negated selectors are only valid for argument maps".to_string())
            .with_suggestion(format!(
                "Declare the dependency under the positive flag, or drop `{}`",
                key
            )),

            ResolveError::UnknownTransition(err) => {
                Diagnostic::error(format!("unknown transition `{}`", err.name))
                    .with_suggestion(
                        "Register the transition, or use one of: default, bootstrap, \
                         stage3, strip_mode"
                            .to_string(),
                    )
            }

            ResolveError::AxisCollision(err) => Diagnostic::error(format!(
                "axis `{}` assigned two values in one batch",
                err.axis
            ))
            .with_context(format!("first `{}`, then `{}`", err.first, err.second))
            .with_suggestion(
                "Split the batch, or drop one assignment; batches have no override order"
                    .to_string(),
            ),
        }
    }
}

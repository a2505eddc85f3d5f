//! Transitions - pure remappings of configuration space.
//!
//! A transition maps one configuration to another. It is the only
//! mechanism for moving work between regions of configuration space:
//! globally (replacing a target's effective configuration) or
//! edge-scoped (replacing the configuration along one dependency edge
//! while the dependent keeps its own). Transitions are a closed set of
//! two primitives - set an axis to a fixed value, or remove an axis -
//! registered by name, so the engine stays enumerable and statically
//! checkable. A transition never reads external mutable state; equal
//! inputs always yield equal outputs, which is what makes the memo
//! cache and the dedup path sound.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::core::{Configuration, ConstraintAxis, ConstraintValue};
use crate::util::Symbol;

/// The bootstrap axis: which toolchain stage a target is built in.
pub const BOOTSTRAP_AXIS: &str = "bootstrap";

/// Host escape hatch: build with the host's own tools.
pub const STAGE_HOST: &str = "host";
/// Seed stage: the baseline configuration, hermetic prebuilt or
/// from-source stage 1.
pub const STAGE_SEED: &str = "seed";
/// Hermetic stage 2, built by seed-stage tools.
pub const STAGE_STAGE2: &str = "stage2";
/// Stage 3 rebuild, built by stage 2's own output.
pub const STAGE_STAGE3: &str = "stage3";

/// The bootstrap axis handle.
pub fn bootstrap_axis() -> ConstraintAxis {
    ConstraintAxis::new(BOOTSTRAP_AXIS)
}

/// What a transition does to a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// Set one axis to a fixed value, overwriting any prior value.
    SetValue(ConstraintValue),
    /// Remove one axis entirely. Ignores the prior value, which is what
    /// collapses configurations differing only on that axis to one
    /// identity (the dedup contract).
    RemoveAxis(ConstraintAxis),
}

/// A named, registered transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    name: Symbol,
    kind: TransitionKind,
}

impl Transition {
    pub fn name(&self) -> Symbol {
        self.name
    }

    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    /// Apply to a configuration. Pure: never fails, never mutates.
    pub fn apply(&self, config: &Configuration) -> Configuration {
        match self.kind {
            TransitionKind::SetValue(value) => config.with_value(value),
            TransitionKind::RemoveAxis(axis) => config.without_axis(axis),
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TransitionKind::SetValue(value) => write!(f, "{}: set {}", self.name, value),
            TransitionKind::RemoveAxis(axis) => write!(f, "{}: remove {}", self.name, axis),
        }
    }
}

/// Applying a transition name nobody registered.
#[derive(Debug, Clone, Error)]
#[error("unknown transition `{name}`")]
pub struct UnknownTransition {
    pub name: String,
}

/// The fixed table of registered transitions, dispatched by name.
#[derive(Debug, Clone, Default)]
pub struct TransitionRegistry {
    entries: BTreeMap<Symbol, Transition>,
}

impl TransitionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        TransitionRegistry::default()
    }

    /// The built-in registry used by the bootstrap stage graph:
    ///
    /// - `default`: pin to the seed stage. Forces a dependency edge to
    ///   resolve in the baseline configuration even when the consumer
    ///   is evaluated elsewhere, breaking the stage-N-needs-stage-N-1
    ///   cycle by configuration equality.
    /// - `bootstrap`: steer an edge into the host escape hatch.
    /// - `stage3`: steer an edge into the stage 3 rebuild.
    /// - `strip_mode`: the dedup transition. Removes the bootstrap axis
    ///   so targets whose output does not depend on it (source
    ///   extraction, kernel config parsing) collapse to one node no
    ///   matter how many configuration paths reach them.
    pub fn builtin() -> Self {
        let axis = bootstrap_axis();
        let mut registry = TransitionRegistry::new();
        registry.register_set("default", ConstraintValue::new(axis, STAGE_SEED));
        registry.register_set("bootstrap", ConstraintValue::new(axis, STAGE_HOST));
        registry.register_set("stage3", ConstraintValue::new(axis, STAGE_STAGE3));
        registry.register_remove("strip_mode", axis);
        registry
    }

    /// Register a set-axis-to-value transition.
    pub fn register_set(&mut self, name: impl Into<Symbol>, value: ConstraintValue) {
        let name = name.into();
        self.entries.insert(
            name,
            Transition {
                name,
                kind: TransitionKind::SetValue(value),
            },
        );
    }

    /// Register a remove-axis transition.
    pub fn register_remove(&mut self, name: impl Into<Symbol>, axis: ConstraintAxis) {
        let name = name.into();
        self.entries.insert(
            name,
            Transition {
                name,
                kind: TransitionKind::RemoveAxis(axis),
            },
        );
    }

    /// Look up a transition by name.
    pub fn get(&self, name: &str) -> Option<&Transition> {
        self.entries.get(name)
    }

    /// Apply a named transition to a configuration.
    pub fn apply(
        &self,
        name: &str,
        config: &Configuration,
    ) -> Result<Configuration, UnknownTransition> {
        let transition = self.get(name).ok_or_else(|| UnknownTransition {
            name: name.to_string(),
        })?;
        Ok(transition.apply(config))
    }

    /// Iterate registered transitions in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_config() -> Configuration {
        Configuration::empty().with_value(ConstraintValue::new(bootstrap_axis(), STAGE_SEED))
    }

    #[test]
    fn test_default_pins_seed() {
        let registry = TransitionRegistry::builtin();
        let stage2 =
            Configuration::empty().with_value(ConstraintValue::new(bootstrap_axis(), STAGE_STAGE2));

        let pinned = registry.apply("default", &stage2).unwrap();
        assert_eq!(pinned.identity(), seed_config().identity());
    }

    #[test]
    fn test_transitions_overwrite_regardless_of_origin() {
        let registry = TransitionRegistry::builtin();
        for start in [STAGE_HOST, STAGE_SEED, STAGE_STAGE2, STAGE_STAGE3] {
            let config = Configuration::empty()
                .with_value(ConstraintValue::new(bootstrap_axis(), start));
            let moved = registry.apply("stage3", &config).unwrap();
            assert_eq!(
                moved.get(bootstrap_axis()).unwrap().value().as_str(),
                STAGE_STAGE3
            );
        }
    }

    #[test]
    fn test_strip_mode_collapses_identities() {
        let registry = TransitionRegistry::builtin();
        let arch = ConstraintAxis::new("arch");

        // N configurations differing only in the bootstrap axis value.
        let incoming: Vec<Configuration> = [STAGE_HOST, STAGE_SEED, STAGE_STAGE2, STAGE_STAGE3]
            .iter()
            .map(|stage| {
                Configuration::empty()
                    .with_value(ConstraintValue::new(arch, "x86_64"))
                    .with_value(ConstraintValue::new(bootstrap_axis(), *stage))
            })
            .collect();

        let outputs: std::collections::BTreeSet<_> = incoming
            .iter()
            .map(|c| registry.apply("strip_mode", c).unwrap().identity())
            .collect();

        assert_eq!(outputs.len(), 1);
    }

    #[test]
    fn test_strip_mode_preserves_other_axes() {
        let registry = TransitionRegistry::builtin();
        let arch = ConstraintAxis::new("arch");
        let config = Configuration::empty()
            .with_value(ConstraintValue::new(arch, "aarch64"))
            .with_value(ConstraintValue::new(bootstrap_axis(), STAGE_SEED));

        let stripped = registry.apply("strip_mode", &config).unwrap();
        assert!(!stripped.contains_axis(bootstrap_axis()));
        assert_eq!(stripped.get(arch).unwrap().value().as_str(), "aarch64");
    }

    #[test]
    fn test_referential_transparency() {
        let registry = TransitionRegistry::builtin();
        let config = seed_config();

        let once = registry.apply("bootstrap", &config).unwrap();
        let twice = registry.apply("bootstrap", &config).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.identity(), twice.identity());
    }

    #[test]
    fn test_unknown_transition_is_an_error() {
        let registry = TransitionRegistry::builtin();
        let err = registry.apply("warp", &Configuration::empty()).unwrap_err();
        assert_eq!(err.name, "warp");
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = TransitionRegistry::builtin();
        let arch = ConstraintAxis::new("arch");
        registry.register_set("cross-arm", ConstraintValue::new(arch, "aarch64"));

        let moved = registry.apply("cross-arm", &Configuration::empty()).unwrap();
        assert_eq!(moved.get(arch).unwrap().value().as_str(), "aarch64");
    }
}

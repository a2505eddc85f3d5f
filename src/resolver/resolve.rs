//! The resolution entry point.
//!
//! `resolve` turns (PackageSpec, Configuration, Profile) into an
//! immutable ResolvedPackage snapshot: enabled flags, concrete
//! dependency edges, the argument list, and the transform chain.
//! Resolution is pure, so results are memoized by the identities of
//! the three inputs; concurrent requests for one key may race to
//! compute but converge to identical results, making last-write-wins
//! caching safe.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use rayon::prelude::*;
use serde::Serialize;

use crate::core::{Configuration, PackageId, PackageSpec};
use crate::resolver::errors::ResolveError;
use crate::resolver::flags::{resolve_flags, Profile};
use crate::resolver::select::{feature_switches, select_args, select_dependencies};
use crate::transform::{compose_chain, TransformChain};
use crate::transition::TransitionRegistry;
use crate::util::{Identity, IdentityHasher, Symbol};

/// A concrete dependency edge of one resolved package instance.
///
/// The edge carries the configuration the dependency resolves under:
/// the consumer's own, unless the declaration steered the edge through
/// a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEdge {
    /// Target package name.
    pub package: Symbol,
    /// The edge-scoped transition applied, if any.
    pub transition: Option<Symbol>,
    /// The configuration the target resolves under.
    pub configuration: Configuration,
    /// Identity of (target, configuration) - equal edges are the same
    /// node in the configuration graph, however they were reached.
    pub identity: Identity,
}

impl DependencyEdge {
    /// The identity any (package, configuration) pair maps to.
    pub fn identity_for(package: Symbol, configuration: &Configuration) -> Identity {
        let mut hasher = IdentityHasher::new();
        hasher.write_str("dependency-edge");
        hasher.write_pair(package.as_str(), configuration.identity().as_str());
        hasher.finish()
    }
}

/// An immutable snapshot of one (spec, configuration, profile)
/// evaluation. Never mutated after creation; any change in inputs
/// produces a new snapshot under a new identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPackage {
    pub id: PackageId,
    pub configuration: Configuration,
    /// Enabled flags, sorted.
    pub enabled: Vec<Symbol>,
    /// Concrete dependency edges.
    pub edges: Vec<DependencyEdge>,
    /// Concrete argument list: feature switches, then explicit
    /// flag-mapped arguments.
    pub args: Vec<String>,
    /// The post-build pipeline description for the execution layer.
    pub chain: TransformChain,
    /// Identity over all of the above.
    pub identity: Identity,
}

type CacheKey = (Identity, Identity, Identity);

/// The resolver: a transition registry plus the memo cache.
///
/// Shared by reference across threads; the cache is the only interior
/// state and tolerates races by construction.
pub struct Resolver {
    registry: TransitionRegistry,
    cache: RwLock<HashMap<CacheKey, Arc<ResolvedPackage>>>,
}

impl Resolver {
    /// A resolver with the given transition registry.
    pub fn new(registry: TransitionRegistry) -> Self {
        Resolver {
            registry,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// A resolver with the built-in bootstrap transitions.
    pub fn with_builtin_transitions() -> Self {
        Resolver::new(TransitionRegistry::builtin())
    }

    pub fn registry(&self) -> &TransitionRegistry {
        &self.registry
    }

    /// Number of memoized snapshots.
    pub fn cached(&self) -> usize {
        self.cache.read().unwrap().len()
    }

    /// Resolve one package instance.
    ///
    /// Deterministic: equal inputs yield equal snapshots. Fails only on
    /// a detected specification error, with no partial result cached.
    pub fn resolve(
        &self,
        spec: &PackageSpec,
        configuration: &Configuration,
        profile: &Profile,
    ) -> Result<Arc<ResolvedPackage>, ResolveError> {
        let key = (
            spec.identity(),
            configuration.identity(),
            profile.identity(),
        );

        if let Some(hit) = self.cache.read().unwrap().get(&key) {
            tracing::debug!(package = %spec.id(), config = %configuration, "resolve cache hit");
            return Ok(Arc::clone(hit));
        }

        let resolved = Arc::new(self.compute(spec, configuration, profile)?);
        tracing::debug!(
            package = %spec.id(),
            config = %configuration,
            identity = resolved.identity.short(),
            "resolved"
        );

        self.cache
            .write()
            .unwrap()
            .insert(key, Arc::clone(&resolved));
        Ok(resolved)
    }

    /// Resolve many independent (spec, configuration) pairs in
    /// parallel. Resolution is side-effect-free, so no coordination is
    /// needed beyond the cache's own locking.
    pub fn resolve_many(
        &self,
        requests: &[(&PackageSpec, Configuration)],
        profile: &Profile,
    ) -> Result<Vec<Arc<ResolvedPackage>>, ResolveError> {
        requests
            .par_iter()
            .map(|(spec, configuration)| self.resolve(spec, configuration, profile))
            .collect()
    }

    fn compute(
        &self,
        spec: &PackageSpec,
        configuration: &Configuration,
        profile: &Profile,
    ) -> Result<ResolvedPackage, ResolveError> {
        let enabled: BTreeSet<Symbol> = resolve_flags(spec, profile);

        let mut edges = Vec::new();
        for dep in select_dependencies(spec, &enabled)? {
            let edge_config = match dep.transition {
                Some(transition) => self.registry.apply(transition.as_str(), configuration)?,
                None => configuration.clone(),
            };
            let identity = DependencyEdge::identity_for(dep.name, &edge_config);
            edges.push(DependencyEdge {
                package: dep.name,
                transition: dep.transition,
                configuration: edge_config,
                identity,
            });
        }

        let mut args = feature_switches(spec, &enabled)?;
        args.extend(select_args(spec, &enabled)?);

        let chain = compose_chain(spec, &enabled)?;

        let enabled: Vec<Symbol> = enabled.into_iter().collect();
        let identity = snapshot_identity(spec, configuration, &enabled, &edges, &args, &chain);

        Ok(ResolvedPackage {
            id: spec.id().clone(),
            configuration: configuration.clone(),
            enabled,
            edges,
            args,
            chain,
            identity,
        })
    }
}

fn snapshot_identity(
    spec: &PackageSpec,
    configuration: &Configuration,
    enabled: &[Symbol],
    edges: &[DependencyEdge],
    args: &[String],
    chain: &TransformChain,
) -> Identity {
    let mut hasher = IdentityHasher::new();
    hasher.write_str("resolved-package");
    hasher.write_str(spec.identity().as_str());
    hasher.write_str(configuration.identity().as_str());
    hasher.write_str("enabled");
    hasher.write_symbols(enabled.iter());
    hasher.write_str("edges");
    for edge in edges {
        hasher.write_str(edge.identity.as_str());
    }
    hasher.write_str("args");
    for arg in args {
        hasher.write_str(arg);
    }
    hasher.write_str("chain");
    for step in chain.steps() {
        hasher.write_pair(step.name.as_str(), step.input.as_str());
    }
    hasher.write_str(chain.alias().as_str());
    hasher.finish()
}

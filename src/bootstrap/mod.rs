//! The bootstrap stage graph.
//!
//! Building a self-hosting toolchain wants the toolchain to already
//! exist. The stage graph sequences that knot: a seed stage (hermetic
//! prebuilt or from-source) or a host escape hatch supplies the first
//! tools, hermetic stage 2 is built by seed-stage tools, and the
//! stage 3 rebuild uses stage 2's own output as compiler. The cycle
//! between "the tool used to build the toolchain" and "the toolchain"
//! is broken by transitions, not by special-casing any edge: stage 2's
//! host-tool dependency is pinned to the baseline configuration via
//! `default`, so it is the same graph node as a direct seed-stage
//! resolution.

use std::fmt;

use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;

use crate::core::{Configuration, ConstraintValue};
use crate::transition::{
    bootstrap_axis, TransitionRegistry, UnknownTransition, STAGE_HOST, STAGE_SEED, STAGE_STAGE2,
    STAGE_STAGE3,
};
use crate::util::Symbol;

/// One phase of building the self-hosting toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BootstrapStage {
    /// Build with the host's own tools. Alternate initial stage; never
    /// combined with Seed in one build.
    HostEscape,
    /// The baseline stage, and the default configuration.
    Seed,
    /// Hermetic stage built by seed-stage tools.
    Stage2,
    /// Fully hermetic rebuild using stage 2's output as compiler.
    Stage3,
}

impl BootstrapStage {
    /// All stages, in build order.
    pub fn all() -> [BootstrapStage; 4] {
        [
            BootstrapStage::HostEscape,
            BootstrapStage::Seed,
            BootstrapStage::Stage2,
            BootstrapStage::Stage3,
        ]
    }

    /// The bootstrap-axis value marking this stage.
    pub fn axis_value(&self) -> &'static str {
        match self {
            BootstrapStage::HostEscape => STAGE_HOST,
            BootstrapStage::Seed => STAGE_SEED,
            BootstrapStage::Stage2 => STAGE_STAGE2,
            BootstrapStage::Stage3 => STAGE_STAGE3,
        }
    }

    /// The configuration packages of this stage are evaluated under,
    /// derived from a base configuration (target arch and the like).
    pub fn configuration(&self, base: &Configuration) -> Configuration {
        base.with_value(ConstraintValue::new(bootstrap_axis(), self.axis_value()))
    }

    /// Whether this stage can start a bootstrap.
    pub fn is_initial(&self) -> bool {
        matches!(self, BootstrapStage::HostEscape | BootstrapStage::Seed)
    }
}

impl fmt::Display for BootstrapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.axis_value())
    }
}

/// Pick the initial stage for a build. The escape hatch and the seed
/// are alternatives, never combined.
pub fn initial_stage(use_host_tools: bool) -> BootstrapStage {
    if use_host_tools {
        BootstrapStage::HostEscape
    } else {
        BootstrapStage::Seed
    }
}

/// The stage graph: nodes are stages, edges are reachability labeled
/// with the transition applied to the successor's host-tool dependency
/// edge.
pub struct StageGraph {
    graph: DiGraph<BootstrapStage, Symbol>,
    registry: TransitionRegistry,
}

impl StageGraph {
    /// Build the stage graph over a transition registry.
    ///
    /// Seed reaches Stage2 with the host-tool edge pinned via
    /// `default`; Stage2 reaches Stage3 via `stage3`. The escape hatch
    /// is a root with no outgoing reachability - its output can seed a
    /// future bootstrap, but that re-trigger is external to this core.
    pub fn new(registry: TransitionRegistry) -> Self {
        let mut graph = DiGraph::new();
        graph.add_node(BootstrapStage::HostEscape);
        let seed = graph.add_node(BootstrapStage::Seed);
        let stage2 = graph.add_node(BootstrapStage::Stage2);
        let stage3 = graph.add_node(BootstrapStage::Stage3);

        graph.add_edge(seed, stage2, Symbol::new("default"));
        graph.add_edge(stage2, stage3, Symbol::new("stage3"));

        StageGraph { graph, registry }
    }

    /// The stage graph over the built-in transitions.
    pub fn builtin() -> Self {
        StageGraph::new(TransitionRegistry::builtin())
    }

    pub fn registry(&self) -> &TransitionRegistry {
        &self.registry
    }

    fn node(&self, stage: BootstrapStage) -> NodeIndex {
        self.graph
            .node_indices()
            .find(|&idx| self.graph[idx] == stage)
            .expect("every stage has a node")
    }

    /// The stage this one is reachable from, with the transition
    /// applied to its host-tool dependency edge. Initial stages have
    /// none.
    pub fn predecessor(&self, stage: BootstrapStage) -> Option<(BootstrapStage, Symbol)> {
        let node = self.node(stage);
        self.graph
            .edges_directed(node, petgraph::Direction::Incoming)
            .map(|edge| (self.graph[edge.source()], *edge.weight()))
            .next()
    }

    /// The transition on this stage's host-tool dependency edge.
    pub fn host_tool_transition(&self, stage: BootstrapStage) -> Option<Symbol> {
        self.predecessor(stage).map(|(_, transition)| transition)
    }

    /// The configuration this stage's host-tool dependency resolves
    /// under: the stage's own configuration remapped by the edge
    /// transition. Initial stages supply their own tools and have none.
    pub fn host_tool_configuration(
        &self,
        stage: BootstrapStage,
        base: &Configuration,
    ) -> Result<Option<Configuration>, UnknownTransition> {
        let Some(transition) = self.host_tool_transition(stage) else {
            return Ok(None);
        };
        let own = stage.configuration(base);
        Ok(Some(self.registry.apply(transition.as_str(), &own)?))
    }

    /// Stages in dependency order (suppliers before consumers).
    pub fn build_order(&self) -> Vec<BootstrapStage> {
        toposort(&self.graph, None)
            .expect("stage graph is acyclic")
            .into_iter()
            .map(|idx| self.graph[idx])
            .collect()
    }

    /// The graph must stay acyclic; the whole point of the transitions
    /// is that no stage's host tools depend on that stage's own output.
    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_directed(&self.graph)
    }
}

impl Default for StageGraph {
    fn default() -> Self {
        StageGraph::builtin()
    }
}

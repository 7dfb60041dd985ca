/*
 * Path Explorer
 *
 * Worklist-driven symbolic execution over a function CFG.
 *
 * # Algorithm
 * 1. Validate the CFG structurally; malformed input never reaches the
 *    worklist.
 * 2. Seed the worklist with (entry, initial state): no bindings, no facts.
 * 3. Pop a (node, state) pair; apply the node's effects in order, driving
 *    machine transitions and collecting diagnostics from the bad-outcome
 *    tables.
 * 4. For each outgoing edge, ask the feasibility check; clone the state for
 *    each feasible successor (copy-on-fork), record the guard's fact, apply
 *    coupled assumption transitions, and push.
 * 5. A Return effect or a block with no successors finalizes the path:
 *    every tracked value must sit in an exit state, anything else leaks.
 *
 * # Termination & explosion control
 * Bounded symbolic execution, not model checking: a path budget caps the
 * number of forked paths and a step budget caps nodes per path. Exceeding
 * either truncates that branch and downgrades coverage to Incomplete -
 * truncated work is never silently reported as proven safe. Successor
 * states already seen at a join point (same bindings, machine states and
 * facts) are merged by deduplication.
 *
 * # Determinism
 * The worklist is FIFO, edges are taken in declaration order, and the final
 * diagnostic list is sorted and deduplicated, so identical inputs and
 * budgets always produce identical outcomes.
 */

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, trace, warn};

use super::feasibility::{apply_guard, edge_feasibility};
use crate::errors::Result;
use crate::features::path_explorer::domain::{PathState, TrackedValue};
use crate::features::path_explorer::infrastructure::validation;
use crate::features::state_machine::domain::{
    Action, Diagnostic, DiagnosticKind, MachineRegistry, StateMachine,
};
use crate::features::state_machine::ports::MachineDefinition;
use crate::shared::models::{AssignValue, CfgNode, Effect, EffectSite, FunctionCfg, NodeId};

/// Exploration budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Maximum number of paths (initial path plus forks)
    pub max_paths: usize,

    /// Maximum nodes visited along a single path
    pub max_steps_per_path: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            max_paths: 1024,
            max_steps_per_path: 4096,
        }
    }
}

/// How much of the path space the explorer covered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Coverage {
    /// Every feasible path was finalized
    Complete,

    /// Budgets truncated exploration; absence of diagnostics proves nothing
    Incomplete { truncated_paths: usize },
}

impl Coverage {
    /// True when every feasible path was finalized
    pub fn is_complete(&self) -> bool {
        matches!(self, Coverage::Complete)
    }
}

/// Exploration statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplorationStats {
    /// Paths finalized at a terminal block or Return
    pub explored_paths: usize,

    /// Guarded edges pruned as infeasible
    pub pruned_edges: usize,

    /// Successor states deduplicated at join points
    pub merged_paths: usize,

    /// Analysis time (milliseconds)
    pub analysis_time_ms: u64,
}

/// Result of analyzing one function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    /// Analyzed function name
    pub function: String,

    /// Defects found on feasible paths, sorted and deduplicated
    pub diagnostics: Vec<Diagnostic>,

    /// Whether the path space was fully covered
    pub coverage: Coverage,

    /// Statistics
    pub stats: ExplorationStats,
}

impl AnalysisOutcome {
    /// True when no defects were found AND coverage is complete
    ///
    /// An incomplete run with no diagnostics is not clean: unexplored paths
    /// are unproven, not safe.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty() && self.coverage.is_complete()
    }

    /// Serialize for a test report
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::errors::EngineError::Analysis(e.to_string()))
    }
}

/// Path-sensitive lifecycle explorer
///
/// Owns an immutable machine registry and the exploration budgets;
/// `explore` may be called any number of times and never mutates the CFG.
pub struct PathExplorer {
    registry: MachineRegistry,
    config: ExplorerConfig,
}

impl PathExplorer {
    /// Create explorer over a machine registry
    pub fn new(registry: MachineRegistry) -> Self {
        Self {
            registry,
            config: ExplorerConfig::default(),
        }
    }

    /// Set exploration budgets
    pub fn with_config(mut self, config: ExplorerConfig) -> Self {
        self.config = config;
        self
    }

    /// Register an additional machine definition
    pub fn with_definition<D: MachineDefinition>(mut self) -> Self {
        self.registry.register(D::define());
        self
    }

    /// Registered machines
    pub fn registry(&self) -> &MachineRegistry {
        &self.registry
    }

    /// Explore every feasible path of one function
    pub fn explore(&self, cfg: &FunctionCfg) -> Result<AnalysisOutcome> {
        validation::validate(cfg)?;
        self.registry
            .validate()
            .map_err(crate::errors::EngineError::Config)?;

        let start_time = std::time::Instant::now();
        debug!(function = %cfg.name, nodes = cfg.node_count(), "starting path exploration");

        let mut run = ExplorationRun {
            cfg,
            registry: &self.registry,
            config: &self.config,
            worklist: VecDeque::new(),
            seen: FxHashMap::default(),
            diagnostics: Vec::new(),
            stats: ExplorationStats::default(),
            path_count: 1,
            truncated_paths: 0,
        };
        run.worklist.push_back((cfg.entry.clone(), PathState::new()));

        while let Some((node_id, state)) = run.worklist.pop_front() {
            run.step(&node_id, state);
        }

        let mut diagnostics = run.diagnostics;
        diagnostics.sort();
        diagnostics.dedup_by_key(|d| {
            (
                d.machine.clone(),
                d.variable.clone(),
                d.kind,
                d.state_at_error.clone(),
                d.site.clone(),
            )
        });

        let coverage = if run.truncated_paths == 0 {
            Coverage::Complete
        } else {
            warn!(
                function = %cfg.name,
                truncated = run.truncated_paths,
                "exploration budgets exhausted; coverage incomplete"
            );
            Coverage::Incomplete {
                truncated_paths: run.truncated_paths,
            }
        };

        let mut stats = run.stats;
        stats.analysis_time_ms = start_time.elapsed().as_millis() as u64;

        debug!(
            function = %cfg.name,
            paths = stats.explored_paths,
            pruned = stats.pruned_edges,
            diagnostics = diagnostics.len(),
            "path exploration finished"
        );

        Ok(AnalysisOutcome {
            function: cfg.name.clone(),
            diagnostics,
            coverage,
            stats,
        })
    }

    /// Explore several functions, in parallel when the `parallel` feature
    /// is enabled
    ///
    /// Outcomes keep the input order, so results stay deterministic either
    /// way.
    #[cfg(feature = "parallel")]
    pub fn explore_all(&self, cfgs: &[FunctionCfg]) -> Result<Vec<AnalysisOutcome>> {
        use rayon::prelude::*;
        cfgs.par_iter().map(|cfg| self.explore(cfg)).collect()
    }

    /// Explore several functions sequentially
    #[cfg(not(feature = "parallel"))]
    pub fn explore_all(&self, cfgs: &[FunctionCfg]) -> Result<Vec<AnalysisOutcome>> {
        cfgs.iter().map(|cfg| self.explore(cfg)).collect()
    }
}

/// Mutable state of one `explore` call
struct ExplorationRun<'a> {
    cfg: &'a FunctionCfg,
    registry: &'a MachineRegistry,
    config: &'a ExplorerConfig,
    worklist: VecDeque<(NodeId, PathState)>,
    /// Join-point merge set: fingerprints of states already pushed per node
    seen: FxHashMap<NodeId, FxHashSet<u64>>,
    diagnostics: Vec<Diagnostic>,
    stats: ExplorationStats,
    /// Paths created so far (initial path plus forks)
    path_count: usize,
    truncated_paths: usize,
}

impl<'a> ExplorationRun<'a> {
    /// Process one worklist entry
    fn step(&mut self, node_id: &NodeId, mut state: PathState) {
        state.visit(node_id);
        if state.steps() > self.config.max_steps_per_path {
            warn!(node = %node_id, "step budget exceeded; truncating path");
            self.truncated_paths += 1;
            return;
        }

        let cfg: &'a FunctionCfg = self.cfg;
        let node = &cfg.nodes[node_id];
        trace!(node = %node_id, steps = state.steps(), "visiting block");

        for (effect_index, effect) in node.effects.iter().enumerate() {
            match effect {
                Effect::Return => {
                    self.finalize(&state);
                    return;
                }
                _ => self.apply_effect(&mut state, node, effect_index, effect),
            }
        }

        if node.is_terminal() {
            self.finalize(&state);
            return;
        }

        self.take_edges(node, state);
    }

    /// Apply one non-Return effect to the path state
    fn apply_effect(
        &mut self,
        state: &mut PathState,
        node: &CfgNode,
        effect_index: usize,
        effect: &Effect,
    ) {
        let registry: &'a MachineRegistry = self.registry;
        match effect {
            Effect::Call { callee, args, dest } => {
                let mut acquired = false;
                for machine in registry.machines() {
                    if machine.is_acquire_call(callee) {
                        if let Some(dest) = dest {
                            let site = EffectSite::new(node.id.clone(), effect_index);
                            let value = TrackedValue::new(dest.clone(), site);
                            state.bind(dest.clone(), value.clone());
                            state.set_machine_state(
                                machine.name.clone(),
                                value,
                                machine.entry_state.clone(),
                            );
                            acquired = true;
                        }
                    } else if let Some(action) = machine.call_action(callee).cloned() {
                        for arg in args {
                            self.apply_call_action(state, machine, arg, &action);
                        }
                    }
                }

                // A call result overwrites its destination: drop stale
                // bindings and facts for anything but an acquisition
                if let Some(dest) = dest {
                    state.invalidate_fact(dest);
                    if !acquired {
                        state.unbind(dest);
                    }
                }
            }
            Effect::Assign { var, value } => {
                state.invalidate_fact(var);
                match value {
                    AssignValue::Var(rhs) => match state.binding(rhs).cloned() {
                        Some(tracked) => state.bind(var.clone(), tracked),
                        None => state.unbind(var),
                    },
                    AssignValue::Literal(_) => state.unbind(var),
                }
            }
            Effect::Return => unreachable!("Return is handled by the caller"),
        }
    }

    /// Drive one machine with a classified call on one argument
    fn apply_call_action(
        &mut self,
        state: &mut PathState,
        machine: &StateMachine,
        arg: &str,
        action: &Action,
    ) {
        let Some(value) = state.binding(arg).cloned() else {
            return;
        };
        let Some(current) = state.machine_state(&machine.name, &value).cloned() else {
            return;
        };

        if let Some(kind) = machine.bad_outcome(&current, action) {
            self.diagnostics.push(Diagnostic::new(
                machine.name.clone(),
                arg,
                kind,
                current.clone(),
                value.site.clone(),
                state.trace().to_vec(),
                format!("'{}' applied to '{}' in state {}", action, arg, current),
            ));
        }

        if let Some(next) = machine.next_state(&current, action) {
            state.set_machine_state(machine.name.clone(), value, next);
        }
    }

    /// Finalize a terminated path: exit-state checks, then discard
    fn finalize(&mut self, state: &PathState) {
        self.stats.explored_paths += 1;

        let registry: &'a MachineRegistry = self.registry;
        for ((machine_name, value), lifecycle) in state.tracked_states() {
            let Some(machine) = registry.get(machine_name) else {
                continue;
            };
            if !machine.is_exit_state(lifecycle) {
                self.diagnostics.push(Diagnostic::new(
                    machine_name.clone(),
                    value.var.clone(),
                    DiagnosticKind::Leak,
                    lifecycle.clone(),
                    value.site.clone(),
                    state.trace().to_vec(),
                    format!(
                        "'{}' still in state {} when the path ends",
                        value.var, lifecycle
                    ),
                ));
            }
        }
    }

    /// Push feasible successors, forking the path state per edge
    fn take_edges(&mut self, node: &CfgNode, state: PathState) {
        let registry: &'a MachineRegistry = self.registry;
        let mut feasible: Vec<(&NodeId, PathState)> = Vec::new();

        for edge in &node.edges {
            match &edge.guard {
                None => feasible.push((&edge.target, state.clone_for_branch())),
                Some(guard) => {
                    if edge_feasibility(&state, guard, registry).is_feasible() {
                        let mut forked = state.clone_for_branch();
                        apply_guard(&mut forked, guard, registry);
                        feasible.push((&edge.target, forked));
                    } else {
                        trace!(node = %node.id, guard = %guard, "pruning infeasible edge");
                        self.stats.pruned_edges += 1;
                    }
                }
            }
        }

        for (index, (target, successor)) in feasible.into_iter().enumerate() {
            // The path continues into its first successor; every further
            // successor is a fork charged against the path budget
            if index > 0 {
                if self.path_count >= self.config.max_paths {
                    warn!(node = %node.id, "path budget exceeded; truncating branch");
                    self.truncated_paths += 1;
                    continue;
                }
                self.path_count += 1;
            }

            let fingerprint = successor.fingerprint();
            let seen_at_target = self.seen.entry(target.clone()).or_default();
            if !seen_at_target.insert(fingerprint) {
                self.stats.merged_paths += 1;
                continue;
            }

            self.worklist.push_back((target.clone(), successor));
        }
    }
}

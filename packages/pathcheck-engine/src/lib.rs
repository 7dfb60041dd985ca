//! # pathcheck-engine
//!
//! Path-sensitive, state-machine-based analysis of resource lifecycles over
//! a control-flow graph.
//!
//! An external front end supplies a [`FunctionCfg`]: basic blocks holding
//! ordered effects (calls, assignments, returns) connected by edges that may
//! carry boolean guards. The [`PathExplorer`] symbolically executes the
//! graph, forking the per-path state at branches and driving the registered
//! [`StateMachine`]s (e.g. the built-in [`HeapMachine`] for malloc/free)
//! with each effect. Facts recorded on taken edges prune infeasible
//! continuations, so two branches guarded by the same condition variable
//! cannot disagree within one path - the mechanism that keeps conditional
//! allocate/release pairs from producing false positives.
//!
//! ## Example
//!
//! ```
//! use pathcheck_engine::features::path_explorer::PathExplorer;
//! use pathcheck_engine::features::state_machine::{HeapMachine, MachineRegistry};
//! use pathcheck_engine::shared::models::{CfgNode, Effect, FunctionCfg, Guard};
//!
//! // p = malloc(); if (!p) return; free(p);
//! let mut cfg = FunctionCfg::new("example", "entry");
//! let mut entry = CfgNode::new("entry");
//! entry.add_effect(Effect::call_into("malloc", vec![], "p"));
//! entry.add_branch(Guard::non_null("p", false), "bail", "body");
//! let mut bail = CfgNode::new("bail");
//! bail.add_effect(Effect::Return);
//! let mut body = CfgNode::new("body");
//! body.add_effect(Effect::call("free", vec!["p".to_string()]));
//! body.add_effect(Effect::Return);
//! cfg.add_node(entry);
//! cfg.add_node(bail);
//! cfg.add_node(body);
//!
//! let explorer = PathExplorer::new(MachineRegistry::new().with_machine(HeapMachine::define()));
//! let outcome = explorer.explore(&cfg).unwrap();
//! assert!(outcome.is_clean());
//! ```

pub mod errors;
pub mod features;
pub mod shared;

// Re-export the primary API surface
pub use errors::{EngineError, Result};
pub use features::path_explorer::{
    AnalysisOutcome, CfgError, Coverage, ExplorationStats, ExplorerConfig, Fact, PathExplorer,
    PathState, TrackedValue,
};
pub use features::state_machine::{
    Action, Diagnostic, DiagnosticKind, HeapMachine, MachineBuilder, MachineDefinition,
    MachineParser, MachineRegistry, State, StateMachine,
};
pub use shared::models::{
    AssignValue, CfgEdge, CfgNode, Effect, EffectSite, FunctionCfg, Guard, GuardTest, NodeId,
};

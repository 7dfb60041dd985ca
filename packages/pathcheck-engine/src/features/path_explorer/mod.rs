/*
 * Path-Sensitive Exploration
 *
 * Worklist-driven symbolic execution over a function CFG:
 * - Fork the per-path state at branches (copy-on-fork)
 * - Prune edges inconsistent with recorded facts or fixed pointer states
 * - Drive the registered lifecycle machines with each block's effects
 * - Check exit states when a path terminates
 *
 * Architecture:
 * - Domain: PathState, TrackedValue, Fact
 * - Application: PathExplorer, feasibility check
 * - Infrastructure: structural CFG validation
 *
 * Exploration is bounded by path and step budgets; exceeding them is
 * reported as incomplete coverage, never as a clean result.
 */

pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export main types
pub use application::{
    AnalysisOutcome, Coverage, ExplorationStats, ExplorerConfig, Feasibility, PathExplorer,
};
pub use domain::{Fact, PathState, TrackedValue};
pub use infrastructure::CfgError;

/*
 * Path-Explorer Application Layer
 *
 * The worklist engine and the feasibility check it consults at branches.
 */

mod explorer;
mod feasibility;

pub use explorer::{
    AnalysisOutcome, Coverage, ExplorationStats, ExplorerConfig, PathExplorer,
};
pub use feasibility::{apply_guard, edge_feasibility, Feasibility};

/*
 * Shared Models
 *
 * Control-flow graph input types consumed by every analysis feature.
 */

mod cfg;

pub use cfg::{
    AssignValue, CfgEdge, CfgNode, Effect, EffectSite, FunctionCfg, Guard, GuardTest, NodeId,
};

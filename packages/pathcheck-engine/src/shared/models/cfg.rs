//! Control-flow graph input model.
//!
//! These are shared types consumed by every analysis feature, so they live in
//! shared/models rather than inside a single feature. The CFG is produced by
//! an external front end; this crate only walks it.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Basic block identifier
pub type NodeId = String;

/// Position of one effect inside the CFG: (block, index within block).
///
/// Used as the identity anchor for tracked values: the same acquisition site
/// yields the same symbolic identity on every path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EffectSite {
    /// Block the effect belongs to
    pub node_id: NodeId,

    /// Index of the effect within the block's ordered effect list
    pub effect_index: usize,
}

impl EffectSite {
    /// Create new effect site
    pub fn new(node_id: impl Into<NodeId>, effect_index: usize) -> Self {
        Self {
            node_id: node_id.into(),
            effect_index,
        }
    }
}

impl std::fmt::Display for EffectSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.node_id, self.effect_index)
    }
}

/// Boolean test an edge guard performs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuardTest {
    /// Truthiness of a named input (`flag != 0`)
    Truthy(String),

    /// Null test on a pointer-valued variable (`ptr != NULL`)
    NonNull(String),
}

impl GuardTest {
    /// Variable the test reads
    pub fn var(&self) -> &str {
        match self {
            GuardTest::Truthy(var) | GuardTest::NonNull(var) => var,
        }
    }
}

/// Edge guard: a boolean test plus the truth value required to take the edge
///
/// A two-way branch is encoded as two edges carrying complementary guards on
/// the same test.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Guard {
    /// Test performed at the branch
    pub test: GuardTest,

    /// Required outcome for this edge to be taken
    pub expect: bool,
}

impl Guard {
    /// Guard on the truthiness of a named input
    pub fn truthy(var: impl Into<String>, expect: bool) -> Self {
        Self {
            test: GuardTest::Truthy(var.into()),
            expect,
        }
    }

    /// Guard on a pointer null test
    pub fn non_null(var: impl Into<String>, expect: bool) -> Self {
        Self {
            test: GuardTest::NonNull(var.into()),
            expect,
        }
    }

    /// Variable the guard reads
    pub fn var(&self) -> &str {
        self.test.var()
    }

    /// Complementary guard (same test, opposite outcome)
    pub fn negated(&self) -> Guard {
        Guard {
            test: self.test.clone(),
            expect: !self.expect,
        }
    }

    /// True when `other` is the complement of this guard
    pub fn is_complement_of(&self, other: &Guard) -> bool {
        self.test == other.test && self.expect != other.expect
    }
}

impl std::fmt::Display for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.test, self.expect) {
            (GuardTest::Truthy(var), true) => write!(f, "{}", var),
            (GuardTest::Truthy(var), false) => write!(f, "!{}", var),
            (GuardTest::NonNull(var), true) => write!(f, "{} != NULL", var),
            (GuardTest::NonNull(var), false) => write!(f, "{} == NULL", var),
        }
    }
}

/// Right-hand side of an assignment effect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignValue {
    /// Copy from another variable
    Var(String),

    /// Integer constant
    Literal(i64),
}

/// One operation inside a basic block, consumed in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Function call, optionally assigning the result
    Call {
        callee: String,
        args: Vec<String>,
        dest: Option<String>,
    },

    /// Assignment to a variable
    Assign { var: String, value: AssignValue },

    /// Return from the analyzed function
    Return,
}

impl Effect {
    /// Call with no result binding
    pub fn call(callee: impl Into<String>, args: Vec<String>) -> Self {
        Effect::Call {
            callee: callee.into(),
            args,
            dest: None,
        }
    }

    /// Call whose result is assigned to `dest`
    pub fn call_into(
        callee: impl Into<String>,
        args: Vec<String>,
        dest: impl Into<String>,
    ) -> Self {
        Effect::Call {
            callee: callee.into(),
            args,
            dest: Some(dest.into()),
        }
    }

    /// Variable-to-variable assignment
    pub fn assign_var(var: impl Into<String>, rhs: impl Into<String>) -> Self {
        Effect::Assign {
            var: var.into(),
            value: AssignValue::Var(rhs.into()),
        }
    }

    /// Constant assignment
    pub fn assign_literal(var: impl Into<String>, literal: i64) -> Self {
        Effect::Assign {
            var: var.into(),
            value: AssignValue::Literal(literal),
        }
    }

    /// Variable this effect writes, if any
    pub fn written_var(&self) -> Option<&str> {
        match self {
            Effect::Call { dest, .. } => dest.as_deref(),
            Effect::Assign { var, .. } => Some(var),
            Effect::Return => None,
        }
    }
}

/// Outgoing CFG edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfgEdge {
    /// Destination block
    pub target: NodeId,

    /// Guard that must hold to take the edge (absent = unconditional)
    pub guard: Option<Guard>,
}

/// CFG basic block: ordered effects plus outgoing edges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfgNode {
    /// Unique block ID
    pub id: NodeId,

    /// Effects executed in order when the block runs
    pub effects: Vec<Effect>,

    /// Outgoing edges
    pub edges: Vec<CfgEdge>,
}

impl CfgNode {
    /// Create empty block
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            effects: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Append an effect
    pub fn add_effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    /// Append an unconditional edge
    pub fn add_edge(&mut self, target: impl Into<NodeId>) {
        self.edges.push(CfgEdge {
            target: target.into(),
            guard: None,
        });
    }

    /// Append a guarded edge
    pub fn add_guarded_edge(&mut self, target: impl Into<NodeId>, guard: Guard) {
        self.edges.push(CfgEdge {
            target: target.into(),
            guard: Some(guard),
        });
    }

    /// Append the two complementary edges of a two-way branch
    ///
    /// The first target is taken when `guard` holds, the second otherwise.
    pub fn add_branch(
        &mut self,
        guard: Guard,
        target_when_holds: impl Into<NodeId>,
        target_otherwise: impl Into<NodeId>,
    ) {
        let complement = guard.negated();
        self.edges.push(CfgEdge {
            target: target_when_holds.into(),
            guard: Some(guard),
        });
        self.edges.push(CfgEdge {
            target: target_otherwise.into(),
            guard: Some(complement),
        });
    }

    /// True when the block terminates a path (no successors)
    pub fn is_terminal(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Control-flow graph of one function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCfg {
    /// Function name (for diagnostics and reports)
    pub name: String,

    /// Named inputs whose values guards may test
    pub inputs: Vec<String>,

    /// Entry block ID
    pub entry: NodeId,

    /// All blocks by ID
    pub nodes: FxHashMap<NodeId, CfgNode>,
}

impl FunctionCfg {
    /// Create empty CFG
    pub fn new(name: impl Into<String>, entry: impl Into<NodeId>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            entry: entry.into(),
            nodes: FxHashMap::default(),
        }
    }

    /// Declare a named input
    pub fn add_input(&mut self, input: impl Into<String>) {
        self.inputs.push(input.into());
    }

    /// Insert a block (replaces any block with the same ID)
    pub fn add_node(&mut self, node: CfgNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Look up a block
    pub fn node(&self, id: &str) -> Option<&CfgNode> {
        self.nodes.get(id)
    }

    /// Number of blocks
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// True when `var` is a declared input
    pub fn is_input(&self, var: &str) -> bool {
        self.inputs.iter().any(|input| input == var)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_complement() {
        let taken = Guard::truthy("flag", true);
        let skipped = taken.negated();

        assert!(taken.is_complement_of(&skipped));
        assert!(skipped.is_complement_of(&taken));
        assert!(!taken.is_complement_of(&taken));

        // Different test on the same variable is not a complement
        let null_test = Guard::non_null("flag", false);
        assert!(!taken.is_complement_of(&null_test));
    }

    #[test]
    fn test_guard_display() {
        assert_eq!(Guard::truthy("flag", true).to_string(), "flag");
        assert_eq!(Guard::truthy("flag", false).to_string(), "!flag");
        assert_eq!(Guard::non_null("ptr", true).to_string(), "ptr != NULL");
        assert_eq!(Guard::non_null("ptr", false).to_string(), "ptr == NULL");
    }

    #[test]
    fn test_effect_written_var() {
        assert_eq!(
            Effect::call_into("malloc", vec![], "ptr").written_var(),
            Some("ptr")
        );
        assert_eq!(Effect::call("free", vec!["ptr".to_string()]).written_var(), None);
        assert_eq!(Effect::assign_literal("flag", 0).written_var(), Some("flag"));
        assert_eq!(Effect::Return.written_var(), None);
    }

    #[test]
    fn test_add_branch_orders_edges() {
        let mut node = CfgNode::new("b0");
        node.add_branch(Guard::truthy("flag", true), "then", "else");

        assert_eq!(node.edges.len(), 2);
        assert_eq!(node.edges[0].target, "then");
        assert_eq!(node.edges[0].guard, Some(Guard::truthy("flag", true)));
        assert_eq!(node.edges[1].target, "else");
        assert_eq!(node.edges[1].guard, Some(Guard::truthy("flag", false)));
    }

    #[test]
    fn test_add_branch_with_negative_guard() {
        let mut node = CfgNode::new("b0");
        // `if (!ptr) return;` — the true target is the null side
        node.add_branch(Guard::non_null("ptr", false), "early_return", "body");

        assert_eq!(node.edges[0].target, "early_return");
        assert_eq!(node.edges[0].guard, Some(Guard::non_null("ptr", false)));
        assert_eq!(node.edges[1].target, "body");
        assert_eq!(node.edges[1].guard, Some(Guard::non_null("ptr", true)));
    }

    #[test]
    fn test_function_cfg_lookup() {
        let mut cfg = FunctionCfg::new("test", "entry");
        cfg.add_input("flag");
        cfg.add_node(CfgNode::new("entry"));

        assert_eq!(cfg.node_count(), 1);
        assert!(cfg.node("entry").is_some());
        assert!(cfg.node("missing").is_none());
        assert!(cfg.is_input("flag"));
        assert!(!cfg.is_input("ptr"));
    }
}

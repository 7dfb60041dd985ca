/*
 * Per-Path Program State
 *
 * The abstract state carried along one symbolic execution path:
 * - Variable bindings to tracked values (allocation-site identity)
 * - (machine, tracked value) -> lifecycle state
 * - Facts: truth values recorded for condition variables on taken edges
 * - Witness trace and step counter
 *
 * Cloned on fork (copy-on-fork); never mutated after being handed to more
 * than one consumer.
 *
 * # Space Complexity
 * O(tracked values x machines + facts + trace length) per live path
 */

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::features::state_machine::domain::State;
use crate::shared::models::{EffectSite, NodeId};

/// Recorded truth value for a condition variable
///
/// Total: an unrecorded variable reads as `Unknown` rather than being a
/// missing map entry callers must special-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Fact {
    Unknown,
    True,
    False,
}

impl Fact {
    /// Fact from a branch outcome
    pub fn from_bool(value: bool) -> Self {
        if value {
            Fact::True
        } else {
            Fact::False
        }
    }

    /// True when a branch requiring `expect` is consistent with this fact
    pub fn admits(&self, expect: bool) -> bool {
        match self {
            Fact::Unknown => true,
            Fact::True => expect,
            Fact::False => !expect,
        }
    }

    /// Concrete value, if recorded
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Fact::Unknown => None,
            Fact::True => Some(true),
            Fact::False => Some(false),
        }
    }
}

/// Symbolic identity of one variable's value between acquisition and
/// reassignment
///
/// Identity is the acquisition site, so the same site yields the same
/// tracked value on every path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrackedValue {
    /// Variable the value was acquired into
    pub var: String,

    /// Acquisition site
    pub site: EffectSite,
}

impl TrackedValue {
    /// Create new tracked value
    pub fn new(var: impl Into<String>, site: EffectSite) -> Self {
        Self {
            var: var.into(),
            site,
        }
    }
}

/// Abstract state of one symbolic execution path
#[derive(Debug, Clone)]
pub struct PathState {
    /// Variable -> tracked value currently bound to it
    bindings: FxHashMap<String, TrackedValue>,

    /// (machine name, tracked value) -> lifecycle state
    machine_states: FxHashMap<(String, TrackedValue), State>,

    /// Condition variable -> recorded fact (only True/False are stored;
    /// `fact()` reads absent entries as Unknown)
    facts: FxHashMap<String, Fact>,

    /// Node ids visited so far, in order
    trace: Vec<NodeId>,

    /// Nodes visited (for the step budget)
    steps: usize,
}

impl PathState {
    /// Create initial state: no bindings, no facts, empty trace
    pub fn new() -> Self {
        Self {
            bindings: FxHashMap::default(),
            machine_states: FxHashMap::default(),
            facts: FxHashMap::default(),
            trace: Vec::new(),
            steps: 0,
        }
    }

    /// Recorded fact for a condition variable (total)
    pub fn fact(&self, var: &str) -> Fact {
        self.facts.get(var).copied().unwrap_or(Fact::Unknown)
    }

    /// Record a fact observed on a taken edge
    ///
    /// Recording is monotonic along a path: a recorded value is only ever
    /// confirmed, never flipped (the feasibility check rejects the edge
    /// first). Re-recording the same value is a no-op.
    pub fn record_fact(&mut self, var: impl Into<String>, value: bool) {
        let var = var.into();
        let fact = Fact::from_bool(value);
        debug_assert!(
            self.fact(&var).admits(value),
            "fact for '{}' flipped within a path",
            var
        );
        self.facts.insert(var, fact);
    }

    /// Drop a recorded fact (the variable was reassigned)
    pub fn invalidate_fact(&mut self, var: &str) {
        self.facts.remove(var);
    }

    /// Tracked value currently bound to a variable
    pub fn binding(&self, var: &str) -> Option<&TrackedValue> {
        self.bindings.get(var)
    }

    /// Bind a variable to a tracked value
    ///
    /// Rebinding drops the old binding but keeps the old value's machine
    /// states: the value still exists and is checked at path exit.
    pub fn bind(&mut self, var: impl Into<String>, value: TrackedValue) {
        self.bindings.insert(var.into(), value);
    }

    /// Remove a variable's binding (reassigned to something untracked)
    pub fn unbind(&mut self, var: &str) {
        self.bindings.remove(var);
    }

    /// Lifecycle state of a tracked value in a machine
    pub fn machine_state(&self, machine: &str, value: &TrackedValue) -> Option<&State> {
        self.machine_states
            .get(&(machine.to_string(), value.clone()))
    }

    /// Set the lifecycle state of a tracked value in a machine
    pub fn set_machine_state(
        &mut self,
        machine: impl Into<String>,
        value: TrackedValue,
        state: State,
    ) {
        self.machine_states.insert((machine.into(), value), state);
    }

    /// All (machine, tracked value) -> state entries, sorted for
    /// deterministic iteration
    pub fn tracked_states(&self) -> Vec<(&(String, TrackedValue), &State)> {
        let mut entries: Vec<_> = self.machine_states.iter().collect();
        entries.sort();
        entries
    }

    /// Record a node visit
    pub fn visit(&mut self, node_id: &str) {
        self.trace.push(node_id.to_string());
        self.steps += 1;
    }

    /// Witness trace so far
    pub fn trace(&self) -> &[NodeId] {
        &self.trace
    }

    /// Nodes visited so far
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Clone for branching (copy-on-fork)
    pub fn clone_for_branch(&self) -> Self {
        self.clone()
    }

    /// Hash of the abstract state (bindings, machine states, facts)
    ///
    /// Trace and step count are excluded: two paths that agree on the
    /// abstract state behave identically from here on, so the explorer may
    /// merge them at a join point. Entries are sorted first so the hash does
    /// not depend on map iteration order.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        let mut bindings: Vec<_> = self.bindings.iter().collect();
        bindings.sort();
        bindings.hash(&mut hasher);

        let mut machine_states: Vec<_> = self.machine_states.iter().collect();
        machine_states.sort();
        machine_states.hash(&mut hasher);

        let mut facts: Vec<_> = self.facts.iter().collect();
        facts.sort();
        facts.hash(&mut hasher);

        hasher.finish()
    }
}

impl Default for PathState {
    fn default() -> Self {
        Self::new()
    }
}

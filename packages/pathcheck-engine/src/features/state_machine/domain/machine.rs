/*
 * State-Machine Definition
 *
 * Defines one resource-lifecycle machine: the abstract states a tracked
 * value moves through and how observed effects drive it.
 *
 * # Example: Heap machine
 * ```
 * States: {Unchecked, Null, NonNull, Freed}
 * Transitions:
 *   Unchecked --assume_nonnull--> NonNull
 *   Unchecked --assume_null--> Null
 *   NonNull --free--> Freed
 * Bad outcomes:
 *   (Freed, free) -> double-free
 *   (Null, free)  -> free-of-null
 * ```
 *
 * # Time Complexity
 * - add_transition: O(1)
 * - next_state / bad_outcome / contradicts: O(1) (hash lookup)
 *
 * # Space Complexity
 * - O(states + transitions)
 */

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::diagnostics::DiagnosticKind;

/// Abstract state of a tracked value (e.g., "NonNull", "Freed")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct State {
    pub name: String,
}

impl State {
    /// Create new state
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Action driving a state transition
///
/// Actions come from two places: calls classified by the machine (e.g.
/// `free` consumes, `deref` uses) and branch assumptions coupled to pointer
/// tests (`assume_nonnull` / `assume_null`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
}

impl Action {
    /// Create new action
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Resource-lifecycle state machine
///
/// The transition table is partial: an absent `(state, action)` entry means
/// the action leaves the state unchanged. Defects are a separate table so
/// that reporting never depends on transition-table shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateMachine {
    /// Machine name (e.g., "Heap")
    pub name: String,

    /// All declared states
    pub states: HashSet<State>,

    /// State a freshly acquired value starts in
    pub entry_state: State,

    /// States accepted when a path terminates; anything else leaks
    pub exit_states: HashSet<State>,

    /// State transitions: (from_state, action) -> to_state
    pub transitions: FxHashMap<(State, Action), State>,

    /// Assumptions incompatible with a state; taking an edge that implies
    /// one of these is infeasible
    pub contradictions: HashSet<(State, Action)>,

    /// Defects: (state, action) -> diagnostic kind
    pub bad_outcomes: FxHashMap<(State, Action), DiagnosticKind>,

    /// Calls that create a tracked value in `entry_state` (e.g., "malloc")
    pub acquire_calls: HashSet<String>,

    /// Calls mapped to the action they perform on tracked arguments
    pub call_actions: HashMap<String, Action>,

    /// Actions applied on the two sides of a pointer null test:
    /// (non-null side, null side)
    pub assume_actions: Option<(Action, Action)>,
}

impl StateMachine {
    /// Create new machine with an empty table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: HashSet::new(),
            entry_state: State::new("Start"),
            exit_states: HashSet::new(),
            transitions: FxHashMap::default(),
            contradictions: HashSet::new(),
            bad_outcomes: FxHashMap::default(),
            acquire_calls: HashSet::new(),
            call_actions: HashMap::new(),
            assume_actions: None,
        }
    }

    /// Set the state freshly acquired values start in
    pub fn set_entry_state(&mut self, state: State) {
        self.states.insert(state.clone());
        self.entry_state = state;
    }

    /// Add a state accepted at path exit
    pub fn add_exit_state(&mut self, state: State) {
        self.states.insert(state.clone());
        self.exit_states.insert(state);
    }

    /// Add state transition
    ///
    /// # Time Complexity
    /// O(1) - Hash map insertion
    pub fn add_transition(&mut self, from: State, action: Action, to: State) {
        self.transitions.insert((from.clone(), action), to.clone());
        self.states.insert(from);
        self.states.insert(to);
    }

    /// Mark an assumption as incompatible with a state
    pub fn add_contradiction(&mut self, state: State, action: Action) {
        self.states.insert(state.clone());
        self.contradictions.insert((state, action));
    }

    /// Classify a (state, action) pair as a defect
    pub fn add_bad_outcome(&mut self, state: State, action: Action, kind: DiagnosticKind) {
        self.states.insert(state.clone());
        self.bad_outcomes.insert((state, action), kind);
    }

    /// Register a call that acquires a tracked value
    pub fn add_acquire_call(&mut self, callee: impl Into<String>) {
        self.acquire_calls.insert(callee.into());
    }

    /// Map a call name to the action it performs on tracked arguments
    pub fn add_call_action(&mut self, callee: impl Into<String>, action: Action) {
        self.call_actions.insert(callee.into(), action);
    }

    /// Set the assumption actions coupled to pointer null tests
    pub fn set_assume_actions(&mut self, on_non_null: Action, on_null: Action) {
        self.assume_actions = Some((on_non_null, on_null));
    }

    /// Get next state after action; None means no change
    ///
    /// # Time Complexity
    /// O(1) - Hash map lookup
    pub fn next_state(&self, from: &State, action: &Action) -> Option<State> {
        self.transitions
            .get(&(from.clone(), action.clone()))
            .cloned()
    }

    /// True when the state is accepted at path exit
    pub fn is_exit_state(&self, state: &State) -> bool {
        self.exit_states.contains(state)
    }

    /// True when assuming `action` in `state` is impossible
    pub fn contradicts(&self, state: &State, action: &Action) -> bool {
        self.contradictions
            .contains(&(state.clone(), action.clone()))
    }

    /// Defect kind for a (state, action) pair, if any
    pub fn bad_outcome(&self, state: &State, action: &Action) -> Option<DiagnosticKind> {
        self.bad_outcomes
            .get(&(state.clone(), action.clone()))
            .copied()
    }

    /// Action a call performs on tracked arguments, if classified
    pub fn call_action(&self, callee: &str) -> Option<&Action> {
        self.call_actions.get(callee)
    }

    /// True when the call creates a tracked value
    pub fn is_acquire_call(&self, callee: &str) -> bool {
        self.acquire_calls.contains(callee)
    }

    /// Assumption action for one side of a pointer null test
    pub fn assume_action(&self, non_null_side: bool) -> Option<&Action> {
        self.assume_actions
            .as_ref()
            .map(|(on_non_null, on_null)| if non_null_side { on_non_null } else { on_null })
    }

    /// Validate machine definition
    ///
    /// Checks:
    /// - Entry state exists in states
    /// - All exit states exist in states
    /// - All transitions, contradictions and bad outcomes reference declared states
    pub fn validate(&self) -> Result<(), String> {
        if !self.states.contains(&self.entry_state) {
            return Err(format!("Entry state '{}' not in states", self.entry_state));
        }

        for state in &self.exit_states {
            if !self.states.contains(state) {
                return Err(format!("Exit state '{}' not in states", state));
            }
        }

        for ((from, _action), to) in &self.transitions {
            if !self.states.contains(from) {
                return Err(format!("Transition from state '{}' not in states", from));
            }
            if !self.states.contains(to) {
                return Err(format!("Transition to state '{}' not in states", to));
            }
        }

        for (state, _action) in self.contradictions.iter().chain(self.bad_outcomes.keys()) {
            if !self.states.contains(state) {
                return Err(format!("Table references state '{}' not in states", state));
            }
        }

        Ok(())
    }
}

/// Immutable set of registered machines
///
/// Passed into the explorer at construction so that concurrent analyses
/// stay independent; there is no ambient global registry.
#[derive(Debug, Clone, Default)]
pub struct MachineRegistry {
    machines: Vec<StateMachine>,
}

impl MachineRegistry {
    /// Create empty registry
    pub fn new() -> Self {
        Self {
            machines: Vec::new(),
        }
    }

    /// Register a machine (builder style)
    pub fn with_machine(mut self, machine: StateMachine) -> Self {
        self.machines.push(machine);
        self
    }

    /// Register a machine in place
    pub fn register(&mut self, machine: StateMachine) {
        self.machines.push(machine);
    }

    /// All registered machines
    pub fn machines(&self) -> &[StateMachine] {
        &self.machines
    }

    /// Look up a machine by name
    pub fn get(&self, name: &str) -> Option<&StateMachine> {
        self.machines.iter().find(|machine| machine.name == name)
    }

    /// Number of registered machines
    pub fn len(&self) -> usize {
        self.machines.len()
    }

    /// True when no machines are registered
    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    /// Validate every registered machine and reject duplicate names
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for machine in &self.machines {
            if !seen.insert(machine.name.as_str()) {
                return Err(format!("Duplicate machine name '{}'", machine.name));
            }
            machine.validate()?;
        }
        Ok(())
    }
}

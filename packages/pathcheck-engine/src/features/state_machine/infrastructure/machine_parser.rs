/*
 * Machine Definition Language Parser
 *
 * Parse machine definitions from YAML/JSON for custom resource types.
 *
 * # Supported Formats
 * - YAML: Human-readable, recommended
 * - JSON: Machine-generated, API-friendly
 *
 * # Schema
 * ```yaml
 * machine: Heap
 * entry_state: Unchecked
 * exit_states:
 *   - Null
 *   - Freed
 * transitions:
 *   - from: Unchecked
 *     action: assume_nonnull
 *     to: NonNull
 *   - from: NonNull
 *     action: free
 *     to: Freed
 * contradictions:
 *   - state: NonNull
 *     action: assume_null
 * bad_outcomes:
 *   - state: Freed
 *     action: free
 *     diagnostic: double-free
 * acquire_calls: [malloc]
 * call_actions:
 *   free: free
 * assume_actions:
 *   on_non_null: assume_nonnull
 *   on_null: assume_null
 * ```
 *
 * # Validation
 * - All states in tables must be declared through transitions
 * - Entry state must exist
 * - Exit states must exist and be reachable from the entry state
 */

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::features::state_machine::domain::{Action, DiagnosticKind, State, StateMachine};

/// Machine configuration (YAML/JSON schema)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Machine name
    pub machine: String,

    /// State a freshly acquired value starts in
    pub entry_state: String,

    /// States accepted at path exit
    #[serde(default)]
    pub exit_states: Vec<String>,

    /// State transitions
    pub transitions: Vec<TransitionConfig>,

    /// Assumptions incompatible with a state (optional)
    #[serde(default)]
    pub contradictions: Vec<ContradictionConfig>,

    /// Defect table (optional)
    #[serde(default)]
    pub bad_outcomes: Vec<BadOutcomeConfig>,

    /// Calls that acquire a tracked value (optional)
    #[serde(default)]
    pub acquire_calls: Vec<String>,

    /// Call name -> action name (optional)
    #[serde(default)]
    pub call_actions: HashMap<String, String>,

    /// Assumption actions coupled to pointer null tests (optional)
    #[serde(default)]
    pub assume_actions: Option<AssumeConfig>,
}

/// Transition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionConfig {
    /// Source state
    pub from: String,

    /// Action name
    pub action: String,

    /// Target state
    pub to: String,
}

/// Contradiction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContradictionConfig {
    /// State the assumption is incompatible with
    pub state: String,

    /// Assumption action name
    pub action: String,
}

/// Bad-outcome configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadOutcomeConfig {
    /// State at the point of error
    pub state: String,

    /// Action name
    pub action: String,

    /// Diagnostic kind label (e.g., "double-free")
    pub diagnostic: String,
}

/// Assumption-action configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssumeConfig {
    /// Action applied on the non-null side of a pointer test
    pub on_non_null: String,

    /// Action applied on the null side
    pub on_null: String,
}

/// Machine parser
pub struct MachineParser;

/// Parse error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// YAML/JSON syntax error
    SyntaxError(String),

    /// Schema validation error
    ValidationError(String),

    /// Semantic error (unreachable exit states, unknown diagnostics, etc.)
    SemanticError(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::SyntaxError(msg) => write!(f, "Syntax error: {}", msg),
            ParseError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ParseError::SemanticError(msg) => write!(f, "Semantic error: {}", msg),
        }
    }
}

impl std::error::Error for ParseError {}

impl MachineParser {
    /// Parse machine from YAML
    ///
    /// # Example
    /// ```rust,ignore
    /// let yaml = r#"
    /// machine: Handle
    /// entry_state: Open
    /// exit_states: [Closed]
    /// transitions:
    ///   - from: Open
    ///     action: close
    ///     to: Closed
    /// "#;
    ///
    /// let machine = MachineParser::from_yaml(yaml)?;
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<StateMachine, ParseError> {
        let config: MachineConfig = serde_yaml::from_str(yaml)
            .map_err(|e| ParseError::SyntaxError(format!("YAML parse error: {}", e)))?;

        Self::build_machine(config)
    }

    /// Parse machine from JSON
    pub fn from_json(json: &str) -> Result<StateMachine, ParseError> {
        let config: MachineConfig = serde_json::from_str(json)
            .map_err(|e| ParseError::SyntaxError(format!("JSON parse error: {}", e)))?;

        Self::build_machine(config)
    }

    /// Build machine from configuration
    fn build_machine(config: MachineConfig) -> Result<StateMachine, ParseError> {
        let mut machine = StateMachine::new(&config.machine);

        machine.set_entry_state(State::new(&config.entry_state));

        for exit_state in &config.exit_states {
            machine.add_exit_state(State::new(exit_state));
        }

        for transition in &config.transitions {
            machine.add_transition(
                State::new(&transition.from),
                Action::new(&transition.action),
                State::new(&transition.to),
            );
        }

        for contradiction in &config.contradictions {
            machine.add_contradiction(
                State::new(&contradiction.state),
                Action::new(&contradiction.action),
            );
        }

        for outcome in &config.bad_outcomes {
            let kind: DiagnosticKind = outcome
                .diagnostic
                .parse()
                .map_err(ParseError::SemanticError)?;
            machine.add_bad_outcome(State::new(&outcome.state), Action::new(&outcome.action), kind);
        }

        for callee in &config.acquire_calls {
            machine.add_acquire_call(callee);
        }

        for (callee, action) in &config.call_actions {
            machine.add_call_action(callee, Action::new(action));
        }

        if let Some(assume) = &config.assume_actions {
            machine.set_assume_actions(
                Action::new(&assume.on_non_null),
                Action::new(&assume.on_null),
            );
        }

        machine
            .validate()
            .map_err(ParseError::ValidationError)?;

        Self::validate_semantics(&config)?;

        Ok(machine)
    }

    /// Validate semantic correctness
    ///
    /// Checks:
    /// - Entry state appears in transitions
    /// - Exit states appear in transitions
    /// - Exit states are reachable from the entry state
    fn validate_semantics(config: &MachineConfig) -> Result<(), ParseError> {
        let mut all_states: HashSet<&str> = HashSet::new();
        for t in &config.transitions {
            all_states.insert(&t.from);
            all_states.insert(&t.to);
        }

        if !all_states.contains(config.entry_state.as_str()) {
            return Err(ParseError::SemanticError(format!(
                "Entry state '{}' not found in transitions",
                config.entry_state
            )));
        }

        for exit_state in &config.exit_states {
            if !all_states.contains(exit_state.as_str()) {
                return Err(ParseError::SemanticError(format!(
                    "Exit state '{}' not found in transitions",
                    exit_state
                )));
            }
        }

        // Reachability: propagate from the entry state over the transition list
        let mut reachable: HashSet<&str> = HashSet::new();
        reachable.insert(config.entry_state.as_str());
        let mut changed = true;
        while changed {
            changed = false;
            for t in &config.transitions {
                if reachable.contains(t.from.as_str()) && reachable.insert(t.to.as_str()) {
                    changed = true;
                }
            }
        }

        for exit_state in &config.exit_states {
            if !reachable.contains(exit_state.as_str()) {
                return Err(ParseError::SemanticError(format!(
                    "Exit state '{}' is unreachable from entry state '{}'",
                    exit_state, config.entry_state
                )));
            }
        }

        Ok(())
    }
}

/// Machine builder (fluent API)
///
/// # Example
/// ```rust
/// use pathcheck_engine::features::state_machine::infrastructure::MachineBuilder;
/// use pathcheck_engine::features::state_machine::domain::DiagnosticKind;
///
/// let machine = MachineBuilder::new("Handle")
///     .entry_state("Open")
///     .add_transition("Open", "close", "Closed")
///     .exit_state("Closed")
///     .bad_outcome("Closed", "close", DiagnosticKind::DoubleFree)
///     .build();
/// ```
pub struct MachineBuilder {
    machine: StateMachine,
}

impl MachineBuilder {
    /// Create new machine builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            machine: StateMachine::new(name),
        }
    }

    /// Set entry state
    pub fn entry_state(mut self, state: impl Into<String>) -> Self {
        self.machine.set_entry_state(State::new(state.into()));
        self
    }

    /// Add state transition
    pub fn add_transition(
        mut self,
        from: impl Into<String>,
        action: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.machine.add_transition(
            State::new(from.into()),
            Action::new(action.into()),
            State::new(to.into()),
        );
        self
    }

    /// Add exit state
    pub fn exit_state(mut self, state: impl Into<String>) -> Self {
        self.machine.add_exit_state(State::new(state.into()));
        self
    }

    /// Mark an assumption incompatible with a state
    pub fn contradiction(mut self, state: impl Into<String>, action: impl Into<String>) -> Self {
        self.machine
            .add_contradiction(State::new(state.into()), Action::new(action.into()));
        self
    }

    /// Classify a (state, action) pair as a defect
    pub fn bad_outcome(
        mut self,
        state: impl Into<String>,
        action: impl Into<String>,
        kind: DiagnosticKind,
    ) -> Self {
        self.machine
            .add_bad_outcome(State::new(state.into()), Action::new(action.into()), kind);
        self
    }

    /// Register an acquiring call
    pub fn acquire_call(mut self, callee: impl Into<String>) -> Self {
        self.machine.add_acquire_call(callee);
        self
    }

    /// Map a call to an action
    pub fn call_action(mut self, callee: impl Into<String>, action: impl Into<String>) -> Self {
        self.machine
            .add_call_action(callee, Action::new(action.into()));
        self
    }

    /// Set assumption actions for pointer null tests
    pub fn assume_actions(
        mut self,
        on_non_null: impl Into<String>,
        on_null: impl Into<String>,
    ) -> Self {
        self.machine
            .set_assume_actions(Action::new(on_non_null.into()), Action::new(on_null.into()));
        self
    }

    /// Build machine
    pub fn build(self) -> StateMachine {
        self.machine
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_simple() {
        let yaml = r#"
machine: Handle
entry_state: Open
exit_states:
  - Closed
transitions:
  - from: Open
    action: close
    to: Closed
call_actions:
  close: close
"#;

        let machine = MachineParser::from_yaml(yaml).unwrap();

        assert_eq!(machine.name, "Handle");
        assert_eq!(machine.entry_state, State::new("Open"));
        assert!(machine.is_exit_state(&State::new("Closed")));
        assert_eq!(
            machine.next_state(&State::new("Open"), &Action::new("close")),
            Some(State::new("Closed"))
        );
        assert_eq!(machine.call_action("close"), Some(&Action::new("close")));
    }

    #[test]
    fn test_parse_json_simple() {
        let json = r#"{
  "machine": "Handle",
  "entry_state": "Open",
  "exit_states": ["Closed"],
  "transitions": [
    {"from": "Open", "action": "close", "to": "Closed"}
  ]
}"#;

        let machine = MachineParser::from_json(json).unwrap();

        assert_eq!(machine.name, "Handle");
        assert_eq!(machine.entry_state, State::new("Open"));
    }

    #[test]
    fn test_parse_full_lifecycle() {
        let yaml = r#"
machine: Heap
entry_state: Unchecked
exit_states:
  - Null
  - Freed
transitions:
  - from: Unchecked
    action: assume_nonnull
    to: NonNull
  - from: Unchecked
    action: assume_null
    to: Null
  - from: NonNull
    action: free
    to: Freed
contradictions:
  - state: NonNull
    action: assume_null
  - state: Null
    action: assume_nonnull
bad_outcomes:
  - state: Freed
    action: free
    diagnostic: double-free
  - state: Null
    action: free
    diagnostic: free-of-null
acquire_calls: [malloc]
call_actions:
  free: free
assume_actions:
  on_non_null: assume_nonnull
  on_null: assume_null
"#;

        let machine = MachineParser::from_yaml(yaml).unwrap();

        assert!(machine.is_acquire_call("malloc"));
        assert!(machine.contradicts(&State::new("NonNull"), &Action::new("assume_null")));
        assert_eq!(
            machine.bad_outcome(&State::new("Freed"), &Action::new("free")),
            Some(DiagnosticKind::DoubleFree)
        );
        assert_eq!(
            machine.assume_action(true),
            Some(&Action::new("assume_nonnull"))
        );
    }

    #[test]
    fn test_parse_error_invalid_yaml() {
        let invalid_yaml = "machine: [invalid syntax";
        let result = MachineParser::from_yaml(invalid_yaml);

        assert!(matches!(result, Err(ParseError::SyntaxError(_))));
    }

    #[test]
    fn test_parse_error_unknown_diagnostic() {
        let yaml = r#"
machine: Test
entry_state: A
transitions:
  - from: A
    action: go
    to: B
bad_outcomes:
  - state: B
    action: go
    diagnostic: wild-pointer
"#;

        let result = MachineParser::from_yaml(yaml);

        assert!(matches!(result, Err(ParseError::SemanticError(_))));
    }

    #[test]
    fn test_parse_error_unreachable_exit_state() {
        let yaml = r#"
machine: Test
entry_state: A
exit_states:
  - C
transitions:
  - from: A
    action: go
    to: B
  - from: C
    action: back
    to: A
"#;

        let result = MachineParser::from_yaml(yaml);

        assert!(matches!(result, Err(ParseError::SemanticError(_))));
    }

    #[test]
    fn test_machine_builder() {
        let machine = MachineBuilder::new("Handle")
            .entry_state("Open")
            .add_transition("Open", "close", "Closed")
            .exit_state("Closed")
            .contradiction("Closed", "assume_open")
            .bad_outcome("Closed", "close", DiagnosticKind::DoubleFree)
            .acquire_call("open_handle")
            .call_action("close", "close")
            .assume_actions("assume_open", "assume_closed")
            .build();

        assert_eq!(machine.name, "Handle");
        assert!(machine.validate().is_ok());
        assert!(machine.is_acquire_call("open_handle"));
        assert!(machine.contradicts(&State::new("Closed"), &Action::new("assume_open")));
        assert_eq!(
            machine.bad_outcome(&State::new("Closed"), &Action::new("close")),
            Some(DiagnosticKind::DoubleFree)
        );
    }
}

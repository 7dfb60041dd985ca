/*
 * Resource-Lifecycle State Machines
 *
 * Defines the abstract lifecycle a tracked value moves through and the
 * defects the engine classifies:
 * - Double-free / free-of-null / free-of-unchecked
 * - Null-deref and use-after-free
 * - Leaks at path exit
 *
 * Architecture:
 * - Domain: State, Action, StateMachine, MachineRegistry, Diagnostic models
 * - Infrastructure: Built-in machines, YAML/JSON parser
 * - Ports: MachineDefinition trait
 *
 * References:
 * - Strom & Yellin (1993) "Typestate"
 */

pub mod domain;
pub mod infrastructure;
pub mod ports;

// Re-export main types
pub use domain::{Action, Diagnostic, DiagnosticKind, MachineRegistry, State, StateMachine};

pub use infrastructure::{HeapMachine, MachineBuilder, MachineParser, ParseError};

pub use ports::MachineDefinition;

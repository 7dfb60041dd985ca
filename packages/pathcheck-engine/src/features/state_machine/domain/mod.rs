/*
 * State-Machine Domain Models
 *
 * Machines, registry, and the diagnostics they classify.
 */

mod diagnostics;
mod machine;

pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use machine::{Action, MachineRegistry, State, StateMachine};

/*
 * State-Machine Ports
 *
 * Interfaces for plugging in machine definitions.
 */

use crate::features::state_machine::domain::StateMachine;

/// Machine definition trait
///
/// Implement this trait to define custom lifecycle machines.
pub trait MachineDefinition {
    /// Define the machine
    fn define() -> StateMachine;
}

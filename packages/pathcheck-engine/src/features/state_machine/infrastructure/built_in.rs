/*
 * Built-in Machines
 *
 * Standard machine definitions shipped with the engine:
 * - HeapMachine: malloc/free lifecycle with null-check coupling
 *
 * These machines are used out-of-the-box without configuration.
 */

use crate::features::state_machine::domain::{Action, DiagnosticKind, State, StateMachine};
use crate::features::state_machine::ports::MachineDefinition;

/// Heap lifecycle machine
///
/// States: Unchecked → {Null, NonNull} → Freed
///
/// Transitions:
/// - Unchecked --assume_nonnull--> NonNull
/// - Unchecked --assume_null--> Null
/// - NonNull --free--> Freed
///
/// Exit states: {Null, Freed}
///
/// Defects:
/// - double-free: free() on Freed
/// - free-of-null: free() on Null
/// - free-of-unchecked: free() before any null check
/// - null-deref: use on Null
/// - use-after-free: use on Freed
/// - leak: NonNull or Unchecked at path exit
pub struct HeapMachine;

impl HeapMachine {
    /// Define heap machine
    ///
    /// # Example
    /// ```ignore
    /// let machine = HeapMachine::define();
    /// assert_eq!(machine.entry_state, State::new("Unchecked"));
    /// assert!(machine.is_acquire_call("malloc"));
    /// ```
    pub fn define() -> StateMachine {
        let mut machine = StateMachine::new("Heap");

        let unchecked = State::new("Unchecked");
        let null = State::new("Null");
        let non_null = State::new("NonNull");
        let freed = State::new("Freed");

        let assume_nonnull = Action::new("assume_nonnull");
        let assume_null = Action::new("assume_null");
        let free = Action::new("free");
        let use_value = Action::new("use");

        machine.set_entry_state(unchecked.clone());
        machine.add_exit_state(null.clone());
        machine.add_exit_state(freed.clone());

        // Null-check coupling: the taken branch fixes the pointer state
        machine.add_transition(unchecked.clone(), assume_nonnull.clone(), non_null.clone());
        machine.add_transition(unchecked.clone(), assume_null.clone(), null.clone());
        machine.add_transition(non_null.clone(), assume_nonnull.clone(), non_null.clone());
        machine.add_transition(null.clone(), assume_null.clone(), null.clone());

        machine.add_transition(non_null.clone(), free.clone(), freed.clone());
        // A bad free still consumes the value; only the diagnostic differs
        machine.add_transition(unchecked.clone(), free.clone(), freed.clone());
        machine.add_transition(null.clone(), free.clone(), freed.clone());
        machine.add_transition(non_null.clone(), use_value.clone(), non_null.clone());

        // A fixed pointer state rules out the complementary branch
        machine.add_contradiction(non_null.clone(), assume_null.clone());
        machine.add_contradiction(null.clone(), assume_nonnull.clone());

        // Defects
        machine.add_bad_outcome(freed.clone(), free.clone(), DiagnosticKind::DoubleFree);
        machine.add_bad_outcome(null.clone(), free.clone(), DiagnosticKind::FreeOfNull);
        machine.add_bad_outcome(unchecked, free.clone(), DiagnosticKind::FreeOfUnchecked);
        machine.add_bad_outcome(null, use_value.clone(), DiagnosticKind::NullDeref);
        machine.add_bad_outcome(freed, use_value.clone(), DiagnosticKind::UseAfterFree);

        // Call classification
        machine.add_acquire_call("malloc");
        machine.add_acquire_call("calloc");
        machine.add_call_action("free", free);
        machine.add_call_action("deref", use_value);

        machine.set_assume_actions(assume_nonnull, assume_null);

        machine
    }
}

impl MachineDefinition for HeapMachine {
    fn define() -> StateMachine {
        HeapMachine::define()
    }
}

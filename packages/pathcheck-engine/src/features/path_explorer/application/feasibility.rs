/*
 * Edge Feasibility
 *
 * Decides whether a guarded edge is consistent with everything the current
 * path already knows, and applies the guard's consequences on the taken
 * edge.
 *
 * Two sources of knowledge:
 * - Facts: truth values recorded for condition variables on earlier edges.
 *   A guard on an already-fixed variable is feasible iff it agrees with the
 *   recorded value; the complementary edge is pruned.
 * - Machine states: a pointer null test on a tracked value is feasible iff
 *   the implied assumption does not contradict the value's current state
 *   (a NonNull value cannot take the null side).
 *
 * This is what suppresses the classic false positive: once a path records
 * `flag == true` at the allocation guard, the `flag == false` side of a
 * later guard on the same variable is never explored, so the would-be leak
 * on that side is never evaluated.
 */

use crate::features::path_explorer::domain::PathState;
use crate::features::state_machine::domain::MachineRegistry;
use crate::shared::models::{Guard, GuardTest};

/// Outcome of checking an edge guard against a path state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feasibility {
    /// The edge may be taken
    Feasible,

    /// The edge contradicts recorded knowledge; prune it
    Infeasible,
}

impl Feasibility {
    /// True when the edge may be taken
    pub fn is_feasible(&self) -> bool {
        matches!(self, Feasibility::Feasible)
    }
}

/// Check whether taking `guard` is consistent with `state`
///
/// An unguarded edge is always feasible; callers only invoke this for
/// guarded ones.
pub fn edge_feasibility(
    state: &PathState,
    guard: &Guard,
    registry: &MachineRegistry,
) -> Feasibility {
    match &guard.test {
        GuardTest::Truthy(var) => {
            if state.fact(var).admits(guard.expect) {
                Feasibility::Feasible
            } else {
                Feasibility::Infeasible
            }
        }
        GuardTest::NonNull(var) => {
            let Some(value) = state.binding(var) else {
                // Untracked pointer: degrade to a plain truthy fact
                return if state.fact(var).admits(guard.expect) {
                    Feasibility::Feasible
                } else {
                    Feasibility::Infeasible
                };
            };

            for machine in registry.machines() {
                let Some(current) = state.machine_state(&machine.name, value) else {
                    continue;
                };
                if let Some(action) = machine.assume_action(guard.expect) {
                    if machine.contradicts(current, action) {
                        return Feasibility::Infeasible;
                    }
                }
            }
            Feasibility::Feasible
        }
    }
}

/// Apply a taken guard to the forked path state
///
/// Records the fact for truthy guards (and untracked pointer tests) and
/// applies the coupled assumption transition for tracked pointer tests.
/// Must only be called after `edge_feasibility` approved the edge.
pub fn apply_guard(state: &mut PathState, guard: &Guard, registry: &MachineRegistry) {
    match &guard.test {
        GuardTest::Truthy(var) => {
            state.record_fact(var.clone(), guard.expect);
        }
        GuardTest::NonNull(var) => {
            let Some(value) = state.binding(var).cloned() else {
                state.record_fact(var.clone(), guard.expect);
                return;
            };

            for machine in registry.machines() {
                let Some(current) = state.machine_state(&machine.name, &value).cloned() else {
                    continue;
                };
                if let Some(action) = machine.assume_action(guard.expect) {
                    if let Some(next) = machine.next_state(&current, action) {
                        state.set_machine_state(machine.name.clone(), value.clone(), next);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::path_explorer::domain::TrackedValue;
    use crate::features::state_machine::domain::State;
    use crate::features::state_machine::infrastructure::HeapMachine;
    use crate::shared::models::EffectSite;

    fn heap_registry() -> MachineRegistry {
        MachineRegistry::new().with_machine(HeapMachine::define())
    }

    fn tracked_ptr(state: &mut PathState, lifecycle: &str) -> TrackedValue {
        let value = TrackedValue::new("ptr", EffectSite::new("alloc", 0));
        state.bind("ptr", value.clone());
        state.set_machine_state("Heap", value.clone(), State::new(lifecycle));
        value
    }

    #[test]
    fn test_truthy_guard_unknown_fact_both_sides_feasible() {
        let state = PathState::new();
        let registry = heap_registry();

        for expect in [true, false] {
            let guard = Guard::truthy("flag", expect);
            assert!(edge_feasibility(&state, &guard, &registry).is_feasible());
        }
    }

    #[test]
    fn test_truthy_guard_recorded_fact_prunes_complement() {
        let mut state = PathState::new();
        state.record_fact("flag", true);
        let registry = heap_registry();

        assert!(edge_feasibility(&state, &Guard::truthy("flag", true), &registry).is_feasible());
        assert_eq!(
            edge_feasibility(&state, &Guard::truthy("flag", false), &registry),
            Feasibility::Infeasible
        );
    }

    #[test]
    fn test_non_null_guard_on_unchecked_value_both_sides_feasible() {
        let mut state = PathState::new();
        tracked_ptr(&mut state, "Unchecked");
        let registry = heap_registry();

        for expect in [true, false] {
            let guard = Guard::non_null("ptr", expect);
            assert!(edge_feasibility(&state, &guard, &registry).is_feasible());
        }
    }

    #[test]
    fn test_non_null_guard_contradicts_fixed_state() {
        let mut state = PathState::new();
        tracked_ptr(&mut state, "NonNull");
        let registry = heap_registry();

        assert!(edge_feasibility(&state, &Guard::non_null("ptr", true), &registry).is_feasible());
        assert_eq!(
            edge_feasibility(&state, &Guard::non_null("ptr", false), &registry),
            Feasibility::Infeasible
        );
    }

    #[test]
    fn test_non_null_guard_on_untracked_var_acts_as_fact() {
        let mut state = PathState::new();
        let registry = heap_registry();

        let guard = Guard::non_null("p", true);
        assert!(edge_feasibility(&state, &guard, &registry).is_feasible());
        apply_guard(&mut state, &guard, &registry);

        assert_eq!(
            edge_feasibility(&state, &Guard::non_null("p", false), &registry),
            Feasibility::Infeasible
        );
    }

    #[test]
    fn test_apply_guard_records_fact() {
        let mut state = PathState::new();
        let registry = heap_registry();

        apply_guard(&mut state, &Guard::truthy("flag", false), &registry);
        assert_eq!(state.fact("flag").as_bool(), Some(false));
    }

    #[test]
    fn test_apply_guard_couples_null_check_to_state() {
        let registry = heap_registry();

        let mut taken = PathState::new();
        let value = tracked_ptr(&mut taken, "Unchecked");
        apply_guard(&mut taken, &Guard::non_null("ptr", true), &registry);
        assert_eq!(
            taken.machine_state("Heap", &value),
            Some(&State::new("NonNull"))
        );

        let mut skipped = PathState::new();
        let value = tracked_ptr(&mut skipped, "Unchecked");
        apply_guard(&mut skipped, &Guard::non_null("ptr", false), &registry);
        assert_eq!(
            skipped.machine_state("Heap", &value),
            Some(&State::new("Null"))
        );
    }
}

/*
 * Exploration Property Tests
 *
 * Laws the explorer must satisfy on generated branch chains:
 * - n branches on distinct variables explore exactly 2^n paths
 * - n branches on one shared variable explore exactly 2 paths, with every
 *   complementary combination pruned
 * - identical inputs and budgets always yield identical outcomes
 */

use proptest::prelude::*;

use pathcheck_engine::{
    CfgNode, Coverage, Effect, FunctionCfg, Guard, HeapMachine, MachineRegistry, PathExplorer,
};

fn heap_explorer() -> PathExplorer {
    PathExplorer::new(MachineRegistry::new().with_machine(HeapMachine::define()))
}

/// Chain of `branches` two-way branches; when `shared_condition` is set,
/// every branch tests the same input variable
fn branch_chain_cfg(branches: usize, shared_condition: bool) -> FunctionCfg {
    let mut cfg = FunctionCfg::new("chain", "b0");

    if shared_condition {
        cfg.add_input("c");
    }

    for i in 0..branches {
        let var = if shared_condition {
            "c".to_string()
        } else {
            let var = format!("c{}", i);
            cfg.add_input(var.clone());
            var
        };

        let mut node = CfgNode::new(format!("b{}", i));
        node.add_branch(
            Guard::truthy(var, true),
            format!("b{}", i + 1),
            format!("b{}", i + 1),
        );
        cfg.add_node(node);
    }

    let mut last = CfgNode::new(format!("b{}", branches));
    last.add_effect(Effect::Return);
    cfg.add_node(last);
    cfg
}

proptest! {
    #[test]
    fn independent_branches_explore_every_combination(branches in 1usize..7) {
        let outcome = heap_explorer()
            .explore(&branch_chain_cfg(branches, false))
            .unwrap();

        prop_assert_eq!(outcome.coverage, Coverage::Complete);
        prop_assert_eq!(outcome.stats.explored_paths, 1 << branches);
        prop_assert_eq!(outcome.stats.pruned_edges, 0);
    }

    #[test]
    fn shared_condition_collapses_to_two_paths(branches in 1usize..7) {
        let outcome = heap_explorer()
            .explore(&branch_chain_cfg(branches, true))
            .unwrap();

        prop_assert_eq!(outcome.coverage, Coverage::Complete);
        // The first branch fixes the fact; every later branch has exactly
        // one feasible side per path
        prop_assert_eq!(outcome.stats.explored_paths, 2);
        prop_assert_eq!(outcome.stats.pruned_edges, 2 * (branches - 1));
    }

    #[test]
    fn exploration_is_deterministic(branches in 1usize..6, shared in any::<bool>()) {
        let cfg = branch_chain_cfg(branches, shared);
        let explorer = heap_explorer();

        let first = explorer.explore(&cfg).unwrap();
        let second = explorer.explore(&cfg).unwrap();

        prop_assert_eq!(first.diagnostics, second.diagnostics);
        prop_assert_eq!(first.coverage, second.coverage);
        prop_assert_eq!(first.stats.explored_paths, second.stats.explored_paths);
        prop_assert_eq!(first.stats.pruned_edges, second.stats.pruned_edges);
        prop_assert_eq!(first.stats.merged_paths, second.stats.merged_paths);
    }
}

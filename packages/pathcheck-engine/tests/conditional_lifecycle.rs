/*
 * Conditional-Lifecycle Acceptance Tests
 *
 * End-to-end runs over the CFG of a function that allocates under a
 * condition, null-checks the result, and releases under the same condition:
 *
 *   void test(int flag) {
 *     void *ptr;
 *     if (flag) {
 *       ptr = malloc(1024);
 *       if (!ptr) return;
 *       marker_A();
 *     }
 *     marker_B();
 *     if (flag) {
 *       marker_C();
 *       free(ptr);
 *     }
 *     marker_D();
 *   }
 *
 * Both release guards test the same variable as the allocation guard, so
 * the only paths that skip the free are paths where the allocation never
 * happened. A path-sensitive engine must report nothing here.
 */

use pretty_assertions::assert_eq;

use pathcheck_engine::{
    CfgNode, Coverage, DiagnosticKind, Effect, ExplorerConfig, FunctionCfg, Guard, HeapMachine,
    MachineRegistry, PathExplorer,
};

fn heap_explorer() -> PathExplorer {
    PathExplorer::new(MachineRegistry::new().with_machine(HeapMachine::define()))
}

/// CFG of the function above, with the release guarded by `release_var`
fn conditional_lifecycle_cfg(release_var: &str) -> FunctionCfg {
    let mut cfg = FunctionCfg::new("test", "entry");
    cfg.add_input("flag");
    if release_var != "flag" {
        cfg.add_input(release_var);
    }

    let mut entry = CfgNode::new("entry");
    entry.add_branch(Guard::truthy("flag", true), "alloc", "marker_b");

    let mut alloc = CfgNode::new("alloc");
    alloc.add_effect(Effect::call_into("malloc", vec![], "ptr"));
    alloc.add_branch(Guard::non_null("ptr", false), "early_return", "marker_a");

    let mut early_return = CfgNode::new("early_return");
    early_return.add_effect(Effect::Return);

    let mut marker_a = CfgNode::new("marker_a");
    marker_a.add_effect(Effect::call("marker_A", vec![]));
    marker_a.add_edge("marker_b");

    let mut marker_b = CfgNode::new("marker_b");
    marker_b.add_effect(Effect::call("marker_B", vec![]));
    marker_b.add_branch(Guard::truthy(release_var, true), "release", "marker_d");

    let mut release = CfgNode::new("release");
    release.add_effect(Effect::call("marker_C", vec![]));
    release.add_effect(Effect::call("free", vec!["ptr".to_string()]));
    release.add_edge("marker_d");

    let mut marker_d = CfgNode::new("marker_d");
    marker_d.add_effect(Effect::call("marker_D", vec![]));
    marker_d.add_effect(Effect::Return);

    cfg.add_node(entry);
    cfg.add_node(alloc);
    cfg.add_node(early_return);
    cfg.add_node(marker_a);
    cfg.add_node(marker_b);
    cfg.add_node(release);
    cfg.add_node(marker_d);
    cfg
}

#[test]
fn correlated_guards_produce_no_diagnostics() {
    let outcome = heap_explorer()
        .explore(&conditional_lifecycle_cfg("flag"))
        .unwrap();

    assert_eq!(outcome.diagnostics, vec![]);
    assert!(outcome.is_clean());
    assert_eq!(outcome.coverage, Coverage::Complete);
}

#[test]
fn correlated_guards_prune_complementary_paths() {
    let outcome = heap_explorer()
        .explore(&conditional_lifecycle_cfg("flag"))
        .unwrap();

    // Exactly three feasible paths:
    //   flag true, allocation failed (early return)
    //   flag true, allocation succeeded, released
    //   flag false, nothing allocated
    assert_eq!(outcome.stats.explored_paths, 3);

    // The (flag==true, flag==false) and (flag==false, flag==true)
    // combinations at the release guard are never explored
    assert_eq!(outcome.stats.pruned_edges, 2);
}

#[test]
fn uncorrelated_release_guard_leaks() {
    // Same function, but the release is guarded by an unrelated input:
    // the path (flag true, other false) keeps the allocation live
    let outcome = heap_explorer()
        .explore(&conditional_lifecycle_cfg("other"))
        .unwrap();

    assert_eq!(outcome.diagnostics.len(), 1);
    let diagnostic = &outcome.diagnostics[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::Leak);
    assert_eq!(diagnostic.variable, "ptr");
    assert_eq!(diagnostic.state_at_error.name, "NonNull");

    // The witness walks the allocation and skips the release
    assert!(diagnostic.witness.contains(&"alloc".to_string()));
    assert!(!diagnostic.witness.contains(&"release".to_string()));
}

#[test]
fn rerunning_the_analysis_is_idempotent() {
    let cfg = conditional_lifecycle_cfg("other");
    let explorer = heap_explorer();

    let first = explorer.explore(&cfg).unwrap();
    let second = explorer.explore(&cfg).unwrap();

    assert_eq!(first.diagnostics, second.diagnostics);
    assert_eq!(first.coverage, second.coverage);
    assert_eq!(first.stats.explored_paths, second.stats.explored_paths);
    assert_eq!(first.stats.pruned_edges, second.stats.pruned_edges);
}

#[test]
fn starved_budget_reports_incomplete_coverage() {
    let explorer = heap_explorer().with_config(ExplorerConfig {
        max_paths: 1,
        max_steps_per_path: 4096,
    });

    let outcome = explorer
        .explore(&conditional_lifecycle_cfg("flag"))
        .unwrap();

    assert!(matches!(outcome.coverage, Coverage::Incomplete { .. }));
    assert!(!outcome.is_clean());
}

use super::*;

fn u(n: u32) -> UnitId {
    UnitId(n)
}

#[test]
fn test_add_dependency_tracks_both_directions() {
    let mut graph = DependencyGraph::new();
    graph.add_dependency(u(1), u(2), DependencyType::Signature, "a.B");
    graph.add_dependency(u(1), u(2), DependencyType::Expression, "a.C");
    graph.add_dependency(u(3), u(2), DependencyType::Inheritance, "a.B");

    assert_eq!(graph.direct_dependencies(u(1)), vec![u(2)]);
    assert_eq!(
        graph.direct_reverse_dependencies(u(2), DependencyTypeSet::all()),
        vec![u(1), u(3)]
    );
    assert_eq!(
        graph.direct_reverse_dependencies(u(2), DependencyTypeSet::INHERITANCE),
        vec![u(3)]
    );
    assert_eq!(
        graph.dependency_types(u(1), u(2)),
        DependencyTypeSet::SIGNATURE | DependencyTypeSet::EXPRESSION
    );
    let edge = graph.edge(u(1), u(2)).unwrap();
    assert_eq!(edge.names.len(), 2);
    assert_eq!(edge.names.get("a.B"), Some(&DependencyTypeSet::SIGNATURE));
    assert!(graph.dependency_types(u(2), u(1)).is_empty());
}

#[test]
fn test_self_dependencies_are_ignored() {
    let mut graph = DependencyGraph::new();
    graph.add_dependency(u(1), u(1), DependencyType::Expression, "x");
    assert!(graph.direct_dependencies(u(1)).is_empty());
    assert!(!graph.contains(u(1)));
}

#[test]
fn test_remove_dependencies_keeps_incoming_edges() {
    let mut graph = DependencyGraph::new();
    graph.add_dependency(u(1), u(2), DependencyType::Signature, "b");
    graph.add_dependency(u(2), u(3), DependencyType::Signature, "c");
    graph.remove_dependencies(u(2));
    assert!(graph.direct_dependencies(u(2)).is_empty());
    assert!(graph.direct_reverse_dependencies(u(3), DependencyTypeSet::all()).is_empty());
    assert_eq!(graph.direct_dependencies(u(1)), vec![u(2)]);

    graph.remove_unit(u(2));
    assert!(graph.direct_dependencies(u(1)).is_empty());
    assert!(!graph.contains(u(2)));
}

#[test]
fn test_topological_sort_puts_bases_first() {
    let mut graph = DependencyGraph::new();
    // 1 extends 3, 3 extends 2; 4 only uses 1 in an expression.
    graph.add_dependency(u(1), u(3), DependencyType::Inheritance, "C");
    graph.add_dependency(u(3), u(2), DependencyType::Inheritance, "B");
    graph.add_dependency(u(4), u(1), DependencyType::Expression, "A");
    graph.add_unit(u(5));

    let sorted = graph.topological_sort(&[u(4), u(5)]);
    assert_eq!(sorted, vec![u(2), u(3), u(1), u(4), u(5)]);
    assert!(graph.last_cycle().is_none());

    // Only what the roots reach.
    assert_eq!(graph.topological_sort(&[u(3)]), vec![u(2), u(3)]);
}

#[test]
fn test_topological_sort_breaks_cycles_deterministically() {
    let mut graph = DependencyGraph::new();
    graph.add_dependency(u(1), u(2), DependencyType::Inheritance, "B");
    graph.add_dependency(u(2), u(1), DependencyType::Inheritance, "A");
    let first = graph.topological_sort(&[u(1), u(2)]);
    assert_eq!(first, vec![u(2), u(1)]);
    assert_eq!(graph.last_cycle(), Some(&[u(1), u(2)][..]));
    assert_eq!(graph.topological_sort(&[u(2), u(1)]), first);
}

#[test]
fn test_invalidation_stops_at_expression_edges() {
    let mut graph = DependencyGraph::new();
    // 2 extends 1, 3 uses 2 in a body, 4 uses 3's signature.
    graph.add_dependency(u(2), u(1), DependencyType::Inheritance, "A");
    graph.add_dependency(u(3), u(2), DependencyType::Expression, "B");
    graph.add_dependency(u(4), u(3), DependencyType::Signature, "C");
    graph.add_dependency(u(5), u(2), DependencyType::Signature, "B");

    assert_eq!(graph.compute_invalidation_set(&[u(1)]), vec![u(1), u(2), u(3), u(5)]);
    assert_eq!(graph.compute_invalidation_set(&[u(3)]), vec![u(3), u(4)]);
    assert_eq!(graph.compute_invalidation_set(&[u(9)]), vec![u(9)]);
}

#[test]
fn test_clear() {
    let mut graph = DependencyGraph::new();
    graph.add_dependency(u(1), u(2), DependencyType::Namespace, "ns");
    assert_eq!(graph.unit_count(), 2);
    graph.clear();
    assert_eq!(graph.unit_count(), 0);
    assert!(graph.direct_dependencies(u(1)).is_empty());
}

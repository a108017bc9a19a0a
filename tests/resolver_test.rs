use argus_extractor::core::DependencyResolver;

// * Test Suite for module ordering (Kahn's algorithm)

fn graph(edges: &[(&str, &[&str])]) -> Vec<(String, Vec<String>)> {
    edges
        .iter()
        .map(|(name, deps)| (name.to_string(), deps.iter().map(|d| d.to_string()).collect()))
        .collect()
}

fn position(order: &[String], name: &str) -> usize {
    order.iter().position(|n| n == name).unwrap()
}

#[test]
fn test_dependencies_run_first() {
    let order = DependencyResolver::new(graph(&[
        ("title", &["json_ld", "open_graph"]),
        ("price", &["json_ld"]),
        ("json_ld", &[]),
        ("open_graph", &[]),
    ]))
    .sort()
    .unwrap();

    assert_eq!(order.len(), 4);
    assert!(position(&order, "json_ld") < position(&order, "title"));
    assert!(position(&order, "open_graph") < position(&order, "title"));
    assert!(position(&order, "json_ld") < position(&order, "price"));
}

#[test]
fn test_inactive_dependency_is_ignored() {
    // * "open_graph" is not part of this run
    let order = DependencyResolver::new(graph(&[("title", &["open_graph"]), ("price", &[])]))
        .sort()
        .unwrap();

    assert_eq!(order.len(), 2);
    assert!(!order.contains(&"open_graph".to_string()));
}

#[test]
fn test_chain_is_fully_ordered() {
    let order = DependencyResolver::new(graph(&[("c", &["b"]), ("b", &["a"]), ("a", &[])]))
        .sort()
        .unwrap();
    assert_eq!(order, vec!["a", "b", "c"]);
}

#[test]
fn test_cycle_reports_members() {
    let err = DependencyResolver::new(graph(&[
        ("json_ld", &[]),
        ("a", &["b"]),
        ("b", &["a"]),
        ("after", &["a"]),
    ]))
    .sort()
    .unwrap_err();

    assert!(err.modules.contains(&"a".to_string()));
    assert!(err.modules.contains(&"b".to_string()));
    assert!(!err.modules.contains(&"json_ld".to_string()));
    assert!(err.to_string().contains("a, "));
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let err = DependencyResolver::new(graph(&[("loop", &["loop"])])).sort().unwrap_err();
    assert_eq!(err.modules, vec!["loop"]);
}

#[test]
fn test_empty_set() {
    assert!(DependencyResolver::new(Vec::new()).sort().unwrap().is_empty());
}

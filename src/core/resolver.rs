// * Dependency resolution for the active module set (Kahn's algorithm).
// * Dependencies on modules outside the active set are dropped, not errors.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::debug;

use super::error::CycleError;
use super::module::ExtractorModule;

pub struct DependencyResolver {
    // * (module, dependencies) in registration order
    nodes: Vec<(String, Vec<String>)>,
}

impl DependencyResolver {
    pub fn new(nodes: Vec<(String, Vec<String>)>) -> Self {
        Self { nodes }
    }

    pub fn from_modules(modules: &[Arc<dyn ExtractorModule>]) -> Self {
        let nodes = modules
            .iter()
            .map(|module| {
                (
                    module.name().to_string(),
                    module.dependencies().iter().map(|d| d.to_string()).collect(),
                )
            })
            .collect();
        Self { nodes }
    }

    /// Returns an execution order in which every module follows its active dependencies.
    ///
    /// Modules that become ready at the same time keep registration order.
    pub fn sort(&self) -> Result<Vec<String>, CycleError> {
        let n = self.nodes.len();
        let index: HashMap<&str, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(idx, (name, _))| (name.as_str(), idx))
            .collect();

        // * Step 1: Adjacency list and in-degrees over active dependencies only
        // * dependents[i] = modules that must wait for module i
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut in_degree: Vec<usize> = vec![0; n];

        for (idx, (name, deps)) in self.nodes.iter().enumerate() {
            let mut seen = HashSet::new();
            for dep in deps {
                match index.get(dep.as_str()) {
                    Some(&dep_idx) if seen.insert(dep_idx) => {
                        dependents[dep_idx].push(idx);
                        in_degree[idx] += 1;
                    }
                    Some(_) => {}
                    None => {
                        debug!(module = %name, dependency = %dep, "Ignoring inactive dependency");
                    }
                }
            }
        }

        // * Step 2: Ready queue seeded with dependency-free modules
        let mut ready: VecDeque<usize> = (0..n).filter(|&idx| in_degree[idx] == 0).collect();
        let mut order: Vec<String> = Vec::with_capacity(n);

        while let Some(idx) = ready.pop_front() {
            order.push(self.nodes[idx].0.clone());
            for &next in &dependents[idx] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push_back(next);
                }
            }
        }

        // * Step 3: Anything left unscheduled sits on or behind a cycle
        if order.len() < n {
            let mut modules: Vec<String> = (0..n)
                .filter(|&idx| in_degree[idx] > 0)
                .map(|idx| self.nodes[idx].0.clone())
                .collect();
            modules.sort();
            return Err(CycleError { modules });
        }

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, deps: &[&str]) -> (String, Vec<String>) {
        (name.to_string(), deps.iter().map(|d| d.to_string()).collect())
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn test_dependencies_come_first() {
        let resolver = DependencyResolver::new(vec![
            node("title", &["json_ld", "open_graph"]),
            node("price", &["json_ld"]),
            node("json_ld", &[]),
            node("open_graph", &[]),
        ]);
        let order = resolver.sort().unwrap();

        assert_eq!(order.len(), 4);
        assert!(position(&order, "json_ld") < position(&order, "title"));
        assert!(position(&order, "open_graph") < position(&order, "title"));
        assert!(position(&order, "json_ld") < position(&order, "price"));
    }

    #[test]
    fn test_inactive_dependency_is_dropped() {
        let resolver = DependencyResolver::new(vec![node("a", &["b", "c"]), node("c", &[])]);
        let order = resolver.sort().unwrap();
        assert_eq!(order, vec!["c".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_cycle_reports_members() {
        let resolver = DependencyResolver::new(vec![
            node("a", &["b"]),
            node("b", &["a"]),
            node("c", &[]),
        ]);
        let err = resolver.sort().unwrap_err();
        assert_eq!(err.modules, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let resolver = DependencyResolver::new(vec![node("a", &["a"])]);
        assert!(resolver.sort().is_err());
    }

    #[test]
    fn test_duplicate_dependency_counted_once() {
        let resolver = DependencyResolver::new(vec![node("b", &["a", "a"]), node("a", &[])]);
        assert_eq!(resolver.sort().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_empty_set() {
        assert!(DependencyResolver::new(Vec::new()).sort().unwrap().is_empty());
    }
}

//! Join tree graph
//!
//! Joins form a tree rooted at the main collection: each join is an edge
//! from its source collection to its target collection. The graph is used
//! to find joins that hang off a removed join, to detect joins that are not
//! reachable from the main collection, and to detect cycles in
//! configurations that did not come through the store (e.g. loaded from a
//! file).

use crate::models::JoinConfiguration;
use petgraph::algo::{dijkstra, is_cyclic_directed, kosaraju_scc};
use petgraph::graph::NodeIndex;
use petgraph::visit::Dfs;
use petgraph::{Directed, Graph};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

pub struct JoinTree {
    graph: Graph<String, Uuid, Directed>,
    node_map: HashMap<String, NodeIndex>,
    root: Option<NodeIndex>,
}

impl JoinTree {
    /// Build the graph for `main_collection` and its joins
    pub fn build(main_collection: &str, joins: &[JoinConfiguration]) -> Self {
        let mut tree = Self {
            graph: Graph::new(),
            node_map: HashMap::new(),
            root: None,
        };

        if !main_collection.is_empty() {
            tree.root = Some(tree.node(main_collection));
        }
        for join in joins {
            let source = tree.node(&join.source_collection);
            let target = tree.node(&join.target_collection);
            tree.graph.add_edge(source, target, join.id);
        }
        tree
    }

    fn node(&mut self, collection: &str) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(collection) {
            return idx;
        }
        let idx = self.graph.add_node(collection.to_string());
        self.node_map.insert(collection.to_string(), idx);
        idx
    }

    /// `collection` and every collection joined (directly or transitively)
    /// from it
    pub fn descendants(&self, collection: &str) -> HashSet<String> {
        let mut found = HashSet::new();
        let Some(&start) = self.node_map.get(collection) else {
            return found;
        };

        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(node) = dfs.next(&self.graph) {
            found.insert(self.graph[node].clone());
        }
        found
    }

    /// Number of joins between the main collection and `collection`
    /// (0 for the main collection, `None` when unreachable)
    pub fn depth(&self, collection: &str) -> Option<usize> {
        let root = self.root?;
        let &target = self.node_map.get(collection)?;
        dijkstra(&self.graph, root, Some(target), |_| 1usize)
            .get(&target)
            .copied()
    }

    pub fn is_reachable(&self, collection: &str) -> bool {
        self.depth(collection).is_some()
    }

    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Collections taking part in each cycle
    pub fn cycles(&self) -> Vec<Vec<String>> {
        kosaraju_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&n| self.graph.contains_edge(n, n))
            })
            .map(|component| {
                let mut names: Vec<String> =
                    component.into_iter().map(|n| self.graph[n].clone()).collect();
                names.sort();
                names
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join(source: &str, target: &str) -> JoinConfiguration {
        JoinConfiguration::new(source, target, "local", "foreign")
    }

    #[test]
    fn test_descendants_follow_chains() {
        let joins = vec![
            join("students", "classes"),
            join("classes", "teachers"),
            join("students", "exams"),
        ];
        let tree = JoinTree::build("students", &joins);

        let below_classes = tree.descendants("classes");
        assert_eq!(below_classes.len(), 2);
        assert!(below_classes.contains("classes"));
        assert!(below_classes.contains("teachers"));
        assert!(tree.descendants("unknown").is_empty());
    }

    #[test]
    fn test_depth_and_reachability() {
        let joins = vec![
            join("students", "classes"),
            join("classes", "teachers"),
            join("rooms", "buildings"),
        ];
        let tree = JoinTree::build("students", &joins);

        assert_eq!(tree.depth("students"), Some(0));
        assert_eq!(tree.depth("classes"), Some(1));
        assert_eq!(tree.depth("teachers"), Some(2));
        assert!(!tree.is_reachable("buildings"));
        assert!(!tree.has_cycle());
    }

    #[test]
    fn test_cycle_detection() {
        let joins = vec![
            join("students", "classes"),
            join("classes", "teachers"),
            join("teachers", "classes"),
        ];
        let tree = JoinTree::build("students", &joins);

        assert!(tree.has_cycle());
        assert_eq!(
            tree.descendants("classes"),
            HashSet::from(["classes".to_string(), "teachers".to_string()])
        );
        assert_eq!(tree.cycles(), vec![vec!["classes".to_string(), "teachers".to_string()]]);
    }
}

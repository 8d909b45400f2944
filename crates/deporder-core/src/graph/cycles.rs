//! Post-drain cycle reporting.
//!
//! # Overview
//!
//! The store never rejects an edge, so a cycle only shows up after draining:
//! nodes on the loop (and everything downstream of it) are never ready, and
//! their edges stay in the forward map. [`CycleReport`] captures that
//! residue and separates the nodes that actually form loops from the ones
//! merely stuck behind them.
//!
//! ## Edge Direction
//!
//! Same as the store: `a → b` means `a` must precede `b`.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;
use std::fmt;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use super::store::DepGraph;
use crate::relation::Node;

/// Edges left behind after a drain, plus the loops among them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Every residual `(prerequisite, dependent)` edge, sorted.
    pub edges: Vec<(Node, Node)>,
    /// Strongly connected components of the residual graph that form a
    /// loop (size > 1, or a single node with a self edge). Each component is
    /// sorted, and the list of components is sorted.
    pub cycles: Vec<Vec<Node>>,
}

impl CycleReport {
    /// Build a report from the store's residual edges, or `None` if there
    /// are none.
    #[must_use]
    pub fn from_graph(graph: &DepGraph) -> Option<Self> {
        if !graph.has_unresolved_edges() {
            return None;
        }

        let edges: Vec<(Node, Node)> = graph
            .residual_edges()
            .into_iter()
            .flat_map(|(prerequisite, dependents)| {
                dependents
                    .into_iter()
                    .map(move |dependent| (prerequisite.clone(), dependent))
            })
            .collect();

        let cycles = find_cycles(&edges);
        Some(Self { edges, cycles })
    }

    /// Nodes that appear on some residual edge but on no loop.
    #[must_use]
    pub fn blocked(&self) -> Vec<Node> {
        let mut on_cycle: Vec<&Node> = self.cycles.iter().flatten().collect();
        on_cycle.sort_unstable();

        let mut blocked: Vec<Node> = self
            .edges
            .iter()
            .flat_map(|(a, b)| [a, b])
            .filter(|node| on_cycle.binary_search(node).is_err())
            .cloned()
            .collect();
        blocked.sort_unstable();
        blocked.dedup();
        blocked
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dependency cycle detected:")?;
        for cycle in &self.cycles {
            let names: Vec<&str> = cycle.iter().map(Node::as_str).collect();
            write!(f, " [{}]", names.join(", "))?;
        }
        let edges: Vec<String> = self
            .edges
            .iter()
            .map(|(a, b)| format!("{a} -> {b}"))
            .collect();
        write!(f, "; residual edges: {}", edges.join(", "))
    }
}

/// Strongly connected components of `edges` that contain a loop.
fn find_cycles(edges: &[(Node, Node)]) -> Vec<Vec<Node>> {
    let mut graph = DiGraph::<Node, ()>::new();
    let mut index: HashMap<&Node, NodeIndex> = HashMap::new();

    for (a, b) in edges {
        let ia = *index.entry(a).or_insert_with(|| graph.add_node(a.clone()));
        let ib = *index.entry(b).or_insert_with(|| graph.add_node(b.clone()));
        graph.add_edge(ia, ib, ());
    }

    let mut cycles: Vec<Vec<Node>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|node| graph.contains_edge(*node, *node))
        })
        .map(|component| {
            let mut names: Vec<Node> = component.into_iter().map(|idx| graph[idx].clone()).collect();
            names.sort_unstable();
            names
        })
        .collect();

    cycles.sort_unstable();
    cycles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(name: &str) -> Node {
        Node::from(name)
    }

    fn drained(pairs: &[(&str, &str)]) -> DepGraph {
        let mut graph = DepGraph::new();
        for (a, b) in pairs {
            graph.add_edge(n(a), n(b));
        }
        graph.by_ref().for_each(drop);
        graph
    }

    #[test]
    fn acyclic_graph_has_no_report() {
        let graph = drained(&[("a", "b"), ("b", "c")]);
        assert_eq!(CycleReport::from_graph(&graph), None);
    }

    #[test]
    fn mutual_pair_reports_both_edges() {
        let graph = drained(&[("a", "b"), ("b", "a")]);
        let report = CycleReport::from_graph(&graph).expect("cycle");
        assert_eq!(report.edges, [(n("a"), n("b")), (n("b"), n("a"))]);
        assert_eq!(report.cycles, [vec![n("a"), n("b")]]);
        assert!(report.blocked().is_empty());
    }

    #[test]
    fn downstream_nodes_are_blocked_not_cyclic() {
        let graph = drained(&[("a", "b"), ("b", "c"), ("c", "a"), ("c", "d")]);
        let report = CycleReport::from_graph(&graph).expect("cycle");
        assert_eq!(report.cycles, [vec![n("a"), n("b"), n("c")]]);
        assert_eq!(report.blocked(), [n("d")]);
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let graph = drained(&[("x", "x")]);
        let report = CycleReport::from_graph(&graph).expect("cycle");
        assert_eq!(report.cycles, [vec![n("x")]]);
    }

    #[test]
    fn display_names_edges() {
        let graph = drained(&[("a", "b"), ("b", "a")]);
        let rendered = CycleReport::from_graph(&graph).expect("cycle").to_string();
        assert!(rendered.starts_with("dependency cycle detected:"));
        assert!(rendered.contains("[a, b]"));
        assert!(rendered.contains("a -> b, b -> a"));
    }
}

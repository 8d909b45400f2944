//! Incremental topological ordering store.
//!
//! # Overview
//!
//! [`DepGraph`] runs Kahn's algorithm online: edges may arrive in any order,
//! from any number of sources, before the first node is popped. Instead of a
//! single up-front in-degree pass, the set of *ready* nodes is maintained as
//! each edge is absorbed.
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A is a prerequisite of B": A is emitted strictly
//! before B. `before: B` declared by A and `after: A` declared by B both
//! produce the same edge, and it is recorded once.
//!
//! ## Node Classes
//!
//! - **ready**: touched by at least one edge, no unresolved prerequisites.
//! - **blocked**: has at least one unresolved prerequisite.
//! - **free**: declared, but never touched by any edge.
//!
//! Popping always drains `ready` before `free`, and picks the
//! lexicographically smallest member of whichever set it draws from. The
//! output therefore depends only on the set of declared edges and free
//! names, never on arrival order.
//!
//! ## Cycles
//!
//! Edges are never rejected. Nodes on a cycle simply never become ready;
//! once iteration returns `None`, [`DepGraph::has_unresolved_edges`] reports
//! whether anything was left behind and [`DepGraph::residual_edges`] says
//! what.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::error::OrderError;
use crate::graph::cycles::CycleReport;
use crate::relation::{Node, Relation};

// ---------------------------------------------------------------------------
// DepGraph
// ---------------------------------------------------------------------------

/// Dependency graph with an online ready set.
///
/// `forward` and `reverse` are kept as exact duals: `b ∈ forward[a]` iff
/// `a ∈ reverse[b]`. `reverse` entries are dropped as soon as they empty.
#[derive(Debug, Clone, Default)]
pub struct DepGraph {
    /// prerequisite → dependents, in first-insertion order.
    forward: HashMap<Node, Vec<Node>>,
    /// dependent → unresolved prerequisites.
    reverse: HashMap<Node, HashSet<Node>>,
    ready: BTreeSet<Node>,
    free: BTreeSet<Node>,
}

impl DepGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `name` exists with no ordering constraint.
    ///
    /// No-op if `name` is already constrained by an edge in either
    /// direction; an edge always wins over a free declaration regardless of
    /// which arrived first. Idempotent.
    pub fn declare_free(&mut self, name: Node) {
        if self.is_constrained(&name) {
            return;
        }
        self.free.insert(name);
    }

    /// Absorb a relation declared by `name`.
    pub fn declare_relation(&mut self, name: &Node, relation: &Relation) {
        let (prerequisite, dependent) = relation.edge(name);
        self.add_edge(prerequisite, dependent);
    }

    /// Insert the edge `prerequisite → dependent`.
    ///
    /// Both endpoints leave the free set for good. The dependent loses
    /// readiness; the prerequisite is ready iff it has no unresolved
    /// prerequisite of its own at this moment.
    pub fn add_edge(&mut self, prerequisite: Node, dependent: Node) {
        self.free.remove(&prerequisite);
        self.free.remove(&dependent);

        let dependents = self.forward.entry(prerequisite.clone()).or_default();
        if !dependents.contains(&dependent) {
            dependents.push(dependent.clone());
        }
        self.reverse
            .entry(dependent.clone())
            .or_default()
            .insert(prerequisite.clone());

        self.ready.remove(&dependent);
        if self.reverse.get(&prerequisite).is_none_or(HashSet::is_empty) {
            self.ready.insert(prerequisite);
        } else {
            self.ready.remove(&prerequisite);
        }
    }

    /// True if any edge has touched `name` and it has not been popped yet.
    fn is_constrained(&self, name: &Node) -> bool {
        self.forward.contains_key(name) || self.reverse.contains_key(name) || self.ready.contains(name)
    }

    /// Remove a popped ready node and release its dependents.
    fn release(&mut self, node: &Node) {
        self.ready.remove(node);
        self.free.remove(node);

        let Some(dependents) = self.forward.remove(node) else {
            return;
        };
        for dependent in dependents {
            let Some(prerequisites) = self.reverse.get_mut(&dependent) else {
                continue;
            };
            prerequisites.remove(node);
            if prerequisites.is_empty() {
                self.reverse.remove(&dependent);
                self.ready.insert(dependent);
            }
        }
    }

    /// True iff edges remain recorded. Meaningful once iteration has
    /// returned `None`: leftovers at that point can only be a cycle (or
    /// nodes stuck behind one).
    #[must_use]
    pub fn has_unresolved_edges(&self) -> bool {
        !self.forward.is_empty()
    }

    /// Remaining forward adjacency, sorted for stable reporting.
    #[must_use]
    pub fn residual_edges(&self) -> BTreeMap<Node, Vec<Node>> {
        self.forward
            .iter()
            .map(|(prerequisite, dependents)| {
                let mut dependents = dependents.clone();
                dependents.sort_unstable();
                (prerequisite.clone(), dependents)
            })
            .collect()
    }

    /// Number of nodes currently eligible through the constrained path.
    #[must_use]
    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }

    /// Number of unconstrained nodes still waiting to be emitted.
    #[must_use]
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Number of edges currently recorded.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.forward.values().map(Vec::len).sum()
    }

    /// Drain every remaining node in order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Cycle`] if edges are left over once nothing
    /// else can be emitted. The nodes emitted before that point are lost;
    /// callers that want the partial prefix should iterate manually.
    pub fn into_order(mut self) -> Result<Vec<Node>, OrderError> {
        let order: Vec<Node> = self.by_ref().collect();
        match CycleReport::from_graph(&self) {
            Some(report) => Err(OrderError::Cycle(report)),
            None => Ok(order),
        }
    }
}

impl Iterator for DepGraph {
    type Item = Node;

    /// Pop the next node: smallest ready node if any, otherwise smallest
    /// free node, otherwise `None`.
    fn next(&mut self) -> Option<Node> {
        if let Some(node) = self.ready.pop_first() {
            self.release(&node);
            return Some(node);
        }
        self.free.pop_first()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

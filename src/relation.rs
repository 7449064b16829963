//! Cross-value dependency wiring.
//!
//! Every constraint attachment records one relation per dependency:
//! `dependency -> dependent`, tagged with the owning constraint. The graph is
//! bookkeeping, not the propagation mechanism (change notification drives
//! cascades); it exists for introspection and for the opt-in setup-time
//! [`validate`](RelationGraph::validate) pass. Nothing on the write path
//! walks or checks it — the acyclicity of the wiring is a data-model
//! invariant the host upholds.

use crate::constraint::ConstraintId;
use crate::error::StatError;
use crate::value::ValueId;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// One recorded dependency edge: a change to `dependency` re-triggers
/// recalculation of `dependent`, on behalf of `constraint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Relation {
    pub dependency: ValueId,
    pub dependent: ValueId,
    pub constraint: ConstraintId,
}

#[derive(Default)]
pub(crate) struct RelationGraph {
    graph: DiGraph<ValueId, ConstraintId>,
    nodes: HashMap<ValueId, NodeIndex>,
}

impl RelationGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, id: ValueId) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(&id) {
            idx
        } else {
            let idx = self.graph.add_node(id);
            self.nodes.insert(id, idx);
            idx
        }
    }

    /// Record `dependency -> dependent` on behalf of `constraint`.
    pub(crate) fn link(&mut self, dependency: ValueId, dependent: ValueId, constraint: ConstraintId) {
        let from = self.node(dependency);
        let to = self.node(dependent);
        self.graph.add_edge(from, to, constraint);
    }

    /// Drop every relation recorded for `constraint`.
    pub(crate) fn unlink(&mut self, constraint: ConstraintId) {
        // Edge removal invalidates indices, so re-scan after each removal.
        while let Some(edge) = self
            .graph
            .edge_indices()
            .find(|&e| self.graph[e] == constraint)
        {
            self.graph.remove_edge(edge);
        }
    }

    /// Values whose recalculation is triggered by a change to `id`, in
    /// attachment order, deduplicated.
    pub(crate) fn dependents_of(&self, id: ValueId) -> Vec<ValueId> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Values read by the constraints protecting `id`, in attachment order,
    /// deduplicated.
    pub(crate) fn dependencies_of(&self, id: ValueId) -> Vec<ValueId> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: ValueId, direction: Direction) -> Vec<ValueId> {
        let Some(&idx) = self.nodes.get(&id) else {
            return Vec::new();
        };
        // petgraph iterates newest edge first; restore attachment order.
        let mut raw: Vec<ValueId> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n])
            .collect();
        raw.reverse();
        let mut out = Vec::new();
        for v in raw {
            if !out.contains(&v) {
                out.push(v);
            }
        }
        out
    }

    /// Every recorded relation, in attachment order.
    pub(crate) fn relations(&self) -> Vec<Relation> {
        self.graph
            .edge_references()
            .map(|e| Relation {
                dependency: self.graph[e.source()],
                dependent: self.graph[e.target()],
                constraint: *e.weight(),
            })
            .collect()
    }

    /// Walk the whole graph and report the first cycle found.
    pub(crate) fn validate(&self) -> Result<(), StatError> {
        let mut visited = HashSet::new();
        let mut on_stack = HashSet::new();
        let mut path = Vec::new();
        for node in self.graph.node_indices() {
            if !visited.contains(&node) {
                if let Some(err) = self.dfs(node, &mut visited, &mut on_stack, &mut path) {
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    fn dfs(
        &self,
        node: NodeIndex,
        visited: &mut HashSet<NodeIndex>,
        on_stack: &mut HashSet<NodeIndex>,
        path: &mut Vec<ValueId>,
    ) -> Option<StatError> {
        visited.insert(node);
        on_stack.insert(node);
        path.push(self.graph[node]);

        for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
            if !visited.contains(&next) {
                if let Some(err) = self.dfs(next, visited, on_stack, path) {
                    return Some(err);
                }
            } else if on_stack.contains(&next) {
                let entry = self.graph[next];
                let start = path.iter().position(|v| *v == entry).unwrap_or(0);
                let mut cycle = path[start..].to_vec();
                cycle.push(entry);
                return Some(StatError::Cycle { path: cycle });
            }
        }

        on_stack.remove(&node);
        path.pop();
        None
    }
}

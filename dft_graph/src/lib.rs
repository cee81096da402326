// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

#![deny(warnings)]
#![deny(clippy::all, clippy::default_trait_access)]
#![allow(
    clippy::len_without_is_empty,
    clippy::redundant_field_names,
    clippy::too_many_arguments,
    clippy::new_without_default,
    clippy::new_ret_no_self,
    clippy::mutex_atomic
)]

mod error;
mod node;

pub use crate::error::GraphError;
pub use crate::node::{
    BasicEvent, CalculationMode, Gate, GateKind, Node, NodeKind, RepairUnitKind,
};

use fnv::FnvHashMap;

/// A stable index into a `Dft`'s node arena. Never reused across rewrite passes: once a node
/// is logically removed (reachability pruning), its `NodeId` simply no longer appears in any
/// child list or `nodes()` iteration, but the slot is not recycled.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Debug)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

///
/// The in-memory dynamic fault tree: an arena of `Node`s, reachable from a single top node via
/// the child relation. The graph is the single owner of its nodes; gates refer to children by
/// `NodeId`, not by direct reference, which keeps rewrite passes (which replace and remove
/// nodes) from needing to fix up borrows.
///
/// Before the rewriter runs, a `Dft` may be incomplete (no top node, unreachable nodes present,
/// derived flags unset). After rewriting, §3's invariants all hold and the graph is frozen:
/// `dft_rewriter` does not mutate it further, and `node_automata`/`sync_composer` only read it.
///
#[derive(Clone, Debug, Default)]
pub struct Dft {
    nodes: Vec<Node>,
    tombstoned: Vec<bool>,
    by_name: FnvHashMap<String, NodeId>,
    top: Option<NodeId>,
}

impl Dft {
    pub fn new() -> Dft {
        Dft {
            nodes: Vec::new(),
            tombstoned: Vec::new(),
            by_name: FnvHashMap::default(),
            top: None,
        }
    }

    /// Adds a node, returning its `NodeId`. Fails if `name` is already taken (invariant 5: no
    /// two nodes, in particular no two BEs, share a name).
    pub fn add_node(&mut self, name: String, kind: NodeKind) -> Result<NodeId, GraphError> {
        if self.by_name.contains_key(&name) {
            return Err(GraphError::DuplicateName(name));
        }
        let id = NodeId(self.nodes.len() as u32);
        self.by_name.insert(name.clone(), id);
        self.nodes.push(Node::new(name, kind));
        self.tombstoned.push(false);
        Ok(id)
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied().filter(|id| !self.is_tombstoned(*id))
    }

    pub fn set_top(&mut self, id: NodeId) {
        self.top = Some(id);
    }

    pub fn top(&self) -> Option<NodeId> {
        self.top
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    fn is_tombstoned(&self, id: NodeId) -> bool {
        self.tombstoned[id.index()]
    }

    /// All live nodes, in declaration order. Tombstoned (pruned) nodes are omitted.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len())
            .map(|i| NodeId(i as u32))
            .filter(move |id| !self.is_tombstoned(*id))
    }

    pub fn len(&self) -> usize {
        self.nodes().count()
    }

    /// Logically removes a node: it stops appearing in `nodes()`, but its `NodeId` remains
    /// valid to dereference (so that callers mid-iteration don't observe a shifted arena).
    /// Callers are responsible for first removing any remaining references to it from child
    /// lists and parent lists.
    pub fn tombstone(&mut self, id: NodeId) {
        self.tombstoned[id.index()] = true;
    }

    /// Recomputes every node's `parents` list from scratch by walking all live nodes' `children`.
    /// Must be called after any pass that mutates child lists, since `parents` is a derived,
    /// lookup-only back-edge (Design Notes §9: "do not carry raw back-pointers across rewrite
    /// passes").
    pub fn recompute_parents(&mut self) {
        for id in self.nodes() {
            self.node_mut(id).parents.clear();
        }
        let edges: Vec<(NodeId, NodeId)> = self
            .nodes()
            .flat_map(|parent| {
                self.node(parent)
                    .children()
                    .to_vec()
                    .into_iter()
                    .map(move |child| (parent, child))
            })
            .collect();
        for (parent, child) in edges {
            self.node_mut(child).parents.push(parent);
        }
    }

    /// The set of nodes reachable from `top()` via the child relation, plus (per invariant 2)
    /// any node reachable by following an FDEP's depender edges backwards from an already-
    /// reachable depender. Used both by the reachability-prune rewrite pass and by the
    /// structural-invariant tests that check it held after rewriting.
    pub fn reachable_from_top(&self) -> Result<fnv::FnvHashSet<NodeId>, GraphError> {
        let top = self.top.ok_or(GraphError::NoTopNode)?;
        let mut seen = fnv::FnvHashSet::default();
        let mut worklist = std::collections::VecDeque::new();
        worklist.push_back(top);
        seen.insert(top);
        while let Some(id) = worklist.pop_front() {
            for &child in self.node(id).children() {
                if seen.insert(child) {
                    worklist.push_back(child);
                }
            }
            if let NodeKind::Gate(gate) = &self.node(id).kind {
                if matches!(gate.kind, GateKind::Fdep) {
                    for &depender in gate.children.iter().skip(1) {
                        if seen.insert(depender) {
                            worklist.push_back(depender);
                        }
                    }
                }
            }
        }
        Ok(seen)
    }

    /// Checks invariants 1 and 2 of §3: every child reference resolves to a live node, and
    /// every live node is reachable from the top node. Accumulates every violation found rather
    /// than stopping at the first, per §7's policy for validation/structural errors.
    pub fn validate(&self) -> Result<(), Vec<GraphError>> {
        let mut errors = Vec::new();

        for id in self.nodes() {
            for &child in self.node(id).children() {
                if child.index() >= self.nodes.len() || self.is_tombstoned(child) {
                    errors.push(GraphError::UnknownName(self.node(id).name.clone()));
                }
            }
        }

        match self.reachable_from_top() {
            Ok(reachable) => {
                for id in self.nodes() {
                    if !reachable.contains(&id) {
                        errors.push(GraphError::UnreachableNode(self.node(id).name.clone()));
                    }
                }
            }
            Err(e) => errors.push(e),
        }

        if let Some(cycle_root) = self.find_cycle() {
            errors.push(GraphError::CyclicChildRelation(
                self.node(cycle_root).name.clone(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// DFS cycle check over the child relation only (FDEP depender edges are a side-channel,
    /// never part of activation flow, and are exempt from the no-cycles rule per invariant 7).
    fn find_cycle(&self) -> Option<NodeId> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }
        let mut marks: FnvHashMap<NodeId, Mark> = FnvHashMap::default();

        fn visit(
            dft: &Dft,
            id: NodeId,
            marks: &mut FnvHashMap<NodeId, Mark>,
        ) -> Option<NodeId> {
            match marks.get(&id) {
                Some(Mark::Done) => return None,
                Some(Mark::Visiting) => return Some(id),
                None => {}
            }
            marks.insert(id, Mark::Visiting);
            for &child in dft.node(id).children() {
                if let Some(cycle) = visit(dft, child, marks) {
                    return Some(cycle);
                }
            }
            marks.insert(id, Mark::Done);
            None
        }

        for id in self.nodes() {
            if let Some(cycle) = visit(self, id, &mut marks) {
                return Some(cycle);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests;

// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::collections::VecDeque;

use fnv::FnvHashMap as HashMap;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;

use crate::node::Node;

pub type StateId = petgraph::stable_graph::NodeIndex<u32>;

///
/// The reachable portion of a (potentially infinite-shaped, but in practice always finite for
/// the node shapes this workspace generates) labeled transition system, explored breadth-first
/// from a single initial state.
///
/// States are hash-consed: `explore` never creates two `StateId`s for states that compare equal.
/// Exploration uses an explicit worklist rather than recursion, since some shapes (WSP gates with
/// many children) have state spaces deeper than is safe to explore on the call stack.
///
pub struct Automaton<N: Node> {
    graph: StableDiGraph<N, N::Label, u32>,
    index: HashMap<N, StateId>,
    initial: StateId,
}

impl<N: Node> Automaton<N> {
    pub fn explore(initial: N) -> Automaton<N> {
        let mut graph = StableDiGraph::default();
        let mut index: HashMap<N, StateId> = HashMap::default();

        let initial_id = graph.add_node(initial.clone());
        index.insert(initial.clone(), initial_id);

        let mut worklist: VecDeque<StateId> = VecDeque::new();
        worklist.push_back(initial_id);

        while let Some(id) = worklist.pop_front() {
            let state = graph[id].clone();
            for (label, successor) in state.successors() {
                let successor_id = if let Some(&existing) = index.get(&successor) {
                    existing
                } else {
                    let new_id = graph.add_node(successor.clone());
                    index.insert(successor, new_id);
                    worklist.push_back(new_id);
                    new_id
                };
                graph.add_edge(id, successor_id, label);
            }
        }

        Automaton {
            graph,
            index,
            initial: initial_id,
        }
    }

    pub fn initial(&self) -> StateId {
        self.initial
    }

    pub fn state(&self, id: StateId) -> &N {
        &self.graph[id]
    }

    pub fn state_id(&self, state: &N) -> Option<StateId> {
        self.index.get(state).copied()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.graph.node_indices()
    }

    ///
    /// The full transition relation as `(src, label, dst)` triples. Callers that need a
    /// reproducible byte-level serialization should sort this themselves (the exploration order
    /// is deterministic given a deterministic `Node::successors`, but the set returned here makes
    /// no ordering guarantee beyond what petgraph's edge iteration happens to produce).
    ///
    pub fn transitions(&self) -> impl Iterator<Item = (StateId, &N::Label, StateId)> + '_ {
        self.graph
            .edge_references()
            .map(|edge| (edge.source(), edge.weight(), edge.target()))
    }

    ///
    /// True if there exists a reachable state `s` and a reachable edge `s -[label]-> t` such that
    /// `predicate(label)` holds. Used to check automaton property 6/7 in tests: that an
    /// `IMPOSSIBLE`-labeled sink is reachable only via an `IMPOSSIBLE` edge, or that some signal
    /// is enabled in the initial state.
    pub fn has_edge_matching(&self, predicate: impl Fn(&N::Label) -> bool) -> bool {
        self.transitions().any(|(_, label, _)| predicate(label))
    }
}

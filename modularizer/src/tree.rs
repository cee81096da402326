// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::collections::VecDeque;

use dft_graph::{Dft, GateKind, NodeId, NodeKind};
use fnv::{FnvHashMap, FnvHashSet};

use crate::interval::{and_combine, or_combine, vot_combine, Interval};

/// The result of modularization: a tree of analytic combinators over leaf modules that must be
/// driven through an external checker. A bare `Leaf` means no analytic decomposition applied,
/// either because the node isn't an AND/OR/VOT gate or because its subtree fails the
/// independent-module test.
#[derive(Clone, Debug)]
pub enum ModuleTree {
    Leaf(NodeId),
    And(Vec<ModuleTree>),
    Or(Vec<ModuleTree>),
    Vot(u32, Vec<ModuleTree>),
}

impl ModuleTree {
    /// All leaf nodes needing an actual checker invocation, in tree order.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<NodeId>) {
        match self {
            ModuleTree::Leaf(id) => out.push(*id),
            ModuleTree::And(children) | ModuleTree::Or(children) | ModuleTree::Vot(_, children) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// Post-order `(node-or-combinator, child-count)` pairs, matching the linearised
    /// serialization a driver can replay without holding the tree in memory.
    pub fn linearize(&self) -> Vec<(LinearNode, usize)> {
        let mut out = Vec::new();
        self.linearize_into(&mut out);
        out
    }

    fn linearize_into(&self, out: &mut Vec<(LinearNode, usize)>) {
        match self {
            ModuleTree::Leaf(id) => out.push((LinearNode::Leaf(*id), 0)),
            ModuleTree::And(children) => {
                for child in children {
                    child.linearize_into(out);
                }
                out.push((LinearNode::And, children.len()));
            }
            ModuleTree::Or(children) => {
                for child in children {
                    child.linearize_into(out);
                }
                out.push((LinearNode::Or, children.len()));
            }
            ModuleTree::Vot(k, children) => {
                for child in children {
                    child.linearize_into(out);
                }
                out.push((LinearNode::Vot(*k), children.len()));
            }
        }
    }

    /// Combines leaf results (one interval per leaf, supplied by the driver after invoking the
    /// checker on each) bottom-up into a single interval for the whole tree.
    pub fn combine(&self, leaf_values: &FnvHashMap<NodeId, Interval>) -> Interval {
        match self {
            ModuleTree::Leaf(id) => leaf_values[id],
            ModuleTree::And(children) => {
                and_combine(&children.iter().map(|c| c.combine(leaf_values)).collect::<Vec<_>>())
            }
            ModuleTree::Or(children) => {
                or_combine(&children.iter().map(|c| c.combine(leaf_values)).collect::<Vec<_>>())
            }
            ModuleTree::Vot(k, children) => vot_combine(
                *k,
                &children.iter().map(|c| c.combine(leaf_values)).collect::<Vec<_>>(),
            ),
        }
    }
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum LinearNode {
    Leaf(NodeId),
    And,
    Or,
    Vot(u32),
}

/// Builds the module tree for `dft`, rooted at its top node.
pub fn modularize(dft: &Dft) -> ModuleTree {
    let top = dft.top().expect("dft must have a top node to modularize");
    modularize_node(dft, top)
}

fn modularize_node(dft: &Dft, id: NodeId) -> ModuleTree {
    if let NodeKind::Gate(gate) = &dft.node(id).kind {
        let decomposable = matches!(gate.kind, GateKind::And | GateKind::Or | GateKind::Vot { .. });
        if decomposable && is_independent_module(dft, id) {
            let children: Vec<ModuleTree> =
                gate.children.iter().map(|&c| modularize_node(dft, c)).collect();
            return match gate.kind {
                GateKind::And => ModuleTree::And(children),
                GateKind::Or => ModuleTree::Or(children),
                GateKind::Vot { k } => ModuleTree::Vot(k, children),
                _ => unreachable!(),
            };
        }
    }
    ModuleTree::Leaf(id)
}

fn subtree_nodes(dft: &Dft, root: NodeId) -> FnvHashSet<NodeId> {
    let mut seen = FnvHashSet::default();
    let mut queue = VecDeque::new();
    queue.push_back(root);
    seen.insert(root);
    while let Some(id) = queue.pop_front() {
        for &child in dft.node(id).children() {
            if seen.insert(child) {
                queue.push_back(child);
            }
        }
    }
    seen
}

/// (a) every non-root node in the subtree has exactly one parent, and that parent is also in
/// the subtree; (b) no FDEP edge crosses the boundary in either direction; (c) conservatively,
/// no node in the subtree lies under a repair/inspection module at all (a module whose repair
/// or inspection coupling might reach outside the subtree is never treated as independent,
/// rather than trying to prove the coupling is itself fully contained).
fn is_independent_module(dft: &Dft, root: NodeId) -> bool {
    let subtree = subtree_nodes(dft, root);

    for &id in &subtree {
        let node = dft.node(id);
        if id != root {
            if node.parents.len() != 1 || !subtree.contains(&node.parents[0]) {
                return false;
            }
        }
        if node.has_repair_module || node.has_inspection_module {
            return false;
        }
        if let NodeKind::Gate(gate) = &node.kind {
            if matches!(gate.kind, GateKind::Fdep) && gate.children.iter().any(|c| !subtree.contains(c)) {
                return false;
            }
        }
    }

    for id in dft.nodes() {
        if subtree.contains(&id) {
            continue;
        }
        if let NodeKind::Gate(gate) = &dft.node(id).kind {
            if matches!(gate.kind, GateKind::Fdep)
                && gate.children.iter().skip(1).any(|d| subtree.contains(d))
            {
                return false;
            }
        }
    }

    true
}

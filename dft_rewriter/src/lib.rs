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

//! The fixed sequence of idempotent passes that turns a freshly-lowered `Dft` into the frozen
//! graph that `node_automata` and `sync_composer` read. Passes run strictly in the order listed
//! in `rewrite`; each one reads invariants the previous passes established and never guesses at
//! ambiguous attribute combinations, which lowering is responsible for rejecting up front.

mod error;

use std::collections::VecDeque;

use dft_graph::{CalculationMode, Dft, GateKind, NodeId, NodeKind};
use fnv::FnvHashSet;
use log::debug;

pub use crate::error::RewriteError;

/// Runs all six rewrite passes against `dft`, applying `evidence` (basic events forced failed at
/// startup) during the first one. Accumulates every error found across every pass rather than
/// stopping at the first, per the error-handling policy shared with `dft_graph::Dft::validate`.
pub fn rewrite(dft: &mut Dft, evidence: &[String]) -> Result<(), Vec<RewriteError>> {
    let mut errors = Vec::new();

    validate_basic_event_attributes(dft, &mut errors);
    if !errors.is_empty() {
        return Err(errors);
    }

    apply_evidence(dft, evidence, &mut errors);
    if !errors.is_empty() {
        return Err(errors);
    }

    lift_seq_to_sand(dft, &mut errors);
    if !errors.is_empty() {
        return Err(errors);
    }

    dft.recompute_parents();
    prune_unreachable(dft);
    dft.recompute_parents();

    propagate_repair_info(dft);
    propagate_always_active(dft, &mut errors);
    if !errors.is_empty() {
        return Err(errors);
    }

    cleanup_redundant_fdep_edges(dft);
    dft.recompute_parents();

    if let Err(graph_errors) = dft.validate() {
        errors.extend(graph_errors.into_iter().map(RewriteError::from));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Pass 0: rejects basic events whose `lambda`/`prob`/`dorm`/`mu` fields are ambiguous. A BE
/// that sets both a nonzero `lambda` and a nonzero `prob` must disambiguate via
/// `calculation_mode`; one that sets both `dorm` and `mu` never can, since the two encode
/// mutually exclusive dormancy models. An event with neither `dorm` nor `mu` set is not an
/// error — a BE with no dormant rate at all is a legitimate, if degenerate, model.
fn validate_basic_event_attributes(dft: &Dft, errors: &mut Vec<RewriteError>) {
    for id in dft.nodes() {
        let NodeKind::BasicEvent(be) = &dft.node(id).kind else {
            continue;
        };
        if be.lambda != 0.0 && be.prob != 0.0 && be.calculation_mode == CalculationMode::Undefined {
            errors.push(RewriteError::AmbiguousCalculationMode(dft.node(id).name.clone()));
        }
        if be.dorm != 0.0 && be.mu != 0.0 {
            errors.push(RewriteError::AmbiguousDormancy(dft.node(id).name.clone()));
        }
    }
}

/// Pass 1: for each BE name in `evidence`, sets `failed_at_startup = true`.
fn apply_evidence(dft: &mut Dft, evidence: &[String], errors: &mut Vec<RewriteError>) {
    for name in evidence {
        match dft.lookup_by_name(name) {
            None => errors.push(RewriteError::UnknownName(name.clone())),
            Some(id) => {
                if dft.node(id).is_basic_event() {
                    dft.node_mut(id).failed_at_startup = true;
                } else {
                    errors.push(RewriteError::EvidenceOnGate(name.clone()));
                }
            }
        }
    }
}

/// Pass 2: a SEQ gate whose children are each an independent BE subtree (sole parent is this
/// SEQ, and the child is itself a BE) becomes a SAND gate in place, with every affected child's
/// dormancy factors zeroed (they are now cold spares in sequence, not independently dormant).
/// Requires `dft`'s parent lists to already be accurate (set by the caller before this pass, or
/// by construction for a freshly-lowered graph).
fn lift_seq_to_sand(dft: &mut Dft, errors: &mut Vec<RewriteError>) {
    dft.recompute_parents();
    let seq_gates: Vec<NodeId> = dft
        .nodes()
        .filter(|&id| {
            matches!(
                &dft.node(id).kind,
                NodeKind::Gate(g) if matches!(g.kind, GateKind::Seq)
            )
        })
        .collect();

    for seq_id in seq_gates {
        let children = dft.node(seq_id).children().to_vec();
        let independent = children.iter().all(|&child| {
            let node = dft.node(child);
            node.is_basic_event() && node.parents == vec![seq_id]
        });
        if !independent {
            errors.push(RewriteError::NonIndependentSeqChild(
                dft.node(seq_id).name.clone(),
            ));
            continue;
        }
        for &child in &children {
            if let NodeKind::BasicEvent(be) = &mut dft.node_mut(child).kind {
                be.dorm = 0.0;
                be.mu = 0.0;
            }
        }
        if let NodeKind::Gate(gate) = &mut dft.node_mut(seq_id).kind {
            gate.kind = GateKind::Sand;
        }
        debug!("lifted SEQ `{}` to SAND", dft.node(seq_id).name);
    }
}

/// Pass 3: forward closure from the top over the child relation, plus FDEP depender backward
/// edges; everything else is tombstoned.
fn prune_unreachable(dft: &mut Dft) {
    let reachable = match dft.reachable_from_top() {
        Ok(set) => set,
        Err(_) => return,
    };
    let to_remove: Vec<NodeId> = dft.nodes().filter(|id| !reachable.contains(id)).collect();
    for id in to_remove {
        debug!("pruning unreachable node `{}`", dft.node(id).name);
        dft.tombstone(id);
    }
}

/// Pass 4: `is_repairable` bottom-up (a BE with `repair > 0`, or a gate with any repairable
/// child); `has_repair_module`/`has_inspection_module` top-down ancestor walk (true under a
/// RepairUnit/Inspection ancestor, not counting the module gate itself).
fn propagate_repair_info(dft: &mut Dft) {
    let Some(top) = dft.top() else { return };

    let post_order = post_order_from(dft, top);
    for id in post_order {
        let repairable = match &dft.node(id).kind {
            NodeKind::BasicEvent(be) => be.repair > 0.0,
            NodeKind::Gate(gate) => gate
                .children
                .iter()
                .any(|&child| dft.node(child).is_repairable),
        };
        dft.node_mut(id).is_repairable = repairable;
    }

    let mut queue = VecDeque::new();
    queue.push_back(top);
    while let Some(id) = queue.pop_front() {
        let (has_repair_module, has_inspection_module) = {
            let node = dft.node(id);
            (node.has_repair_module, node.has_inspection_module)
        };
        let gate_kind = dft.node(id).kind.as_gate().map(|g| g.kind.clone());
        let children = dft.node(id).children().to_vec();
        for &child in &children {
            let child_repair = has_repair_module
                || matches!(gate_kind, Some(GateKind::RepairUnit(_)) | Some(GateKind::Replacement));
            let child_inspection =
                has_inspection_module || matches!(gate_kind, Some(GateKind::Inspection { .. }));
            dft.node_mut(child).has_repair_module = child_repair;
            dft.node_mut(child).has_inspection_module = child_inspection;
            queue.push_back(child);
        }
    }
}

/// Pass 5: top-down. The top node is always-active by definition; a child inherits its parent's
/// always-active flag unless the edge crosses a dynamic activator (WSP — all children; PAND/SAND
/// — all children, since the trigger side's ordering is itself dynamic; FDEP — all dependers,
/// but not the trigger).
fn propagate_always_active(dft: &mut Dft, errors: &mut Vec<RewriteError>) {
    let Some(top) = dft.top() else { return };

    // A WSP primary pre-flagged always-active by lowering conflicts with the claim protocol
    // (it can never be deactivated to free the resource), and must be caught before this pass
    // overwrites the flag.
    let wsp_gates: Vec<NodeId> = dft
        .nodes()
        .filter(|&id| matches!(&dft.node(id).kind, NodeKind::Gate(g) if matches!(g.kind, GateKind::Wsp)))
        .collect();
    for wsp_id in wsp_gates {
        if let Some(&primary) = dft.node(wsp_id).children().first() {
            if dft.node(primary).is_always_active {
                errors.push(RewriteError::AlwaysActiveWspPrimary(
                    dft.node(wsp_id).name.clone(),
                ));
            }
        }
    }
    if !errors.is_empty() {
        return;
    }

    dft.node_mut(top).is_always_active = true;

    let mut queue = VecDeque::new();
    queue.push_back(top);
    while let Some(id) = queue.pop_front() {
        let parent_active = dft.node(id).is_always_active;
        let gate = dft.node(id).kind.as_gate().cloned();
        let Some(gate) = gate else { continue };
        for (i, &child) in gate.children.iter().enumerate() {
            let child_active = match gate.kind {
                GateKind::Wsp | GateKind::Pand | GateKind::Sand => false,
                GateKind::Fdep => parent_active && i == 0,
                _ => parent_active,
            };
            dft.node_mut(child).is_always_active = child_active;
            queue.push_back(child);
        }
    }
}

/// Pass 6: a FDEP depender that is already a transitive child of the FDEP's own trigger gains
/// nothing from the explicit dependency edge, since it will fail whenever the trigger's subtree
/// does anyway; such edges are dropped.
fn cleanup_redundant_fdep_edges(dft: &mut Dft) {
    let fdep_gates: Vec<NodeId> = dft
        .nodes()
        .filter(|&id| {
            matches!(&dft.node(id).kind, NodeKind::Gate(g) if matches!(g.kind, GateKind::Fdep))
        })
        .collect();

    for fdep_id in fdep_gates {
        let children = dft.node(fdep_id).children().to_vec();
        let Some(&trigger) = children.first() else {
            continue;
        };
        let descendants = descendants_of(dft, trigger);
        let kept: Vec<NodeId> = std::iter::once(trigger)
            .chain(
                children
                    .into_iter()
                    .skip(1)
                    .filter(|depender| !descendants.contains(depender)),
            )
            .collect();
        if let NodeKind::Gate(gate) = &mut dft.node_mut(fdep_id).kind {
            gate.children = kept;
        }
    }
}

fn post_order_from(dft: &Dft, root: NodeId) -> Vec<NodeId> {
    let mut order = Vec::new();
    let mut seen = FnvHashSet::default();
    fn visit(dft: &Dft, id: NodeId, seen: &mut FnvHashSet<NodeId>, order: &mut Vec<NodeId>) {
        if !seen.insert(id) {
            return;
        }
        for &child in dft.node(id).children() {
            visit(dft, child, seen, order);
        }
        order.push(id);
    }
    visit(dft, root, &mut seen, &mut order);
    order
}

fn descendants_of(dft: &Dft, root: NodeId) -> FnvHashSet<NodeId> {
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
    seen.remove(&root);
    seen
}

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

//! Wires the per-node automata from `node_automata` into a single synchronization rule set,
//! following the rule patterns (broadcast, anycast, activation-with-dynamic-listeners, FDEP
//! fan-out, top-level activation/fail, impossible-visibility) and emits the parallel-composition
//! script a back end can feed to a model checker.

mod script;

use std::fmt;

use dft_graph::{Dft, GateKind, NodeId, NodeKind};
use node_automata::Signal;

pub use crate::script::composition_script;

/// A participant in the composed system: either the synthetic top-level activator, or a node of
/// the DFT (identified positionally, since the same shape-key artifact may back several nodes).
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum ActorId {
    Top,
    Node(NodeId),
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorId::Top => write!(f, "top"),
            ActorId::Node(id) => write!(f, "{id:?}"),
        }
    }
}

/// One synchronization rule: every listed actor must offer `label` simultaneously; the
/// composition emits `result` in its place. Actors not listed do not participate (a `_` in the
/// textual form).
#[derive(Clone, Debug)]
pub struct Rule {
    pub participants: Vec<(ActorId, Signal)>,
    pub result: Signal,
}

/// The full synchronization rule set for a frozen `Dft`, plus which result labels stay visible
/// after composition (the rest are hidden).
pub struct Composition {
    pub actors: Vec<ActorId>,
    pub rules: Vec<Rule>,
    pub visible: Vec<Signal>,
}

fn local_index(dft: &Dft, parent: NodeId, child: NodeId) -> usize {
    dft.node(parent)
        .children()
        .iter()
        .position(|&c| c == child)
        .expect("child must be a child of parent")
        + 1
}

/// Builds the rule set for `dft`, which must already be frozen (rewritten and validated).
pub fn compose(dft: &Dft) -> Composition {
    let top = dft.top().expect("dft must have a top node to compose");
    let mut rules = Vec::new();
    let mut visible = Vec::new();

    // Top-level activation: a synthetic Top actor activates the real top node, and every FDEP
    // gate also listens so its trigger side is activated even when it has no normal parent path
    // from the top (invariant 7: FDEP edges are a side-channel, not part of activation flow).
    let mut top_rule_participants = vec![
        (ActorId::Top, Signal::Activate { index: 0, sending: true }),
        (
            ActorId::Node(top),
            Signal::Activate { index: 0, sending: false },
        ),
    ];
    for id in dft.nodes() {
        if matches!(&dft.node(id).kind, NodeKind::Gate(g) if matches!(g.kind, GateKind::Fdep)) {
            top_rule_participants.push((
                ActorId::Node(id),
                Signal::Activate { index: 0, sending: false },
            ));
        }
    }
    rules.push(Rule {
        participants: top_rule_participants,
        result: Signal::Activate { index: 0, sending: true },
    });

    // The top node's own FAIL(0) is the single observable system-failure label.
    visible.push(Signal::Fail(0));

    for id in dft.nodes() {
        let node = dft.node(id);

        // Broadcast: a node's own FAIL(0)/ONLINE(0)/ACTIVATE/DEACTIVATE synchronizes with every
        // parent's view of it at that parent's local child index. FDEP parents are excluded
        // here, trigger and dependers alike: per invariant 7, FDEP never creates activation/
        // failure parent-child flow for its dependers, and the trigger's own FDEP relationship
        // (activation claim and its FAIL(0) feeding `trigger_failed`) is instead synthesized
        // explicitly in the `GateKind::Fdep` arm below, alongside the depender fan-out.
        let is_fdep = |parent: NodeId| {
            matches!(&dft.node(parent).kind, NodeKind::Gate(g) if matches!(g.kind, GateKind::Fdep))
        };
        let broadcast_parents: Vec<NodeId> =
            node.parents.iter().copied().filter(|&parent| !is_fdep(parent)).collect();
        if !broadcast_parents.is_empty() {
            for (local_label, parent_label_of) in [
                (Signal::Fail(0), Signal::Fail as fn(usize) -> Signal),
                (Signal::Online(0), Signal::Online as fn(usize) -> Signal),
            ] {
                let mut participants = vec![(ActorId::Node(id), local_label)];
                for &parent in &broadcast_parents {
                    let i = local_index(dft, parent, id);
                    participants.push((ActorId::Node(parent), parent_label_of(i)));
                }
                rules.push(Rule {
                    participants,
                    result: local_label,
                });
            }

            for &parent in &broadcast_parents {
                let i = local_index(dft, parent, id);
                rules.push(Rule {
                    participants: vec![
                        (
                            ActorId::Node(parent),
                            Signal::Activate { index: i, sending: true },
                        ),
                        (
                            ActorId::Node(id),
                            Signal::Activate { index: 0, sending: false },
                        ),
                    ],
                    result: Signal::Activate { index: i, sending: true },
                });
                rules.push(Rule {
                    participants: vec![
                        (
                            ActorId::Node(parent),
                            Signal::Deactivate { index: i, sending: true },
                        ),
                        (
                            ActorId::Node(id),
                            Signal::Deactivate { index: 0, sending: false },
                        ),
                    ],
                    result: Signal::Deactivate { index: i, sending: true },
                });
            }
        }

        // Impossible-visibility: a node's IMPOSSIBLE transition stays observable after
        // composition rather than being internalised by the hide set.
        if node.is_basic_event() {
            rules.push(Rule {
                participants: vec![(ActorId::Node(id), Signal::Impossible)],
                result: Signal::Impossible,
            });
        }

        if let NodeKind::Gate(gate) = &node.kind {
            match gate.kind {
                // Anycast: a repair unit services exactly one child index at a time; each
                // possible pairing is its own rule, and the model checker's own semantics (only
                // one synchronization fires per step) supplies the "one at a time" guarantee.
                GateKind::RepairUnit(_) | GateKind::Replacement => {
                    for (j, &child) in gate.children.iter().enumerate() {
                        let i = j + 1;
                        rules.push(anycast(
                            ActorId::Node(id),
                            Signal::Repair { index: i, to_ancestor: false },
                            ActorId::Node(child),
                            Signal::Repair { index: 0, to_ancestor: false },
                        ));
                        rules.push(anycast(
                            ActorId::Node(child),
                            Signal::Repair { index: 0, to_ancestor: true },
                            ActorId::Node(id),
                            Signal::Repair { index: i, to_ancestor: true },
                        ));
                        rules.push(anycast(
                            ActorId::Node(id),
                            Signal::Repairing(i),
                            ActorId::Node(child),
                            Signal::Repairing(0),
                        ));
                        rules.push(anycast(
                            ActorId::Node(child),
                            Signal::Repaired(0),
                            ActorId::Node(id),
                            Signal::Repaired(i),
                        ));
                    }
                }

                // Inspection: one-to-one sync between the module and each inspected child.
                GateKind::Inspection { .. } => {
                    for (j, &child) in gate.children.iter().enumerate() {
                        rules.push(anycast(
                            ActorId::Node(id),
                            Signal::Inspect(j + 1),
                            ActorId::Node(child),
                            Signal::Inspect(0),
                        ));
                    }
                }

                // FDEP fan-out: each depender's parents listen for the FDEP's own FAIL(j+2),
                // not for any signal originating at the depender, which never participates.
                GateKind::Fdep => {
                    let Some(&trigger) = gate.children.first() else {
                        continue;
                    };
                    rules.push(anycast(
                        ActorId::Node(id),
                        Signal::Activate { index: 1, sending: true },
                        ActorId::Node(trigger),
                        Signal::Activate { index: 0, sending: false },
                    ));
                    // The trigger's own FAIL(0) is what feeds `trigger_failed`; this is the one
                    // FDEP parent-child edge the broadcast loop above deliberately skips, since
                    // every other FDEP relationship (the dependers') must not flow through it.
                    rules.push(Rule {
                        participants: vec![
                            (ActorId::Node(trigger), Signal::Fail(0)),
                            (ActorId::Node(id), Signal::Fail(1)),
                        ],
                        result: Signal::Fail(0),
                    });
                    for (j, &depender) in gate.children.iter().enumerate().skip(1) {
                        let fail_label = Signal::Fail(j + 1);
                        let mut participants = vec![(ActorId::Node(id), fail_label)];
                        for &parent in &dft.node(depender).parents {
                            if parent == id {
                                continue;
                            }
                            let i = local_index(dft, parent, depender);
                            participants.push((ActorId::Node(parent), Signal::Fail(i)));
                        }
                        rules.push(Rule {
                            participants,
                            result: fail_label,
                        });
                    }
                }
                _ => {}
            }
        }
    }

    let actors = std::iter::once(ActorId::Top)
        .chain(dft.nodes().map(ActorId::Node))
        .collect();

    Composition { actors, rules, visible }
}

fn anycast(a: ActorId, a_label: Signal, b: ActorId, b_label: Signal) -> Rule {
    Rule {
        participants: vec![(a, a_label), (b, b_label)],
        result: a_label,
    }
}

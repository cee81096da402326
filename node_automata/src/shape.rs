// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::fmt;

use dft_graph::{Dft, GateKind, NodeId, NodeKind, RepairUnitKind};

///
/// The canonical identity under which an automaton artifact is cached: two nodes with the same
/// `ShapeKey` generate byte-identical LTS files, so the artifact cache keys on this rather than
/// on node name or `NodeId`.
///
/// Per `spec.md` §4.3: "type + arity + repairability + a handful of flags". Only the fields
/// that actually change which transitions are reachable belong here; anything else (the node's
/// name, its numeric rate constants) is a property of the *generated* artifact's instantiation,
/// not of its shape.
///
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum ShapeKey {
    BasicEvent {
        is_repairable: bool,
        is_always_active: bool,
        has_repair_module: bool,
        has_inspection_module: bool,
        can_definitely_fail: bool,
        /// Whether evidence forces this event to start in `DOWN`; two events differing only on
        /// this pick different initial states, so it must be part of the shape, not just folded
        /// into `can_definitely_fail`.
        starts_down: bool,
        phases: u32,
    },
    Voting {
        k: u32,
        n: u32,
        is_always_active: bool,
    },
    Pand {
        arity: u32,
        is_repairable: bool,
    },
    Wsp {
        arity: u32,
        is_always_active: bool,
    },
    Fdep {
        depender_count: u32,
        trigger_always_active: bool,
    },
    Inspection {
        arity: u32,
        phases: u32,
    },
    RepairUnit {
        kind: RepairUnitKind,
        arity: u32,
    },
}

impl fmt::Display for ShapeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeKey::BasicEvent {
                is_repairable,
                is_always_active,
                has_repair_module,
                has_inspection_module,
                can_definitely_fail,
                starts_down,
                phases,
            } => write!(
                f,
                "be_r{}_a{}_rm{}_im{}_cdf{}_sd{}_ph{}",
                *is_repairable as u8,
                *is_always_active as u8,
                *has_repair_module as u8,
                *has_inspection_module as u8,
                *can_definitely_fail as u8,
                *starts_down as u8,
                phases
            ),
            ShapeKey::Voting { k, n, is_always_active } => {
                write!(f, "vot_{k}_{n}_a{}", *is_always_active as u8)
            }
            ShapeKey::Pand { arity, is_repairable } => {
                write!(f, "pand_{arity}_r{}", *is_repairable as u8)
            }
            ShapeKey::Wsp { arity, is_always_active } => {
                write!(f, "wsp_{arity}_a{}", *is_always_active as u8)
            }
            ShapeKey::Fdep {
                depender_count,
                trigger_always_active,
            } => write!(
                f,
                "fdep_{depender_count}_a{}",
                *trigger_always_active as u8
            ),
            ShapeKey::Inspection { arity, phases } => write!(f, "insp_{arity}_{phases}"),
            ShapeKey::RepairUnit { kind, arity } => write!(f, "ru_{kind:?}_{arity}"),
        }
    }
}

/// Computes the `ShapeKey` for `node` within `dft`. Panics if `node` does not resolve, since
/// this is only ever called on nodes already validated by `dft_graph::Dft::validate`.
pub fn shape_key_for(dft: &Dft, node: NodeId) -> ShapeKey {
    let n = dft.node(node);
    match &n.kind {
        NodeKind::BasicEvent(be) => ShapeKey::BasicEvent {
            is_repairable: n.is_repairable,
            is_always_active: n.is_always_active,
            has_repair_module: n.has_repair_module,
            has_inspection_module: n.has_inspection_module,
            can_definitely_fail: be.lambda > 0.0 || be.prob > 0.0 || n.failed_at_startup,
            starts_down: n.failed_at_startup,
            phases: be.phases,
        },
        NodeKind::Gate(gate) => match &gate.kind {
            GateKind::And => ShapeKey::Voting {
                k: gate.children.len() as u32,
                n: gate.children.len() as u32,
                is_always_active: n.is_always_active,
            },
            GateKind::Or => ShapeKey::Voting {
                k: 1,
                n: gate.children.len() as u32,
                is_always_active: n.is_always_active,
            },
            GateKind::Vot { k } => ShapeKey::Voting {
                k: *k,
                n: gate.children.len() as u32,
                is_always_active: n.is_always_active,
            },
            GateKind::Pand | GateKind::Sand => ShapeKey::Pand {
                arity: gate.children.len() as u32,
                is_repairable: n.is_repairable,
            },
            GateKind::Wsp => ShapeKey::Wsp {
                arity: gate.children.len() as u32,
                is_always_active: n.is_always_active,
            },
            GateKind::Fdep => ShapeKey::Fdep {
                depender_count: gate.children.len().saturating_sub(1) as u32,
                trigger_always_active: gate
                    .children
                    .first()
                    .is_some_and(|&trigger| dft.node(trigger).is_always_active),
            },
            GateKind::Seq => {
                unreachable!("SEQ gates are lifted to SAND before shape keys are computed")
            }
            GateKind::Inspection { phases } => ShapeKey::Inspection {
                arity: gate.children.len() as u32,
                phases: *phases,
            },
            GateKind::RepairUnit(kind) => ShapeKey::RepairUnit {
                kind: *kind,
                arity: gate.children.len() as u32,
            },
            GateKind::Replacement => ShapeKey::RepairUnit {
                kind: RepairUnitKind::Arbitrary,
                arity: gate.children.len() as u32,
            },
        },
    }
}

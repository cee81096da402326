// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::path::PathBuf;

use crate::NodeId;

///
/// How a BasicEvent's failure-time distribution was specified. Exactly one of these is
/// consistent with the rate/probability fields actually set on the event; which one is
/// recorded explicitly rather than re-derived, so that later passes never need to re-guess
/// lowering-time intent.
///
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum CalculationMode {
    Exponential,
    Probability,
    Erlang,
    PhaseType,
    Undefined,
}

///
/// A leaf node: a stochastic failure (and, optionally, repair) distribution.
///
/// `dorm` and `mu` are alternate routes into the same dormant-rate concept; exactly one may be
/// set on an event (see Open Question in `DESIGN.md`), and lowering is responsible for
/// rejecting input that sets both. `dft_graph` stores whichever was given and does not attempt
/// to unify them itself.
///
#[derive(Clone, Debug)]
pub struct BasicEvent {
    pub lambda: f64,
    pub mu: f64,
    pub prob: f64,
    pub dorm: f64,
    pub repair: f64,
    pub phases: u32,
    pub interval: f64,
    pub priority: u32,
    pub res: f64,
    pub maintain: f64,
    pub embedded_phase_type_file: Option<PathBuf>,
    pub calculation_mode: CalculationMode,
}

impl Default for BasicEvent {
    fn default() -> Self {
        BasicEvent {
            lambda: 0.0,
            mu: 0.0,
            prob: 0.0,
            dorm: 0.0,
            repair: 0.0,
            phases: 1,
            interval: 0.0,
            priority: 0,
            res: 1.0,
            maintain: 0.0,
            embedded_phase_type_file: None,
            calculation_mode: CalculationMode::Undefined,
        }
    }
}

/// Which child services a RepairUnit gate dispatches to next.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum RepairUnitKind {
    Arbitrary,
    Fcfs,
    Priority,
    NonDeterministic,
}

/// The behavior a Gate node implements over its `children`.
#[derive(Clone, Debug)]
pub enum GateKind {
    And,
    Or,
    /// `k`-of-`children.len()` voting; AND is `Vot { k: children.len() }`, OR is `Vot { k: 1 }`.
    Vot { k: u32 },
    Pand,
    Sand,
    /// First child is the primary; the rest are spares shareable with other WSPs.
    Wsp,
    /// First child is the trigger; the rest are dependers.
    Fdep,
    /// Present only before `dft_rewriter`'s SEQ-lifting pass runs; never in a frozen DFT.
    Seq,
    RepairUnit(RepairUnitKind),
    Inspection { phases: u32 },
    Replacement,
}

impl GateKind {
    pub fn is_dynamic_activator(&self) -> bool {
        matches!(self, GateKind::Wsp | GateKind::Pand | GateKind::Fdep)
    }
}

/// A gate: an interior node that combines its ordered `children`.
#[derive(Clone, Debug)]
pub struct Gate {
    pub kind: GateKind,
    pub children: Vec<NodeId>,
}

/// The tagged-variant payload distinguishing a `BasicEvent` from a `Gate`.
#[derive(Clone, Debug)]
pub enum NodeKind {
    BasicEvent(BasicEvent),
    Gate(Gate),
}

impl NodeKind {
    pub fn is_basic_event(&self) -> bool {
        matches!(self, NodeKind::BasicEvent(_))
    }

    pub fn as_basic_event(&self) -> Option<&BasicEvent> {
        match self {
            NodeKind::BasicEvent(be) => Some(be),
            NodeKind::Gate(_) => None,
        }
    }

    pub fn as_gate(&self) -> Option<&Gate> {
        match self {
            NodeKind::Gate(gate) => Some(gate),
            NodeKind::BasicEvent(_) => None,
        }
    }

    pub fn children(&self) -> &[NodeId] {
        match self {
            NodeKind::Gate(gate) => &gate.children,
            NodeKind::BasicEvent(_) => &[],
        }
    }
}

///
/// A single element of the DFT: either a `BasicEvent` or a `Gate`, plus the fields common to
/// both (invariant 3.1 of the data model).
///
/// `parents` is a lookup-only back-edge list recomputed by `Dft::recompute_parents` whenever the
/// child relation changes; per Design Notes §9, no pass should carry it across a rewrite that
/// mutates children without calling that method first.
///
#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub parents: Vec<NodeId>,
    pub failed_at_startup: bool,
    pub is_repairable: bool,
    pub is_always_active: bool,
    pub has_repair_module: bool,
    pub has_inspection_module: bool,
}

impl Node {
    pub fn new(name: String, kind: NodeKind) -> Node {
        Node {
            name,
            kind,
            parents: Vec::new(),
            failed_at_startup: false,
            is_repairable: false,
            is_always_active: false,
            has_repair_module: false,
            has_inspection_module: false,
        }
    }

    pub fn children(&self) -> &[NodeId] {
        self.kind.children()
    }

    pub fn is_basic_event(&self) -> bool {
        self.kind.is_basic_event()
    }
}

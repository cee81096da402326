// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use graph::{Automaton, Node};

use crate::basic_event::{BeShape, BeState};
use crate::fdep::{FdepShape, FdepState};
use crate::inspection::{InspectionShape, InspectionState};
use crate::pand::{PandShape, PandState};
use crate::repair_unit::{RepairUnitShape, RepairUnitState};
use crate::shape::ShapeKey;
use crate::signal::Signal;
use crate::voting::{VotingShape, VotingState};
use crate::wsp::{WspShape, WspState};

///
/// The reachable portion of one shape's LTS, reduced to a form that does not depend on which
/// concrete `graph::Node` type produced it: state identity becomes a dense `u32` index, and
/// `transitions` is sorted for byte-reproducible serialization (`Automaton::transitions` itself
/// makes no ordering guarantee).
///
pub struct ExploredShape {
    pub state_count: usize,
    pub initial: u32,
    pub transitions: Vec<(u32, Signal, u32)>,
}

fn collect<N: Node<Label = Signal>>(automaton: Automaton<N>) -> ExploredShape {
    let mut transitions: Vec<(u32, Signal, u32)> = automaton
        .transitions()
        .map(|(src, label, dst)| (src.index() as u32, *label, dst.index() as u32))
        .collect();
    transitions.sort();
    ExploredShape {
        state_count: automaton.len(),
        initial: automaton.initial().index() as u32,
        transitions,
    }
}

///
/// Explores `shape_key`'s automaton, dispatching to the concrete per-variant state type that
/// shape corresponds to. `ShapeKey` carries exactly the fields that determine this LTS's
/// structure (§4.3: "type + arity + repairability + a handful of flags"), so this is the only
/// input needed; the node's name and rate constants never affect the result.
///
pub fn explore_shape(shape_key: &ShapeKey) -> ExploredShape {
    match shape_key {
        &ShapeKey::BasicEvent {
            is_repairable,
            is_always_active,
            has_repair_module,
            has_inspection_module,
            can_definitely_fail,
            starts_down,
            phases,
        } => collect(Automaton::explore(BeState::initial(BeShape {
            phases,
            is_repairable,
            // `has_repair_module` is true iff an ancestor RepairUnit services this event (§4.2
            // pass 4); `independent_repair` is the opposite case, where the event's own `repair`
            // rate applies with no ancestor to hand off to.
            independent_repair: is_repairable && !has_repair_module,
            is_always_active,
            has_inspection_module,
            can_definitely_fail,
            starts_down,
        }))),
        &ShapeKey::Voting { k, n, is_always_active } => {
            collect(Automaton::explore(VotingState::initial(VotingShape { k, n, is_always_active })))
        }
        &ShapeKey::Pand { arity, is_repairable } => {
            collect(Automaton::explore(PandState::initial(PandShape { arity, is_repairable })))
        }
        &ShapeKey::Wsp { arity, is_always_active } => {
            collect(Automaton::explore(WspState::initial(WspShape { arity, is_always_active })))
        }
        &ShapeKey::Fdep { depender_count, trigger_always_active } => collect(Automaton::explore(
            FdepState::initial(FdepShape { depender_count, trigger_always_active }),
        )),
        &ShapeKey::Inspection { arity, phases } => {
            collect(Automaton::explore(InspectionState::initial(InspectionShape { arity, phases })))
        }
        &ShapeKey::RepairUnit { kind, arity } => {
            collect(Automaton::explore(RepairUnitState::initial(RepairUnitShape { kind, arity })))
        }
    }
}

// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use graph::Node;

use dft_graph::RepairUnitKind;

use crate::signal::Signal;

/// A repair unit services exactly one child at a time; `kind` governs which pending request is
/// granted the unit next. The child's own automaton (see `basic_event`) owns the actual
/// `RATE_REPAIR` clock and busy/done bookkeeping — the unit's job is only to serialize access.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct RepairUnitShape {
    pub kind: RepairUnitKind,
    pub arity: u32,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct RepairUnitState {
    pub shape: RepairUnitShape,
    pub needs_repair: Vec<bool>,
    /// FCFS arrival order of child indices (1-based) currently awaiting repair.
    pub queue: Vec<usize>,
    pub in_repair: Option<usize>,
}

impl RepairUnitState {
    pub fn initial(shape: RepairUnitShape) -> RepairUnitState {
        let n = shape.arity as usize;
        RepairUnitState {
            shape,
            needs_repair: vec![false; n],
            queue: Vec::new(),
            in_repair: None,
        }
    }

    fn candidates(&self) -> Vec<usize> {
        match self.shape.kind {
            RepairUnitKind::Priority => self
                .needs_repair
                .iter()
                .position(|&needs| needs)
                .map(|i| vec![i + 1])
                .unwrap_or_default(),
            RepairUnitKind::Fcfs => self.queue.first().map(|&i| vec![i]).unwrap_or_default(),
            RepairUnitKind::Arbitrary | RepairUnitKind::NonDeterministic => self
                .needs_repair
                .iter()
                .enumerate()
                .filter(|(_, &needs)| needs)
                .map(|(i, _)| i + 1)
                .collect(),
        }
    }
}

impl Node for RepairUnitState {
    type Label = Signal;

    fn successors(&self) -> Vec<(Signal, RepairUnitState)> {
        let mut out = Vec::new();

        for (i, needs) in self.needs_repair.iter().enumerate() {
            if !needs {
                let mut next = self.clone();
                next.needs_repair[i] = true;
                if matches!(self.shape.kind, RepairUnitKind::Fcfs) {
                    next.queue.push(i + 1);
                }
                out.push((
                    Signal::Repair {
                        index: i + 1,
                        to_ancestor: true,
                    },
                    next,
                ));
            }
        }

        if self.in_repair.is_none() {
            for candidate in self.candidates() {
                let mut next = self.clone();
                next.in_repair = Some(candidate);
                out.push((
                    Signal::Repair {
                        index: candidate,
                        to_ancestor: false,
                    },
                    next,
                ));
            }
        }

        if let Some(busy) = self.in_repair {
            // Notifies the serviced child that it may now advance WAITING -> BUSY; the unit's
            // own state does not change, so this is a self-loop offered until the child consumes
            // it (each child only ever does so once per repair cycle).
            out.push((Signal::Repairing(busy), self.clone()));

            let mut next = self.clone();
            next.needs_repair[busy - 1] = false;
            next.in_repair = None;
            if matches!(self.shape.kind, RepairUnitKind::Fcfs) {
                next.queue.retain(|&i| i != busy);
            }
            out.push((Signal::Repaired(busy), next));
        }

        out
    }
}

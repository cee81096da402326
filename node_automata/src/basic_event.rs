// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use graph::Node;

use crate::signal::{RateKind, Signal};

#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum FailureStatus {
    Up,
    Failing,
    Down,
    Failsafe,
    Impossible,
}

#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum RepairStatus {
    None,
    Busy,
    Needed,
    Waiting,
    Done,
}

///
/// The parts of a BasicEvent's automaton that are fixed for its entire lifetime and that
/// determine which transitions exist at all (as opposed to the mutable fields of `BeState`,
/// which determine which of those transitions is *currently* enabled). Two events with equal
/// `BeShape` generate byte-identical `.lnt`/`.aut` artifacts.
///
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct BeShape {
    pub phases: u32,
    pub is_repairable: bool,
    /// True if this event has its own repair module (services itself), rather than waiting on
    /// an ancestor RepairUnit.
    pub independent_repair: bool,
    pub is_always_active: bool,
    pub has_inspection_module: bool,
    /// `lambda > 0 || prob > 0 || failed_at_startup`: gates whether any `RATE_FAIL` transition
    /// exists at all out of `Up`. An event with this false can never reach `Down` (testable
    /// property 8) — there is no exponential clock to race, dormant or active.
    pub can_definitely_fail: bool,
    /// True if the event starts the run already failed (evidence was applied to it). This (not
    /// just `can_definitely_fail`) must be part of the shape, since it picks a different initial
    /// state than an otherwise-identical event that starts `Up`.
    pub starts_down: bool,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct BeState {
    pub shape: BeShape,
    pub status: FailureStatus,
    pub repair_status: RepairStatus,
    pub phase: u32,
    pub is_active: bool,
    pub emit_fail: bool,
    pub emit_online: bool,
    pub emit_inspect: bool,
    pub terminated: bool,
}

impl BeState {
    pub fn initial(shape: BeShape) -> BeState {
        let (status, emit_fail) = if shape.starts_down {
            (FailureStatus::Down, true)
        } else {
            (FailureStatus::Up, false)
        };
        let repair_status = if status == FailureStatus::Down && shape.is_repairable {
            if shape.independent_repair {
                RepairStatus::Busy
            } else {
                RepairStatus::Needed
            }
        } else {
            RepairStatus::None
        };
        BeState {
            shape,
            status,
            repair_status,
            phase: 1,
            is_active: false,
            emit_fail,
            emit_online: false,
            emit_inspect: false,
            terminated: false,
        }
    }

    fn enter_down(&self) -> BeState {
        let mut next = self.clone();
        next.status = FailureStatus::Down;
        next.phase = 1;
        next.emit_fail = true;
        next.emit_inspect = self.shape.has_inspection_module;
        next.repair_status = if self.shape.is_repairable {
            if self.shape.independent_repair {
                RepairStatus::Busy
            } else {
                RepairStatus::Needed
            }
        } else {
            RepairStatus::None
        };
        next
    }
}

impl Node for BeState {
    type Label = Signal;

    fn successors(&self) -> Vec<(Signal, BeState)> {
        if self.terminated {
            return Vec::new();
        }
        if self.status == FailureStatus::Impossible {
            let mut sink = self.clone();
            sink.terminated = true;
            return vec![(Signal::Impossible, sink)];
        }

        let mut out = Vec::new();

        // Activation / deactivation (property 7: ACTIVATE(0,·) enabled in the initial state).
        if !self.is_active {
            let mut next = self.clone();
            next.is_active = true;
            out.push((
                Signal::Activate {
                    index: 0,
                    sending: false,
                },
                next,
            ));
        } else {
            let mut next = self.clone();
            if self.shape.is_always_active {
                next.status = FailureStatus::Impossible;
            } else {
                next.is_active = false;
            }
            out.push((
                Signal::Deactivate {
                    index: 0,
                    sending: false,
                },
                next,
            ));
        }

        // The exponential failure clock. Offered only while Up; gated entirely by
        // `can_definitely_fail` so that an event with lambda == 0 && prob == 0 never reaches
        // Down (testable property 8).
        if self.status == FailureStatus::Up && self.shape.can_definitely_fail {
            let advance = |rate_kind: RateKind, to_failsafe: bool| {
                let mut next = self.clone();
                if to_failsafe {
                    next.status = FailureStatus::Failsafe;
                    next.phase = 1;
                    next.emit_fail = true;
                } else if self.phase >= self.shape.phases {
                    next = next.enter_down();
                } else {
                    next.phase += 1;
                }
                (
                    Signal::RateFail {
                        phase: self.phase as u8,
                        rate_kind,
                    },
                    next,
                )
            };
            out.push(advance(RateKind::Active, false));
            if self.phase == 1 {
                // Phase 1 is where the source models a choice between completing a normal
                // failure step and failing safe instead; both rates are offered there.
                out.push(advance(RateKind::Dormant, true));
            } else {
                out.push(advance(RateKind::Dormant, false));
            }
        }

        // One-shot emissions.
        if self.emit_fail {
            let mut next = self.clone();
            next.emit_fail = false;
            out.push((Signal::Fail(0), next));
        }
        if self.emit_online {
            let mut next = self.clone();
            next.emit_online = false;
            out.push((Signal::Online(0), next));
        }
        if self.emit_inspect {
            let mut next = self.clone();
            next.emit_inspect = false;
            out.push((Signal::Inspect(0), next));
        }

        // Repair sub-protocol.
        if self.shape.is_repairable
            && matches!(self.status, FailureStatus::Down | FailureStatus::Failsafe)
        {
            match self.repair_status {
                RepairStatus::Needed => {
                    let mut next = self.clone();
                    next.repair_status = RepairStatus::Waiting;
                    out.push((
                        Signal::Repair {
                            index: 0,
                            to_ancestor: false,
                        },
                        next,
                    ));
                }
                RepairStatus::Waiting => {
                    let mut next = self.clone();
                    next.repair_status = RepairStatus::Busy;
                    out.push((Signal::Repairing(0), next));
                }
                RepairStatus::Busy => {
                    let mut next = self.clone();
                    next.phase = 1;
                    next.repair_status = RepairStatus::Done;
                    next.emit_online = true;
                    if self.status != FailureStatus::Failsafe {
                        next.status = FailureStatus::Up;
                    }
                    out.push((Signal::RateRepair, next));
                }
                RepairStatus::Done => {
                    let mut next = self.clone();
                    next.repair_status = RepairStatus::None;
                    out.push((Signal::Repaired(0), next));
                }
                RepairStatus::None => {}
            }
        }

        out
    }
}

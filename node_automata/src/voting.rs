// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use graph::Node;

use crate::signal::Signal;

/// Shared shape for AND (`k == n`), OR (`k == 1`), and VOT(k,n) gates: once `k` of `n` children
/// have reported `FAIL`, the gate itself fails.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct VotingShape {
    pub k: u32,
    pub n: u32,
    pub is_always_active: bool,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct VotingState {
    pub shape: VotingShape,
    pub is_active: bool,
    pub activated_children: Vec<bool>,
    pub failed_children: Vec<bool>,
    pub done: bool,
    pub emit_fail: bool,
    pub emit_online: bool,
    pub status_impossible: bool,
}

impl VotingState {
    pub fn initial(shape: VotingShape) -> VotingState {
        let n = shape.n as usize;
        VotingState {
            shape,
            is_active: false,
            activated_children: vec![false; n],
            failed_children: vec![false; n],
            done: false,
            emit_fail: false,
            emit_online: false,
            status_impossible: false,
        }
    }

    fn nr_failed(&self) -> u32 {
        self.failed_children.iter().filter(|&&f| f).count() as u32
    }
}

impl Node for VotingState {
    type Label = Signal;

    fn successors(&self) -> Vec<(Signal, VotingState)> {
        if self.status_impossible {
            return Vec::new();
        }

        let mut out = Vec::new();

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
                next.status_impossible = true;
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

        if self.is_active {
            for (i, activated) in self.activated_children.iter().enumerate() {
                if !activated {
                    let mut next = self.clone();
                    next.activated_children[i] = true;
                    out.push((
                        Signal::Activate {
                            index: i + 1,
                            sending: true,
                        },
                        next,
                    ));
                }
            }
        }

        if !self.done {
            for (i, failed) in self.failed_children.iter().enumerate() {
                if !failed {
                    let mut next = self.clone();
                    next.failed_children[i] = true;
                    if next.nr_failed() >= self.shape.k {
                        next.done = true;
                        next.emit_fail = true;
                    }
                    out.push((Signal::Fail(i + 1), next));
                }
            }
        } else {
            for (i, failed) in self.failed_children.iter().enumerate() {
                if *failed {
                    let mut next = self.clone();
                    next.failed_children[i] = false;
                    if next.nr_failed() < self.shape.k {
                        next.done = false;
                        next.emit_online = true;
                    }
                    out.push((Signal::Online(i + 1), next));
                }
            }
        }

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

        out
    }
}

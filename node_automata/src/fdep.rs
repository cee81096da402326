// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use graph::Node;

use crate::signal::Signal;

/// Functional dependency: child 1 is the trigger, children `2..=depender_count+1` are the
/// dependers. Once the trigger fails, every depender is forced to fail too, in no particular
/// order. Unlike the other gate automata, an FDEP never emits its own `FAIL(0)`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct FdepShape {
    pub depender_count: u32,
    pub trigger_always_active: bool,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct FdepState {
    pub shape: FdepShape,
    pub is_active: bool,
    pub trigger_activated: bool,
    pub trigger_failed: bool,
    pub notified: Vec<bool>,
    pub status_impossible: bool,
}

impl FdepState {
    pub fn initial(shape: FdepShape) -> FdepState {
        let n = shape.depender_count as usize;
        FdepState {
            shape,
            is_active: false,
            trigger_activated: false,
            trigger_failed: false,
            notified: vec![false; n],
            status_impossible: false,
        }
    }
}

impl Node for FdepState {
    type Label = Signal;

    fn successors(&self) -> Vec<(Signal, FdepState)> {
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
            if self.shape.trigger_always_active {
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

        if self.is_active && !self.trigger_activated {
            let mut next = self.clone();
            next.trigger_activated = true;
            out.push((
                Signal::Activate {
                    index: 1,
                    sending: true,
                },
                next,
            ));
        }

        if !self.trigger_failed {
            let mut next = self.clone();
            next.trigger_failed = true;
            out.push((Signal::Fail(1), next));
        }

        if self.trigger_failed {
            for (i, notified) in self.notified.iter().enumerate() {
                if !notified {
                    let mut next = self.clone();
                    next.notified[i] = true;
                    // Depender children are indexed 2.. in the FDEP's own child list.
                    out.push((Signal::Fail(i + 2), next));
                }
            }
        }

        out
    }
}

// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use graph::Node;

use crate::signal::Signal;

/// Shared shape for PAND (Priority AND) and SAND (Sequential AND, after SEQ is lifted to it):
/// children must report `FAIL` in the exact order given, or the gate never fails.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct PandShape {
    pub arity: u32,
    pub is_repairable: bool,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct PandState {
    pub shape: PandShape,
    pub is_active: bool,
    pub activated_children: Vec<bool>,
    pub failed_children: Vec<bool>,
    /// Count of children `0..in_order_mark` that have failed consecutively, in order.
    pub in_order_mark: u32,
    pub done: bool,
    pub emit_fail: bool,
    pub status_impossible: bool,
}

impl PandState {
    pub fn initial(shape: PandShape) -> PandState {
        let n = shape.arity as usize;
        PandState {
            shape,
            is_active: false,
            activated_children: vec![false; n],
            failed_children: vec![false; n],
            in_order_mark: 0,
            done: false,
            emit_fail: false,
            status_impossible: false,
        }
    }
}

impl Node for PandState {
    type Label = Signal;

    fn successors(&self) -> Vec<(Signal, PandState)> {
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
            // A PAND/SAND that has already begun collecting ordered failures cannot be
            // deactivated without invalidating the order it has committed to.
            let mut next = self.clone();
            next.status_impossible = true;
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
                    if i as u32 == self.in_order_mark {
                        next.in_order_mark += 1;
                        if next.in_order_mark == self.shape.arity {
                            next.done = true;
                            next.emit_fail = true;
                        }
                    }
                    out.push((Signal::Fail(i + 1), next));
                }
            }
        }

        if self.emit_fail {
            let mut next = self.clone();
            next.emit_fail = false;
            out.push((Signal::Fail(0), next));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph::Automaton;

    fn shape() -> PandShape {
        PandShape {
            arity: 2,
            is_repairable: false,
        }
    }

    #[test]
    fn fail_0_only_enabled_once_all_children_fail_in_order() {
        let automaton = Automaton::explore(PandState::initial(shape()));
        let has_premature_fail = automaton.states().any(|id| {
            let state = automaton.state(id);
            state.in_order_mark < state.shape.arity
                && state
                    .successors()
                    .iter()
                    .any(|(label, _)| matches!(label, Signal::Fail(0)))
        });
        assert!(!has_premature_fail);
    }

    #[test]
    fn out_of_order_fail_does_not_complete_the_gate() {
        let mut state = PandState::initial(shape());
        state.is_active = true;
        state.activated_children = vec![true; 2];
        // Child 2 (index 1) fails before child 1: recorded, but does not advance the mark.
        let after = state
            .successors()
            .into_iter()
            .find(|(label, _)| matches!(label, Signal::Fail(2)))
            .unwrap()
            .1;
        assert_eq!(after.in_order_mark, 0);
        assert!(!after.done);
    }

    #[test]
    fn deactivate_after_activation_is_impossible() {
        let mut state = PandState::initial(shape());
        state.is_active = true;
        let after = state
            .successors()
            .into_iter()
            .find(|(label, _)| matches!(label, Signal::Deactivate { index: 0, .. }))
            .unwrap()
            .1;
        assert!(after.status_impossible);
    }
}

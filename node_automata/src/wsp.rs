// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use graph::Node;

use crate::signal::Signal;

/// Warm/cold/hot spare gate: one child (the primary) starts claimed, and on its failure the
/// gate claims the next unfailed, unclaimed child in order. Because spares may be shared with
/// other WSP gates elsewhere in the tree, claiming is modelled as an explicit handshake rather
/// than an instantaneous internal choice.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct WspShape {
    pub arity: u32,
    pub is_always_active: bool,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct WspState {
    pub shape: WspShape,
    pub is_active: bool,
    pub unfailed: Vec<bool>,
    /// 1-based index of the child currently claimed as in-use, if any.
    pub cur_using: Option<usize>,
    pub done: bool,
    pub emit_fail: bool,
    pub status_impossible: bool,
}

impl WspState {
    pub fn initial(shape: WspShape) -> WspState {
        let n = shape.arity as usize;
        WspState {
            shape,
            is_active: false,
            unfailed: vec![true; n],
            cur_using: None,
            done: false,
            emit_fail: false,
            status_impossible: false,
        }
    }

    fn next_unclaimed(&self) -> Option<usize> {
        self.unfailed.iter().position(|&ok| ok).map(|i| i + 1)
    }
}

impl Node for WspState {
    type Label = Signal;

    fn successors(&self) -> Vec<(Signal, WspState)> {
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

        if self.is_active && !self.done && self.cur_using.is_none() {
            if let Some(candidate) = self.next_unclaimed() {
                let mut next = self.clone();
                next.cur_using = Some(candidate);
                out.push((
                    Signal::Activate {
                        index: candidate,
                        sending: true,
                    },
                    next,
                ));
            }
        }

        if !self.done {
            for (i, ok) in self.unfailed.iter().enumerate() {
                if *ok {
                    let mut next = self.clone();
                    next.unfailed[i] = false;
                    if next.cur_using == Some(i + 1) {
                        next.cur_using = None;
                    }
                    if next.unfailed.iter().all(|&ok| !ok) {
                        next.done = true;
                        next.emit_fail = true;
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

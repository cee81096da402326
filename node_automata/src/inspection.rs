// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use graph::Node;

use crate::signal::Signal;

/// Periodic inspection module: every `phases`-th `RATE_INSPECTION` tick completes a period, at
/// which point every child under inspection is sent `INSPECT` in turn before the counter resets.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct InspectionShape {
    pub arity: u32,
    pub phases: u32,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct InspectionState {
    pub shape: InspectionShape,
    pub counter: u32,
    pub wrapped: bool,
    pub inspected: Vec<bool>,
}

impl InspectionState {
    pub fn initial(shape: InspectionShape) -> InspectionState {
        let n = shape.arity as usize;
        InspectionState {
            shape,
            counter: 0,
            wrapped: false,
            inspected: vec![false; n],
        }
    }
}

impl Node for InspectionState {
    type Label = Signal;

    fn successors(&self) -> Vec<(Signal, InspectionState)> {
        let mut out = Vec::new();

        if !self.wrapped {
            let mut next = self.clone();
            next.counter += 1;
            if next.counter >= self.shape.phases {
                next.counter = 0;
                next.wrapped = true;
            }
            out.push((Signal::RateInspection, next));
        }

        if self.wrapped {
            if let Some(i) = self.inspected.iter().position(|&done| !done) {
                let mut next = self.clone();
                next.inspected[i] = true;
                out.push((Signal::Inspect(i + 1), next));
            } else {
                let mut next = self.clone();
                next.wrapped = false;
                next.inspected = vec![false; self.shape.arity as usize];
                out.push((Signal::RatePeriod, next));
            }
        }

        out
    }
}

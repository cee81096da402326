// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

/// A logical query against the composed system's top-level failure label, independent of which
/// checker ends up answering it.
#[derive(Clone, Debug)]
pub enum Query {
    /// `P(top fails within [lower, upper])`. `step`, when set, means the caller wants the same
    /// query repeated at successive upper bounds `lower + step, lower + 2*step, ...` up to
    /// `upper`; an adapter expands that into one checker invocation per time before driving it.
    TimeBound {
        lower: f64,
        upper: f64,
        step: Option<f64>,
    },
    /// `P(top eventually fails)`.
    Unbounded,
    /// Long-run unavailability.
    Steady,
    /// Mean time to failure.
    ExpectedTime,
    /// A raw checker-native query string, passed through verbatim.
    Custom(String),
}

impl Query {
    /// Expands a stepped `TimeBound` into the individual fixed-bound queries a checker actually
    /// answers one at a time; any other variant is returned unchanged as a single-element vec.
    pub fn expand_steps(&self) -> Vec<Query> {
        let Query::TimeBound { lower, upper, step: Some(step) } = self else {
            return vec![self.clone()];
        };
        let mut out = Vec::new();
        let mut cur = *lower + step;
        while cur <= *upper {
            out.push(Query::TimeBound { lower: 0.0, upper: cur, step: None });
            cur += step;
        }
        out
    }
}

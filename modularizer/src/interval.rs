// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use rust_decimal::Decimal;

/// A bound on an unreliability value, `[lo, hi]`. Exact results have `lo == hi`; approximate
/// checker results carry the user's error bound as the gap between them. Arithmetic over
/// intervals preserves monotonicity: combining two intervals with a monotone operator never
/// produces a result wider than applying that operator to the bounding scalars independently.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct Interval {
    pub lo: Decimal,
    pub hi: Decimal,
}

impl Interval {
    pub fn exact(value: Decimal) -> Interval {
        Interval { lo: value, hi: value }
    }

    pub fn new(lo: Decimal, hi: Decimal) -> Interval {
        debug_assert!(lo <= hi);
        Interval { lo, hi }
    }
}

/// `∏ intervals`, applied independently to both bounds.
pub fn and_combine(intervals: &[Interval]) -> Interval {
    let lo = intervals.iter().map(|i| i.lo).product();
    let hi = intervals.iter().map(|i| i.hi).product();
    Interval::new(lo, hi)
}

/// `1 − ∏(1 − intervals)`, applied independently to both bounds.
pub fn or_combine(intervals: &[Interval]) -> Interval {
    let one = Decimal::ONE;
    let lo = one - intervals.iter().map(|i| one - i.lo).product::<Decimal>();
    let hi = one - intervals.iter().map(|i| one - i.hi).product::<Decimal>();
    Interval::new(lo, hi)
}

/// `k`-of-`N` voting via the recursive decomposition
/// `P_{k/N} = P_1 · P_{(k-1)/(N-1)} + (1 − P_1) · P_{k/(N-1)}`, base cases `P_{0/·} = 1` and
/// `P_{j/N} = 0` for `j > N`. Applied independently to both bounds.
pub fn vot_combine(k: u32, intervals: &[Interval]) -> Interval {
    let lo = vot_scalar(k, &intervals.iter().map(|i| i.lo).collect::<Vec<_>>());
    let hi = vot_scalar(k, &intervals.iter().map(|i| i.hi).collect::<Vec<_>>());
    Interval::new(lo, hi)
}

fn vot_scalar(k: u32, probs: &[Decimal]) -> Decimal {
    if k == 0 {
        return Decimal::ONE;
    }
    if k as usize > probs.len() {
        return Decimal::ZERO;
    }
    let p1 = probs[0];
    let rest = &probs[1..];
    p1 * vot_scalar(k - 1, rest) + (Decimal::ONE - p1) * vot_scalar(k, rest)
}

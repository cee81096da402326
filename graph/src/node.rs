// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::fmt::Debug;
use std::hash::Hash;

///
/// A single state in a labeled transition system. `successors` is a pure function of the state:
/// calling it twice on equal states must produce equal (possibly reordered) results. This is
/// what allows `Automaton::explore` to hash-cons states instead of re-exploring them.
///
pub trait Node: Clone + Eq + Hash + Debug {
    type Label: Clone + Eq + Hash + Debug;

    fn successors(&self) -> Vec<(Self::Label, Self)>;
}

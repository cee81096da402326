// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

#![deny(warnings)]
// Enable all clippy lints we think are valuable.
#![deny(clippy::all, clippy::default_trait_access)]
#![allow(
    clippy::len_without_is_empty,
    clippy::redundant_field_names,
    clippy::too_many_arguments,
    clippy::new_without_default,
    clippy::new_ret_no_self,
    clippy::mutex_atomic
)]

mod explore;
mod node;

pub use crate::explore::{Automaton, StateId};
pub use crate::node::Node;

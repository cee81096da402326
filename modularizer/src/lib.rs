// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

#![deny(warnings)]
#![deny(clippy::all, clippy::default_trait_access)]
#![allow(
    clippy::len_without_is_empty,
    clippy::redundant_field_names,
    clippy::too_many_arguments,
    clippy::new_without_default,
    clippy::new_ret_no_self,
    clippy::mutex_atomic
)]

//! Splits a frozen `Dft` into independent modules wherever an AND/OR/VOT gate's subtree can be
//! solved analytically, and combines per-module results back into a single interval. Nodes that
//! don't decompose become leaves a driver must still send through the actual checker.

mod interval;
mod tree;

pub use crate::interval::{and_combine, or_combine, vot_combine, Interval};
pub use crate::tree::{modularize, LinearNode, ModuleTree};

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

//! Per-node automata: one labeled transition system per DFT node, keyed by its `ShapeKey` so
//! that structurally identical nodes generate and cache a single artifact regardless of how many
//! times that shape occurs in the tree. `sync_composer` wires these together; this crate never
//! looks past a single node's own children count and flags.

mod artifact;
mod basic_event;
mod fdep;
mod inspection;
mod pand;
mod repair_unit;
mod shape;
mod signal;
mod voting;
mod wsp;

pub use crate::artifact::{explore_shape, ExploredShape};
pub use crate::basic_event::{BeShape, BeState, FailureStatus, RepairStatus};
pub use crate::fdep::{FdepShape, FdepState};
pub use crate::inspection::{InspectionShape, InspectionState};
pub use crate::pand::{PandShape, PandState};
pub use crate::repair_unit::{RepairUnitShape, RepairUnitState};
pub use crate::shape::{shape_key_for, ShapeKey};
pub use crate::signal::{RateKind, Signal};
pub use crate::voting::{VotingShape, VotingState};
pub use crate::wsp::{WspShape, WspState};

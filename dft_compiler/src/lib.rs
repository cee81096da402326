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

//! The driver crate: resolves `Config`, owns the artifact `Cache`, initializes logging, and
//! orchestrates the rewrite → compose → modularize → back-end pipeline over a frozen `Dft`,
//! reporting a `Report` and accumulated `Diagnostics` per input model.

mod artifacts;
mod cache;
mod config;
mod error;
mod lowering;
mod pipeline;
mod report;

pub use crate::artifacts::emit_node_artifacts;
pub use crate::cache::{Cache, OutputKind, FORMAT_VERSION};
pub use crate::config::Config;
pub use crate::error::{Diagnostics, Error, SourceLocation};
pub use crate::lowering::{lower, Parser, RawAst};
pub use crate::pipeline::compile;
pub use crate::report::{Report, ReportItem, RunStatistics};


/// Initializes the `logging` crate's stderr destination for this process. Call once at
/// startup, before any pass logs through the `log` crate's macros.
pub fn init_logging(max_level: u64, use_color: bool) {
    logging::Logger::init(max_level, false, use_color);
}

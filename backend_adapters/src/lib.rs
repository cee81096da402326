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

//! Checker-specific adapters: each maps the fixed `Query` vocabulary to a back end's native
//! query syntax, runs it as a blocking subprocess via `task_executor`, and parses its output
//! back into a bounded `CalculationResultItem`.

mod mrmc;
mod query;
mod result;
mod storm;

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use rust_decimal::Decimal;
use task_executor::{Executor, ProcessError};

pub use crate::mrmc::MrmcAdapter;
pub use crate::query::Query;
pub use crate::result::{CalculationResultItem, CheckerFailure};
pub use crate::storm::StormAdapter;

/// Which external model checker an `Adapter` speaks to.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum BackendKind {
    Storm,
    Mrmc,
    Imrmc,
    Imca,
}

/// The {build-query, run-checker, parse-result} capability set a back end implements.
pub trait Adapter {
    fn kind(&self) -> BackendKind;

    /// Whether this adapter ever returns a degenerate `[r, r]` interval (as opposed to always
    /// widening by the error bound).
    fn is_exact(&self) -> bool;

    /// Renders `query` into the checker's native script/property text, targeting the given
    /// model-file path and the label that marks the top-level failure state.
    fn build_query(&self, query: &Query, model: &Path, goal_label: &str, error_bound: Decimal) -> String;

    /// The subprocess invocation for one rendered query, given the checker binary's path.
    fn command(&self, binary: &Path, model: &Path, rendered_query: &str) -> Command;

    /// Parses a finished subprocess's captured output into a result, or a `CheckerFailure` if
    /// the exit status was non-zero or the output didn't match the checker's expected shape.
    fn parse_result(
        &self,
        query: &Query,
        error_bound: Decimal,
        stdout: &str,
        stderr: &str,
        exit_code: Option<i32>,
    ) -> Result<CalculationResultItem, CheckerFailure>;
}

/// Drives one query end to end through `adapter`: builds the native query text, runs the
/// checker as a blocking subprocess, and parses its result. `model` is the composed system's
/// artifact the checker reads; `goal_label` names the top-level failure label within it.
pub fn run_query(
    executor: &Executor,
    adapter: &dyn Adapter,
    binary: &Path,
    model: &Path,
    goal_label: &str,
    query: &Query,
    error_bound: Decimal,
    timeout: Option<Duration>,
) -> Result<CalculationResultItem, CheckerFailure> {
    let rendered = adapter.build_query(query, model, goal_label, error_bound);
    let command = adapter.command(binary, model, &rendered);
    let output = executor.run_blocking(command, timeout).map_err(|e| match e {
        ProcessError::Spawn(err) => CheckerFailure::NonZeroExit { exit_code: None, stderr: err.to_string() },
        ProcessError::Timeout(d) => {
            CheckerFailure::NonZeroExit { exit_code: None, stderr: format!("timed out after {d:?}") }
        }
    })?;
    if !output.status.success() {
        return Err(CheckerFailure::NonZeroExit {
            exit_code: output.status.code(),
            stderr: output.stderr_utf8_lossy(),
        });
    }
    adapter.parse_result(
        query,
        error_bound,
        &output.stdout_utf8_lossy(),
        &output.stderr_utf8_lossy(),
        output.status.code(),
    )
}

// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use rust_decimal::Decimal;

use crate::Query;

/// One checker's answer to one `Query`: a bound interval, exact when `lower_bound == upper_bound`.
#[derive(Clone, Debug)]
pub struct CalculationResultItem {
    pub query: Query,
    pub lower_bound: Decimal,
    pub upper_bound: Decimal,
    pub exact: bool,
}

/// Raised when a checker invocation itself fails, or when it exits cleanly but its output can't
/// be parsed into a result — the caller never distinguishes the two beyond the message.
#[derive(Clone, Debug, thiserror::Error)]
pub enum CheckerFailure {
    #[error("checker exited with status {exit_code:?}: {stderr}")]
    NonZeroExit { exit_code: Option<i32>, stderr: String },
    #[error("checker produced unparseable output: {0}")]
    UnparseableOutput(String),
}

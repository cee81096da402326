// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::path::Path;
use std::process::Command;

use rust_decimal::Decimal;

use crate::{Adapter, BackendKind, CalculationResultItem, CheckerFailure, Query};

/// MRMC (and its incremental sibling IMRMC) take a command script on stdin and report results
/// prefixed by one of a handful of `$...RESULT` markers; both are iterative/approximate
/// checkers, so every result is widened by half the error bound.
pub struct MrmcAdapter {
    incremental: bool,
}

impl MrmcAdapter {
    pub fn new() -> MrmcAdapter {
        MrmcAdapter { incremental: false }
    }

    pub fn incremental() -> MrmcAdapter {
        MrmcAdapter { incremental: true }
    }
}

impl Adapter for MrmcAdapter {
    fn kind(&self) -> BackendKind {
        if self.incremental {
            BackendKind::Imrmc
        } else {
            BackendKind::Mrmc
        }
    }

    fn is_exact(&self) -> bool {
        false
    }

    fn build_query(&self, query: &Query, _model: &Path, goal_label: &str, error_bound: Decimal) -> String {
        let mut script = format!("set error_bound {error_bound}\n");
        let body = match query {
            Query::TimeBound { lower, upper, step: None } => {
                format!("P{{<1}}[tt U[{lower}, {upper}] {goal_label}]")
            }
            Query::TimeBound { step: Some(_), .. } => {
                unreachable!("stepped queries must be expanded via Query::expand_steps before reaching an adapter")
            }
            Query::Unbounded => format!("P{{<1}}[tt U {goal_label}]"),
            Query::Steady => format!("S{{<1}}[{goal_label}]"),
            Query::ExpectedTime => format!("M{{<1}}[{goal_label}]"),
            Query::Custom(raw) => raw.clone(),
        };
        script.push_str(&body);
        script.push('\n');
        script
    }

    fn command(&self, binary: &Path, model: &Path, rendered_query: &str) -> Command {
        let mut command = Command::new(binary);
        command.arg(model).arg("-").env("MRMC_SCRIPT", rendered_query);
        command
    }

    fn parse_result(
        &self,
        query: &Query,
        error_bound: Decimal,
        stdout: &str,
        _stderr: &str,
        _exit_code: Option<i32>,
    ) -> Result<CalculationResultItem, CheckerFailure> {
        let value = parse_result_marker(stdout)
            .ok_or_else(|| CheckerFailure::UnparseableOutput(stdout.to_owned()))?;
        let margin = error_bound / Decimal::TWO;
        Ok(CalculationResultItem {
            query: query.clone(),
            lower_bound: clamp_unit(value - margin),
            upper_bound: clamp_unit(value + margin),
            exact: false,
        })
    }
}

fn clamp_unit(value: Decimal) -> Decimal {
    value.clamp(Decimal::ZERO, Decimal::ONE)
}

/// Scans for the first of MRMC's result markers, in the priority order the original tool checks
/// them, and parses the numeric literal that follows.
fn parse_result_marker(output: &str) -> Option<Decimal> {
    for marker in ["$MIN_RESULT", "$MAX_RESULT", "$RESULT[1]", "$RESULT:"] {
        if let Some(pos) = output.find(marker) {
            let rest = &output[pos + marker.len()..];
            let line = rest.lines().next().unwrap_or("").trim_start_matches([':', ' ']);
            if let Ok(value) = line.trim().parse::<Decimal>() {
                return Some(value);
            }
        }
    }
    None
}

// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::path::Path;
use std::process::Command;

use rust_decimal::Decimal;

use crate::{Adapter, BackendKind, CalculationResultItem, CheckerFailure, Query};

const RESULT_NEEDLE: &str = "Result (for initial states): ";

/// Storm takes a PRISM-style property string on the command line and prints its answer to
/// stdout prefixed by a fixed marker. Storm solves exactly unless asked for a time-bounded
/// property, which it always answers approximately regardless of an `--exact` request.
pub struct StormAdapter;

impl StormAdapter {
    pub fn new() -> StormAdapter {
        StormAdapter
    }
}

impl Adapter for StormAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Storm
    }

    fn is_exact(&self) -> bool {
        true
    }

    fn build_query(&self, query: &Query, _model: &Path, goal_label: &str, _error_bound: Decimal) -> String {
        match query {
            Query::ExpectedTime => format!("Tmin=? [F {goal_label} = 1]"),
            Query::Steady => format!("LRAmin=? [{goal_label} = 1]"),
            Query::TimeBound { lower, upper, step: None } => {
                if *lower == 0.0 {
                    format!("Pmin=? [F<={upper} ({goal_label} = 1)]")
                } else {
                    format!("Pmin=? [F[{lower}, {upper}] ({goal_label} = 1)]")
                }
            }
            Query::TimeBound { step: Some(_), .. } => {
                unreachable!("stepped queries must be expanded via Query::expand_steps before reaching an adapter")
            }
            Query::Unbounded => format!("Pmin=? [F {goal_label} = 1]"),
            Query::Custom(raw) => raw.clone(),
        }
    }

    fn command(&self, binary: &Path, model: &Path, rendered_query: &str) -> Command {
        let mut command = Command::new(binary);
        command
            .arg("--jani")
            .arg(model)
            .arg("--prop")
            .arg(rendered_query);
        let is_time_bounded = rendered_query.starts_with("Pmin=? [F<=") || rendered_query.starts_with("Pmin=? [F[");
        if !is_time_bounded {
            command.arg("--exact");
        }
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
        let line = stdout
            .lines()
            .find(|l| l.contains(RESULT_NEEDLE))
            .ok_or_else(|| CheckerFailure::UnparseableOutput(stdout.to_owned()))?;
        let mut rest = line[line.find(RESULT_NEEDLE).unwrap() + RESULT_NEEDLE.len()..].to_owned();
        let is_approximate = rest.find(" (approx.").inspect(|&pos| rest.truncate(pos)).is_some();

        let value: Decimal = rest
            .trim()
            .parse()
            .map_err(|_| CheckerFailure::UnparseableOutput(stdout.to_owned()))?;

        if !is_approximate {
            return Ok(CalculationResultItem {
                query: query.clone(),
                lower_bound: value,
                upper_bound: value,
                exact: true,
            });
        }

        let margin = error_bound / Decimal::TWO;
        let mut lower = value - margin;
        let mut upper = value + margin;
        if !matches!(query, Query::Custom(_)) {
            if lower < Decimal::ZERO {
                lower = Decimal::ZERO;
            }
            if upper > Decimal::ONE {
                upper = Decimal::ONE;
            }
        }
        Ok(CalculationResultItem { query: query.clone(), lower_bound: lower, upper_bound: upper, exact: false })
    }
}

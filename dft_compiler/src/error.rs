// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::fmt;

use backend_adapters::CheckerFailure;
use dft_graph::GraphError;
use dft_rewriter::RewriteError;

/// A source location within an input model, when one is known (the parser/lowering stage is
/// out of scope here, so most errors surfaced inside this crate carry `None`).
#[derive(Clone, Debug, Default)]
pub struct SourceLocation {
    pub line: Option<u32>,
    pub column: Option<u32>,
}

/// One diagnostic raised during compilation.
#[derive(Debug)]
pub enum Error {
    Syntax { message: String, location: SourceLocation },
    Validation { message: String, location: SourceLocation },
    Structural(GraphError),
    Rewrite(RewriteError),
    Artifact(String),
    Checker(CheckerFailure),
    Composition(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Syntax { message, .. } => write!(f, "syntax error: {message}"),
            Error::Validation { message, .. } => write!(f, "validation error: {message}"),
            Error::Structural(e) => write!(f, "structural error: {e}"),
            Error::Rewrite(e) => write!(f, "rewrite error: {e}"),
            Error::Artifact(message) => write!(f, "artifact error: {message}"),
            Error::Checker(e) => write!(f, "checker failure: {e}"),
            Error::Composition(message) => write!(f, "composition error: {message}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Structural(e) => Some(e),
            Error::Rewrite(e) => Some(e),
            Error::Checker(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GraphError> for Error {
    fn from(e: GraphError) -> Error {
        Error::Structural(e)
    }
}

impl From<RewriteError> for Error {
    fn from(e: RewriteError) -> Error {
        Error::Rewrite(e)
    }
}

impl From<CheckerFailure> for Error {
    fn from(e: CheckerFailure) -> Error {
        Error::Checker(e)
    }
}

/// Accumulates every validation/structural error found during one compilation, rather than
/// stopping at the first. Per the error-handling policy: no artifact is written while this is
/// non-empty, but artifact/checker errors (pushed individually via `Diagnostics::fail_fast`-style
/// call sites, not this collector) abort the current model immediately instead of accumulating.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<Error>,
    warnings: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    pub fn push_error(&mut self, error: Error) {
        self.errors.push(error);
    }

    pub fn push_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn extend_errors(&mut self, errors: impl IntoIterator<Item = Error>) {
        self.errors.extend(errors);
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Non-zero exit per `--warn-code` policy (§3.3): any error, or any warning when
    /// `warn_as_error` promotes warnings to failures.
    pub fn is_failure(&self, warn_as_error: bool) -> bool {
        self.has_errors() || (warn_as_error && !self.warnings.is_empty())
    }
}

// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use thiserror::Error;

/// Structural and validation failures raised while building or checking a `Dft`.
///
/// These map onto `spec.md` §7's `ValidationError`/`StructuralError` kinds; `dft_compiler`
/// aggregates them into its own top-level `Error` alongside the other component errors.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum GraphError {
    #[error("duplicate node name: {0:?}")]
    DuplicateName(String),

    #[error("reference to unknown node: {0:?}")]
    UnknownName(String),

    #[error("no top node has been set")]
    NoTopNode,

    #[error("cycle in the child relation reachable from {0:?}")]
    CyclicChildRelation(String),

    #[error("node {0:?} is unreachable from the top node")]
    UnreachableNode(String),
}

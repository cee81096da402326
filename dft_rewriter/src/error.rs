// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use dft_graph::GraphError;
use thiserror::Error;

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum RewriteError {
    #[error("evidence names unknown basic event `{0}`")]
    UnknownName(String),
    #[error("evidence names `{0}`, which is not a basic event")]
    EvidenceOnGate(String),
    #[error("SEQ gate `{0}` has a child that is not an independent basic event subtree")]
    NonIndependentSeqChild(String),
    #[error("WSP gate `{0}` cannot mark its primary child always-active")]
    AlwaysActiveWspPrimary(String),
    #[error("basic event `{0}` sets both `lambda` and `prob` without a `calculation_mode` to disambiguate them")]
    AmbiguousCalculationMode(String),
    #[error("basic event `{0}` sets both `dorm` and `mu`, which are mutually exclusive")]
    AmbiguousDormancy(String),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

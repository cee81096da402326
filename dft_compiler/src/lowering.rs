// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use dft_graph::Dft;

use crate::error::Error;

/// An unparsed model, as produced by a textual-syntax parser. No grammar is implemented here;
/// this type exists only so the interface below has something concrete to name.
pub struct RawAst {
    pub source_text: String,
}

/// The textual-syntax parser's interface. No implementation is provided — parsing a Galileo-
/// derived DFT file is conventional plumbing outside this system's scope.
pub trait Parser {
    fn parse(text: &str) -> Result<RawAst, Vec<Error>>;
}

/// Lowers a parsed AST plus a set of evidence names (forced-failure overrides) into a `Dft`
/// ready for `dft_rewriter::rewrite`. No implementation is provided: the AST shape is defined by
/// whichever `Parser` produced it, which this repo does not implement.
pub fn lower(_ast: RawAst, _evidence: &[String]) -> Result<Dft, Vec<Error>> {
    unimplemented!("AST-to-Dft lowering is out of scope; this signature documents the interface a parser/lowering crate must satisfy")
}

// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::fmt::Write as _;

use dft_graph::Dft;
use fnv::FnvHashSet;
use node_automata::{explore_shape, shape_key_for, ExploredShape, ShapeKey, Signal};

use crate::cache::{Cache, OutputKind, FORMAT_VERSION};
use crate::error::Error;

/// Every distinct `ShapeKey` present in `dft`, in `dft.nodes()` traversal order, so that which
/// node "first" claims a shape (and therefore the order artifacts are generated in) is
/// deterministic rather than a function of hash-map iteration.
fn distinct_shapes(dft: &Dft) -> Vec<ShapeKey> {
    let mut seen: FnvHashSet<ShapeKey> = FnvHashSet::default();
    let mut shapes = Vec::new();
    for id in dft.nodes() {
        let key = shape_key_for(dft, id);
        if seen.insert(key.clone()) {
            shapes.push(key);
        }
    }
    shapes
}

fn label_text(label: Signal) -> String {
    format!("{label:?}")
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Renders `explored` as an Aldebaran-style `.aut` body (`des (init, ntrans, nstates)` followed
/// by one `(src,"label",dst)` line per transition), prefixed with the cache's format-version
/// header. `Lnt`/`Bcg`/`Aut` share this body: the distinction between the three output kinds is
/// only which directory and extension a shape's artifact is cached under, not its content.
fn render(explored: &ExploredShape) -> String {
    let mut out = String::new();
    writeln!(out, "(** V{FORMAT_VERSION:06} *)").unwrap();
    writeln!(out, "des ({}, {}, {})", explored.initial, explored.transitions.len(), explored.state_count).unwrap();
    for &(src, label, dst) in &explored.transitions {
        writeln!(out, "({src},\"{}\",{dst})", label_text(label)).unwrap();
    }
    out
}

/// Explores every distinct node shape in `dft` and writes its `.lnt`/`.bcg`/`.aut` artifacts
/// under `cache`, skipping any output that is already valid. `sync_composer::composition_script`
/// references each node's `.bcg` file by shape key, so this must run before a composition script
/// generated against the same `dft` is trusted to resolve.
pub fn emit_node_artifacts(dft: &Dft, cache: &Cache) -> Result<(), Error> {
    const KINDS: [OutputKind; 3] = [OutputKind::Lnt, OutputKind::Bcg, OutputKind::Aut];

    for shape_key in distinct_shapes(dft) {
        let paths: Vec<_> = KINDS.iter().map(|&kind| cache.path_for(&shape_key, kind)).collect();
        if paths.iter().all(|p| cache.is_valid(p)) {
            continue;
        }
        let contents = render(&explore_shape(&shape_key));
        for path in &paths {
            if !cache.is_valid(path) {
                cache.write_atomic(path, &contents)?;
            }
        }
    }
    Ok(())
}

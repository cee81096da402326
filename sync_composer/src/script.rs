// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::fmt::Write as _;

use dft_graph::Dft;
use node_automata::{shape_key_for, Signal};

use crate::{ActorId, Composition};

fn label_text(label: Signal) -> String {
    format!("{label:?}")
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

fn artifact_name(dft: &Dft, actor: ActorId) -> String {
    match actor {
        ActorId::Top => "top.bcg".to_owned(),
        ActorId::Node(id) => format!("{}.bcg", shape_key_for(dft, id)),
    }
}

/// Renders `composition` as the `hide ... in label par using ... in "a.bcg" || ... end par end
/// hide` textual form. Hidden labels are every rule result not in `composition.visible`.
pub fn composition_script(dft: &Dft, composition: &Composition) -> String {
    let mut hidden: Vec<String> = composition
        .rules
        .iter()
        .map(|r| label_text(r.result))
        .filter(|label| !composition.visible.iter().any(|v| label_text(*v) == *label))
        .collect();
    hidden.sort();
    hidden.dedup();

    let mut out = String::new();
    writeln!(out, "hide {} in", hidden.join(", ")).unwrap();
    writeln!(out, "  label par using").unwrap();
    for (i, rule) in composition.rules.iter().enumerate() {
        let mut slots: Vec<String> = vec!["_".to_owned(); composition.actors.len()];
        for (actor, label) in &rule.participants {
            let pos = composition
                .actors
                .iter()
                .position(|a| a == actor)
                .expect("rule participant must be a known actor");
            slots[pos] = label_text(*label);
        }
        let sep = if i + 1 == composition.rules.len() { "" } else { "," };
        writeln!(out, "    {} -> {}{}", slots.join(" * "), label_text(rule.result), sep).unwrap();
    }
    writeln!(out, "  in").unwrap();
    let files: Vec<String> = composition
        .actors
        .iter()
        .map(|&a| format!("\"{}\"", artifact_name(dft, a)))
        .collect();
    writeln!(out, "    {}", files.join(" || ")).unwrap();
    writeln!(out, "  end par").unwrap();
    write!(out, "end hide").unwrap();
    out
}

// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use crate::{BasicEvent, Dft, Gate, GateKind, GraphError, NodeKind};

fn basic_event(dft: &mut Dft, name: &str, lambda: f64) -> crate::NodeId {
    dft.add_node(
        name.to_owned(),
        NodeKind::BasicEvent(BasicEvent {
            lambda,
            ..BasicEvent::default()
        }),
    )
    .unwrap()
}

#[test]
fn duplicate_name_is_rejected() {
    let mut dft = Dft::new();
    basic_event(&mut dft, "b1", 1.0);
    let result = dft.add_node(
        "b1".to_owned(),
        NodeKind::BasicEvent(BasicEvent::default()),
    );
    assert_eq!(result, Err(GraphError::DuplicateName("b1".to_owned())));
}

#[test]
fn and_gate_of_two_bes_validates() {
    let mut dft = Dft::new();
    let b1 = basic_event(&mut dft, "b1", 1.0);
    let b2 = basic_event(&mut dft, "b2", 1.0);
    let and = dft
        .add_node(
            "A".to_owned(),
            NodeKind::Gate(Gate {
                kind: GateKind::And,
                children: vec![b1, b2],
            }),
        )
        .unwrap();
    dft.set_top(and);
    dft.recompute_parents();

    assert!(dft.validate().is_ok());
    assert_eq!(dft.node(b1).parents, vec![and]);
    assert_eq!(dft.node(b2).parents, vec![and]);
}

#[test]
fn unreachable_node_fails_validation() {
    let mut dft = Dft::new();
    let b1 = basic_event(&mut dft, "b1", 1.0);
    let _orphan = basic_event(&mut dft, "orphan", 1.0);
    dft.set_top(b1);

    let errors = dft.validate().unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, GraphError::UnreachableNode(name) if name == "orphan")));
}

#[test]
fn missing_top_node_fails_validation() {
    let mut dft = Dft::new();
    basic_event(&mut dft, "b1", 1.0);
    let errors = dft.validate().unwrap_err();
    assert!(errors.iter().any(|e| matches!(e, GraphError::NoTopNode)));
}

#[test]
fn cycle_in_child_relation_is_detected() {
    let mut dft = Dft::new();
    let a = dft
        .add_node(
            "A".to_owned(),
            NodeKind::Gate(Gate {
                kind: GateKind::And,
                children: vec![],
            }),
        )
        .unwrap();
    let b = dft
        .add_node(
            "B".to_owned(),
            NodeKind::Gate(Gate {
                kind: GateKind::And,
                children: vec![a],
            }),
        )
        .unwrap();
    // Introduce a cycle: A -> B -> A.
    if let NodeKind::Gate(gate) = &mut dft.node_mut(a).kind {
        gate.children.push(b);
    }
    dft.set_top(a);

    let errors = dft.validate().unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, GraphError::CyclicChildRelation(_))));
}

#[test]
fn fdep_depender_is_reachable_through_backward_edge() {
    let mut dft = Dft::new();
    let trigger = basic_event(&mut dft, "trigger", 1.0);
    let depender = basic_event(&mut dft, "depender", 1.0);
    let fdep = dft
        .add_node(
            "F".to_owned(),
            NodeKind::Gate(Gate {
                kind: GateKind::Fdep,
                children: vec![trigger, depender],
            }),
        )
        .unwrap();
    dft.set_top(fdep);
    dft.recompute_parents();

    assert!(dft.validate().is_ok());
    let reachable = dft.reachable_from_top().unwrap();
    assert!(reachable.contains(&depender));
}

#[test]
fn tombstoned_node_is_excluded_from_iteration_and_lookup() {
    let mut dft = Dft::new();
    let b1 = basic_event(&mut dft, "b1", 1.0);
    dft.set_top(b1);
    let orphan = basic_event(&mut dft, "orphan", 1.0);
    dft.tombstone(orphan);

    assert_eq!(dft.nodes().count(), 1);
    assert_eq!(dft.lookup_by_name("orphan"), None);
    assert!(dft.validate().is_ok());
}

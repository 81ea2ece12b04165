//! Build-time validation: empty graphs, arity, sinks, cycles, inputs.

use proptest::prelude::*;

use cascade_core::{call0, call1, call2, graph, node0, node1, node2, GraphError, Name};

#[test]
fn empty_graph_fails_to_build() {
    let err = graph::<String>().build().unwrap_err();
    assert!(matches!(err, GraphError::EmptyGraph));
    assert!(err.to_string().contains("Empty graph"));
}

#[test]
fn node_declared_without_arguments_fails_arity_validation() {
    let mut builder = graph::<String>();
    builder.call(
        call2(node2(|a: String, b: String| async move { Ok(a + &b) })).named("needs two"),
    );
    let err = builder.build().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Incorrect argument count"));
    assert!(message.contains("needs two"));
}

#[test]
fn two_unrelated_nodes_are_multiple_sinks() {
    let mut builder = graph::<String>();
    builder.call(call0(node0(|| async { Ok("one".to_string()) })).named("the first sink"));
    builder.call(call0(node0(|| async { Ok("two".to_string()) })));

    let err = builder.build().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Multiple sinks"));
    assert!(message.contains("the first sink"));
    assert!(message.contains("unnamed"));
}

#[test]
fn declaration_cycle_is_detected_with_a_representative_path() {
    let mut builder = graph::<String>();
    let n1 = builder.call(call0(node0(|| async { Ok("one".to_string()) })).named("n1"));
    let n2 = builder.call(
        call1(node1(|s: String| async move { Ok(s) }))
            .with(&n1)
            .named("n2"),
    );
    n1.after(&n2);

    let err = builder.build().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("cycle detected"));
    assert!(
        message.contains("n1 -> n2 -> n1") || message.contains("n2 -> n1 -> n2"),
        "unexpected cycle path in: {message}"
    );
}

#[test]
fn bindings_must_reference_declared_inputs() {
    let undeclared = Name::<String>::new("undeclared");
    let mut builder = graph::<String>();
    builder.call(
        call1(node1(|s: String| async move { Ok(s) }))
            .with(&undeclared)
            .named("reader"),
    );

    let err = builder.build().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("reader"));
    assert!(message.contains("undeclared"));
}

#[test]
fn validation_reports_the_first_error_in_order() {
    // Both an arity problem and two sinks: arity is checked first.
    let mut builder = graph::<String>();
    builder.call(
        call2(node2(|a: String, b: String| async move { Ok(a + &b) })).named("unbound"),
    );
    builder.call(call0(node0(|| async { Ok("x".to_string()) })).named("extra"));

    let err = builder.build().unwrap_err();
    assert!(err.to_string().contains("Incorrect argument count"));
}

#[test]
fn happens_after_alone_keeps_a_single_sink() {
    let mut builder = graph::<String>();
    let first = builder.call(call0(node0(|| async { Ok("first".to_string()) })).named("first"));
    let last = builder.call(call0(node0(|| async { Ok("last".to_string()) })).named("last"));
    last.after(&first);

    let built = builder.build().unwrap();
    assert_eq!(built.info().name(), "last");
    assert_eq!(built.info().predecessors().len(), 1);
    assert_eq!(built.info().predecessors()[0].name(), "first");
    assert!(built.info().args().is_empty());
}

proptest! {
    #[test]
    fn linear_chains_always_build(len in 1usize..16) {
        let mut builder = graph::<u64>();
        let mut prev = builder.call(call0(node0(|| async { Ok(0u64) })).named("head"));
        for i in 1..len {
            prev = builder.call(
                call1(node1(|x: u64| async move { Ok(x + 1) }))
                    .with(&prev)
                    .named(format!("step{i}")),
            );
        }
        prop_assert!(builder.build().is_ok());
    }

    #[test]
    fn every_extra_sink_is_rejected(sinks in 2usize..8) {
        let mut builder = graph::<u64>();
        for i in 0..sinks {
            builder.call(call0(node0(|| async { Ok(1u64) })).named(format!("sink{i}")));
        }
        let err = builder.build().unwrap_err();
        let matches_expected = matches!(err, GraphError::MultipleSinks { ref nodes } if nodes.len() == sinks);
        prop_assert!(matches_expected);
    }
}

//! Error kinds: every failure a running graph can hit, surfaced as the
//! right `FlowError` variant with no partial output.

use anyhow::Result;
use rowflow::operators::mappers::{LowerCase, Product, Speed};
use rowflow::operators::reducers::Count;
use rowflow::testing::*;
use rowflow::{Bindings, ExternalSort, FlowError, Graph, InnerJoiner, Join, Reduce, row};

#[test]
fn running_with_an_unbound_source_fails() {
    let graph = Graph::from_source("input").map(LowerCase::new("text"));
    let err = graph.run(Bindings::new()).unwrap_err();
    assert!(matches!(err, FlowError::UnboundSource(name) if name == "input"));
}

#[test]
fn one_unbound_side_of_a_join_fails() {
    let left = Graph::from_source("left");
    let right = Graph::from_source("right");
    let graph = left.join(InnerJoiner::new(), &right, &["k"]);
    let err = graph
        .run(Bindings::new().bind_rows("left", vec![row! { "k" => 1 }]))
        .unwrap_err();
    assert!(matches!(err, FlowError::UnboundSource(name) if name == "right"));
}

#[test]
fn missing_column_names_the_column() {
    let graph = Graph::from_source("input").map(LowerCase::new("text"));
    let err = graph
        .run(Bindings::new().bind_rows("input", vec![row! { "other" => "x" }]))
        .unwrap_err();
    assert!(matches!(err, FlowError::MissingColumn(column) if column == "text"));
}

#[test]
fn type_mismatch_on_non_numeric_arithmetic() {
    let graph = Graph::from_source("input").map(Product::new(&["a", "b"], "p"));
    let err = graph
        .run(Bindings::new().bind_rows(
            "input",
            vec![row! { "a" => 2, "b" => "three" }],
        ))
        .unwrap_err();
    assert!(matches!(err, FlowError::TypeMismatch { .. }));
}

#[test]
fn sort_rejects_incomparable_key_values() {
    let rows = vec![row! { "k" => 1 }, row! { "k" => "one" }];
    let err = collect(ExternalSort::new(vec!["k".to_string()]).apply(stream_of(rows)))
        .unwrap_err();
    assert!(matches!(err, FlowError::NotComparable { .. }));
}

#[test]
fn grouping_rejects_incomparable_adjacent_keys() {
    let rows = vec![row! { "k" => 1 }, row! { "k" => "one" }];
    let err = collect(
        Reduce::new(Count::new("count"), vec!["k".to_string()]).apply(stream_of(rows)),
    )
    .unwrap_err();
    assert!(matches!(err, FlowError::NotComparable { .. }));
}

#[test]
fn reduce_detects_unsorted_input() {
    let rows = vec![
        row! { "k" => 2, "v" => 1 },
        row! { "k" => 1, "v" => 2 },
    ];
    let err = collect(
        Reduce::new(Count::new("count"), vec!["k".to_string()]).apply(stream_of(rows)),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        FlowError::SortedOrderViolated { operation: "reduce" }
    ));
}

#[test]
fn join_detects_unsorted_input() {
    let left = vec![
        row! { "k" => 2, "v" => 1 },
        row! { "k" => 1, "v" => 2 },
    ];
    let right = vec![row! { "k" => 1, "w" => 3 }];
    let err = collect(
        Join::new(InnerJoiner::new(), vec!["k".to_string()])
            .apply(stream_of(left), stream_of(right)),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        FlowError::SortedOrderViolated { operation: "join" }
    ));
}

#[test]
fn user_errors_propagate_from_operators() {
    let graph = Graph::from_source("input").map(Speed::new("length", "dt", "speed"));
    let err = graph
        .run(Bindings::new().bind_rows(
            "input",
            vec![row! { "length" => 10.0, "dt" => 0.0 }],
        ))
        .unwrap_err();
    assert!(matches!(err, FlowError::User(_)));
}

#[test]
fn errors_abort_the_run_with_no_partial_result() {
    // The second row is malformed; the run must fail as a whole even though
    // the first row maps cleanly.
    let graph = Graph::from_source("input").map(LowerCase::new("text"));
    let result = graph.run(Bindings::new().bind_rows(
        "input",
        vec![row! { "text" => "OK" }, row! { "wrong" => 1 }],
    ));
    assert!(result.is_err());
}

#[test]
fn missing_file_surfaces_as_io_error() {
    let graph = Graph::from_source("input");
    let err = graph
        .run(Bindings::new().bind(
            "input",
            rowflow::file_source("/nonexistent/rowflow-test-input", rowflow::parse_json_row),
        ))
        .unwrap_err();
    assert!(matches!(err, FlowError::Io(_)));
}

#[test]
fn malformed_line_is_a_user_parser_error() -> Result<()> {
    use std::io::Write;
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "{{not json")?;
    file.flush()?;

    let graph = Graph::from_source("input");
    let err = graph
        .run(Bindings::new().bind(
            "input",
            rowflow::file_source(file.path(), rowflow::parse_json_row),
        ))
        .unwrap_err();
    assert!(matches!(err, FlowError::User(_)));
    Ok(())
}

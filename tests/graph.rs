//! Graph composition and execution: builder purity, source-table merging,
//! binding rules, re-runs.

use anyhow::Result;
use rowflow::operators::mappers::{Identity, LowerCase, Project};
use rowflow::operators::reducers::{Count, TopN};
use rowflow::testing::*;
use rowflow::{Bindings, Graph, InnerJoiner, Row, row};

fn numbers() -> Vec<Row> {
    vec![
        row! { "1" => 1, "2" => 2, "3" => 3 },
        row! { "1" => 4, "2" => 5, "3" => 6 },
    ]
}

#[test]
fn source_graph_passes_rows_through() -> Result<()> {
    let graph = Graph::from_source("input");
    let out = graph.run(Bindings::new().bind_rows("input", numbers()))?;
    assert_rows_equal(&out, &numbers());
    Ok(())
}

#[test]
fn map_node_applies_mapper() -> Result<()> {
    let graph = Graph::from_source("input").map(Identity::new());
    let out = graph.run(Bindings::new().bind_rows("input", numbers()))?;
    assert_rows_equal(&out, &numbers());
    Ok(())
}

#[test]
fn reduce_node_applies_reducer_per_group() -> Result<()> {
    let rows = vec![
        row! { "1" => 1, "2" => 2, "3" => 3 },
        row! { "1" => 1, "2" => 2, "3" => 6 },
        row! { "1" => 2, "2" => 3, "3" => 6 },
    ];
    let graph = Graph::from_source("input").reduce(TopN::new("1", 2), &["1", "2"]);
    let out = graph.run(Bindings::new().bind_rows("input", rows.clone()))?;
    assert_rows_equal(&out, &rows);
    Ok(())
}

#[test]
fn join_node_joins_two_graphs() -> Result<()> {
    let left_rows = vec![
        row! { "1" => 1, "2" => 2, "3" => 3 },
        row! { "1" => 1, "2" => 2, "3" => 6 },
        row! { "1" => 2, "2" => 3, "3" => 6 },
    ];
    let right_rows = vec![
        row! { "1" => 1, "2" => 2, "3" => 3 },
        row! { "1" => 4, "2" => 5, "3" => 6 },
    ];
    let left = Graph::from_source("left");
    let right = Graph::from_source("right");
    let graph = left.join(InnerJoiner::new(), &right, &["1", "2"]);
    let out = graph.run(
        Bindings::new()
            .bind_rows("left", left_rows)
            .bind_rows("right", right_rows),
    )?;
    assert_rows_equal(
        &out,
        &[
            row! { "1" => 1, "2" => 2, "3_1" => 3, "3_2" => 3 },
            row! { "1" => 1, "2" => 2, "3_1" => 6, "3_2" => 3 },
        ],
    );
    Ok(())
}

#[test]
fn builder_calls_leave_the_receiver_unchanged() -> Result<()> {
    let base = Graph::from_source("input");
    let extended = base.map(LowerCase::new("text"));

    // The base graph still runs as a bare source.
    let rows = vec![row! { "text" => "ABC" }];
    let out = base.run(Bindings::new().bind_rows("input", rows.clone()))?;
    assert_rows_equal(&out, &rows);

    let out = extended.run(Bindings::new().bind_rows("input", rows))?;
    assert_rows_equal(&out, &[row! { "text" => "abc" }]);
    Ok(())
}

#[test]
fn branches_extend_independently() -> Result<()> {
    let base = Graph::from_source("input").sort(&["text"]);
    let counted = base.reduce(Count::new("count"), &["text"]);
    let projected = base.map(Project::new(&["text"]));

    let rows = vec![
        row! { "text" => "b", "junk" => 1 },
        row! { "text" => "a", "junk" => 2 },
        row! { "text" => "b", "junk" => 3 },
    ];

    let counts = counted.run(Bindings::new().bind_rows("input", rows.clone()))?;
    assert_rows_equal(
        &counts,
        &[
            row! { "text" => "a", "count" => 1 },
            row! { "text" => "b", "count" => 2 },
        ],
    );

    // Running one branch does not disturb the other.
    let projections = projected.run(Bindings::new().bind_rows("input", rows.clone()))?;
    assert_rows_equal(
        &projections,
        &[
            row! { "text" => "a" },
            row! { "text" => "b" },
            row! { "text" => "b" },
        ],
    );

    let counts_again = counted.run(Bindings::new().bind_rows("input", rows))?;
    assert_rows_equal(&counts_again, &counts);
    Ok(())
}

#[test]
fn rerunning_a_graph_yields_equal_output() -> Result<()> {
    let graph = Graph::from_source("input")
        .sort(&["text"])
        .reduce(Count::new("count"), &["text"]);
    let rows = vec![
        row! { "text" => "x" },
        row! { "text" => "y" },
        row! { "text" => "x" },
    ];
    let first = graph.run(Bindings::new().bind_rows("input", rows.clone()))?;
    let second = graph.run(Bindings::new().bind_rows("input", rows))?;
    assert_rows_equal(&first, &second);
    Ok(())
}

#[test]
fn colliding_source_names_are_renamed_with_underscores() -> Result<()> {
    let left = Graph::from_source("input");
    let right = Graph::from_source("input");
    let graph = left.join(InnerJoiner::new(), &right, &["k"]);

    assert_eq!(graph.source_names(), vec!["input", "input_"]);

    // Repeated binds of the original name reach the renamed slot in
    // registration order: first bind feeds the left side, second the right.
    let out = graph.run(
        Bindings::new()
            .bind_rows("input", vec![row! { "k" => 1, "left" => "l" }])
            .bind_rows("input", vec![row! { "k" => 1, "right" => "r" }]),
    )?;
    assert_rows_equal(&out, &[row! { "k" => 1, "left" => "l", "right" => "r" }]);
    Ok(())
}

#[test]
fn renamed_sources_bind_by_registered_name_too() -> Result<()> {
    let left = Graph::from_source("input");
    let right = Graph::from_source("input");
    let graph = left.join(InnerJoiner::new(), &right, &["k"]);

    let out = graph.run(
        Bindings::new()
            .bind_rows("input_", vec![row! { "k" => 1, "right" => "r" }])
            .bind_rows("input", vec![row! { "k" => 1, "left" => "l" }]),
    )?;
    assert_rows_equal(&out, &[row! { "k" => 1, "left" => "l", "right" => "r" }]);
    Ok(())
}

#[test]
fn shared_source_registers_once_across_joined_branches() -> Result<()> {
    // A diamond: two branches over one source, joined back together.
    let base = Graph::from_source("input").sort(&["k"]);
    let counted = base.reduce(Count::new("count"), &["k"]);
    let graph = base.join(InnerJoiner::new(), &counted, &["k"]);

    assert_eq!(graph.source_names(), vec!["input"]);

    let rows = vec![
        row! { "k" => 1, "v" => "a" },
        row! { "k" => 1, "v" => "b" },
    ];
    let out = graph.run(Bindings::new().bind_rows("input", rows))?;
    assert_rows_equal(
        &out,
        &[
            row! { "k" => 1, "v" => "a", "count" => 2 },
            row! { "k" => 1, "v" => "b", "count" => 2 },
        ],
    );
    Ok(())
}

#[test]
fn unknown_binding_names_are_ignored() -> Result<()> {
    let graph = Graph::from_source("input");
    let out = graph.run(
        Bindings::new()
            .bind_rows("typo", vec![row! { "x" => 0 }])
            .bind_rows("input", numbers()),
    )?;
    assert_rows_equal(&out, &numbers());
    Ok(())
}

#[test]
fn source_factories_are_invoked_afresh_per_run() -> Result<()> {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    let calls = Arc::new(AtomicUsize::new(0));
    let factory: rowflow::SourceFactory = {
        let calls = Arc::clone(&calls);
        Arc::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            Box::new(vec![row! { "k" => 1 }].into_iter().map(Ok)) as rowflow::RowStream
        })
    };

    let graph = Graph::from_source("input").map(Identity::new());
    graph.run(Bindings::new().bind("input", Arc::clone(&factory)))?;
    graph.run(Bindings::new().bind("input", factory))?;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    Ok(())
}

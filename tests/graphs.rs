//! End-to-end runs of the graph catalogue.

use anyhow::Result;
use rowflow::graphs::{average_speed_graph, pmi_graph, tf_idf_graph, word_count_graph};
use rowflow::testing::*;
use rowflow::{Bindings, Row, file_source, parse_json_row, row};
use std::io::Write;

fn documents() -> Vec<Row> {
    vec![
        row! { "doc_id" => 1, "text" => "hello world" },
        row! { "doc_id" => 2, "text" => "hello hello" },
        row! { "doc_id" => 3, "text" => "world" },
    ]
}

#[test]
fn word_count() -> Result<()> {
    let graph = word_count_graph("docs", "text", "count");
    let out = graph.run(Bindings::new().bind_rows(
        "docs",
        vec![
            row! { "text" => "Hello, world" },
            row! { "text" => "hello!" },
        ],
    ))?;
    assert_rows_equal(
        &out,
        &[
            row! { "text" => "world", "count" => 1 },
            row! { "text" => "hello", "count" => 2 },
        ],
    );
    Ok(())
}

#[test]
fn word_count_runs_twice_with_equal_output() -> Result<()> {
    let graph = word_count_graph("docs", "text", "count");
    let rows = vec![
        row! { "text" => "a b a" },
        row! { "text" => "b a b" },
    ];
    let first = graph.run(Bindings::new().bind_rows("docs", rows.clone()))?;
    let second = graph.run(Bindings::new().bind_rows("docs", rows))?;
    assert_rows_equal(&first, &second);
    Ok(())
}

#[test]
fn word_count_from_file_matches_in_memory_rows() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, r#"{{"text": "Hello, world"}}"#)?;
    writeln!(file, r#"{{"text": "hello!"}}"#)?;
    file.flush()?;

    let graph = word_count_graph("docs", "text", "count");
    let from_file = graph.run(
        Bindings::new().bind("docs", file_source(file.path(), parse_json_row)),
    )?;
    let from_rows = graph.run(Bindings::new().bind_rows(
        "docs",
        vec![
            row! { "text" => "Hello, world" },
            row! { "text" => "hello!" },
        ],
    ))?;
    assert_rows_equal(&from_file, &from_rows);
    Ok(())
}

#[test]
fn tf_idf() -> Result<()> {
    let graph = tf_idf_graph("texts", "doc_id", "text", "tf_idf");
    let out = graph.run(Bindings::new().bind_rows("texts", documents()))?;

    // Both words appear in two of the three documents: idf = ln(3/2).
    let idf = (3.0f64 / 2.0).ln();
    assert_rows_approx_equal(
        &out,
        &[
            row! { "doc_id" => 1, "text" => "hello", "tf_idf" => 0.5 * idf },
            row! { "doc_id" => 1, "text" => "world", "tf_idf" => 0.5 * idf },
            row! { "doc_id" => 2, "text" => "hello", "tf_idf" => 1.0 * idf },
            row! { "doc_id" => 3, "text" => "world", "tf_idf" => 1.0 * idf },
        ],
        1e-9,
    );
    Ok(())
}

#[test]
fn pmi() -> Result<()> {
    let graph = pmi_graph("texts", "doc_id", "text", "pmi");
    let out = graph.run(Bindings::new().bind_rows(
        "texts",
        vec![
            row! { "doc_id" => 1, "text" => "little little big" },
            row! { "doc_id" => 2, "text" => "little hello hello" },
        ],
    ))?;

    // Survivors are words longer than four characters occurring at least
    // twice in their document: "little" in doc 1, "hello" in doc 2. Each
    // has in-document frequency 1 against corpus frequency 1/2.
    let ln2 = 2.0f64.ln();
    assert_rows_approx_equal(
        &out,
        &[
            row! { "doc_id" => 1, "text" => "little", "pmi" => ln2 },
            row! { "doc_id" => 2, "text" => "hello", "pmi" => ln2 },
        ],
        1e-9,
    );
    Ok(())
}

#[test]
fn average_speed_per_weekday_and_hour() -> Result<()> {
    use rowflow::Value;
    let pair = |lon: f64, lat: f64| vec![Value::from(lon), Value::from(lat)];

    let edges = vec![
        row! { "edge_id" => 1, "start" => pair(0.0, 0.0), "end" => pair(1.0, 0.0) },
    ];
    // Two traversals of the same edge on Friday noon: one hour and two
    // hours for the same distance.
    let times = vec![
        row! { "edge_id" => 1, "enter_time" => "20171020T120000", "leave_time" => "20171020T130000" },
        row! { "edge_id" => 1, "enter_time" => "20171020T120500", "leave_time" => "20171020T140500" },
    ];

    let graph = average_speed_graph("travel_times", "edge_lengths");
    let out = graph.run(
        Bindings::new()
            .bind_rows("travel_times", times)
            .bind_rows("edge_lengths", edges),
    )?;

    // One degree of longitude along the equator.
    let length = 6371.0 * 1.0f64.to_radians();
    let mean_speed = (length / 1.0 + length / 2.0) / 2.0;
    assert_rows_approx_equal(
        &out,
        &[row! { "weekday" => "Fri", "hour" => 12, "speed" => mean_speed }],
        1e-6,
    );
    Ok(())
}

#[test]
fn tf_idf_has_a_single_bindable_source() {
    // Both internal branches read the same source; it registers once.
    let graph = tf_idf_graph("texts", "doc_id", "text", "tf_idf");
    assert_eq!(graph.source_names(), vec!["texts"]);
}

//! External sort: ordering, stability, determinism, and the spill path.

use anyhow::Result;
use rowflow::testing::*;
use rowflow::{ExternalSort, Row, row};

fn sort_rows(keys: &[&str], rows: Vec<Row>) -> rowflow::Result<Vec<Row>> {
    let keys = keys.iter().map(|k| (*k).to_string()).collect();
    collect(ExternalSort::new(keys).apply(stream_of(rows)))
}

fn sort_rows_spilled(keys: &[&str], chunk_rows: usize, rows: Vec<Row>) -> rowflow::Result<Vec<Row>> {
    let keys = keys.iter().map(|k| (*k).to_string()).collect();
    collect(
        ExternalSort::new(keys)
            .with_chunk_rows(chunk_rows)
            .apply(stream_of(rows)),
    )
}

#[test]
fn sorts_ascending_by_key_tuple() -> Result<()> {
    let rows = vec![
        row! { "a" => 2, "b" => "y" },
        row! { "a" => 1, "b" => "z" },
        row! { "a" => 2, "b" => "x" },
        row! { "a" => 1, "b" => "a" },
    ];
    let out = sort_rows(&["a", "b"], rows)?;
    assert_rows_equal(
        &out,
        &[
            row! { "a" => 1, "b" => "a" },
            row! { "a" => 1, "b" => "z" },
            row! { "a" => 2, "b" => "x" },
            row! { "a" => 2, "b" => "y" },
        ],
    );
    Ok(())
}

#[test]
fn sort_is_stable() -> Result<()> {
    let rows = vec![
        row! { "k" => 2, "pos" => 1 },
        row! { "k" => 1, "pos" => 2 },
        row! { "k" => 2, "pos" => 3 },
        row! { "k" => 1, "pos" => 4 },
        row! { "k" => 2, "pos" => 5 },
    ];
    let out = sort_rows(&["k"], rows)?;
    assert_rows_equal(
        &out,
        &[
            row! { "k" => 1, "pos" => 2 },
            row! { "k" => 1, "pos" => 4 },
            row! { "k" => 2, "pos" => 1 },
            row! { "k" => 2, "pos" => 3 },
            row! { "k" => 2, "pos" => 5 },
        ],
    );
    Ok(())
}

#[test]
fn sort_is_deterministic() -> Result<()> {
    let rows: Vec<Row> = (0..100)
        .map(|i| row! { "k" => (i * 37) % 11, "i" => i })
        .collect();
    let a = sort_rows(&["k"], rows.clone())?;
    let b = sort_rows(&["k"], rows)?;
    assert_rows_equal(&a, &b);
    Ok(())
}

#[test]
fn spill_path_matches_in_memory_sort() -> Result<()> {
    let rows: Vec<Row> = (0..250)
        .map(|i| row! { "k" => (i * 37) % 11, "i" => i })
        .collect();
    let in_memory = sort_rows(&["k"], rows.clone())?;
    // A chunk of 7 rows forces dozens of scratch chunks and a wide merge.
    let spilled = sort_rows_spilled(&["k"], 7, rows)?;
    assert_rows_equal(&spilled, &in_memory);
    Ok(())
}

#[test]
fn spill_path_is_stable_across_chunk_boundaries() -> Result<()> {
    // All rows share one key; the merge must preserve input order exactly.
    let rows: Vec<Row> = (0..40).map(|i| row! { "k" => 1, "pos" => i }).collect();
    let out = sort_rows_spilled(&["k"], 3, rows.clone())?;
    assert_rows_equal(&out, &rows);
    Ok(())
}

#[test]
fn numeric_keys_mix_int_and_float() -> Result<()> {
    let rows = vec![
        row! { "k" => 2.5 },
        row! { "k" => 2 },
        row! { "k" => 1.5 },
        row! { "k" => 3 },
    ];
    let out = sort_rows(&["k"], rows)?;
    assert_rows_equal(
        &out,
        &[
            row! { "k" => 1.5 },
            row! { "k" => 2 },
            row! { "k" => 2.5 },
            row! { "k" => 3 },
        ],
    );
    Ok(())
}

#[test]
fn empty_input_and_empty_keys() -> Result<()> {
    let out = sort_rows(&["k"], Vec::new())?;
    assert_rows_equal(&out, &[]);

    // Sorting by no keys is the stable identity.
    let rows = vec![row! { "a" => 3 }, row! { "a" => 1 }, row! { "a" => 2 }];
    let out = sort_rows(&[], rows.clone())?;
    assert_rows_equal(&out, &rows);
    Ok(())
}

#[test]
fn values_survive_the_scratch_round_trip() -> Result<()> {
    use rowflow::Value;
    let rows: Vec<Row> = (0..10)
        .map(|i| {
            row! {
                "k" => 9 - i,
                "f" => i as f64 / 3.0,
                "s" => format!("row {i}"),
                "l" => vec![Value::from(i), Value::from("x")],
            }
        })
        .collect();
    let spilled = sort_rows_spilled(&["k"], 2, rows.clone())?;
    let mut expected = rows;
    expected.reverse();
    assert_rows_equal(&spilled, &expected);
    Ok(())
}

#[test]
fn early_termination_releases_the_stream() -> Result<()> {
    let rows: Vec<Row> = (0..50).map(|i| row! { "k" => 50 - i }).collect();
    let keys = vec!["k".to_string()];
    let mut stream = ExternalSort::new(keys)
        .with_chunk_rows(5)
        .apply(stream_of(rows));
    // Pull one row, then drop the stream with its scratch files mid-merge.
    let first = stream.next().expect("one row")?;
    assert_eq!(first, row! { "k" => 1 });
    drop(stream);
    Ok(())
}

#[test]
fn sorting_is_deferred_until_first_pull() {
    // The input stream fails on first pull; building the sorted stream
    // must not touch it.
    let failing: rowflow::RowStream = Box::new(std::iter::once(Err(
        rowflow::FlowError::MissingColumn("boom".into()),
    )));
    let stream = ExternalSort::new(vec!["k".to_string()]).apply(failing);
    drop(stream);
}

//! A catalogue of ready-made graphs.
//!
//! Each function composes the standard operator library into an unbound
//! [`Graph`] over named sources; callers bind rows (or files, via
//! [`file_source`](crate::io::file_source)) at run time:
//!
//! ```
//! use rowflow::{Bindings, row};
//! use rowflow::graphs::word_count_graph;
//!
//! let graph = word_count_graph("docs", "text", "count");
//! let out = graph.run(Bindings::new().bind_rows(
//!     "docs",
//!     vec![row! { "text" => "Hello, world" }, row! { "text" => "hello!" }],
//! ))?;
//! assert_eq!(
//!     out,
//!     vec![
//!         row! { "text" => "world", "count" => 1 },
//!         row! { "text" => "hello", "count" => 2 },
//!     ]
//! );
//! # rowflow::Result::<()>::Ok(())
//! ```

use crate::graph::Graph;
use crate::operators::joiners::InnerJoiner;
use crate::operators::mappers::{
    DeltaTime, Filter, FilterPunctuation, Haversine, Hour, LogRatio, LowerCase, ParseDate,
    Product, Project, Speed, Split, WeekDay,
};
use crate::operators::reducers::{Count, First, Mean, TermFrequency, TopN};
use crate::row::Row;

/// Count the words of `text_column` across all rows of `input`.
///
/// Output rows are `{text_column, count_column}`, sorted by (count, word).
pub fn word_count_graph(input: &str, text_column: &str, count_column: &str) -> Graph {
    Graph::from_source(input)
        .map(FilterPunctuation::new(text_column))
        .map(LowerCase::new(text_column))
        .map(Split::new(text_column))
        .sort(&[text_column])
        .reduce(Count::new(count_column), &[text_column])
        .sort(&[count_column, text_column])
}

/// Tf-idf for every document/word pair: the top 3 documents per word by
/// `tf * idf`, projected to `{doc_column, text_column, result_column}`.
pub fn tf_idf_graph(input: &str, doc_column: &str, text_column: &str, result_column: &str) -> Graph {
    let rows = Graph::from_source(input);

    let words = rows
        .map(FilterPunctuation::new(text_column))
        .map(LowerCase::new(text_column))
        .map(Split::new(text_column));

    let doc_count = "doc_count";

    // Total number of documents, as a single keyless row.
    let total_docs = rows
        .sort(&[doc_column])
        .reduce(Count::new(doc_count), &[]);

    let suffix = "_1";

    // Documents containing each word, joined with the total to get idf.
    let idf = words
        .sort(&[doc_column, text_column])
        .reduce(First::new(), &[doc_column, text_column])
        .sort(&[text_column])
        .reduce(Count::new(doc_count), &[text_column])
        .join(InnerJoiner::with_suffixes("", suffix), &total_docs, &[])
        .map(LogRatio::new(
            format!("{doc_count}{suffix}"),
            doc_count,
            "idf",
        ));

    let tf = words
        .sort(&[doc_column])
        .reduce(TermFrequency::new(text_column), &[doc_column])
        .sort(&[text_column]);

    tf.join(InnerJoiner::new(), &idf, &[text_column])
        .map(Product::new(&["tf", "idf"], result_column))
        .reduce(TopN::new(result_column, 3), &[text_column])
        .sort(&[doc_column])
        .map(Project::new(&[doc_column, text_column, result_column]))
}

/// The top 10 words per document ranked by pointwise mutual information:
/// `ln(tf_in_document / tf_in_corpus)`, over words longer than four
/// characters occurring at least twice in their document.
pub fn pmi_graph(input: &str, doc_column: &str, text_column: &str, result_column: &str) -> Graph {
    let word_in_doc = "count";

    let words = Graph::from_source(input)
        .map(FilterPunctuation::new(text_column))
        .map(LowerCase::new(text_column))
        .map(Split::new(text_column))
        .sort(&[doc_column, text_column]);

    let long_words = {
        let column = text_column.to_string();
        words.map(Filter::new(move |row: &Row| {
            Ok(row.require(&column)?.as_str()?.chars().count() > 4)
        }))
    };

    let frequent = long_words
        .sort(&[doc_column, text_column])
        .reduce(Count::new(word_in_doc), &[doc_column, text_column])
        .map(Filter::new(move |row: &Row| {
            Ok(row.require(word_in_doc)?.as_int()? >= 2)
        }))
        .join(InnerJoiner::new(), &words, &[doc_column, text_column]);

    let corpus_tf = frequent
        .reduce(TermFrequency::new(text_column), &[])
        .sort(&[text_column]);

    let suffix = "_1";

    frequent
        .sort(&[doc_column])
        .reduce(TermFrequency::new(text_column), &[doc_column])
        .sort(&[text_column])
        .join(
            InnerJoiner::with_suffixes("", suffix),
            &corpus_tf,
            &[text_column],
        )
        .map(LogRatio::new("tf", format!("tf{suffix}"), result_column))
        .sort(&[doc_column, result_column])
        .reduce(TopN::new(result_column, 10), &[doc_column])
        .map(Project::new(&[doc_column, text_column, result_column]))
}

/// Mean traversal speed in km/h per (weekday, hour).
///
/// `edge_lengths` rows carry `edge_id` plus `start`/`end` coordinate pairs;
/// `travel_times` rows carry `edge_id` plus `enter_time`/`leave_time`
/// strings in `YYYYMMDDTHHMMSS.ffffff` form. Output rows are
/// `{weekday, hour, speed}`.
pub fn average_speed_graph(travel_times: &str, edge_lengths: &str) -> Graph {
    let lengths = Graph::from_source(edge_lengths)
        .map(Haversine::new("start", "end", "length"))
        .sort(&["edge_id"]);

    let times = Graph::from_source(travel_times)
        .map(ParseDate::new("enter_time", "enter_dt"))
        .map(ParseDate::new("leave_time", "leave_dt"))
        .map(WeekDay::new("enter_dt", "weekday"))
        .map(Hour::new("enter_dt", "hour"))
        .map(DeltaTime::new("enter_dt", "leave_dt", "dt"))
        .sort(&["edge_id"]);

    lengths
        .join(InnerJoiner::new(), &times, &["edge_id"])
        .map(Speed::new("length", "dt", "speed"))
        .sort(&["weekday", "hour"])
        .reduce(Mean::new("speed"), &["weekday", "hour"])
        .map(Project::new(&["weekday", "hour", "speed"]))
}

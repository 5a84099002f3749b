//! Bounded-memory stable external sort.
//!
//! [`ExternalSort`] yields all rows of a stream in ascending lexicographic
//! order of their key tuples, stably, buffering at most one chunk of rows at
//! a time:
//!
//! 1. Rows accumulate into a chunk; each full chunk is stable-sorted and
//!    spilled to an unlinked scratch file as one serde_json row per line.
//! 2. An input that fits in a single chunk never touches disk.
//! 3. Spilled chunks merge by always taking the smallest head key, breaking
//!    ties toward the earliest chunk -- chunks are cut in input order, so the
//!    merged output is stable end to end.
//!
//! Scratch files are unlinked at creation and owned by the merge stream;
//! dropping the stream (normal exhaustion, error, or a consumer that stops
//! pulling) releases them. Sorting is deferred until the first pull so that
//! building and wiring a graph stays lazy.

use crate::error::{FlowError, Result};
use crate::operations::RowStream;
use crate::row::{KeyTuple, Row, Value, sort_cmp_tuples};
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Seek, Write};

/// Rows buffered in memory before a chunk is sorted and spilled.
pub const DEFAULT_CHUNK_ROWS: usize = 64 * 1024;

/// Stable sort of an arbitrarily large row stream by a key-column list.
#[derive(Clone)]
pub struct ExternalSort {
    keys: Vec<String>,
    chunk_rows: usize,
}

impl ExternalSort {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys,
            chunk_rows: DEFAULT_CHUNK_ROWS,
        }
    }

    /// Override the in-memory chunk bound (minimum 1). Mainly useful to
    /// force the spill path in tests.
    pub fn with_chunk_rows(mut self, chunk_rows: usize) -> Self {
        self.chunk_rows = chunk_rows.max(1);
        self
    }

    /// Wrap `input` in a lazily-sorted stream.
    pub fn apply(&self, input: RowStream) -> RowStream {
        Box::new(SortStream {
            sorter: self.clone(),
            state: SortState::Pending(Some(input)),
        })
    }

    /// Drain the input, producing the sorted output stream.
    fn sort_all(&self, input: RowStream) -> Result<RowStream> {
        let mut chunk: Vec<(KeyTuple, Row)> = Vec::new();
        let mut spills: Vec<ChunkLines> = Vec::new();
        let mut reference: Option<KeyTuple> = None;

        for item in input {
            let row = item?;
            let key = row.key_tuple(&self.keys)?;
            match &reference {
                None => reference = Some(key.clone()),
                Some(first) => ensure_comparable(first, &key)?,
            }
            chunk.push((key, row));
            if chunk.len() >= self.chunk_rows {
                chunk.sort_by(|a, b| sort_cmp_tuples(&a.0, &b.0));
                spills.push(spill_chunk(&chunk)?);
                debug!("spilled sorted chunk of {} rows to scratch", chunk.len());
                chunk.clear();
            }
        }

        chunk.sort_by(|a, b| sort_cmp_tuples(&a.0, &b.0));
        if spills.is_empty() {
            return Ok(Box::new(chunk.into_iter().map(|(_, row)| Ok(row))));
        }
        if !chunk.is_empty() {
            spills.push(spill_chunk(&chunk)?);
        }
        debug!("merging {} sorted scratch chunks", spills.len());
        let merge = MergeStream::new(spills, self.keys.clone())?;
        Ok(Box::new(merge))
    }
}

enum SortState {
    Pending(Option<RowStream>),
    Ready(RowStream),
    Failed,
}

struct SortStream {
    sorter: ExternalSort,
    state: SortState,
}

impl Iterator for SortStream {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if let SortState::Pending(input) = &mut self.state {
            let input = input.take()?;
            match self.sorter.sort_all(input) {
                Ok(stream) => self.state = SortState::Ready(stream),
                Err(e) => {
                    self.state = SortState::Failed;
                    return Some(Err(e));
                }
            }
        }
        match &mut self.state {
            SortState::Ready(stream) => stream.next(),
            _ => None,
        }
    }
}

/// All key tuples in one sort must be mutually orderable; the first tuple
/// seen acts as the reference shape.
fn ensure_comparable(reference: &[Value], key: &[Value]) -> Result<()> {
    for (a, b) in reference.iter().zip(key.iter()) {
        if a.key_class() != b.key_class() {
            return Err(FlowError::NotComparable {
                left: a.type_name(),
                right: b.type_name(),
            });
        }
    }
    Ok(())
}

fn scratch_err(e: serde_json::Error) -> FlowError {
    FlowError::Io(std::io::Error::other(e))
}

type ChunkLines = Lines<BufReader<File>>;

/// Write one sorted chunk to an unlinked scratch file and hand back a
/// reader positioned at its start.
fn spill_chunk(chunk: &[(KeyTuple, Row)]) -> Result<ChunkLines> {
    let file = tempfile::tempfile()?;
    let mut writer = BufWriter::new(file);
    for (_, row) in chunk {
        serde_json::to_writer(&mut writer, row).map_err(scratch_err)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    let mut file = writer.into_inner().map_err(|e| e.into_error())?;
    file.rewind()?;
    Ok(BufReader::new(file).lines())
}

fn read_head(chunk: &mut ChunkLines, keys: &[String]) -> Result<Option<(KeyTuple, Row)>> {
    match chunk.next() {
        None => Ok(None),
        Some(line) => {
            let row: Row = serde_json::from_str(&line?).map_err(scratch_err)?;
            let key = row.key_tuple(keys)?;
            Ok(Some((key, row)))
        }
    }
}

/// K-way merge over sorted scratch chunks.
struct MergeStream {
    keys: Vec<String>,
    chunks: Vec<ChunkLines>,
    heads: Vec<Option<(KeyTuple, Row)>>,
    failed: bool,
}

impl MergeStream {
    fn new(mut chunks: Vec<ChunkLines>, keys: Vec<String>) -> Result<Self> {
        let mut heads = Vec::with_capacity(chunks.len());
        for chunk in &mut chunks {
            heads.push(read_head(chunk, &keys)?);
        }
        Ok(Self {
            keys,
            chunks,
            heads,
            failed: false,
        })
    }
}

impl Iterator for MergeStream {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        // Smallest head key wins; the earliest chunk wins ties, which keeps
        // the merge stable because chunks are cut in input order.
        let mut best: Option<usize> = None;
        for (i, head) in self.heads.iter().enumerate() {
            if let Some((key, _)) = head {
                let better = match best {
                    None => true,
                    Some(j) => match &self.heads[j] {
                        Some((best_key, _)) => {
                            sort_cmp_tuples(key, best_key) == std::cmp::Ordering::Less
                        }
                        None => true,
                    },
                };
                if better {
                    best = Some(i);
                }
            }
        }
        let i = best?;
        let (_, row) = self.heads[i].take()?;
        match read_head(&mut self.chunks[i], &self.keys) {
            Ok(head) => self.heads[i] = head,
            Err(e) => {
                self.failed = true;
                return Some(Err(e));
            }
        }
        Some(Ok(row))
    }
}

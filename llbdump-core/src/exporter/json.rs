//! `records-json` renderer: newline-delimited JSON, one record per op.
//!
//! Records are produced lazily by [`RecordStream`] and written one at a time,
//! each flushed before the next is encoded.

use std::io::Write;
use std::slice;

use crate::error::{DumpError, Result};
use crate::graph::LlbGraph;
use crate::types::OpRecord;

/// Lazy sequence of encoded records, in node order.
pub struct RecordStream<'g> {
    nodes: slice::Iter<'g, OpRecord>,
}

impl<'g> Iterator for RecordStream<'g> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.nodes.next()?;
        Some(encode(record))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.nodes.size_hint()
    }
}

/// Encode one record as a single JSON line.
pub fn encode(record: &OpRecord) -> Result<Vec<u8>> {
    let mut line =
        serde_json::to_vec(record).map_err(|e| DumpError::render(&record.digest, e))?;
    line.push(b'\n');
    Ok(line)
}

pub fn records(graph: &LlbGraph) -> RecordStream<'_> {
    RecordStream {
        nodes: graph.nodes().iter(),
    }
}

/// Stream every record to `out`.
pub fn write<W: Write>(graph: &LlbGraph, out: &mut W) -> Result<()> {
    for line in records(graph) {
        out.write_all(&line?)?;
        out.flush()?;
    }
    Ok(())
}

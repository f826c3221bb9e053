//! In-memory LLB graph built on petgraph.
//!
//! Nodes keep the decode order of the definition. Input references are
//! resolved best-effort: a reference to a digest that is not part of the
//! definition is reported as dangling instead of failing, so every renderer
//! can still emit it verbatim.
//!
//! # Architecture
//!
//! ```text
//! Definition -> decode_ops -> join_metadata -> LlbGraph -> renderers
//! ```

use std::collections::HashMap;

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::decoder::decode_ops;
use crate::digest::Digest;
use crate::error::Result;
use crate::metadata::join_metadata;
use crate::pb::Definition;
use crate::types::OpRecord;

/// Read-only build graph of one definition.
pub struct LlbGraph {
    records: Vec<OpRecord>,
    /// First occurrence of every digest.
    index: HashMap<Digest, usize>,
    /// Node `i` is `records[i]`; edges run from an input to its consumer and
    /// carry the referenced output index.
    graph: DiGraph<usize, i64>,
}

/// One input reference of a node, after lookup.
#[derive(Debug, Clone, Copy)]
pub enum ResolvedInput<'g> {
    /// The referenced op is part of the graph.
    Resolved { node: &'g OpRecord, output: i64 },
    /// The referenced digest is unknown to this definition.
    Dangling { digest: &'g str, output: i64 },
}

impl<'g> ResolvedInput<'g> {
    /// Digest string of the referenced op, resolved or not.
    pub fn digest(&self) -> &'g str {
        match self {
            ResolvedInput::Resolved { node, .. } => node.digest.as_str(),
            ResolvedInput::Dangling { digest, .. } => digest,
        }
    }

    pub fn is_dangling(&self) -> bool {
        matches!(self, ResolvedInput::Dangling { .. })
    }
}

impl LlbGraph {
    /// Build the graph from already joined records, in the given order.
    pub fn new(records: Vec<OpRecord>) -> Self {
        let mut graph = DiGraph::with_capacity(records.len(), records.len());
        let mut index = HashMap::with_capacity(records.len());

        for (pos, record) in records.iter().enumerate() {
            graph.add_node(pos);
            index.entry(record.digest.clone()).or_insert(pos);
        }

        let mut dangling = 0usize;
        for (pos, record) in records.iter().enumerate() {
            for input in record.inputs() {
                match index.get(input.digest.as_str()) {
                    Some(&src) => {
                        graph.add_edge(NodeIndex::new(src), NodeIndex::new(pos), input.index);
                    }
                    None => dangling += 1,
                }
            }
        }

        if dangling > 0 {
            tracing::warn!(dangling, "definition references ops it does not contain");
        }

        let llb = Self {
            records,
            index,
            graph,
        };
        if !llb.is_acyclic() {
            tracing::warn!("definition contains a cycle");
        }
        llb
    }

    /// Decode, join and index a definition.
    pub fn from_definition(def: &Definition) -> Result<Self> {
        let decoded = decode_ops(def.def.as_slice())?;
        Ok(Self::new(join_metadata(decoded, &def.metadata)))
    }

    /// Nodes in decode order.
    pub fn nodes(&self) -> &[OpRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a node by digest.
    pub fn get(&self, digest: &str) -> Option<&OpRecord> {
        self.index.get(digest).map(|&pos| &self.records[pos])
    }

    /// Inputs of `node` in positional order.
    pub fn inputs<'g>(&'g self, node: &'g OpRecord) -> Vec<ResolvedInput<'g>> {
        node.inputs()
            .iter()
            .map(|input| match self.get(&input.digest) {
                Some(found) => ResolvedInput::Resolved {
                    node: found,
                    output: input.index,
                },
                None => ResolvedInput::Dangling {
                    digest: &input.digest,
                    output: input.index,
                },
            })
            .collect()
    }

    /// Number of `(input, node)` pairs, counting dangling references.
    pub fn edge_count(&self) -> usize {
        self.records.iter().map(|r| r.inputs().len()).sum()
    }

    /// Every dangling reference as `(consumer, missing digest)`.
    pub fn dangling(&self) -> Vec<(&Digest, &str)> {
        self.records
            .iter()
            .flat_map(|record| {
                record
                    .inputs()
                    .iter()
                    .filter(|input| !self.index.contains_key(input.digest.as_str()))
                    .map(move |input| (&record.digest, input.digest.as_str()))
            })
            .collect()
    }

    /// Nodes that nothing else in the graph consumes.
    pub fn sinks(&self) -> Vec<&OpRecord> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, petgraph::Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .map(|idx| &self.records[self.graph[idx]])
            .collect()
    }

    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_directed(&self.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pb::{self, Input, OpMetadata};

    fn record(name: &str, inputs: &[&str]) -> OpRecord {
        OpRecord {
            op: pb::Op {
                inputs: inputs
                    .iter()
                    .map(|d| Input {
                        digest: d.to_string(),
                        index: 0,
                    })
                    .collect(),
                ..Default::default()
            },
            digest: Digest::from(name),
            metadata: OpMetadata::default(),
        }
    }

    #[test]
    fn test_nodes_keep_order() {
        let graph = LlbGraph::new(vec![record("b", &[]), record("a", &["b"])]);
        let names: Vec<_> = graph.nodes().iter().map(|r| r.digest.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_inputs_resolve_and_dangle() {
        let graph = LlbGraph::new(vec![record("a", &[]), record("b", &["a", "ghost"])]);
        let b = graph.get("b").unwrap();
        let inputs = graph.inputs(b);

        assert_eq!(inputs.len(), 2);
        assert!(!inputs[0].is_dangling());
        assert_eq!(inputs[0].digest(), "a");
        assert!(inputs[1].is_dangling());
        assert_eq!(inputs[1].digest(), "ghost");
        assert_eq!(graph.dangling(), vec![(&Digest::from("b"), "ghost")]);
    }

    #[test]
    fn test_edge_count_includes_dangling() {
        let graph = LlbGraph::new(vec![
            record("a", &[]),
            record("b", &["a"]),
            record("c", &["a", "b", "missing"]),
        ]);
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn test_sinks_and_acyclic() {
        let graph = LlbGraph::new(vec![
            record("a", &[]),
            record("b", &["a"]),
            record("c", &["b"]),
        ]);
        assert!(graph.is_acyclic());
        let sinks: Vec<_> = graph.sinks().iter().map(|r| r.digest.as_str()).collect();
        assert_eq!(sinks, vec!["c"]);
    }

    #[test]
    fn test_cycle_is_detected_not_fatal() {
        let graph = LlbGraph::new(vec![record("a", &["b"]), record("b", &["a"])]);
        assert!(!graph.is_acyclic());
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_duplicate_digest_resolves_to_first() {
        let mut first = record("a", &[]);
        first.metadata.ignore_cache = true;
        let graph = LlbGraph::new(vec![first, record("a", &[])]);
        assert_eq!(graph.len(), 2);
        assert!(graph.get("a").unwrap().metadata.ignore_cache);
    }

    #[test]
    fn test_from_definition() {
        use prost::Message;

        let source = pb::Op {
            op: Some(pb::op::Op::Source(pb::SourceOp {
                identifier: "local://ctx".to_string(),
                ..Default::default()
            })),
            ..Default::default()
        }
        .encode_to_vec();
        let digest = Digest::from_bytes(&source);
        let terminal = pb::Op {
            inputs: vec![Input {
                digest: digest.to_string(),
                index: 0,
            }],
            ..Default::default()
        }
        .encode_to_vec();

        let def = Definition {
            def: vec![source, terminal],
            metadata: Default::default(),
        };
        let graph = LlbGraph::from_definition(&def).unwrap();
        assert_eq!(graph.len(), 2);
        assert!(graph.dangling().is_empty());
        assert_eq!(graph.inputs(&graph.nodes()[1])[0].digest(), digest.as_str());
    }
}

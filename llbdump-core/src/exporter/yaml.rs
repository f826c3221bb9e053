//! `records-yaml` renderer.
//!
//! Unlike the JSON stream, the YAML output is fully materialized first: the
//! highlighter needs the complete text. Each record is its own document;
//! documents are separated by `---`.

use crate::error::{DumpError, Result};
use crate::graph::LlbGraph;

const DOCUMENT_SEPARATOR: &str = "---\n";

/// Render all records into a single buffer.
pub fn render(graph: &LlbGraph) -> Result<String> {
    let mut buf = String::new();
    for (i, record) in graph.nodes().iter().enumerate() {
        if i > 0 {
            buf.push_str(DOCUMENT_SEPARATOR);
        }
        let doc = serde_yaml::to_string(record).map_err(|e| DumpError::render(&record.digest, e))?;
        buf.push_str(&doc);
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Digest;
    use crate::pb::{self, OpMetadata};
    use crate::types::OpRecord;
    use serde::Deserialize;

    fn exec_record(digest: &str) -> OpRecord {
        OpRecord {
            op: pb::Op {
                op: Some(pb::op::Op::Exec(pb::ExecOp {
                    meta: Some(pb::Meta {
                        args: vec!["touch".to_string(), "/a".to_string()],
                        cwd: "/".to_string(),
                        ..Default::default()
                    }),
                    ..Default::default()
                })),
                ..Default::default()
            },
            digest: Digest::from(digest),
            metadata: OpMetadata::default(),
        }
    }

    #[test]
    fn test_one_document_per_record() {
        let graph = LlbGraph::new(vec![
            exec_record("sha256:01"),
            exec_record("sha256:02"),
            exec_record("sha256:03"),
        ]);
        let text = render(&graph).unwrap();

        let docs: Vec<serde_yaml::Value> = serde_yaml::Deserializer::from_str(&text)
            .map(serde_yaml::Value::deserialize)
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0]["Digest"].as_str(), Some("sha256:01"));
        assert_eq!(docs[2]["Digest"].as_str(), Some("sha256:03"));
        assert_eq!(docs[1]["Op"]["exec"]["meta"]["args"][0].as_str(), Some("touch"));
    }

    #[test]
    fn test_two_space_indentation() {
        let graph = LlbGraph::new(vec![exec_record("sha256:01")]);
        let text = render(&graph).unwrap();
        assert!(text.starts_with("Op:\n  exec:\n    meta:\n"));
        assert!(text.contains("Digest: sha256:01\n"));
        assert!(text.contains("OpMetadata: {}\n"));
    }

    #[test]
    fn test_empty_graph_renders_nothing() {
        let graph = LlbGraph::new(Vec::new());
        assert_eq!(render(&graph).unwrap(), "");
    }
}

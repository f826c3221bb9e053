//! `graph` renderer: a Graphviz DOT digraph of the definition.

use std::fmt::Write as _;
use std::io::Write;

use crate::error::Result;
use crate::graph::LlbGraph;
use crate::label::{edge_label, resolve_label, NodeLabel};

/// Write the DOT document for `graph`.
///
/// All node statements come first, then one edge per input reference,
/// dangling ones included.
pub fn write<W: Write>(graph: &LlbGraph, out: &mut W) -> Result<()> {
    writeln!(out, "digraph {{")?;

    for record in graph.nodes() {
        let NodeLabel { label, shape } = resolve_label(&record.digest, &record.op);
        writeln!(
            out,
            "  {} [label={} shape={}];",
            quote(record.digest.as_str()),
            quote(&label),
            quote(shape.as_str())
        )?;
    }

    for record in graph.nodes() {
        for (i, input) in graph.inputs(record).iter().enumerate() {
            writeln!(
                out,
                "  {} -> {} [label={}];",
                quote(input.digest()),
                quote(record.digest.as_str()),
                quote(edge_label(&record.op, i))
            )?;
        }
    }

    writeln!(out, "}}")?;
    out.flush()?;
    Ok(())
}

/// Double-quote `s` as a DOT string literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Digest;
    use crate::pb::{self, OpMetadata};
    use crate::types::OpRecord;

    fn render(graph: &LlbGraph) -> String {
        let mut out = Vec::new();
        write(graph, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn source(digest: &str, identifier: &str) -> OpRecord {
        OpRecord {
            op: pb::Op {
                op: Some(pb::op::Op::Source(pb::SourceOp {
                    identifier: identifier.to_string(),
                    ..Default::default()
                })),
                ..Default::default()
            },
            digest: Digest::from(digest),
            metadata: OpMetadata::default(),
        }
    }

    fn exec(digest: &str, inputs: &[&str], mounts: &[(i64, &str)]) -> OpRecord {
        OpRecord {
            op: pb::Op {
                inputs: inputs
                    .iter()
                    .map(|d| pb::Input {
                        digest: d.to_string(),
                        index: 0,
                    })
                    .collect(),
                op: Some(pb::op::Op::Exec(pb::ExecOp {
                    meta: Some(pb::Meta {
                        args: vec!["make".to_string(), "all".to_string()],
                        ..Default::default()
                    }),
                    mounts: mounts
                        .iter()
                        .map(|(input, dest)| pb::Mount {
                            input: *input,
                            dest: dest.to_string(),
                            ..Default::default()
                        })
                        .collect(),
                    ..Default::default()
                })),
                ..Default::default()
            },
            digest: Digest::from(digest),
            metadata: OpMetadata::default(),
        }
    }

    #[test]
    fn test_graph_document() {
        let graph = LlbGraph::new(vec![
            source("sha256:img", "docker-image://alpine"),
            source("sha256:ctx", "local://context"),
            exec(
                "sha256:run",
                &["sha256:img", "sha256:ctx"],
                &[(0, "/"), (1, "/src")],
            ),
        ]);

        assert_eq!(
            render(&graph),
            concat!(
                "digraph {\n",
                "  \"sha256:img\" [label=\"docker-image://alpine\" shape=\"ellipse\"];\n",
                "  \"sha256:ctx\" [label=\"local://context\" shape=\"ellipse\"];\n",
                "  \"sha256:run\" [label=\"make all\" shape=\"box\"];\n",
                "  \"sha256:img\" -> \"sha256:run\" [label=\"\"];\n",
                "  \"sha256:ctx\" -> \"sha256:run\" [label=\"/src\"];\n",
                "}\n",
            )
        );
    }

    #[test]
    fn test_empty_graph() {
        assert_eq!(render(&LlbGraph::new(Vec::new())), "digraph {\n}\n");
    }

    #[test]
    fn test_dangling_input_still_drawn() {
        let graph = LlbGraph::new(vec![exec("sha256:run", &["sha256:gone"], &[])]);
        let text = render(&graph);
        assert!(text.contains("  \"sha256:gone\" -> \"sha256:run\" [label=\"\"];\n"));
        assert!(!text.contains("\"sha256:gone\" [label="));
    }

    #[test]
    fn test_edge_lines_match_input_count() {
        let graph = LlbGraph::new(vec![
            source("sha256:a", "local://a"),
            exec("sha256:b", &["sha256:a", "sha256:a"], &[]),
            exec("sha256:c", &["sha256:b", "sha256:missing"], &[]),
        ]);
        let edges = render(&graph).lines().filter(|l| l.contains(" -> ")).count();
        assert_eq!(edges, graph.edge_count());
        assert_eq!(edges, 4);
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(quote("a\\b"), "\"a\\\\b\"");
        assert_eq!(quote("l1\nl2\t"), "\"l1\\nl2\\t\"");
        assert_eq!(quote("\u{1}"), "\"\\x01\"");
        assert_eq!(quote("héllo"), "\"héllo\"");
    }
}
